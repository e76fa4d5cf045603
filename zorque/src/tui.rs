//! Terminal frontend.
//!
//! The terminal plays the part of the touchscreen: the mouse is the finger
//! and a [`CharGrid`] sized to the narration area is the text terminal. The
//! four colored labels mark the quadrants.
//!
//! Raw mode swallows Ctrl-C, so quit keys are read from the event queue:
//! by [`MouseTouch`] while waiting for a tap, and by [`QuitWatch`] while a
//! reply is being fetched.

use anyhow::Result;
use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    style::{Color, Style},
    text::Line,
    widgets::Paragraph,
    Frame, Terminal,
};
use std::io::{self, Stdout};
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};
use zorque_core::{
    CharGrid, CompletionClient, CompletionError, Completer, DisplayError, DisplaySink, Game,
    GameConfig, InputError, Layout, TouchChoices, TouchDecoder, TouchPoint, TouchSource, Turn,
};

/// Label colors for choices 1 to 4.
const LABEL_COLORS: [Color; 4] = [Color::Yellow, Color::Cyan, Color::Magenta, Color::Green];

/// How long one touch sample waits for a terminal event.
const SAMPLE_INTERVAL: Duration = Duration::from_millis(10);

/// Play until interrupted.
pub fn run(config: GameConfig, completer: CompletionClient) -> Result<()> {
    let display = TerminalDisplay::enter()?;
    let (cols, rows) = display.screen_size();
    info!(cols, rows, "terminal ready");

    let decoder = TouchDecoder::new(u32::from(cols), u32::from(rows)).with_debounce(config.debounce);
    let touch = MouseTouch::new();
    let completer = QuitWatch::new(completer, touch.pointer());
    let input = TouchChoices::new(decoder, touch);

    let mut game = Game::new(config, input, completer, display);
    game.run()?;
    Ok(())
}

/// The terminal as a display sink.
///
/// Every write redraws, so text shows up as soon as it is written.
/// Restores the terminal when dropped.
pub struct TerminalDisplay {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    layout: Layout,
    grid: CharGrid,
}

impl TerminalDisplay {
    /// Take over the terminal: raw mode, alternate screen, mouse capture.
    pub fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        match Self::setup() {
            Ok(display) => Ok(display),
            Err(err) => {
                restore_terminal(&mut io::stdout());
                Err(err)
            }
        }
    }

    fn setup() -> io::Result<Self> {
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        terminal.hide_cursor()?;

        let size = terminal.size()?;
        let layout = Layout::for_screen(size.width, size.height);
        let (cols, rows) = layout.text_size();

        let mut display = Self {
            terminal,
            layout,
            grid: CharGrid::new(cols, rows),
        };
        display.draw()?;
        Ok(display)
    }

    /// Screen size in cells as `(cols, rows)`.
    pub fn screen_size(&self) -> (u16, u16) {
        (self.layout.screen.width, self.layout.screen.height)
    }

    fn draw(&mut self) -> io::Result<()> {
        let Self {
            terminal,
            layout,
            grid,
        } = self;
        terminal.draw(|frame| render(frame, layout, grid))?;
        grid.mark_clean();
        Ok(())
    }
}

impl DisplaySink for TerminalDisplay {
    fn write_line(&mut self, line: &str) -> Result<(), DisplayError> {
        self.grid.write_line(line)?;
        self.draw()?;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        self.grid.clear()?;
        self.draw()?;
        Ok(())
    }

    /// Repaint the whole screen, not just what changed.
    fn refresh(&mut self) -> Result<(), DisplayError> {
        self.terminal.clear()?;
        self.draw()?;
        Ok(())
    }

    fn columns(&self) -> usize {
        self.grid.cols()
    }
}

impl Drop for TerminalDisplay {
    fn drop(&mut self) {
        restore_terminal(self.terminal.backend_mut());
        let _ = self.terminal.show_cursor();
    }
}

fn restore_terminal<W: io::Write>(out: &mut W) {
    let _ = disable_raw_mode();
    let _ = execute!(out, LeaveAlternateScreen, DisableMouseCapture, cursor::Show);
}

fn to_area(rect: zorque_core::Rect) -> ratatui::layout::Rect {
    ratatui::layout::Rect::new(rect.x, rect.y, rect.width, rect.height)
}

fn render(frame: &mut Frame, layout: &Layout, grid: &CharGrid) {
    let screen = frame.area();

    for (label, color) in layout.labels.iter().zip(LABEL_COLORS) {
        let caption =
            Paragraph::new(label.caption()).style(Style::default().fg(Color::Black).bg(color));
        frame.render_widget(caption, to_area(label.area).intersection(screen));
    }

    let text: Vec<Line> = grid.lines().map(Line::raw).collect();
    frame.render_widget(Paragraph::new(text), to_area(layout.text).intersection(screen));
}

/// Left-button state, shared by every reader of the terminal event queue.
#[derive(Debug, Clone, Default)]
pub struct Pointer(Arc<Mutex<Option<TouchPoint>>>);

impl Pointer {
    pub fn get(&self) -> Option<TouchPoint> {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply one terminal event. Returns true for a quit key.
    fn apply(&self, event: Event) -> bool {
        match event {
            Event::Mouse(mouse) => {
                let mut pressed = self.0.lock().unwrap_or_else(PoisonError::into_inner);
                match mouse.kind {
                    MouseEventKind::Down(MouseButton::Left)
                    | MouseEventKind::Drag(MouseButton::Left) => {
                        *pressed = Some(TouchPoint::new(
                            i32::from(mouse.column),
                            i32::from(mouse.row),
                        ));
                    }
                    MouseEventKind::Up(_) => *pressed = None,
                    _ => {}
                }
                false
            }
            Event::Key(key) if is_quit(&key) => {
                debug!(?key.code, "quit key");
                true
            }
            _ => false,
        }
    }
}

/// Wait up to `timeout` for the next terminal event.
fn poll_event(timeout: Duration) -> io::Result<Option<Event>> {
    if event::poll(timeout)? {
        event::read().map(Some)
    } else {
        Ok(None)
    }
}

/// The mouse as a touch panel.
///
/// The left button held down is a finger on the glass. Each sample handles
/// at most one terminal event.
#[derive(Debug, Default)]
pub struct MouseTouch {
    pointer: Pointer,
}

impl MouseTouch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle on the button state, for readers that drain events while no
    /// tap is awaited.
    pub fn pointer(&self) -> Pointer {
        self.pointer.clone()
    }
}

impl TouchSource for MouseTouch {
    fn sample(&mut self) -> Result<Option<TouchPoint>, InputError> {
        if let Some(event) = poll_event(SAMPLE_INTERVAL)? {
            if self.pointer.apply(event) {
                return Err(InputError::Interrupted);
            }
        }
        Ok(self.pointer.get())
    }
}

/// Keeps quit keys live while a completion blocks.
///
/// The request runs on the calling thread while a scoped watcher drains the
/// event queue. A blocking request cannot be cancelled, so a quit key
/// restores the terminal and exits the process with the interrupt status.
pub struct QuitWatch<C> {
    inner: C,
    pointer: Pointer,
}

impl<C: Completer> QuitWatch<C> {
    pub fn new(inner: C, pointer: Pointer) -> Self {
        Self { inner, pointer }
    }
}

impl<C: Completer> Completer for QuitWatch<C> {
    fn complete(&mut self, prompt: &[Turn]) -> Result<String, CompletionError> {
        let done = AtomicBool::new(false);
        let pointer = &self.pointer;
        let inner = &mut self.inner;

        thread::scope(|scope| {
            scope.spawn(|| match watch_for_quit(&done, pointer, poll_event) {
                Ok(true) => {
                    info!("interrupted during fetch, shutting down");
                    restore_terminal(&mut io::stdout());
                    process::exit(i32::from(crate::EXIT_INTERRUPTED));
                }
                Ok(false) => {}
                Err(err) => warn!(error = %err, "stopped watching for quit keys"),
            });

            let result = inner.complete(prompt);
            done.store(true, Ordering::Relaxed);
            result
        })
    }
}

/// Drain terminal events until `done` is set or a quit key arrives.
///
/// Mouse events still update `pointer` so a release during the fetch is not
/// lost. Returns whether a quit key was seen.
fn watch_for_quit(
    done: &AtomicBool,
    pointer: &Pointer,
    mut next_event: impl FnMut(Duration) -> io::Result<Option<Event>>,
) -> io::Result<bool> {
    while !done.load(Ordering::Relaxed) {
        if let Some(event) = next_event(SAMPLE_INTERVAL)? {
            if pointer.apply(event) {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

fn is_quit(key: &KeyEvent) -> bool {
    if key.kind != KeyEventKind::Press {
        return false;
    }
    match key.code {
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        KeyCode::Char('q') | KeyCode::Esc => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::MouseEvent;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn test_quit_keys() {
        assert!(is_quit(&key(KeyCode::Char('q'), KeyModifiers::NONE)));
        assert!(is_quit(&key(KeyCode::Esc, KeyModifiers::NONE)));
        assert!(is_quit(&key(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        assert!(!is_quit(&key(KeyCode::Char('c'), KeyModifiers::NONE)));
        assert!(!is_quit(&key(KeyCode::Char('1'), KeyModifiers::NONE)));
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> Event {
        Event::Mouse(MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        })
    }

    #[test]
    fn test_quit_key_during_fetch_stops_without_waiting_for_reply() {
        let done = AtomicBool::new(false);
        let pointer = Pointer::default();
        let mut events = vec![
            None,
            Some(mouse(MouseEventKind::Down(MouseButton::Left), 3, 4)),
            Some(Event::Key(key(KeyCode::Char('q'), KeyModifiers::NONE))),
        ]
        .into_iter();

        // `done` is never set: the fetch is still in flight.
        let quit = watch_for_quit(&done, &pointer, |_| Ok(events.next().flatten())).unwrap();
        assert!(quit);
        assert_eq!(pointer.get(), Some(TouchPoint::new(3, 4)));
    }

    #[test]
    fn test_ctrl_c_during_fetch() {
        let done = AtomicBool::new(false);
        let ctrl_c = Event::Key(key(KeyCode::Char('c'), KeyModifiers::CONTROL));
        let quit = watch_for_quit(&done, &Pointer::default(), |_| Ok(Some(ctrl_c.clone())));
        assert!(quit.unwrap());
    }

    #[test]
    fn test_watch_ends_with_the_fetch() {
        let done = AtomicBool::new(false);
        let pointer = Pointer::default();
        pointer.apply(mouse(MouseEventKind::Down(MouseButton::Left), 1, 1));

        let quit = watch_for_quit(&done, &pointer, |_| {
            done.store(true, Ordering::Relaxed);
            Ok(Some(mouse(MouseEventKind::Up(MouseButton::Left), 1, 1)))
        })
        .unwrap();

        assert!(!quit);
        // The release seen during the fetch is not lost.
        assert_eq!(pointer.get(), None);
    }

    #[test]
    fn test_watch_not_started_after_fetch() {
        let done = AtomicBool::new(true);
        let quit = watch_for_quit(&done, &Pointer::default(), |_| -> io::Result<Option<Event>> {
            panic!("no events should be read")
        });
        assert!(!quit.unwrap());
    }

    #[test]
    fn test_render_labels_and_text() {
        use ratatui::backend::TestBackend;

        let layout = Layout::for_screen(20, 8);
        let (cols, rows) = layout.text_size();
        let mut grid = CharGrid::new(cols, rows);
        grid.write_line("Hello").unwrap();

        let mut terminal = Terminal::new(TestBackend::new(20, 8)).unwrap();
        terminal.draw(|frame| render(frame, &layout, &grid)).unwrap();

        let buffer = terminal.backend().buffer();
        assert_eq!(buffer[(4, 0)].symbol(), "1");
        assert_eq!(buffer[(14, 0)].symbol(), "2");
        assert_eq!(buffer[(4, 7)].symbol(), "3");
        assert_eq!(buffer[(14, 7)].symbol(), "4");
        assert_eq!(buffer[(0, 0)].bg, Color::Yellow);
        assert_eq!(buffer[(10, 7)].bg, Color::Green);

        let text: String = (1..6).map(|x| buffer[(x, 2)].symbol()).collect();
        assert_eq!(text, "Hello");
    }
}
