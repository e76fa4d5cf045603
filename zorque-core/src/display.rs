//! Display sink and the character grid it usually renders into.

use std::collections::VecDeque;
use thiserror::Error;
use unicode_width::UnicodeWidthChar;

/// Errors from a display sink.
#[derive(Debug, Error)]
pub enum DisplayError {
    #[error("display I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A line-oriented character display.
///
/// Written text is visible without a refresh; `refresh` is for redrawing
/// after layout changes.
pub trait DisplaySink {
    /// Write one line and move the cursor to the start of the next.
    fn write_line(&mut self, line: &str) -> Result<(), DisplayError>;

    /// Blank the display and home the cursor.
    fn clear(&mut self) -> Result<(), DisplayError>;

    fn refresh(&mut self) -> Result<(), DisplayError>;

    /// Width of the display in character cells.
    fn columns(&self) -> usize;
}

impl<T: DisplaySink + ?Sized> DisplaySink for Box<T> {
    fn write_line(&mut self, line: &str) -> Result<(), DisplayError> {
        (**self).write_line(line)
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        (**self).clear()
    }

    fn refresh(&mut self) -> Result<(), DisplayError> {
        (**self).refresh()
    }

    fn columns(&self) -> usize {
        (**self).columns()
    }
}

/// A fixed-size terminal buffer.
///
/// Behaves like a small hardware terminal: text that reaches the last
/// column wraps onto the next row, and writing past the bottom row scrolls
/// everything up by one. Nothing is ever drawn outside `cols x rows`.
#[derive(Debug, Clone)]
pub struct CharGrid {
    cols: usize,
    rows: usize,
    lines: VecDeque<String>,
    cursor_row: usize,
    cursor_col: usize,
    dirty: bool,
}

impl CharGrid {
    /// Create a blank grid. Both dimensions are at least 1.
    pub fn new(cols: usize, rows: usize) -> Self {
        let rows = rows.max(1);
        Self {
            cols: cols.max(1),
            rows,
            lines: (0..rows).map(|_| String::new()).collect(),
            cursor_row: 0,
            cursor_col: 0,
            dirty: true,
        }
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Visible rows, top to bottom.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn row(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }

    /// `(row, column)` where the next character lands.
    pub fn cursor(&self) -> (usize, usize) {
        (self.cursor_row, self.cursor_col)
    }

    /// Check if the grid changed since the last `mark_clean`.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Mark the grid as drawn.
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Write raw text. `\n` moves down a row, `\r` returns to column 0.
    pub fn write(&mut self, text: &str) {
        for c in text.chars() {
            match c {
                '\n' => self.line_feed(),
                '\r' => self.cursor_col = 0,
                _ => self.put(c),
            }
        }
        self.dirty = true;
    }

    /// Reset to a blank grid with the cursor at the top left.
    pub fn reset(&mut self) {
        for line in &mut self.lines {
            line.clear();
        }
        self.cursor_row = 0;
        self.cursor_col = 0;
        self.dirty = true;
    }

    fn put(&mut self, c: char) {
        let width = c.width().unwrap_or(0);
        if width == 0 {
            // Combining marks attach to the previous cell.
            self.lines[self.cursor_row].push(c);
            return;
        }
        if width > self.cols {
            return;
        }
        if self.cursor_col + width > self.cols {
            self.line_feed();
            self.cursor_col = 0;
        }

        overwrite_cell(&mut self.lines[self.cursor_row], self.cursor_col, c, width);
        self.cursor_col += width;
    }

    fn line_feed(&mut self) {
        if self.cursor_row + 1 < self.rows {
            self.cursor_row += 1;
        } else {
            self.lines.pop_front();
            self.lines.push_back(String::new());
        }
    }
}

/// Place `c` at cell `col` of `line`, replacing whatever covered those cells.
fn overwrite_cell(line: &mut String, col: usize, c: char, width: usize) {
    let mut before = String::with_capacity(line.len() + 1);
    let mut after = String::new();
    let mut pos = 0;

    for existing in line.chars() {
        let w = existing.width().unwrap_or(0);
        if pos + w <= col && (w > 0 || pos < col) {
            before.push(existing);
        } else if pos >= col + width {
            after.push(existing);
        }
        pos += w;
    }

    let used: usize = before.chars().filter_map(|c| c.width()).sum();
    before.extend(std::iter::repeat(' ').take(col - used));
    before.push(c);
    before.push_str(&after);
    *line = before;
}

impl DisplaySink for CharGrid {
    fn write_line(&mut self, line: &str) -> Result<(), DisplayError> {
        self.write(line);
        self.write("\r\n");
        Ok(())
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        self.reset();
        Ok(())
    }

    fn refresh(&mut self) -> Result<(), DisplayError> {
        Ok(())
    }

    fn columns(&self) -> usize {
        self.cols
    }
}
