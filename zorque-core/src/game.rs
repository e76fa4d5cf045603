//! The game loop.
//!
//! Each adventure step walks the same states:
//!
//! ```text
//! Init ──> BuildPrompt ──> Fetch ──> Render ──> Record ──> AwaitInput
//!              ^                                              │
//!              └──────────────────────────────────────────────┘
//! ```
//!
//! `Init` injects the synthetic "New game" action instead of waiting for a
//! tap. `Fatal` (fetch gave up, display or input device broke) and
//! `Shutdown` (operator interrupt) are terminal.

use crate::completion::{Completer, FetchError};
use crate::config::GameConfig;
use crate::display::{DisplayError, DisplaySink};
use crate::input::{ChoiceSource, InputError};
use crate::turn::{Action, Turn};
use crate::window::ConversationWindow;
use crate::wrap::write_wrapped;
use thiserror::Error;
use tracing::{error, info};

/// Errors that end a game.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("could not get narration: {0}")]
    Completion(#[from] FetchError),

    #[error("display failed: {0}")]
    Display(#[from] DisplayError),

    #[error("input failed: {0}")]
    Input(#[from] InputError),
}

/// Where the game loop is.
#[derive(Debug, Clone, PartialEq)]
pub enum GameState {
    Init,
    AwaitInput,
    BuildPrompt { action: Action },
    Fetch { action: Action, prompt: Vec<Turn> },
    Render { action: Action, reply: String },
    Record { action: Action, reply: String },
    Fatal,
    Shutdown,
}

impl GameState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, GameState::Fatal | GameState::Shutdown)
    }
}

/// A running adventure.
///
/// Owns the conversation window and every device it talks to.
pub struct Game<I, C, D> {
    config: GameConfig,
    window: ConversationWindow,
    input: I,
    completer: C,
    display: D,
    state: GameState,
    steps: u64,
}

impl<I, C, D> Game<I, C, D>
where
    I: ChoiceSource,
    C: Completer,
    D: DisplaySink,
{
    pub fn new(config: GameConfig, input: I, completer: C, display: D) -> Self {
        let window = ConversationWindow::new(config.system_prompt.clone(), config.window_cap);
        Self {
            config,
            window,
            input,
            completer,
            display,
            state: GameState::Init,
            steps: 0,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn window(&self) -> &ConversationWindow {
        &self.window
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn completer(&self) -> &C {
        &self.completer
    }

    pub fn completer_mut(&mut self) -> &mut C {
        &mut self.completer
    }

    pub fn input_mut(&mut self) -> &mut I {
        &mut self.input
    }

    /// Completed adventure steps.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Advance one state.
    ///
    /// On error the game is left in [`GameState::Fatal`]. Terminal states
    /// do not advance.
    pub fn step(&mut self) -> Result<(), GameError> {
        let state = std::mem::replace(&mut self.state, GameState::Fatal);
        match self.advance(state) {
            Ok(next) => {
                self.state = next;
                Ok(())
            }
            Err(err) => {
                error!(error = %err, step = self.steps, "game stopped");
                Err(err)
            }
        }
    }

    /// Step until a terminal state.
    ///
    /// The loop has no natural end: `Ok(())` means the operator
    /// interrupted it.
    pub fn run(&mut self) -> Result<(), GameError> {
        while !self.state.is_terminal() {
            self.step()?;
        }
        Ok(())
    }

    fn advance(&mut self, state: GameState) -> Result<GameState, GameError> {
        let next = match state {
            GameState::Init => {
                info!(
                    model = %self.config.model,
                    offline = self.config.offline,
                    window_cap = self.window.cap(),
                    "starting new game"
                );
                self.announce(&Action::NewGame)?;
                GameState::BuildPrompt {
                    action: Action::NewGame,
                }
            }
            GameState::AwaitInput => match self.input.next_choice() {
                Ok(choice) => {
                    let action = Action::Choose(choice);
                    self.announce(&action)?;
                    GameState::BuildPrompt { action }
                }
                Err(InputError::Interrupted) => {
                    info!(steps = self.steps, "interrupted, shutting down");
                    GameState::Shutdown
                }
                Err(err) => return Err(err.into()),
            },
            GameState::BuildPrompt { action } => GameState::Fetch {
                prompt: self.window.snapshot_for_request(&action),
                action,
            },
            GameState::Fetch { action, prompt } => {
                let reply = self.config.retry.fetch(&mut self.completer, &prompt)?;
                GameState::Render { action, reply }
            }
            GameState::Render { action, reply } => {
                self.display.clear()?;
                let columns = self.display.columns();
                write_wrapped(&mut self.display, &reply, columns)?;
                self.display.refresh()?;
                GameState::Record { action, reply }
            }
            GameState::Record { action, reply } => {
                self.window.record_exchange(&action, &reply);
                self.steps += 1;
                GameState::AwaitInput
            }
            terminal @ (GameState::Fatal | GameState::Shutdown) => terminal,
        };
        Ok(next)
    }

    /// Show the player's action so a tap visibly registers before the
    /// fetch blocks.
    fn announce(&mut self, action: &Action) -> Result<(), DisplayError> {
        let columns = self.display.columns();
        write_wrapped(
            &mut self.display,
            &format!("\n\n{}", action.player_text()),
            columns,
        )?;
        Ok(())
    }
}
