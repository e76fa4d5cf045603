//! Session core for Zorque, a touch-driven text adventure with an AI game
//! master.
//!
//! This crate provides:
//! - A bounded conversation window used as both prompt and game memory
//! - A debouncing decoder from touch samples to one of four choices
//! - A retrying completion client with a deterministic offline mode
//! - A word wrapper and character grid for a fixed-size terminal
//! - The game loop tying them together
//!
//! Everything is synchronous: a step blocks on input, then on the
//! completion service, then renders.
//!
//! # Quick Start
//!
//! ```ignore
//! use zorque_core::{CharGrid, CompletionClient, Game, GameConfig, TouchChoices, TouchDecoder};
//!
//! let config = GameConfig::new().offline(true);
//! let input = TouchChoices::new(TouchDecoder::new(320, 240), my_touch_driver);
//! let mut game = Game::new(config, input, CompletionClient::offline(), CharGrid::new(52, 16));
//!
//! game.run()?;
//! ```

pub mod completion;
pub mod config;
pub mod display;
pub mod game;
pub mod input;
pub mod layout;
pub mod prompts;
pub mod testing;
pub mod touch;
pub mod turn;
pub mod window;
pub mod wrap;

// Primary public API
pub use completion::{
    CompletionClient, CompletionError, Completer, FetchError, OfflineCompleter, OnlineCompleter,
    RetryPolicy,
};
pub use config::GameConfig;
pub use display::{CharGrid, DisplayError, DisplaySink};
pub use game::{Game, GameError, GameState};
pub use input::{ChoiceSource, InputError};
pub use layout::{Label, Layout, Rect};
pub use touch::{TouchChoices, TouchDecoder, TouchPoint, TouchSample, TouchSource};
pub use turn::{Action, Choice, Role, Turn};
pub use window::ConversationWindow;
pub use wrap::{wrap, write_wrapped};

// Re-exported so frontends can build an online client without a direct
// dependency.
pub use openai;
