//! Player input sources.

use crate::turn::Choice;
use thiserror::Error;

/// Errors from an input source.
#[derive(Debug, Error)]
pub enum InputError {
    /// The operator asked to stop (Ctrl-C, `#quit`, end of input).
    #[error("input interrupted")]
    Interrupted,

    #[error("input device error: {0}")]
    Io(#[from] std::io::Error),
}

/// Something that produces the player's next choice.
///
/// `next_choice` blocks until a choice is available; there is no timeout.
pub trait ChoiceSource {
    fn next_choice(&mut self) -> Result<Choice, InputError>;
}

impl<T: ChoiceSource + ?Sized> ChoiceSource for Box<T> {
    fn next_choice(&mut self) -> Result<Choice, InputError> {
        (**self).next_choice()
    }
}
