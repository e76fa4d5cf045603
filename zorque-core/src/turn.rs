//! Conversation turns and the player's actions.

use std::fmt;

/// Who authored a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// The fixed game-master instructions.
    System,
    /// The player's action for a step.
    Player,
    /// The game master's narration.
    Narrator,
}

impl Role {
    fn wire_role(self) -> openai::Role {
        match self {
            Role::System => openai::Role::System,
            Role::Player => openai::Role::User,
            Role::Narrator => openai::Role::Assistant,
        }
    }
}

/// One message in the conversation. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    role: Role,
    text: String,
}

impl Turn {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            text: text.into(),
        }
    }

    pub fn player(text: impl Into<String>) -> Self {
        Self {
            role: Role::Player,
            text: text.into(),
        }
    }

    pub fn narrator(text: impl Into<String>) -> Self {
        Self {
            role: Role::Narrator,
            text: text.into(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl From<&Turn> for openai::Message {
    fn from(turn: &Turn) -> Self {
        openai::Message {
            role: turn.role.wire_role(),
            content: turn.text.clone(),
        }
    }
}

/// Convert a prompt window into chat-completion messages.
pub fn to_messages(turns: &[Turn]) -> Vec<openai::Message> {
    turns.iter().map(openai::Message::from).collect()
}

/// One of the four on-screen choices, numbered 1 to 4.
///
/// Quadrants map as top-left=1, top-right=2, bottom-left=3, bottom-right=4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Choice(u8);

impl Choice {
    pub const ALL: [Choice; 4] = [Choice(1), Choice(2), Choice(3), Choice(4)];

    /// Returns `None` outside 1..=4.
    pub fn new(number: u8) -> Option<Self> {
        (1..=4).contains(&number).then_some(Self(number))
    }

    /// The choice for a quadrant of the screen.
    pub fn from_quadrant(right: bool, bottom: bool) -> Self {
        let mut number = 1;
        if right {
            number += 1;
        }
        if bottom {
            number += 2;
        }
        Self(number)
    }

    pub fn number(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What the player did in a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Synthetic action for the first step of a session.
    NewGame,
    Choose(Choice),
}

impl Action {
    /// The player turn content sent to the game master, e.g. `PLAYER: 3`.
    pub fn player_text(&self) -> String {
        format!("PLAYER: {self}")
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::NewGame => f.write_str("New game"),
            Action::Choose(choice) => write!(f, "{choice}"),
        }
    }
}

impl From<Choice> for Action {
    fn from(choice: Choice) -> Self {
        Action::Choose(choice)
    }
}
