//! Game configuration.

use crate::completion::RetryPolicy;
use crate::prompts::GAME_MASTER_PROMPT;
use crate::touch::DEFAULT_DEBOUNCE;
use crate::window::DEFAULT_WINDOW_CAP;

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Configuration for a game session.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Instructions placed in the system turn.
    pub system_prompt: String,

    /// Chat model asked for narration.
    pub model: String,

    /// Temperature for generation, or the service default.
    pub temperature: Option<f32>,

    /// Maximum tokens per reply, or the service default.
    pub max_tokens: Option<usize>,

    /// Conversation window cap in turns, including the system turn.
    pub window_cap: usize,

    /// Pressed samples beyond which a tap is confirmed.
    pub debounce: u32,

    pub retry: RetryPolicy,

    /// Answer with canned replies instead of calling the service.
    pub offline: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            system_prompt: GAME_MASTER_PROMPT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: None,
            max_tokens: None,
            window_cap: DEFAULT_WINDOW_CAP,
            debounce: DEFAULT_DEBOUNCE,
            retry: RetryPolicy::default(),
            offline: false,
        }
    }
}

impl GameConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the built-in game master prompt.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_window_cap(mut self, cap: usize) -> Self {
        self.window_cap = cap;
        self
    }

    pub fn with_debounce(mut self, debounce: u32) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }
}
