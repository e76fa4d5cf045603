//! Getting the game master's next narration.
//!
//! A [`Completer`] makes one attempt at turning a prompt window into a
//! reply. [`RetryPolicy`] wraps attempts into one logical fetch per step.

use crate::turn::{to_messages, Role, Turn};
use openai::{OpenAi, ReqwestTransport, Request, Transport};
use thiserror::Error;
use tracing::{debug, warn};

/// Attempts per step before the step is fatal.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Why a single completion attempt failed.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// Connection, DNS or timeout failure; no response arrived.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("service returned status {status}: {body}")]
    Service { status: u16, body: String },

    /// The response did not contain `choices[0].message.content`.
    #[error("malformed completion response: {0}")]
    Protocol(String),

    #[error("completion client misconfigured: {0}")]
    Config(String),
}

impl CompletionError {
    /// Transport and service failures may clear up on another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CompletionError::Transport(_) | CompletionError::Service { .. }
        )
    }
}

impl From<openai::Error> for CompletionError {
    fn from(err: openai::Error) -> Self {
        match err {
            openai::Error::Network(msg) => CompletionError::Transport(msg),
            openai::Error::Api { status, message } => CompletionError::Service {
                status,
                body: message,
            },
            openai::Error::Parse(msg) => CompletionError::Protocol(msg),
            openai::Error::NoApiKey => CompletionError::Config("API key not configured".into()),
            openai::Error::Config(msg) => CompletionError::Config(msg),
        }
    }
}

/// One attempt at producing the narrator's reply to a prompt window.
pub trait Completer {
    fn complete(&mut self, prompt: &[Turn]) -> Result<String, CompletionError>;
}

impl<T: Completer + ?Sized> Completer for Box<T> {
    fn complete(&mut self, prompt: &[Turn]) -> Result<String, CompletionError> {
        (**self).complete(prompt)
    }
}

/// Answers without the network, echoing the player's last action.
///
/// Used to exercise the rest of the game without spending API calls. The
/// reply depends only on the last player turn.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineCompleter;

impl OfflineCompleter {
    pub fn reply_for(player_text: &str) -> String {
        format!(
            "This is a canned response in offline mode. The player's last\n\
             choice was as follows: {player_text}"
        )
    }
}

impl Completer for OfflineCompleter {
    fn complete(&mut self, prompt: &[Turn]) -> Result<String, CompletionError> {
        let last_player = prompt
            .iter()
            .rev()
            .find(|turn| turn.role() == Role::Player)
            .map(Turn::text)
            .unwrap_or_default();
        Ok(Self::reply_for(last_player))
    }
}

/// Asks a chat-completion service for the reply.
pub struct OnlineCompleter<T> {
    client: OpenAi<T>,
    temperature: Option<f32>,
    max_tokens: Option<usize>,
}

impl<T: Transport> OnlineCompleter<T> {
    pub fn new(client: OpenAi<T>) -> Self {
        Self {
            client,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    fn build_request(&self, prompt: &[Turn]) -> Request {
        let mut request = Request::new(to_messages(prompt));
        if let Some(temperature) = self.temperature {
            request = request.with_temperature(temperature);
        }
        if let Some(max_tokens) = self.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }
        request
    }
}

impl<T: Transport> Completer for OnlineCompleter<T> {
    fn complete(&mut self, prompt: &[Turn]) -> Result<String, CompletionError> {
        let request = self.build_request(prompt);
        let response = self.client.complete(&request)?;
        if let Some(usage) = response.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "completion received"
            );
        }
        Ok(response.content.trim().to_string())
    }
}

/// Either completer, picked at startup.
pub enum CompletionClient {
    Offline(OfflineCompleter),
    Online(OnlineCompleter<ReqwestTransport>),
}

impl CompletionClient {
    pub fn offline() -> Self {
        CompletionClient::Offline(OfflineCompleter)
    }

    pub fn online(completer: OnlineCompleter<ReqwestTransport>) -> Self {
        CompletionClient::Online(completer)
    }

    pub fn is_offline(&self) -> bool {
        matches!(self, CompletionClient::Offline(_))
    }
}

impl Completer for CompletionClient {
    fn complete(&mut self, prompt: &[Turn]) -> Result<String, CompletionError> {
        match self {
            CompletionClient::Offline(offline) => offline.complete(prompt),
            CompletionClient::Online(online) => online.complete(prompt),
        }
    }
}

/// Why a whole fetch failed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        last: CompletionError,
    },

    #[error("unrecoverable completion failure: {0}")]
    Unrecoverable(CompletionError),
}

/// How many times a step's completion is attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. At least 1.
    pub max_attempts: u32,
    /// Treat malformed responses like transport failures instead of failing
    /// at once.
    pub retry_protocol_failures: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_protocol_failures: false,
        }
    }
}

impl RetryPolicy {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn retrying_protocol_failures(mut self, retry: bool) -> Self {
        self.retry_protocol_failures = retry;
        self
    }

    fn should_retry(&self, err: &CompletionError) -> bool {
        err.is_retryable()
            || (self.retry_protocol_failures && matches!(err, CompletionError::Protocol(_)))
    }

    /// Run `completer` until it succeeds or the policy gives up.
    pub fn fetch<C: Completer + ?Sized>(
        &self,
        completer: &mut C,
        prompt: &[Turn],
    ) -> Result<String, FetchError> {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match completer.complete(prompt) {
                Ok(reply) => {
                    debug!(attempt, chars = reply.len(), "completion succeeded");
                    return Ok(reply);
                }
                Err(err) if !self.should_retry(&err) => {
                    return Err(FetchError::Unrecoverable(err));
                }
                Err(err) if attempt >= max_attempts => {
                    return Err(FetchError::Exhausted {
                        attempts: attempt,
                        last: err,
                    });
                }
                Err(err) => {
                    warn!(attempt, max_attempts, error = %err, "completion attempt failed, retrying");
                    attempt += 1;
                }
            }
        }
    }
}
