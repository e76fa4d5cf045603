//! Testing utilities for the game core.
//!
//! This module provides scripted stand-ins for every device the game
//! talks to, so whole adventures can be played without hardware or
//! network:
//! - `ScriptedTouch` and `ScriptedChoices` for input
//! - `ScriptedCompleter` for the game master
//! - `RecordingDisplay` for output
//! - `TestHarness` wiring them into a [`Game`]

use crate::completion::{CompletionError, Completer};
use crate::config::GameConfig;
use crate::display::{DisplayError, DisplaySink};
use crate::game::Game;
use crate::input::{ChoiceSource, InputError};
use crate::touch::{TouchPoint, TouchSource};
use crate::turn::{Choice, Turn};
use std::collections::VecDeque;

/// Touch driver that plays back a fixed list of samples.
///
/// Reports [`InputError::Interrupted`] once the script runs out.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTouch {
    samples: VecDeque<Option<TouchPoint>>,
}

impl ScriptedTouch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `count` pressed samples at `(x, y)`.
    pub fn hold(mut self, x: i32, y: i32, count: usize) -> Self {
        self.samples
            .extend(std::iter::repeat(Some(TouchPoint::new(x, y))).take(count));
        self
    }

    /// Queue `count` released samples.
    pub fn release(mut self, count: usize) -> Self {
        self.samples.extend(std::iter::repeat(None).take(count));
        self
    }

    /// A release followed by a press long enough to confirm with the
    /// default debounce.
    pub fn tap(self, x: i32, y: i32) -> Self {
        self.release(1).hold(x, y, 6)
    }

    /// Samples not yet consumed.
    pub fn remaining(&self) -> usize {
        self.samples.len()
    }
}

impl TouchSource for ScriptedTouch {
    fn sample(&mut self) -> Result<Option<TouchPoint>, InputError> {
        self.samples.pop_front().ok_or(InputError::Interrupted)
    }
}

/// Choice source that hands out queued choices, then interrupts.
#[derive(Debug, Clone, Default)]
pub struct ScriptedChoices {
    choices: VecDeque<Choice>,
}

impl ScriptedChoices {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue choice `number`; numbers outside 1..=4 are ignored.
    pub fn push(&mut self, number: u8) {
        if let Some(choice) = Choice::new(number) {
            self.choices.push_back(choice);
        }
    }
}

impl ChoiceSource for ScriptedChoices {
    fn next_choice(&mut self) -> Result<Choice, InputError> {
        self.choices.pop_front().ok_or(InputError::Interrupted)
    }
}

/// Completer that returns scripted results in order.
///
/// Once the script runs out every attempt fails with a transport error.
#[derive(Debug, Default)]
pub struct ScriptedCompleter {
    results: VecDeque<Result<String, CompletionError>>,
    prompts: Vec<Vec<Turn>>,
}

impl ScriptedCompleter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply.
    pub fn reply(mut self, text: impl Into<String>) -> Self {
        self.push_reply(text);
        self
    }

    /// Queue a failed attempt.
    pub fn fail(mut self, err: CompletionError) -> Self {
        self.push_failure(err);
        self
    }

    pub fn push_reply(&mut self, text: impl Into<String>) {
        self.results.push_back(Ok(text.into()));
    }

    pub fn push_failure(&mut self, err: CompletionError) {
        self.results.push_back(Err(err));
    }

    /// Number of attempts made so far.
    pub fn calls(&self) -> usize {
        self.prompts.len()
    }

    /// Every prompt window received, in order.
    pub fn prompts(&self) -> &[Vec<Turn>] {
        &self.prompts
    }
}

impl Completer for ScriptedCompleter {
    fn complete(&mut self, prompt: &[Turn]) -> Result<String, CompletionError> {
        self.prompts.push(prompt.to_vec());
        self.results
            .pop_front()
            .unwrap_or_else(|| Err(CompletionError::Transport("script exhausted".into())))
    }
}

/// Something the game did to the display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayEvent {
    Line(String),
    Clear,
    Refresh,
}

/// Display sink that records every call.
#[derive(Debug, Clone)]
pub struct RecordingDisplay {
    columns: usize,
    events: Vec<DisplayEvent>,
}

impl RecordingDisplay {
    pub fn new(columns: usize) -> Self {
        Self {
            columns,
            events: Vec::new(),
        }
    }

    pub fn events(&self) -> &[DisplayEvent] {
        &self.events
    }

    /// Lines written since the last clear.
    pub fn screen(&self) -> Vec<&str> {
        let start = self
            .events
            .iter()
            .rposition(|e| *e == DisplayEvent::Clear)
            .map_or(0, |i| i + 1);
        self.events[start..]
            .iter()
            .filter_map(|e| match e {
                DisplayEvent::Line(line) => Some(line.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl DisplaySink for RecordingDisplay {
    fn write_line(&mut self, line: &str) -> Result<(), DisplayError> {
        self.events.push(DisplayEvent::Line(line.to_string()));
        Ok(())
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        self.events.push(DisplayEvent::Clear);
        Ok(())
    }

    fn refresh(&mut self) -> Result<(), DisplayError> {
        self.events.push(DisplayEvent::Refresh);
        Ok(())
    }

    fn columns(&self) -> usize {
        self.columns
    }
}

/// Columns of the harness display.
pub const HARNESS_COLUMNS: usize = 40;

/// Test harness for playing scripted adventures.
pub struct TestHarness {
    game: Game<ScriptedChoices, ScriptedCompleter, RecordingDisplay>,
}

impl TestHarness {
    /// A game with a short system prompt and the default window and retry
    /// settings.
    pub fn new() -> Self {
        Self::with_config(GameConfig::new().with_system_prompt("You are the GM."))
    }

    pub fn with_config(config: GameConfig) -> Self {
        Self {
            game: Game::new(
                config,
                ScriptedChoices::new(),
                ScriptedCompleter::new(),
                RecordingDisplay::new(HARNESS_COLUMNS),
            ),
        }
    }

    /// Queue a player choice.
    pub fn choose(mut self, number: u8) -> Self {
        self.game.input_mut().push(number);
        self
    }

    /// Queue a game master reply.
    pub fn reply(mut self, text: impl Into<String>) -> Self {
        self.game.completer_mut().push_reply(text);
        self
    }

    /// Queue a failed completion attempt.
    pub fn fail(mut self, err: CompletionError) -> Self {
        self.game.completer_mut().push_failure(err);
        self
    }

    pub fn game(&self) -> &Game<ScriptedChoices, ScriptedCompleter, RecordingDisplay> {
        &self.game
    }

    pub fn game_mut(&mut self) -> &mut Game<ScriptedChoices, ScriptedCompleter, RecordingDisplay> {
        &mut self.game
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
