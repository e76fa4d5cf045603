//! Bounded conversation window.
//!
//! The window is both the game's memory and the prompt sent to the game
//! master. It always starts with the system turn, which is never evicted,
//! followed by player/narrator pairs. After every append it is pruned back
//! to at most `cap` turns.

use crate::turn::{Action, Role, Turn};
use tracing::{debug, warn};

/// System turn plus the last five turns.
pub const DEFAULT_WINDOW_CAP: usize = 6;

/// An ordered, size-bounded log of turns.
#[derive(Debug, Clone)]
pub struct ConversationWindow {
    turns: Vec<Turn>,
    cap: usize,
}

impl ConversationWindow {
    /// Create a window holding only the system turn.
    ///
    /// `cap` counts the system turn; values below 1 are raised to 1.
    pub fn new(system_prompt: impl Into<String>, cap: usize) -> Self {
        Self {
            turns: vec![Turn::system(system_prompt)],
            cap: cap.max(1),
        }
    }

    /// Append a turn to the end, then prune.
    ///
    /// System turns are ignored: the window has exactly one. Keeping player
    /// and narrator turns alternating is up to the caller; see
    /// [`record_exchange`](Self::record_exchange).
    pub fn append(&mut self, turn: Turn) {
        if turn.role() == Role::System {
            warn!("ignoring extra system turn appended to conversation window");
            return;
        }
        self.turns.push(turn);
        self.prune();
    }

    /// Record a completed step: the player's action and the reply to it.
    pub fn record_exchange(&mut self, action: &Action, reply: &str) {
        self.append(Turn::player(action.player_text()));
        self.append(Turn::narrator(reply.trim()));
    }

    /// The stored history plus a trailing player turn for `action`.
    ///
    /// Does not modify the window; the action is only recorded once a reply
    /// for it has been received.
    pub fn snapshot_for_request(&self, action: &Action) -> Vec<Turn> {
        let mut prompt = Vec::with_capacity(self.turns.len() + 1);
        prompt.extend_from_slice(&self.turns);
        prompt.push(Turn::player(action.player_text()));
        prompt
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Number of stored turns, including the system turn.
    pub fn turn_count(&self) -> usize {
        self.turns.len()
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn system_prompt(&self) -> &str {
        self.turns[0].text()
    }

    /// Keep turn 0 and the last `cap - 1` turns.
    ///
    /// If that leaves a narrator turn directly after the system turn, its
    /// player turn was evicted and it goes too, so the history still opens
    /// with a player turn.
    fn prune(&mut self) {
        let keep = self.cap - 1;
        let history = self.turns.len() - 1;
        if history <= keep {
            return;
        }

        let mut dropped = history - keep;
        self.turns.drain(1..=dropped);

        if self.turns.get(1).map(Turn::role) == Some(Role::Narrator) {
            self.turns.remove(1);
            dropped += 1;
        }

        debug!(dropped, kept = self.turns.len(), "pruned conversation window");
    }
}
