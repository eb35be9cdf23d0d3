//! Append-only record of one session's questions and answers.

use chrono::Local;
use serde::Serialize;

/// Caption format for turn timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

/// One entry of a [`Transcript`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationTurn {
    pub role: TurnRole,
    pub content: String,
    /// Local capture time, formatted with [`TIMESTAMP_FORMAT`].
    pub timestamp: String,
}

impl ConversationTurn {
    fn now(role: TurnRole, content: String) -> Self {
        Self { role, content, timestamp: Local::now().format(TIMESTAMP_FORMAT).to_string() }
    }
}

/// Turns in the order they happened.
///
/// Only [`Session`](crate::Session) appends; every assistant turn directly
/// follows the user turn whose question it answers.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Transcript {
    turns: Vec<ConversationTurn>,
}

impl Transcript {
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConversationTurn> {
        self.turns.iter()
    }

    pub fn last(&self) -> Option<&ConversationTurn> {
        self.turns.last()
    }

    pub(crate) fn push_user(&mut self, query: &str) {
        self.turns.push(ConversationTurn::now(TurnRole::User, query.to_string()));
    }

    pub(crate) fn push_assistant(&mut self, content: String) {
        debug_assert!(matches!(self.last(), Some(turn) if turn.role == TurnRole::User));
        self.turns.push(ConversationTurn::now(TurnRole::Assistant, content));
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a ConversationTurn;
    type IntoIter = std::slice::Iter<'a, ConversationTurn>;

    fn into_iter(self) -> Self::IntoIter {
        self.turns.iter()
    }
}
