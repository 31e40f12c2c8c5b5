//! Conversation state and its reducer.

use crate::types::Message;

/// Ordered, append-only message log for one turn.
///
/// Owned by a single turn; advanced only through [`reduce`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationState {
    messages: Vec<Message>,
}

impl ConversationState {
    pub fn new(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }
}

/// Advance the state by concatenating `update` after the existing messages.
///
/// No deduplication, truncation, or reordering.
pub fn reduce(state: ConversationState, update: Vec<Message>) -> ConversationState {
    let mut messages = state.messages;
    messages.extend(update);
    ConversationState { messages }
}
