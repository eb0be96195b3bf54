/*!
 * Conversation window carried between chunk translations of one chapter.
 */

use crate::providers::ChatMessage;

/// Prior entries kept when a new exchange is recorded
pub const WINDOW_HISTORY: usize = 3;

/// Short trailing history sent ahead of every chunk request.
///
/// The window is a plain value: the chapter loop owns it, hands it to the
/// translator and gets the advanced window back.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationWindow {
    messages: Vec<ChatMessage>,
}

impl ConversationWindow {
    /// Empty window for the start of a chapter
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Record one accepted exchange: keep the last three entries and append
    /// the wrapped input under the role the provider answered with
    pub fn advance(self, role: &str, wrapped_input: &str) -> Self {
        let skip = self.messages.len().saturating_sub(WINDOW_HISTORY);
        let mut messages: Vec<ChatMessage> = self.messages.into_iter().skip(skip).collect();
        messages.push(ChatMessage::new(role, wrapped_input));
        Self { messages }
    }
}
