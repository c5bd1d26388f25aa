//! Conversation types.
//!
//! A conversation is an ordered, append-only list of role-tagged messages.
//! After generation the last message is the assistant's answer.

use serde::{Deserialize, Serialize};

/// Author of a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    /// Get the canonical role name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A single conversation message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Ordered sequence of messages exchanged with the generation model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    /// Create an empty conversation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message.
    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Append a message (builder style).
    pub fn with_message(mut self, message: ChatMessage) -> Self {
        self.push(message);
        self
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

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    /// Content of the last message if it was written by the assistant.
    pub fn reply(&self) -> Option<&str> {
        self.last()
            .filter(|message| message.role == Role::Assistant)
            .map(|message| message.content.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serialization() {
        let json = serde_json::to_string(&ChatMessage::system("be brief")).unwrap();
        assert_eq!(json, r#"{"role":"system","content":"be brief"}"#);
    }

    #[test]
    fn test_conversation_is_append_only_list() {
        let conversation = Conversation::new()
            .with_message(ChatMessage::system("rules"))
            .with_message(ChatMessage::user("question"));

        assert_eq!(conversation.len(), 2);
        assert_eq!(conversation.messages()[0].role, Role::System);
        assert_eq!(conversation.last().unwrap().content, "question");
    }

    #[test]
    fn test_reply_requires_assistant_message() {
        let mut conversation = Conversation::new().with_message(ChatMessage::user("hi"));
        assert_eq!(conversation.reply(), None);

        conversation.push(ChatMessage::assistant("hello"));
        assert_eq!(conversation.reply(), Some("hello"));
    }

    #[test]
    fn test_conversation_serializes_as_message_list() {
        let conversation = Conversation::new().with_message(ChatMessage::user("q"));
        let json = serde_json::to_value(&conversation).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["role"], "user");
    }
}
