//! Chat completion request types
//!
//! Provider-neutral shape of a chat request. Providers translate it into their
//! own wire format.

use crate::traits::Tokenizer;
use serde::{Deserialize, Serialize};

/// Fixed per-message framing cost added to every token count
pub const MESSAGE_OVERHEAD_TOKENS: usize = 4;

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions that frame the conversation
    System,
    /// Input from the caller
    User,
    /// Output of the model
    Assistant,
}

/// One message of a chat request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Author
    pub role: Role,

    /// Optional participant name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Message text
    pub content: String,
}

impl ChatMessage {
    /// System message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            name: None,
            content: content.into(),
        }
    }

    /// Anonymous user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            name: None,
            content: content.into(),
        }
    }

    /// User message attributed to a named participant
    pub fn user_named(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            name: Some(name.into()),
            content: content.into(),
        }
    }

    /// Tokens this message costs, framing included
    pub fn token_count(&self, tokenizer: &dyn Tokenizer) -> usize {
        let name_tokens = self
            .name
            .as_deref()
            .map(|n| tokenizer.count_tokens(n))
            .unwrap_or(0);
        MESSAGE_OVERHEAD_TOKENS + name_tokens + tokenizer.count_tokens(&self.content)
    }
}

/// Ordered list of messages sent to a completion provider
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Messages in conversation order
    pub messages: Vec<ChatMessage>,
}

impl CompletionRequest {
    /// Request with the given messages
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self { messages }
    }

    /// Total tokens of every message
    pub fn token_count(&self, tokenizer: &dyn Tokenizer) -> usize {
        self.messages.iter().map(|m| m.token_count(tokenizer)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct WordTokenizer;

    impl Tokenizer for WordTokenizer {
        fn count_tokens(&self, text: &str) -> usize {
            text.split_whitespace().count()
        }

        fn truncate(&self, text: &str, max_tokens: usize) -> String {
            text.split_whitespace()
                .take(max_tokens)
                .collect::<Vec<_>>()
                .join(" ")
        }
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&ChatMessage::system("hi")).unwrap();
        assert_eq!(json, r#"{"role":"system","content":"hi"}"#);
    }

    #[test]
    fn test_named_user_message() {
        let msg = ChatMessage::user_named("document-provider", "body");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["name"], "document-provider");
    }

    #[test]
    fn test_token_count_includes_overhead() {
        let request = CompletionRequest::new(vec![
            ChatMessage::system("one two"),
            ChatMessage::user_named("doc", "three four five"),
        ]);
        // 2 + 4, then 1 (name) + 3 + 4
        assert_eq!(request.token_count(&WordTokenizer), 14);
    }
}
