//! Prompt construction and token-budget truncation

use archivist_domain::{AiError, ChatMessage, CompletionRequest, Tokenizer};
use tracing::debug;

/// Participant name attached to the document message
pub const DOCUMENT_PROVIDER: &str = "document-provider";

/// Frames the conversation for the model
pub const SYSTEM_INSTRUCTION: &str = "You are a helpful assistant that can answer questions and help with tasks. You are limited in resources, so you need to be efficient and concise.

You are given a document followed by a question. You need to answer the question based on the document.";

/// The question asked about every document
pub const TASK_INSTRUCTION: &str = "Please describe the content and purpose of the above document in 3-5 sentences. Limit your response to information that is explicitly stated in the document. Use markdown, and include samples where appropriate.";

/// Builds the analysis request for one document
///
/// Message order is system instruction, document, task. Only the document
/// content is ever shortened to fit the budget.
pub struct PromptBuilder<'a> {
    content: &'a str,
}

impl<'a> PromptBuilder<'a> {
    /// Create a builder for the given document content
    pub fn new(content: &'a str) -> Self {
        Self { content }
    }

    /// Build a request that costs at most `token_budget` tokens
    ///
    /// # Errors
    ///
    /// Returns `AiError` when the instructions alone do not fit.
    pub fn build(
        &self,
        tokenizer: &dyn Tokenizer,
        token_budget: usize,
    ) -> Result<CompletionRequest, AiError> {
        let system = ChatMessage::system(SYSTEM_INSTRUCTION);
        let task = ChatMessage::user(TASK_INSTRUCTION);
        let empty_document = ChatMessage::user_named(DOCUMENT_PROVIDER, "");

        let fixed = system.token_count(tokenizer)
            + task.token_count(tokenizer)
            + empty_document.token_count(tokenizer);
        if fixed > token_budget {
            return Err(AiError::new("Prompt instructions exceed the token budget").with_cause(
                format!("{} tokens needed, budget is {}", fixed, token_budget),
            ));
        }

        let available = token_budget - fixed;
        let content_tokens = tokenizer.count_tokens(self.content);
        let content = if content_tokens > available {
            debug!(
                "Truncating document from {} to {} tokens",
                content_tokens, available
            );
            tokenizer.truncate(self.content, available)
        } else {
            self.content.to_string()
        };

        Ok(CompletionRequest::new(vec![
            system,
            ChatMessage::user_named(DOCUMENT_PROVIDER, content),
            task,
        ]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use archivist_domain::Role;
    use archivist_llm::ApproxTokenizer;

    #[test]
    fn test_message_order() {
        let request = PromptBuilder::new("hello").build(&ApproxTokenizer::default(), 30_000).unwrap();
        assert_eq!(request.messages.len(), 3);
        assert_eq!(request.messages[0].role, Role::System);
        assert_eq!(request.messages[1].name.as_deref(), Some(DOCUMENT_PROVIDER));
        assert_eq!(request.messages[1].content, "hello");
        assert_eq!(request.messages[2].content, TASK_INSTRUCTION);
    }

    #[test]
    fn test_short_document_untouched() {
        let content = "A short README.";
        let request = PromptBuilder::new(content).build(&ApproxTokenizer::default(), 30_000).unwrap();
        assert_eq!(request.messages[1].content, content);
    }

    #[test]
    fn test_long_document_truncated_to_budget() {
        let tokenizer = ApproxTokenizer::default();
        let content = "word ".repeat(50_000);
        let request = PromptBuilder::new(&content).build(&tokenizer, 1_000).unwrap();

        assert!(request.token_count(&tokenizer) <= 1_000);
        assert!(request.messages[1].content.len() < content.len());
        assert!(content.starts_with(&request.messages[1].content));
        assert_eq!(request.messages[0].content, SYSTEM_INSTRUCTION);
        assert_eq!(request.messages[2].content, TASK_INSTRUCTION);
    }

    #[test]
    fn test_instructions_over_budget() {
        let result = PromptBuilder::new("doc").build(&ApproxTokenizer::default(), 10);
        let err = result.unwrap_err();
        assert!(err.message.contains("token budget"));
    }
}
