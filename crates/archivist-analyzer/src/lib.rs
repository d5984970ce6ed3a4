//! Archivist Document Analyzer
//!
//! Turns one document into a 3-5 sentence description using a completion
//! provider.
//!
//! # Overview
//!
//! The analyzer builds a three-message chat request (system instruction, the
//! document attributed to `document-provider`, the task), truncates the
//! document so the whole request fits the configured token budget, and
//! returns the model's text verbatim.
//!
//! # Example Usage
//!
//! ```no_run
//! use archivist_analyzer::{AnalyzerConfig, DocumentAnalyzer};
//! use archivist_llm::MockProvider;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let analyzer = DocumentAnalyzer::new(MockProvider::new("A README."), AnalyzerConfig::default());
//! let result = analyzer.analyze("README.md", "# Project").await?;
//! println!("{}", result.analysis_text);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod analyzer;
mod config;
mod prompt;


pub use analyzer::DocumentAnalyzer;
pub use config::AnalyzerConfig;
pub use prompt::{PromptBuilder, DOCUMENT_PROVIDER, SYSTEM_INSTRUCTION, TASK_INSTRUCTION};
