//! Archivist Knowledge Graph Layer
//!
//! Uploads document analyses to a Zep-compatible knowledge graph.
//!
//! # Components
//!
//! - `KnowledgeGraphUploader`: size gate, lazy group ensure, retried upload
//! - `ZepClient`: HTTP implementation of [`GraphClient`]
//! - `InMemoryGraph`: in-process implementation for tests and local runs
//!
//! [`GraphClient`]: archivist_domain::GraphClient

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod memory;
pub mod uploader;
pub mod zep;

pub use config::GraphConfig;
pub use error::{GraphError, UploadError};
pub use memory::InMemoryGraph;
pub use uploader::KnowledgeGraphUploader;
pub use zep::ZepClient;
