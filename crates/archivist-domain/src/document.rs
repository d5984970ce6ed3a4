//! Documents and entity payloads
//!
//! Field names serialize in camelCase because these structs are the JSON wire
//! shapes of the two Archivist entity operations.

use serde::{Deserialize, Serialize};

/// Request to ingest one archive (`PrepareDocuments` payload)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveRequest {
    /// Location of the archive (`http`, `https` or `file` URL)
    pub archive_url: String,
}

impl ArchiveRequest {
    /// Create a request for the given archive URL
    pub fn new(archive_url: impl Into<String>) -> Self {
        Self {
            archive_url: archive_url.into(),
        }
    }
}

/// A regular file found inside an extracted archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectedFile {
    /// Path relative to the extraction root
    pub name: String,

    /// Full text content
    pub content: String,
}

impl CollectedFile {
    /// Create a collected file
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// Output of the document analyzer for one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Name of the analyzed document
    pub document_name: String,

    /// Model output, verbatim
    pub analysis_text: String,
}

/// `AnalyzeDocument` payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzeDocumentRequest {
    /// Document name; also the routing key used by the coordinator
    pub name: String,

    /// Document text
    pub content: String,
}

impl AnalyzeDocumentRequest {
    /// Create a request for one document
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

impl From<CollectedFile> for AnalyzeDocumentRequest {
    fn from(file: CollectedFile) -> Self {
        Self {
            name: file.name,
            content: file.content,
        }
    }
}

/// `AnalyzeDocument` success
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzeDocumentResponse {
    /// Analysis text produced for the document
    pub analysis: String,
}

/// `PrepareDocuments` success
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrepareDocumentsResponse {
    /// Number of files dispatched, soft failures included
    pub file_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_request_wire_shape() {
        let request = ArchiveRequest::new("https://example.com/docs.zip");
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(json, r#"{"archiveUrl":"https://example.com/docs.zip"}"#);
    }

    #[test]
    fn test_prepare_response_wire_shape() {
        let response: PrepareDocumentsResponse =
            serde_json::from_str(r#"{"fileCount": 3}"#).unwrap();
        assert_eq!(response.file_count, 3);
    }

    #[test]
    fn test_collected_file_into_request() {
        let request: AnalyzeDocumentRequest = CollectedFile::new("a/readme.md", "# Hi").into();
        assert_eq!(request.name, "a/readme.md");
        assert_eq!(request.content, "# Hi");
    }
}
