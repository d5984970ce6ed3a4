//! Archivist Archive Handling
//!
//! Fetches an archive by URL, unpacks it into a scratch directory owned by the
//! request, and reads back every regular file it contained.
//!
//! # Architecture
//!
//! ```text
//! archive URL → ArchiveSource (format check) → download → unpack → FileCollector
//! ```
//!
//! Supported formats are `.zip` and `.tar.gz`, decided from the URL's last
//! path segment before anything is downloaded. `http`, `https` and `file`
//! URLs are accepted.
//!
//! # Example Usage
//!
//! ```no_run
//! use archivist_archive::{ArchiveFetcher, FileCollector};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = ArchiveFetcher::new(Duration::from_secs(300))?;
//! let extracted = fetcher.extract("https://example.com/docs.zip").await?;
//! let files = FileCollector::new().collect(extracted.path()).await?;
//! println!("{} files", files.len());
//! // Scratch directory is removed here
//! drop(extracted);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod collector;
mod fetcher;
mod format;

pub use collector::FileCollector;
pub use fetcher::{ArchiveFetcher, ExtractedArchive, DEFAULT_DOWNLOAD_TIMEOUT_SECS, EXTRACTION_DIR};
pub use format::{ArchiveFormat, ArchiveSource};
