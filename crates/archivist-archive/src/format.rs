//! Archive format detection
//!
//! The format is decided from the last path segment of the URL alone; query
//! strings and fragments never influence it.

use archivist_domain::{ArchiveError, ArchiveErrorKind};
use url::Url;

/// Supported archive encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveFormat {
    /// `.zip`
    Zip,
    /// `.tar.gz`
    TarGz,
}

impl ArchiveFormat {
    /// File extension, without the leading dot
    pub fn extension(&self) -> &'static str {
        match self {
            ArchiveFormat::Zip => "zip",
            ArchiveFormat::TarGz => "tar.gz",
        }
    }
}

/// A parsed archive location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSource {
    /// Parsed URL
    pub url: Url,
    /// Detected format
    pub format: ArchiveFormat,
    /// Last path segment
    pub file_name: String,
}

impl ArchiveSource {
    /// Parse a URL and detect its archive format
    ///
    /// # Errors
    ///
    /// - `Download` if the URL is malformed or uses a scheme other than
    ///   `http`, `https` or `file`
    /// - `UnsupportedFormat` if the name ends in neither `.zip` nor `.tar.gz`
    pub fn parse(archive_url: &str) -> Result<Self, ArchiveError> {
        let url = Url::parse(archive_url).map_err(|e| {
            ArchiveError::new(ArchiveErrorKind::Download, "Invalid archive URL").with_cause(e)
        })?;

        match url.scheme() {
            "http" | "https" | "file" => {}
            other => {
                return Err(
                    ArchiveError::new(ArchiveErrorKind::Download, "Unsupported URL scheme")
                        .with_cause(other),
                )
            }
        }

        let file_name = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .unwrap_or_default()
            .to_string();

        let format = detect(&file_name)?;
        Ok(Self {
            url,
            format,
            file_name,
        })
    }
}

fn detect(file_name: &str) -> Result<ArchiveFormat, ArchiveError> {
    let lower = file_name.to_ascii_lowercase();
    for format in [ArchiveFormat::TarGz, ArchiveFormat::Zip] {
        if lower.ends_with(&format!(".{}", format.extension())) {
            return Ok(format);
        }
    }

    let extension = file_name.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("");
    Err(ArchiveError::unsupported_format(extension))
}
