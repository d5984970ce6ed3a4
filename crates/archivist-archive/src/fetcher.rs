//! Archive download and extraction

use crate::format::{ArchiveFormat, ArchiveSource};
use archivist_domain::{ArchiveError, ArchiveErrorKind};
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Default timeout for archive downloads (5 minutes)
pub const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 300;

/// Directory inside the scratch directory that entries are unpacked into
pub const EXTRACTION_DIR: &str = "extracted";

/// File name of the downloaded archive, before its extension
const DOWNLOAD_STEM: &str = "download";

/// An archive unpacked into a scratch directory owned by one request
///
/// The scratch directory, downloaded archive included, is deleted by
/// [`ExtractedArchive::cleanup`] or, failing that, when the value is dropped.
/// Either way the recursive delete runs on the blocking pool when a runtime
/// is available.
#[derive(Debug)]
pub struct ExtractedArchive {
    root: PathBuf,
    scratch: Option<TempDir>,
}

impl ExtractedArchive {
    /// Directory the archive's entries were unpacked into
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Scratch directory holding the download and the extraction root
    pub fn scratch_path(&self) -> &Path {
        self.scratch.as_ref().map_or(self.root.as_path(), TempDir::path)
    }

    /// Delete the scratch directory and wait for the delete to finish
    ///
    /// # Errors
    ///
    /// Returns an `Extraction` error if the directory cannot be removed.
    pub async fn cleanup(mut self) -> Result<(), ArchiveError> {
        if let Some(scratch) = self.scratch.take() {
            tokio::task::spawn_blocking(move || scratch.close())
                .await
                .map_err(extraction_error)?
                .map_err(extraction_error)?;
        }
        Ok(())
    }
}

impl Drop for ExtractedArchive {
    fn drop(&mut self) {
        if let Some(scratch) = self.scratch.take() {
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    handle.spawn_blocking(move || drop(scratch));
                }
                Err(_) => drop(scratch),
            }
        }
    }
}

/// Downloads archives and unpacks them into per-request scratch directories
pub struct ArchiveFetcher {
    client: reqwest::Client,
    scratch_root: Option<PathBuf>,
}

impl ArchiveFetcher {
    /// Create a fetcher with the given download timeout
    ///
    /// # Errors
    ///
    /// Returns a `Download` error if the HTTP client cannot be built.
    pub fn new(download_timeout: Duration) -> Result<Self, ArchiveError> {
        let client = reqwest::Client::builder()
            .timeout(download_timeout)
            .build()
            .map_err(|e| {
                ArchiveError::new(ArchiveErrorKind::Download, "Failed to build HTTP client")
                    .with_cause(e)
            })?;
        Ok(Self {
            client,
            scratch_root: None,
        })
    }

    /// Create scratch directories under `root` instead of the system temp dir
    pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = Some(root.into());
        self
    }

    /// Fetch and unpack one archive
    ///
    /// The format is checked first: an unsupported archive is never
    /// downloaded.
    pub async fn extract(&self, archive_url: &str) -> Result<ExtractedArchive, ArchiveError> {
        let source = ArchiveSource::parse(archive_url)?;
        let scratch = self.scratch_dir()?;

        // Names under the scratch directory are fixed; the URL never picks a path
        let archive_path = scratch
            .path()
            .join(format!("{}.{}", DOWNLOAD_STEM, source.format.extension()));
        self.download(&source, &archive_path).await?;
        info!("Downloaded {} to {}", source.url, archive_path.display());

        let root = scratch.path().join(EXTRACTION_DIR);
        let format = source.format;
        let target = root.clone();
        tokio::task::spawn_blocking(move || unpack(format, &archive_path, &target))
            .await
            .map_err(|e| {
                ArchiveError::new(ArchiveErrorKind::Extraction, "Extraction task failed")
                    .with_cause(e)
            })??;

        debug!("Extracted {} into {}", source.file_name, root.display());
        Ok(ExtractedArchive {
            root,
            scratch: Some(scratch),
        })
    }

    fn scratch_dir(&self) -> Result<TempDir, ArchiveError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("archivist-");
        let created = match &self.scratch_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        };
        created.map_err(|e| {
            ArchiveError::new(ArchiveErrorKind::Extraction, "Failed to create scratch directory")
                .with_cause(e)
        })
    }

    async fn download(&self, source: &ArchiveSource, dest: &Path) -> Result<(), ArchiveError> {
        if source.url.scheme() == "file" {
            let path = source
                .url
                .to_file_path()
                .map_err(|_| download_error("Invalid file URL"))?;
            tokio::fs::copy(&path, dest).await.map_err(download_error)?;
            return Ok(());
        }

        let mut response = self
            .client
            .get(source.url.clone())
            .send()
            .await
            .map_err(download_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(download_error(format!("HTTP {}", status)));
        }

        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(download_error)?;
        while let Some(chunk) = response.chunk().await.map_err(download_error)? {
            file.write_all(&chunk).await.map_err(download_error)?;
        }
        file.flush().await.map_err(download_error)?;
        Ok(())
    }
}

fn download_error(cause: impl fmt::Display) -> ArchiveError {
    ArchiveError::new(ArchiveErrorKind::Download, "Failed to download archive").with_cause(cause)
}

fn extraction_error(cause: impl fmt::Display) -> ArchiveError {
    ArchiveError::new(ArchiveErrorKind::Extraction, "Failed to extract archive").with_cause(cause)
}

fn unpack(format: ArchiveFormat, archive: &Path, target: &Path) -> Result<(), ArchiveError> {
    std::fs::create_dir_all(target).map_err(extraction_error)?;
    let file = File::open(archive).map_err(extraction_error)?;

    match format {
        ArchiveFormat::Zip => {
            let mut zip = zip::ZipArchive::new(file).map_err(extraction_error)?;
            zip.extract(target).map_err(extraction_error)
        }
        ArchiveFormat::TarGz => {
            let mut tar = tar::Archive::new(flate2::read::GzDecoder::new(file));
            tar.unpack(target).map_err(extraction_error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher() -> ArchiveFetcher {
        ArchiveFetcher::new(Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_unsupported_format_never_downloads() {
        // Nothing listens on port 1; a download attempt would be a Download error
        let err = fetcher()
            .extract("http://127.0.0.1:1/docs.rar")
            .await
            .unwrap_err();
        assert_eq!(err.kind, ArchiveErrorKind::UnsupportedFormat);
    }

    #[tokio::test]
    async fn test_missing_local_file_is_download_error() {
        let err = fetcher()
            .extract("file:///definitely/not/here/docs.zip")
            .await
            .unwrap_err();
        assert_eq!(err.kind, ArchiveErrorKind::Download);
    }

    #[tokio::test]
    async fn test_unreachable_host_is_download_error() {
        let err = fetcher()
            .extract("http://127.0.0.1:1/docs.zip")
            .await
            .unwrap_err();
        assert_eq!(err.kind, ArchiveErrorKind::Download);
    }

    #[tokio::test]
    async fn test_corrupt_archive_is_extraction_error() {
        let dir = TempDir::new().unwrap();
        let bogus = dir.path().join("broken.zip");
        std::fs::write(&bogus, b"this is not a zip file").unwrap();
        let url = url::Url::from_file_path(&bogus).unwrap();

        let err = fetcher().extract(url.as_str()).await.unwrap_err();
        assert_eq!(err.kind, ArchiveErrorKind::Extraction);
    }

    #[tokio::test]
    async fn test_scratch_root_is_used() {
        let root = TempDir::new().unwrap();
        let fetcher = fetcher().with_scratch_root(root.path());
        let scratch = fetcher.scratch_dir().unwrap();
        assert!(scratch.path().starts_with(root.path()));
    }
}
