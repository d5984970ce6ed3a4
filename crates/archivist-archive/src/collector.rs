//! Concurrent collection of extracted files

use archivist_domain::{ArchiveError, ArchiveErrorKind, CollectedFile};
use futures::future::try_join_all;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Lists and reads every regular file under an extraction root
///
/// Symlinks are not followed and, like directories, are left out of the
/// result. All stat and read calls run concurrently; the first failure fails
/// the whole collection.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileCollector;

impl FileCollector {
    /// Create a collector
    pub fn new() -> Self {
        Self
    }

    /// Collect every regular file under `root`
    ///
    /// Names are paths relative to `root` with `/` separators. Content is
    /// decoded as UTF-8 with invalid sequences replaced.
    pub async fn collect(&self, root: &Path) -> Result<Vec<CollectedFile>, ArchiveError> {
        let walk_root = root.to_path_buf();
        let entries = tokio::task::spawn_blocking(move || list_entries(&walk_root))
            .await
            .map_err(collection_error)??;

        debug!("Found {} entries under {}", entries.len(), root.display());

        let files = try_join_all(entries.into_iter().map(|path| read_entry(root, path))).await?;
        Ok(files.into_iter().flatten().collect())
    }
}

fn collection_error(cause: impl fmt::Display) -> ArchiveError {
    ArchiveError::new(ArchiveErrorKind::CollectionFailure, "Failed to collect files")
        .with_cause(cause)
}

fn list_entries(root: &Path) -> Result<Vec<PathBuf>, ArchiveError> {
    WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .into_iter()
        .map(|entry| entry.map(|e| e.into_path()).map_err(collection_error))
        .collect()
}

async fn read_entry(root: &Path, path: PathBuf) -> Result<Option<CollectedFile>, ArchiveError> {
    let metadata = tokio::fs::symlink_metadata(&path)
        .await
        .map_err(collection_error)?;
    if !metadata.is_file() {
        return Ok(None);
    }

    let bytes = tokio::fs::read(&path).await.map_err(collection_error)?;
    let content = String::from_utf8_lossy(&bytes).into_owned();
    Ok(Some(CollectedFile::new(relative_name(root, &path), content)))
}

fn relative_name(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_collects_nested_regular_files() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("docs/deep")).unwrap();
        std::fs::write(dir.path().join("README.md"), "# Top").unwrap();
        std::fs::write(dir.path().join("docs/deep/notes.txt"), "nested").unwrap();
        std::fs::create_dir_all(dir.path().join("empty")).unwrap();

        let mut files = FileCollector::new().collect(dir.path()).await.unwrap();
        files.sort_by(|a, b| a.name.cmp(&b.name));

        assert_eq!(
            files,
            vec![
                CollectedFile::new("README.md", "# Top"),
                CollectedFile::new("docs/deep/notes.txt", "nested"),
            ]
        );
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_replaced() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("bin.dat"), [b'o', b'k', 0xff, b'!']).unwrap();

        let files = FileCollector::new().collect(dir.path()).await.unwrap();
        assert_eq!(files[0].content, "ok\u{fffd}!");
    }

    #[tokio::test]
    async fn test_empty_root() {
        let dir = TempDir::new().unwrap();
        let files = FileCollector::new().collect(dir.path()).await.unwrap();
        assert!(files.is_empty());
    }

    #[tokio::test]
    async fn test_missing_root_is_collection_failure() {
        let dir = TempDir::new().unwrap();
        let err = FileCollector::new()
            .collect(&dir.path().join("gone"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ArchiveErrorKind::CollectionFailure);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlinks_are_skipped() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("real.txt"), "real").unwrap();
        std::os::unix::fs::symlink(dir.path().join("real.txt"), dir.path().join("link.txt"))
            .unwrap();

        let files = FileCollector::new().collect(dir.path()).await.unwrap();
        assert_eq!(files, vec![CollectedFile::new("real.txt", "real")]);
    }

    #[test]
    fn test_relative_name_uses_forward_slashes() {
        let root = Path::new("/scratch/docs");
        let path = root.join("a").join("b.txt");
        assert_eq!(relative_name(root, &path), "a/b.txt");
    }
}
