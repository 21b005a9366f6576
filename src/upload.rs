//! Uploaded-file handles: request-scoped temp files with best-effort cleanup.
//!
//! Uploads live on disk only for the duration of one request. The HTTP
//! layer spools each multipart part into a request-owned directory (a
//! [`tempfile::TempDir`] it keeps alive across the call), and the
//! orchestrator deletes each file as soon as its text has been extracted —
//! successfully or not. Deletion is fire-and-forget: a file we cannot
//! unlink is an operator log line, never a request failure.

use std::path::{Path, PathBuf};

use tracing::warn;

/// A single uploaded file: temp-storage path, the client's original
/// filename (whose extension drives extraction-strategy selection), and the
/// byte size.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    path: PathBuf,
    original_name: String,
    size: u64,
}

impl UploadedFile {
    /// Wrap a file that already exists on disk.
    pub fn new(path: impl Into<PathBuf>, original_name: impl Into<String>, size: u64) -> Self {
        Self {
            path: path.into(),
            original_name: original_name.into(),
            size,
        }
    }

    /// Write `bytes` into `dir` and return the handle.
    ///
    /// The on-disk name is position-based, not the client-supplied name —
    /// original filenames are never used as path components.
    pub async fn spool(
        bytes: &[u8],
        original_name: &str,
        dir: &Path,
        index: usize,
    ) -> std::io::Result<Self> {
        let path = dir.join(format!("upload-{index}"));
        tokio::fs::write(&path, bytes).await?;
        Ok(Self {
            path,
            original_name: original_name.to_string(),
            size: bytes.len() as u64,
        })
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Read the file's bytes back.
    pub async fn read(&self) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(&self.path).await
    }

    /// Delete the temp file, best-effort. Failure is logged and swallowed.
    pub async fn remove(&self) {
        if let Err(e) = tokio::fs::remove_file(&self.path).await {
            warn!(
                "failed to remove temp file '{}' for '{}': {}",
                self.path.display(),
                self.original_name,
                e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn spool_read_remove_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let file = UploadedFile::spool(b"hello statement", "jan.txt", dir.path(), 0)
            .await
            .unwrap();

        assert_eq!(file.original_name(), "jan.txt");
        assert_eq!(file.size(), 15);
        assert_eq!(file.read().await.unwrap(), b"hello statement");

        file.remove().await;
        assert!(!file.path().exists());
    }

    #[tokio::test]
    async fn spooled_name_ignores_client_filename() {
        let dir = tempfile::tempdir().unwrap();
        let file = UploadedFile::spool(b"x", "../../../etc/passwd", dir.path(), 3)
            .await
            .unwrap();
        assert!(file.path().starts_with(dir.path()));
        assert!(file.path().ends_with("upload-3"));
        file.remove().await;
    }

    #[tokio::test]
    async fn remove_missing_file_does_not_panic() {
        let dir = tempfile::tempdir().unwrap();
        let file = UploadedFile::new(dir.path().join("never-created"), "gone.txt", 0);
        file.remove().await;
    }
}
