//! Staged multi-file write
//!
//! Files are rendered up front and then replaced one at a time. Each file is
//! replaced atomically, but the set is not: a failure part-way reports the
//! files already written so the caller can decide what to do.

use crate::error::{Error, Result};
use crate::vault::fs::write_replace;
use std::path::PathBuf;

/// Ordered set of pending file replacements
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncCommit {
    staged: Vec<(PathBuf, String)>,
}

impl SyncCommit {
    /// Create an empty commit
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage `content` for `path`, replacing any earlier staging of the same path
    pub fn stage(mut self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        let path = path.into();
        let content = content.into();
        match self.staged.iter_mut().find(|(p, _)| *p == path) {
            Some(entry) => entry.1 = content,
            None => self.staged.push((path, content)),
        }
        self
    }

    /// Staged paths in write order
    pub fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.staged.iter().map(|(p, _)| p)
    }

    /// Staged content for `path`
    pub fn content(&self, path: &std::path::Path) -> Option<&str> {
        self.staged
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, c)| c.as_str())
    }

    /// Number of staged files
    pub fn len(&self) -> usize {
        self.staged.len()
    }

    /// Whether nothing is staged
    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    /// Write every staged file in order.
    ///
    /// Returns the written paths, or [`Error::PartialCommit`] naming the files
    /// written before the first failure.
    pub async fn apply(self) -> Result<Vec<PathBuf>> {
        let mut written = Vec::with_capacity(self.staged.len());
        for (path, content) in self.staged {
            if let Err(e) = write_replace(&path, &content).await {
                tracing::warn!("Failed to write {}: {}", path.display(), e);
                return Err(Error::PartialCommit {
                    written,
                    failed: path,
                    message: e.to_string(),
                });
            }
            written.push(path);
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_apply_writes_in_order() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("p/a.md");
        let b = dir.path().join("p/b.md");

        let written = SyncCommit::new()
            .stage(&a, "A")
            .stage(&b, "B")
            .apply()
            .await
            .unwrap();

        assert_eq!(written, vec![a.clone(), b.clone()]);
        assert_eq!(std::fs::read_to_string(a).unwrap(), "A");
        assert_eq!(std::fs::read_to_string(b).unwrap(), "B");
    }

    #[test]
    fn test_restaging_replaces_content() {
        let commit = SyncCommit::new().stage("x.md", "one").stage("x.md", "two");
        assert_eq!(commit.len(), 1);
        assert_eq!(commit.content(std::path::Path::new("x.md")), Some("two"));
        assert!(!SyncCommit::new().stage("y", "").is_empty());
    }

    #[tokio::test]
    async fn test_partial_failure_reports_written_files() {
        let dir = TempDir::new().unwrap();
        let ok = dir.path().join("ok.md");
        // A regular file where a directory is needed makes the second write fail.
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "file").unwrap();
        let bad = blocker.join("bad.md");
        let never = dir.path().join("never.md");

        let err = SyncCommit::new()
            .stage(&ok, "ok")
            .stage(&bad, "bad")
            .stage(&never, "never")
            .apply()
            .await
            .unwrap_err();

        match err {
            Error::PartialCommit {
                written, failed, ..
            } => {
                assert_eq!(written, vec![ok.clone()]);
                assert_eq!(failed, bad);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(ok.exists());
        assert!(!never.exists());
    }
}
