//! File primitives for vault writes
//!
//! Whole-file writes go through a temporary sibling and a rename, so a reader
//! sees either the old or the new content. Appends are plain `O_APPEND`
//! writes. Neither takes a lock.

use crate::error::Result;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Create the parent directory of `path` if needed
pub async fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    Ok(())
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.{}.tmp", name, uuid::Uuid::new_v4().simple()))
}

/// Replace `path` with `content` via a temporary file and rename
pub async fn write_replace(path: &Path, content: &str) -> Result<()> {
    ensure_parent(path).await?;
    let tmp = temp_sibling(path);
    if let Err(e) = tokio::fs::write(&tmp, content).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    Ok(())
}

/// Append `content` to `path`, creating the file if missing
pub async fn append(path: &Path, content: &str) -> Result<()> {
    ensure_parent(path).await?;
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(content.as_bytes()).await?;
    file.flush().await?;
    Ok(())
}

/// Read `path`, treating a missing file as `None`. Other failures propagate.
pub async fn read_optional(path: &Path) -> Result<Option<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}
