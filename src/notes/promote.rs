//! Promotion of a local note into stable knowledge
//!
//! The local note file is copied, never moved. Its per-entry headings and
//! metadata bullets are stripped through a [`LocalNoteFormat`] before the body
//! is handed to the knowledge writer with the local path as its only source.

use super::knowledge::{write_knowledge_note, KnowledgeEntry};
use crate::error::{Error, Result};
use crate::vault::VaultLayout;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// Extracts the promotable body from a local note file
pub trait LocalNoteFormat: Send + Sync {
    /// Body text with writer-added formatting removed, trimmed
    fn strip(&self, raw: &str) -> String;
}

/// Line-prefix heuristic matching the local note writer's output.
///
/// Drops every line whose trimmed form starts with `## Note ` or `- `. This
/// also removes ordinary markdown bullets in the body.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicLocalNoteFormat;

impl LocalNoteFormat for HeuristicLocalNoteFormat {
    fn strip(&self, raw: &str) -> String {
        raw.lines()
            .filter(|line| {
                let line = line.trim();
                !line.starts_with("## Note ") && !line.starts_with("- ")
            })
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string()
    }
}

/// Request to promote a local note
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromoteRequest {
    /// Path of the local note file
    pub local_note_path: String,
    /// Knowledge title; defaults to the file name without `.md`
    pub title: Option<String>,
    /// Related project
    pub project_slug: Option<String>,
    /// Knowledge domain
    pub domain: Option<String>,
    /// Knowledge tags; defaults to the domain
    pub tags: Option<Vec<String>>,
}

impl PromoteRequest {
    /// Create a request for the note at `path`
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            local_note_path: path.into(),
            ..Default::default()
        }
    }
}

/// Paths produced by a promotion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Promotion {
    /// Newly written knowledge note
    pub knowledge_path: PathBuf,
    /// Local note that was promoted, left in place
    pub source_path: PathBuf,
}

fn default_title(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    name.strip_suffix(".md").unwrap_or(&name).to_string()
}

/// Promote with the default [`HeuristicLocalNoteFormat`]
pub async fn promote_local_note(
    layout: &VaultLayout,
    request: &PromoteRequest,
    now: DateTime<Utc>,
) -> Result<Promotion> {
    promote_local_note_with(layout, request, &HeuristicLocalNoteFormat, now).await
}

/// Promote a local note, stripping it with `format`
pub async fn promote_local_note_with(
    layout: &VaultLayout,
    request: &PromoteRequest,
    format: &dyn LocalNoteFormat,
    now: DateTime<Utc>,
) -> Result<Promotion> {
    let source = request.local_note_path.trim();
    if source.is_empty() {
        return Err(Error::MissingPath("local note path".to_string()));
    }
    let source_path = PathBuf::from(source);

    let raw = tokio::fs::read_to_string(&source_path).await?;
    let text = format.strip(&raw);
    if text.is_empty() {
        return Err(Error::EmptyNote(source_path));
    }

    let title = request
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| default_title(&source_path));

    let entry = KnowledgeEntry {
        text,
        title: Some(title),
        project_slug: request.project_slug.clone(),
        domain: request.domain.clone(),
        tags: request.tags.clone(),
        sources: vec![source.to_string()],
        strict: true,
    };
    let knowledge_path = write_knowledge_note(layout, &entry, now).await?;

    tracing::info!(
        "Promoted local note {} to {}",
        source_path.display(),
        knowledge_path.display()
    );
    Ok(Promotion {
        knowledge_path,
        source_path,
    })
}
