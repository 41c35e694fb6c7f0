//! Volatile writers: inbox captures, local notes and the session journal
//!
//! Inbox captures create one file per call. Local notes and journal entries
//! append a block to a per-day file.

use crate::error::{Error, Result};
use crate::vault::fs::append;
use crate::vault::text::{
    file_timestamp, first_words, format_time, format_timestamp, format_ymd, slugify,
};
use crate::vault::VaultLayout;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Words of the note text used to derive a capture slug
const SLUG_SEED_WORDS: usize = 8;

/// Upper bound on `-N` suffixes tried for a colliding capture file name
const MAX_NAME_ATTEMPTS: usize = 100;

/// Text plus optional origin metadata for a capture or local note
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteEntry {
    /// Note body (trimmed on write)
    pub text: String,
    /// Originating channel
    pub channel: Option<String>,
    /// Sender identifier
    pub sender_id: Option<String>,
    /// Project the note relates to
    pub project_slug: Option<String>,
}

impl NoteEntry {
    /// Create an entry with no metadata
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Set the originating channel
    pub fn channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    /// Set the sender identifier
    pub fn sender_id(mut self, sender_id: impl Into<String>) -> Self {
        self.sender_id = Some(sender_id.into());
        self
    }

    /// Set the related project
    pub fn project_slug(mut self, project_slug: impl Into<String>) -> Self {
        self.project_slug = Some(project_slug.into());
        self
    }

    fn body(&self, what: &str) -> Result<&str> {
        let text = self.text.trim();
        if text.is_empty() {
            return Err(Error::EmptyText(format!("{} text is empty", what)));
        }
        Ok(text)
    }

    /// `(key, value)` pairs for the metadata that is set
    fn metadata(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("channel", self.channel.as_deref()),
            ("sender", self.sender_id.as_deref()),
            ("project", self.project_slug.as_deref()),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key, v)))
    }
}

/// Session summary appended to the daily journal
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JournalEntry {
    /// Session identifier
    pub session_id: String,
    /// Number of messages exchanged
    pub message_count: u64,
    /// Session duration, when known
    pub duration_ms: Option<u64>,
    /// Agent that ran the session, when known
    pub agent_id: Option<String>,
}

/// Create `<dir>/<stem>.md`, adding `-2`, `-3`, … if the name is taken
async fn create_unique(dir: &Path, stem: &str, content: &str) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    for attempt in 1..=MAX_NAME_ATTEMPTS {
        let name = if attempt == 1 {
            format!("{}.md", stem)
        } else {
            format!("{}-{}.md", stem, attempt)
        };
        let path = dir.join(name);
        match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(mut file) => {
                file.write_all(content.as_bytes()).await?;
                file.flush().await?;
                return Ok(path);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Err(Error::Io(std::io::Error::new(
        std::io::ErrorKind::AlreadyExists,
        format!("no free capture name for {} in {}", stem, dir.display()),
    )))
}

/// Capture text into a new file under `Inbox/idees/`
pub async fn capture_inbox(
    layout: &VaultLayout,
    entry: &NoteEntry,
    now: DateTime<Utc>,
) -> Result<PathBuf> {
    let text = entry.body("Capture")?;
    let slug = slugify(&first_words(text, SLUG_SEED_WORDS));
    let stem = format!("{}-{}", file_timestamp(&now), slug);

    let mut lines = vec![
        "---".to_string(),
        "type: inbox".to_string(),
        format!("created: {}", format_timestamp(&now)),
    ];
    lines.extend(entry.metadata().map(|(k, v)| format!("{}: {}", k, v)));
    lines.push("---".to_string());
    lines.push(String::new());
    lines.push(format!("# Capture {}", format_ymd(&now)));
    lines.push(String::new());
    lines.push(text.to_string());
    lines.push(String::new());

    let path = create_unique(&layout.inbox_dir(), &stem, &lines.join("\n")).await?;
    tracing::info!("Captured inbox note: {}", path.display());
    Ok(path)
}

/// Append a timestamped block to today's local note file
pub async fn write_local_note(
    layout: &VaultLayout,
    entry: &NoteEntry,
    now: DateTime<Utc>,
) -> Result<PathBuf> {
    let text = entry.body("Local note")?;
    let path = layout.local_notes_path(&format_ymd(&now));

    let mut lines = vec![format!("## Note {}", format_time(&now))];
    lines.extend(entry.metadata().map(|(k, v)| format!("- {}: {}", k, v)));
    lines.push(String::new());
    lines.push(text.to_string());
    lines.push(String::new());
    lines.push(String::new());

    append(&path, &lines.join("\n")).await?;
    tracing::info!("Local note appended: {}", path.display());
    Ok(path)
}

/// Append a session summary to the journal for `date`
pub async fn write_journal_entry(
    layout: &VaultLayout,
    date: DateTime<Utc>,
    entry: &JournalEntry,
) -> Result<PathBuf> {
    let path = layout.journal_path(&format_ymd(&date));
    let duration = entry
        .duration_ms
        .map(|ms| format!("{} ms", ms))
        .unwrap_or_else(|| "n/a".to_string());

    let block = [
        format!("## OpenClaw session {}", format_time(&date)),
        format!("- sessionId: {}", entry.session_id),
        format!("- agentId: {}", entry.agent_id.as_deref().unwrap_or("unknown")),
        format!("- messageCount: {}", entry.message_count),
        format!("- durationMs: {}", duration),
        String::new(),
        String::new(),
    ]
    .join("\n");

    append(&path, &block).await?;
    tracing::debug!("Journal entry appended: {}", path.display());
    Ok(path)
}
