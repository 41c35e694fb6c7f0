//! Host-facing plugin surface
//!
//! [`IpcraePlugin`] owns a resolved config and a [`SnapshotReader`]. Hosts
//! dispatch slash commands through [`IpcraePlugin::handle_command`] and forward
//! the `before_prompt_build` and `session_end` events. Every command returns
//! plain text; failures are rendered as `<Label> failed: <message>`.

use crate::config::IpcraeConfig;
use crate::error::{Error, Result};
use crate::notes::{
    capture_inbox, promote_local_note, write_journal_entry, write_knowledge_note,
    write_local_note, JournalEntry, KnowledgeEntry, NoteEntry, PromoteRequest, Promotion,
};
use crate::status::{build_context, evaluate, SnapshotReader, StatusSnapshot, WriteStability};
use crate::sync::{sync_project_artifacts, ProjectArtifacts, ProjectSyncEntry};
use crate::vault::VaultLayout;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Registration data for one command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CommandSpec {
    /// Command name without the leading `/`
    pub name: &'static str,
    /// One-line description
    pub description: &'static str,
    /// Whether the command takes free-text arguments
    pub accepts_args: bool,
}

/// Commands exposed to the host
pub const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "capture",
        description: "Capture text into IPCRAE Inbox/idees.",
        accepts_args: true,
    },
    CommandSpec {
        name: "capture-local",
        description: "Save a volatile local note (allowed in degraded mode).",
        accepts_args: true,
    },
    CommandSpec {
        name: "promote-note",
        description: "Promote a local note file into stable knowledge.",
        accepts_args: true,
    },
    CommandSpec {
        name: "ipcrae-sync",
        description: "Sync project index/tracking/memory with an optional next action.",
        accepts_args: true,
    },
    CommandSpec {
        name: "ipcrae-status",
        description: "Show IPCRAE vault integration status (phase/project/context).",
        accepts_args: false,
    },
];

/// Arguments and origin of a command invocation
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandContext {
    /// Free-text arguments
    pub args: Option<String>,
    /// Originating channel
    pub channel: Option<String>,
    /// Sender identifier
    pub sender_id: Option<String>,
}

impl CommandContext {
    /// Context carrying only `args`
    pub fn with_args(args: impl Into<String>) -> Self {
        Self {
            args: Some(args.into()),
            ..Default::default()
        }
    }

    fn text(&self) -> &str {
        self.args.as_deref().map(str::trim).unwrap_or_default()
    }
}

/// Text returned to the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandReply {
    /// Reply text
    pub text: String,
}

impl From<String> for CommandReply {
    fn from(text: String) -> Self {
        Self { text }
    }
}

impl From<&str> for CommandReply {
    fn from(text: &str) -> Self {
        Self {
            text: text.to_string(),
        }
    }
}

/// Payload of the host's `session_end` event
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionEndEvent {
    /// Session identifier
    pub session_id: String,
    /// Number of messages exchanged
    pub message_count: u64,
    /// Session duration, when known
    pub duration_ms: Option<u64>,
}

/// IPCRAE vault plugin
#[derive(Debug, Clone)]
pub struct IpcraePlugin {
    config: IpcraeConfig,
    reader: SnapshotReader,
}

impl IpcraePlugin {
    /// Create a plugin with its own snapshot cache
    pub fn new(config: IpcraeConfig) -> Self {
        tracing::info!(
            "IPCRAE enabled root={} mode={} autoJournal={} autoCapture={}",
            config.ipcrae_root.display(),
            config.context_mode.as_str(),
            config.auto_journal,
            config.auto_capture
        );
        Self {
            config,
            reader: SnapshotReader::new(),
        }
    }

    /// Replace the snapshot reader
    pub fn with_reader(mut self, reader: SnapshotReader) -> Self {
        self.reader = reader;
        self
    }

    /// Resolved configuration
    pub fn config(&self) -> &IpcraeConfig {
        &self.config
    }

    /// Snapshot reader shared by every command
    pub fn reader(&self) -> &SnapshotReader {
        &self.reader
    }

    /// Commands to register with the host
    pub fn commands(&self) -> &'static [CommandSpec] {
        COMMANDS
    }

    fn layout(&self) -> VaultLayout {
        VaultLayout::new(&self.config.ipcrae_root)
    }

    /// Resolve a fresh snapshot
    pub async fn snapshot(&self) -> StatusSnapshot {
        self.reader.resolve(&self.config).await
    }

    /// Resolve a snapshot and check it against the write policy
    async fn gate(&self, stability: WriteStability) -> Result<StatusSnapshot> {
        let snapshot = self.snapshot().await;
        let decision = evaluate(&snapshot, stability);
        if decision.allowed {
            return Ok(snapshot);
        }
        let reason = decision.reason.unwrap_or_default();
        tracing::warn!("Blocked {:?} write: {}", stability, reason);
        Err(Error::WriteBlocked(reason))
    }

    /// Dispatch a command by name
    pub async fn handle_command(&self, name: &str, ctx: &CommandContext) -> CommandReply {
        let name = name.trim_start_matches('/');
        let (label, result) = match name {
            "capture" => ("Capture", self.cmd_capture(ctx).await),
            "capture-local" => ("Local note", self.cmd_capture_local(ctx).await),
            "promote-note" => ("Promotion", self.cmd_promote(ctx).await),
            "ipcrae-sync" => ("Sync", self.cmd_sync(ctx).await),
            "ipcrae-status" => return self.status_text().await.into(),
            other => return format!("Unknown command: /{}", other).into(),
        };
        match result {
            Ok(text) => text.into(),
            Err(Error::WriteBlocked(reason)) => reason.into(),
            Err(e) => {
                tracing::warn!("Command /{} failed: {}", name, e);
                format!("{} failed: {}", label, e).into()
            }
        }
    }

    async fn cmd_capture(&self, ctx: &CommandContext) -> Result<String> {
        if !self.config.auto_capture {
            return Ok("IPCRAE capture is disabled by plugin config (autoCapture=false).".into());
        }
        let text = ctx.text();
        if text.is_empty() {
            return Ok("Usage: /capture <texte>".into());
        }
        let path = self.capture(text, ctx).await?;
        Ok(format!("Captured to {}", path.display()))
    }

    async fn cmd_capture_local(&self, ctx: &CommandContext) -> Result<String> {
        let text = ctx.text();
        if text.is_empty() {
            return Ok("Usage: /capture-local <texte>".into());
        }
        let path = self.capture_local(text, ctx).await?;
        Ok(format!("Local note saved to {}", path.display()))
    }

    async fn cmd_promote(&self, ctx: &CommandContext) -> Result<String> {
        let path = ctx.text();
        if path.is_empty() {
            return Ok("Usage: /promote-note <chemin-local-note>".into());
        }
        let promotion = self.promote(PromoteRequest::new(path)).await?;
        Ok(format!(
            "Local note promoted to stable knowledge:\n- knowledge: {}\n- source: {}",
            promotion.knowledge_path.display(),
            promotion.source_path.display()
        ))
    }

    async fn cmd_sync(&self, ctx: &CommandContext) -> Result<String> {
        let action = Some(ctx.text()).filter(|a| !a.is_empty());
        let (slug, artifacts) = self.sync(action).await?;
        Ok(format!(
            "IPCRAE project synced for {}:\n- index: {}\n- tracking: {}\n- memory: {}",
            slug,
            artifacts.index_path.display(),
            artifacts.tracking_path.display(),
            artifacts.memory_path.display()
        ))
    }

    /// Inbox capture (volatile)
    pub async fn capture(&self, text: &str, ctx: &CommandContext) -> Result<PathBuf> {
        let snapshot = self.gate(WriteStability::Volatile).await?;
        let entry = note_entry(text, ctx, snapshot.project_slug);
        capture_inbox(&self.layout(), &entry, Utc::now()).await
    }

    /// Local note (volatile)
    pub async fn capture_local(&self, text: &str, ctx: &CommandContext) -> Result<PathBuf> {
        let snapshot = self.gate(WriteStability::Volatile).await?;
        let entry = note_entry(text, ctx, snapshot.project_slug);
        write_local_note(&self.layout(), &entry, Utc::now()).await
    }

    /// Promote a local note (stable). Missing domain and project come from the snapshot.
    pub async fn promote(&self, mut request: PromoteRequest) -> Result<Promotion> {
        let snapshot = self.gate(WriteStability::Stable).await?;
        request.domain = request.domain.or(snapshot.domain);
        request.project_slug = request.project_slug.or(snapshot.project_slug);
        promote_local_note(&self.layout(), &request, Utc::now()).await
    }

    /// Write a knowledge note (stable). Missing domain and project come from the snapshot.
    pub async fn write_knowledge(&self, mut entry: KnowledgeEntry) -> Result<PathBuf> {
        let snapshot = self.gate(WriteStability::Stable).await?;
        entry.domain = entry.domain.or(snapshot.domain);
        entry.project_slug = entry.project_slug.or(snapshot.project_slug);
        write_knowledge_note(&self.layout(), &entry, Utc::now()).await
    }

    /// Sync the active project's artifacts (stable)
    pub async fn sync(&self, action_text: Option<&str>) -> Result<(String, ProjectArtifacts)> {
        let snapshot = self.gate(WriteStability::Stable).await?;
        let slug = snapshot.project_slug.ok_or_else(|| {
            Error::Config(
                "No active project: set projectSlug, state.json or 'Projet actif:' in context.md"
                    .to_string(),
            )
        })?;
        let entry = ProjectSyncEntry {
            project_slug: slug.clone(),
            domain: snapshot.domain,
            action_text: action_text.map(str::to_string),
        };
        let artifacts = sync_project_artifacts(&self.layout(), &entry, Utc::now()).await?;
        Ok((slug, artifacts))
    }

    /// Human-readable status with follow-up actions
    pub async fn status_text(&self) -> String {
        let status = self.snapshot().await;
        render_status(&self.config, &status)
    }

    /// Context to prepend to the next prompt, if the vault has any
    pub async fn before_prompt_build(&self) -> Option<String> {
        let context = build_context(&self.config, &self.reader).await;
        if context.is_empty() {
            tracing::debug!(
                "No IPCRAE context under {}",
                self.config.ipcrae_root.display()
            );
            None
        } else {
            Some(context)
        }
    }

    /// Append a journal entry for a finished session
    pub async fn write_journal(
        &self,
        event: &SessionEndEvent,
        agent_id: Option<&str>,
    ) -> Result<PathBuf> {
        let entry = JournalEntry {
            session_id: event.session_id.clone(),
            message_count: event.message_count,
            duration_ms: event.duration_ms,
            agent_id: agent_id.map(str::to_string),
        };
        write_journal_entry(&self.layout(), Utc::now(), &entry).await
    }

    /// Journal the session when `auto_journal` is on. Failures are logged only.
    pub async fn session_end(
        &self,
        event: &SessionEndEvent,
        agent_id: Option<&str>,
    ) -> Option<PathBuf> {
        if !self.config.auto_journal {
            return None;
        }
        match self.write_journal(event, agent_id).await {
            Ok(path) => {
                tracing::info!("Session journal appended: {}", path.display());
                Some(path)
            }
            Err(e) => {
                tracing::warn!("Failed session journal write: {}", e);
                None
            }
        }
    }
}

fn note_entry(text: &str, ctx: &CommandContext, project_slug: Option<String>) -> NoteEntry {
    NoteEntry {
        text: text.to_string(),
        channel: ctx.channel.clone(),
        sender_id: ctx.sender_id.clone(),
        project_slug,
    }
}

/// Render the status block for `status`
pub fn render_status(config: &IpcraeConfig, status: &StatusSnapshot) -> String {
    let mut lines = vec![
        "IPCRAE status:".to_string(),
        format!("- root: {}", config.ipcrae_root.display()),
        format!("- contextMode: {}", config.context_mode.as_str()),
        format!("- cdeMode: {}", status.cde_mode()),
        format!(
            "- domain: {}",
            status.domain.as_deref().unwrap_or("(unknown)")
        ),
        format!(
            "- project: {}",
            status.project_slug.as_deref().unwrap_or("(unknown)")
        ),
        match &status.phase_summary {
            Some(_) => "- phases: loaded".to_string(),
            None => format!("- phases: missing ({})", status.phase_index_path.display()),
        },
        match (&status.project_tracking_summary, &status.project_tracking_path) {
            (Some(_), _) => "- tracking: loaded".to_string(),
            (None, Some(path)) => format!("- tracking: missing ({})", path.display()),
            (None, None) => "- tracking: n/a".to_string(),
        },
    ];

    if let Some(summary) = &status.phase_summary {
        lines.push(format!("\nPhase summary:\n{}", summary));
    }
    if let Some(summary) = &status.project_tracking_summary {
        lines.push(format!("\nProject tracking:\n{}", summary));
    }

    let fixes = next_fixes(status);
    if !fixes.is_empty() {
        lines.push("\nNext fixes:".to_string());
        lines.extend(fixes.into_iter().map(|fix| format!("- {}", fix)));
        lines.push("- Re-run /ipcrae-status after applying the fixes above.".to_string());
    }

    lines.join("\n")
}

fn next_fixes(status: &StatusSnapshot) -> Vec<String> {
    let mut fixes: Vec<String> = status
        .missing_required_paths
        .iter()
        .map(|path| {
            let what = if *path == status.context_path {
                "context"
            } else if *path == status.instructions_path {
                "instructions"
            } else if *path == status.phase_index_path {
                "phase index"
            } else {
                "CDE"
            };
            format!("Create required {} file: {}", what, path.display())
        })
        .collect();

    if let (None, Some(path)) = (
        &status.project_tracking_summary,
        &status.project_tracking_path,
    ) {
        fixes.push(format!(
            "Run /ipcrae-sync to initialize tracking: {}",
            path.display()
        ));
    }
    fixes
}
