//! Project artifact synchronization
//!
//! `Projets/<slug>/index.md` is regenerated wholesale. `tracking.md` and
//! `memory.md` are user-editable; only their managed blocks are rewritten.

use super::commit::SyncCommit;
use super::managed_block::ManagedBlock;
use crate::error::{Error, Result};
use crate::vault::fs::read_optional;
use crate::vault::text::format_timestamp;
use crate::vault::VaultLayout;
use chrono::{DateTime, Utc};
use std::path::PathBuf;

/// Managed block id in `tracking.md`
pub const TRACKING_BLOCK_ID: &str = "ipcrae-tracking-sync";

/// Managed block id in `memory.md`
pub const MEMORY_BLOCK_ID: &str = "ipcrae-memory-sync";

const NO_ACTION: &str = "(none)";

/// Request to synchronize one project
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectSyncEntry {
    /// Project slug, used as the directory name
    pub project_slug: String,
    /// Project domain
    pub domain: Option<String>,
    /// Next action / latest signal text
    pub action_text: Option<String>,
}

impl ProjectSyncEntry {
    /// Create an entry for `project_slug`
    pub fn new(project_slug: impl Into<String>) -> Self {
        Self {
            project_slug: project_slug.into(),
            ..Default::default()
        }
    }
}

/// Paths written by a sync
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectArtifacts {
    /// `index.md`
    pub index_path: PathBuf,
    /// `tracking.md`
    pub tracking_path: PathBuf,
    /// `memory.md`
    pub memory_path: PathBuf,
}

fn validate_slug(slug: &str) -> Result<&str> {
    let slug = slug.trim();
    if slug.is_empty() || slug == "." || slug == ".." || slug.contains(&['/', '\\'][..]) {
        return Err(Error::Config(format!("Invalid project slug: {:?}", slug)));
    }
    Ok(slug)
}

fn ensure_heading(content: String, heading: &str) -> String {
    if content.trim().is_empty() {
        format!("{}\n\n", heading)
    } else {
        content
    }
}

fn render_index(slug: &str, domain: Option<&str>, updated: &str) -> String {
    [
        format!("# Projet {}", slug),
        String::new(),
        "## Pilotage".to_string(),
        format!("- project: {}", slug),
        format!("- domain: {}", domain.unwrap_or("unknown")),
        format!("- updated: {}", updated),
        String::new(),
        "## Liens".to_string(),
        "- tracking.md".to_string(),
        "- memory.md".to_string(),
        String::new(),
    ]
    .join("\n")
}

fn render_sync_body(key: &str, updated: &str, action: Option<&str>) -> String {
    format!(
        "## OpenClaw Sync\n- updated: {}\n- {}: {}",
        updated,
        key,
        action.unwrap_or(NO_ACTION)
    )
}

/// Render the three project files without writing them
pub async fn stage_project_artifacts(
    layout: &VaultLayout,
    entry: &ProjectSyncEntry,
    now: DateTime<Utc>,
) -> Result<(ProjectArtifacts, SyncCommit)> {
    let slug = validate_slug(&entry.project_slug)?;
    let updated = format_timestamp(&now);
    let action = entry
        .action_text
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty());

    let artifacts = ProjectArtifacts {
        index_path: layout.project_index_path(slug),
        tracking_path: layout.project_tracking_path(slug),
        memory_path: layout.project_memory_path(slug),
    };

    let (tracking, memory) = tokio::join!(
        read_optional(&artifacts.tracking_path),
        read_optional(&artifacts.memory_path),
    );
    let tracking = ensure_heading(tracking?.unwrap_or_default(), "# Tracking");
    let memory = ensure_heading(memory?.unwrap_or_default(), "# Memory");

    let tracking = ManagedBlock::new(TRACKING_BLOCK_ID)
        .merge(&tracking, &render_sync_body("next_action", &updated, action));
    let memory = ManagedBlock::new(MEMORY_BLOCK_ID)
        .merge(&memory, &render_sync_body("latest_signal", &updated, action));

    let commit = SyncCommit::new()
        .stage(
            &artifacts.index_path,
            render_index(slug, entry.domain.as_deref(), &updated),
        )
        .stage(&artifacts.tracking_path, tracking)
        .stage(&artifacts.memory_path, memory);

    Ok((artifacts, commit))
}

/// Regenerate `index.md` and merge the managed blocks of `tracking.md` and `memory.md`
pub async fn sync_project_artifacts(
    layout: &VaultLayout,
    entry: &ProjectSyncEntry,
    now: DateTime<Utc>,
) -> Result<ProjectArtifacts> {
    let (artifacts, commit) = stage_project_artifacts(layout, entry, now).await?;
    commit.apply().await?;
    tracing::info!(
        "Synced project artifacts for {} in {}",
        entry.project_slug.trim(),
        layout.project_dir(entry.project_slug.trim()).display()
    );
    Ok(artifacts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 2, 10, minute, 0).unwrap()
    }

    fn entry(action: Option<&str>) -> ProjectSyncEntry {
        ProjectSyncEntry {
            project_slug: "openclawIPCRAE".to_string(),
            domain: Some("devops".to_string()),
            action_text: action.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_first_sync_creates_all_files() {
        let dir = TempDir::new().unwrap();
        let layout = VaultLayout::new(dir.path());

        let paths = sync_project_artifacts(&layout, &entry(Some("  Ship v1  ")), at(0))
            .await
            .unwrap();

        let index = std::fs::read_to_string(&paths.index_path).unwrap();
        assert_eq!(
            index,
            "# Projet openclawIPCRAE\n\n## Pilotage\n- project: openclawIPCRAE\n- domain: devops\n\
             - updated: 2026-04-02T10:00:00.000Z\n\n## Liens\n- tracking.md\n- memory.md\n"
        );

        let tracking = std::fs::read_to_string(&paths.tracking_path).unwrap();
        assert_eq!(
            tracking,
            "# Tracking\n\n<!-- openclaw:ipcrae-tracking-sync:start -->\n## OpenClaw Sync\n\
             - updated: 2026-04-02T10:00:00.000Z\n- next_action: Ship v1\n\
             <!-- openclaw:ipcrae-tracking-sync:end -->\n"
        );

        let memory = std::fs::read_to_string(&paths.memory_path).unwrap();
        assert!(memory.starts_with("# Memory\n\n<!-- openclaw:ipcrae-memory-sync:start -->"));
        assert!(memory.contains("- latest_signal: Ship v1"));
    }

    #[tokio::test]
    async fn test_repeated_sync_updates_block_in_place() {
        let dir = TempDir::new().unwrap();
        let layout = VaultLayout::new(dir.path());
        let tracking_path = layout.project_tracking_path("openclawIPCRAE");
        std::fs::create_dir_all(tracking_path.parent().unwrap()).unwrap();
        std::fs::write(&tracking_path, "Next action: initiale\n").unwrap();

        sync_project_artifacts(&layout, &entry(Some("first")), at(1)).await.unwrap();
        let paths = sync_project_artifacts(&layout, &entry(Some("second")), at(2))
            .await
            .unwrap();

        let tracking = std::fs::read_to_string(&paths.tracking_path).unwrap();
        let memory = std::fs::read_to_string(&paths.memory_path).unwrap();
        assert_eq!(tracking.matches("openclaw:ipcrae-tracking-sync:start").count(), 1);
        assert_eq!(tracking.matches("openclaw:ipcrae-tracking-sync:end").count(), 1);
        assert_eq!(memory.matches("openclaw:ipcrae-memory-sync:start").count(), 1);
        assert!(tracking.starts_with("Next action: initiale\n\n<!--"));
        assert!(tracking.contains("- next_action: second"));
        assert!(!tracking.contains("- next_action: first"));
        assert!(memory.contains("- latest_signal: second"));
    }

    #[tokio::test]
    async fn test_user_content_after_block_survives() {
        let dir = TempDir::new().unwrap();
        let layout = VaultLayout::new(dir.path());
        let paths = sync_project_artifacts(&layout, &entry(None), at(0)).await.unwrap();

        let mut tracking = std::fs::read_to_string(&paths.tracking_path).unwrap();
        tracking.push_str("\n## Manual\n- keep me\n");
        std::fs::write(&paths.tracking_path, &tracking).unwrap();

        sync_project_artifacts(&layout, &entry(Some("go")), at(5)).await.unwrap();
        let tracking = std::fs::read_to_string(&paths.tracking_path).unwrap();
        assert!(tracking.contains("- next_action: go\n<!-- openclaw:ipcrae-tracking-sync:end -->\n\n## Manual\n- keep me\n"));
    }

    #[tokio::test]
    async fn test_missing_action_uses_placeholder() {
        let dir = TempDir::new().unwrap();
        let layout = VaultLayout::new(dir.path());
        let no_domain = ProjectSyncEntry {
            action_text: Some("   ".to_string()),
            ..ProjectSyncEntry::new("demo")
        };
        let paths = sync_project_artifacts(&layout, &no_domain, at(0)).await.unwrap();

        let tracking = std::fs::read_to_string(&paths.tracking_path).unwrap();
        assert!(tracking.contains("- next_action: (none)"));
        let index = std::fs::read_to_string(&paths.index_path).unwrap();
        assert!(index.contains("- domain: unknown"));
    }

    #[tokio::test]
    async fn test_invalid_slug_rejected() {
        let dir = TempDir::new().unwrap();
        let layout = VaultLayout::new(dir.path());
        for slug in ["", "..", "a/b", "a\\b"] {
            let err = sync_project_artifacts(&layout, &ProjectSyncEntry::new(slug), at(0))
                .await
                .unwrap_err();
            assert!(matches!(err, Error::Config(_)), "slug {slug:?}");
        }
        assert!(!layout.root().join("Projets").exists());
    }

    #[tokio::test]
    async fn test_staging_does_not_write() {
        let dir = TempDir::new().unwrap();
        let layout = VaultLayout::new(dir.path());
        let (paths, commit) = stage_project_artifacts(&layout, &entry(None), at(0))
            .await
            .unwrap();
        assert_eq!(commit.len(), 3);
        assert!(commit.content(&paths.index_path).unwrap().contains("# Projet openclawIPCRAE"));
        assert!(!paths.index_path.exists());
    }
}
