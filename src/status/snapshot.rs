//! Vault status snapshot
//!
//! One resolution pass reads the required documents through the
//! [`TextCache`], resolves the active domain and project slug, and derives the
//! CDE mode. Snapshots are rebuilt on every call; only the file reads are
//! cached.

use super::cache::TextCache;
use crate::config::IpcraeConfig;
use crate::vault::text::{normalize_slug, truncate_text};
use crate::vault::VaultLayout;
use futures::future::OptionFuture;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

/// Character budget for snapshot summaries
pub const SUMMARY_MAX_CHARS: usize = 900;

/// Operating mode of the vault
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CdeMode {
    /// Every required document is present
    Normal,
    /// At least one required document is missing
    Degraded,
}

impl CdeMode {
    /// Lowercase name used in status output
    pub fn as_str(&self) -> &'static str {
        match self {
            CdeMode::Normal => "normal",
            CdeMode::Degraded => "degraded",
        }
    }
}

impl std::fmt::Display for CdeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Domain and project slug supplied by one identity source
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    /// Active domain
    pub domain: Option<String>,
    /// Active project slug
    pub project_slug: Option<String>,
}

impl Identity {
    /// Fill each missing field from `fallback`. Fields resolve independently.
    pub fn or(self, fallback: Identity) -> Identity {
        Identity {
            domain: self.domain.or(fallback.domain),
            project_slug: self.project_slug.or(fallback.project_slug),
        }
    }

    /// Identity explicitly set in configuration
    pub fn from_config(config: &IpcraeConfig) -> Self {
        let non_empty = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        Self {
            domain: non_empty(&config.domain),
            project_slug: non_empty(&config.project_slug),
        }
    }

    /// Identity from the structured state document.
    ///
    /// Unparseable JSON is treated as an absent document.
    pub fn from_state_json(raw: &str) -> Self {
        let state = match serde_json::from_str::<serde_json::Value>(raw) {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!("Ignoring unparseable state.json: {}", e);
                return Self::default();
            }
        };
        let Some(fields) = state.as_object() else {
            return Self::default();
        };
        let slug = |key: &str| {
            fields
                .get(key)
                .and_then(serde_json::Value::as_str)
                .and_then(normalize_slug)
        };
        Self {
            domain: slug("domain"),
            project_slug: slug("projectSlug"),
        }
    }

    /// Identity matched from `Domaine actif: <x>` / `Projet actif: <x>` lines
    pub fn from_context_text(text: &str) -> Self {
        static DOMAIN: OnceLock<Option<Regex>> = OnceLock::new();
        static PROJECT: OnceLock<Option<Regex>> = OnceLock::new();

        let capture = |cell: &'static OnceLock<Option<Regex>>, pattern: &str| {
            cell.get_or_init(|| Regex::new(pattern).ok())
                .as_ref()
                .and_then(|re| re.captures(text))
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().trim().to_string())
        };

        Self {
            domain: capture(&DOMAIN, r"(?i)Domaine actif:\s*([a-z0-9_-]+)"),
            project_slug: capture(&PROJECT, r"(?i)Projet actif:\s*([a-z0-9_-]+)"),
        }
    }
}

/// Resolve identity with precedence: explicit config > state document > context text
pub fn resolve_identity(explicit: Identity, state: Identity, context: Identity) -> Identity {
    explicit.or(state).or(context)
}

/// Immutable result of one resolution pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSnapshot {
    /// Resolved domain
    pub domain: Option<String>,
    /// Resolved project slug
    pub project_slug: Option<String>,
    /// Global context document path
    pub context_path: PathBuf,
    /// Instructions document path
    pub instructions_path: PathBuf,
    /// Phase index path
    pub phase_index_path: PathBuf,
    /// Project tracking path, when a project slug resolved
    pub project_tracking_path: Option<PathBuf>,
    /// Truncated instructions
    pub instructions_summary: Option<String>,
    /// Truncated phase index
    pub phase_summary: Option<String>,
    /// Truncated project tracking
    pub project_tracking_summary: Option<String>,
    /// Required documents that could not be read
    pub missing_required_paths: Vec<PathBuf>,
}

impl StatusSnapshot {
    /// Degraded iff at least one required path is missing
    pub fn cde_mode(&self) -> CdeMode {
        if self.missing_required_paths.is_empty() {
            CdeMode::Normal
        } else {
            CdeMode::Degraded
        }
    }

    /// Shorthand for `cde_mode() == CdeMode::Degraded`
    pub fn is_degraded(&self) -> bool {
        self.cde_mode() == CdeMode::Degraded
    }
}

/// Resolves [`StatusSnapshot`]s for a vault, owning the text cache it reads through
#[derive(Debug, Clone, Default)]
pub struct SnapshotReader {
    cache: TextCache,
}

impl SnapshotReader {
    /// Create a reader with a fresh cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a reader over an existing cache
    pub fn with_cache(cache: TextCache) -> Self {
        Self { cache }
    }

    /// The cache used by this reader
    pub fn cache(&self) -> &TextCache {
        &self.cache
    }

    /// Cached read that treats an empty file as absent
    pub(crate) async fn read_text(&self, path: &Path, ttl: Duration) -> Option<String> {
        self.cache
            .get_or_load(path, ttl)
            .await
            .filter(|text| !text.is_empty())
    }

    /// Run one resolution pass against the vault configured in `config`
    pub async fn resolve(&self, config: &IpcraeConfig) -> StatusSnapshot {
        let layout = VaultLayout::new(&config.ipcrae_root);
        let ttl = config.cache_ttl();

        let context_path = layout.context_path();
        let instructions_path = layout.instructions_path();
        let phase_index_path = layout.phase_index_path();
        let state_path = layout.state_path();

        let (context_md, state_raw) = tokio::join!(
            self.read_text(&context_path, ttl),
            self.read_text(&state_path, ttl),
        );

        let identity = resolve_identity(
            Identity::from_config(config),
            state_raw
                .as_deref()
                .map(Identity::from_state_json)
                .unwrap_or_default(),
            context_md
                .as_deref()
                .map(Identity::from_context_text)
                .unwrap_or_default(),
        );

        let project_tracking_path = identity
            .project_slug
            .as_deref()
            .map(|slug| layout.project_tracking_path(slug));

        let (instructions, phase_index, tracking) = tokio::join!(
            self.read_text(&instructions_path, ttl),
            self.read_text(&phase_index_path, ttl),
            OptionFuture::from(
                project_tracking_path
                    .as_deref()
                    .map(|path| self.read_text(path, ttl))
            ),
        );
        let tracking = tracking.flatten();

        let missing_required_paths: Vec<PathBuf> = [
            (context_md.is_some(), &context_path),
            (instructions.is_some(), &instructions_path),
            (phase_index.is_some(), &phase_index_path),
        ]
        .into_iter()
        .filter(|(present, _)| !present)
        .map(|(_, path)| path.clone())
        .collect();

        let summarize = |text: Option<String>| {
            text.map(|t| truncate_text(t.trim(), SUMMARY_MAX_CHARS))
                .filter(|t| !t.is_empty())
        };

        let snapshot = StatusSnapshot {
            domain: identity.domain,
            project_slug: identity.project_slug,
            context_path,
            instructions_path,
            phase_index_path,
            project_tracking_path,
            instructions_summary: summarize(instructions),
            phase_summary: summarize(phase_index),
            project_tracking_summary: summarize(tracking),
            missing_required_paths,
        };

        tracing::debug!(
            "Resolved IPCRAE snapshot: mode={} domain={:?} project={:?} missing={}",
            snapshot.cde_mode(),
            snapshot.domain,
            snapshot.project_slug,
            snapshot.missing_required_paths.len()
        );
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vault::text::TRUNCATION_MARKER;
    use tempfile::TempDir;

    struct Fixture {
        dir: TempDir,
        config: IpcraeConfig,
    }

    impl Fixture {
        fn root(&self) -> &Path {
            self.dir.path()
        }

        fn write(&self, rel: &str, content: &str) {
            let path = self.root().join(rel);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, content).unwrap();
        }

        fn remove(&self, rel: &str) {
            std::fs::remove_file(self.root().join(rel)).unwrap();
        }
    }

    fn fixture(with_instructions: bool, with_state: bool) -> Fixture {
        let dir = TempDir::new().unwrap();
        let mut config = IpcraeConfig::with_root(dir.path());
        config.project_slug = None;
        config.context_cache_ttl_ms = 1_000;
        let fx = Fixture { dir, config };

        fx.write(
            ".ipcrae/context.md",
            "Domaine actif: devops\nProjet actif: openclawIPCRAE\n",
        );
        if with_state {
            fx.write(
                ".ipcrae/state.json",
                r#"{"domain":"strategy","projectSlug":"state-project"}"#,
            );
            fx.write("Projets/state-project/tracking.md", "Next action: from-state");
        }
        if with_instructions {
            fx.write(".ipcrae/instructions.md", "Toujours respecter la methode IPCRAE.");
        }
        fx.write("Phases/index.md", "Phase active: Execution");
        fx.write("Projets/openclawIPCRAE/tracking.md", "Next action: valider");
        fx
    }

    #[tokio::test]
    async fn test_normal_mode_with_all_required_files() {
        let fx = fixture(true, true);
        let snapshot = SnapshotReader::new().resolve(&fx.config).await;

        assert_eq!(snapshot.cde_mode(), CdeMode::Normal);
        assert!(snapshot.missing_required_paths.is_empty());
        assert!(snapshot
            .instructions_summary
            .as_deref()
            .unwrap()
            .contains("methode IPCRAE"));
        assert!(snapshot
            .instructions_path
            .ends_with(Path::new(".ipcrae").join("instructions.md")));
        assert_eq!(snapshot.phase_summary.as_deref(), Some("Phase active: Execution"));
    }

    #[tokio::test]
    async fn test_degraded_when_instructions_missing() {
        let fx = fixture(false, true);
        let snapshot = SnapshotReader::new().resolve(&fx.config).await;

        assert_eq!(snapshot.cde_mode(), CdeMode::Degraded);
        assert_eq!(snapshot.missing_required_paths.len(), 1);
        assert!(snapshot.missing_required_paths[0].ends_with(".ipcrae/instructions.md"));
        assert!(snapshot.instructions_summary.is_none());
    }

    #[tokio::test]
    async fn test_whitespace_only_required_file_counts_as_present() {
        let fx = fixture(true, false);
        fx.write(".ipcrae/instructions.md", "   \n\n");
        let snapshot = SnapshotReader::new().resolve(&fx.config).await;

        assert_eq!(snapshot.cde_mode(), CdeMode::Normal);
        assert!(snapshot.missing_required_paths.is_empty());
        assert!(snapshot.instructions_summary.is_none());
    }

    #[tokio::test]
    async fn test_empty_required_file_counts_as_missing() {
        let fx = fixture(true, false);
        fx.write(".ipcrae/instructions.md", "");
        let snapshot = SnapshotReader::new().resolve(&fx.config).await;

        assert_eq!(snapshot.cde_mode(), CdeMode::Degraded);
        assert!(snapshot.missing_required_paths[0].ends_with(".ipcrae/instructions.md"));
    }

    #[tokio::test]
    async fn test_empty_vault_lists_every_required_path() {
        let dir = TempDir::new().unwrap();
        let config = IpcraeConfig::with_root(dir.path());
        let snapshot = SnapshotReader::new().resolve(&config).await;

        assert!(snapshot.is_degraded());
        assert_eq!(
            snapshot.missing_required_paths,
            VaultLayout::new(dir.path()).required_paths().to_vec()
        );
    }

    #[tokio::test]
    async fn test_missing_tracking_does_not_degrade() {
        let fx = fixture(true, false);
        fx.remove("Projets/openclawIPCRAE/tracking.md");
        let snapshot = SnapshotReader::new().resolve(&fx.config).await;

        assert_eq!(snapshot.cde_mode(), CdeMode::Normal);
        assert!(snapshot.project_tracking_path.is_some());
        assert!(snapshot.project_tracking_summary.is_none());
    }

    #[tokio::test]
    async fn test_state_metadata_beats_context_patterns() {
        let fx = fixture(true, true);
        let snapshot = SnapshotReader::new().resolve(&fx.config).await;

        assert_eq!(snapshot.domain.as_deref(), Some("strategy"));
        assert_eq!(snapshot.project_slug.as_deref(), Some("state-project"));
        assert_eq!(
            snapshot.project_tracking_summary.as_deref(),
            Some("Next action: from-state")
        );
    }

    #[tokio::test]
    async fn test_context_patterns_without_state() {
        let fx = fixture(true, false);
        let snapshot = SnapshotReader::new().resolve(&fx.config).await;

        assert_eq!(snapshot.domain.as_deref(), Some("devops"));
        assert_eq!(snapshot.project_slug.as_deref(), Some("openclawIPCRAE"));
    }

    #[tokio::test]
    async fn test_identity_precedence_chain() {
        let fx = fixture(true, false);
        fx.write(".ipcrae/context.md", "Domaine actif: qa\n");
        fx.write(".ipcrae/state.json", r#"{"domain":"devops"}"#);

        let mut config = fx.config.clone();
        config.domain = Some("strategy".to_string());
        assert_eq!(
            SnapshotReader::new().resolve(&config).await.domain.as_deref(),
            Some("strategy")
        );

        config.domain = None;
        assert_eq!(
            SnapshotReader::new().resolve(&config).await.domain.as_deref(),
            Some("devops")
        );

        fx.remove(".ipcrae/state.json");
        assert_eq!(
            SnapshotReader::new().resolve(&config).await.domain.as_deref(),
            Some("qa")
        );
    }

    #[tokio::test]
    async fn test_fields_resolve_independently() {
        let fx = fixture(true, false);
        fx.write(".ipcrae/state.json", r#"{"projectSlug":"from-state"}"#);

        let mut config = fx.config.clone();
        config.domain = Some("explicit".to_string());
        let snapshot = SnapshotReader::new().resolve(&config).await;

        assert_eq!(snapshot.domain.as_deref(), Some("explicit"));
        assert_eq!(snapshot.project_slug.as_deref(), Some("from-state"));
    }

    #[tokio::test]
    async fn test_invalid_state_json_is_ignored() {
        let fx = fixture(true, false);
        fx.write(".ipcrae/state.json", "{ not json");
        let snapshot = SnapshotReader::new().resolve(&fx.config).await;

        assert_eq!(snapshot.cde_mode(), CdeMode::Normal);
        assert_eq!(snapshot.domain.as_deref(), Some("devops"));
    }

    #[tokio::test]
    async fn test_long_instructions_are_truncated() {
        let fx = fixture(true, false);
        fx.write(".ipcrae/instructions.md", &"i".repeat(5_000));
        let snapshot = SnapshotReader::new().resolve(&fx.config).await;

        let summary = snapshot.instructions_summary.unwrap();
        assert!(summary.chars().count() <= SUMMARY_MAX_CHARS);
        assert!(summary.ends_with(TRUNCATION_MARKER));
    }

    #[tokio::test]
    async fn test_short_instructions_are_kept_verbatim() {
        let fx = fixture(true, false);
        fx.write(".ipcrae/instructions.md", "ten chars!");
        let snapshot = SnapshotReader::new().resolve(&fx.config).await;

        assert_eq!(snapshot.instructions_summary.as_deref(), Some("ten chars!"));
    }

    #[tokio::test]
    async fn test_resolution_reads_through_cache() {
        let fx = fixture(true, false);
        let mut config = fx.config.clone();
        config.context_cache_ttl_ms = 60_000;
        let reader = SnapshotReader::new();

        let first = reader.resolve(&config).await;
        fx.remove(".ipcrae/instructions.md");
        let second = reader.resolve(&config).await;

        assert_eq!(first, second);
        assert!(!reader.cache().is_empty().await);
    }

    #[test]
    fn test_state_json_normalization() {
        let identity = Identity::from_state_json(r#"{"domain":"Dev Ops!","projectSlug":"***"}"#);
        assert_eq!(identity.domain.as_deref(), Some("Dev-Ops"));
        assert_eq!(identity.project_slug, None);

        let identity = Identity::from_state_json(r#"{"domain": 42}"#);
        assert_eq!(identity, Identity::default());

        assert_eq!(
            Identity::from_state_json(r#"["devops", "proj"]"#),
            Identity::default()
        );
        assert_eq!(Identity::from_state_json("\"devops\""), Identity::default());
    }

    #[test]
    fn test_context_pattern_is_case_insensitive() {
        let identity = Identity::from_context_text("domaine ACTIF:   Research_2 more text");
        assert_eq!(identity.domain.as_deref(), Some("Research_2"));
        assert_eq!(identity.project_slug, None);
    }

    #[test]
    fn test_mode_invariant() {
        let mut snapshot = StatusSnapshot {
            domain: None,
            project_slug: None,
            context_path: PathBuf::from("c.md"),
            instructions_path: PathBuf::from("i.md"),
            phase_index_path: PathBuf::from("p.md"),
            project_tracking_path: None,
            instructions_summary: None,
            phase_summary: None,
            project_tracking_summary: None,
            missing_required_paths: vec![],
        };
        assert_eq!(snapshot.cde_mode(), CdeMode::Normal);

        snapshot.missing_required_paths.push(PathBuf::from("i.md"));
        assert_eq!(snapshot.cde_mode(), CdeMode::Degraded);
        assert_eq!(CdeMode::Degraded.to_string(), "degraded");
    }
}
