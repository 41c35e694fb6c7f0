//! IPCRAE configuration management
//!
//! The host hands over a loosely-typed value (JSON from its plugin settings,
//! or a TOML file for the CLI). Resolution is defensive: every field that is
//! missing or has the wrong type falls back to its default instead of failing.

use crate::error::Result;
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default vault root before tilde expansion
pub const DEFAULT_ROOT: &str = "~/IPCRAE";

/// Default project slug when the host does not provide one
pub const DEFAULT_PROJECT_SLUG: &str = "openclawIPCRAE";

/// Default text cache TTL (5 minutes)
pub const DEFAULT_CACHE_TTL_MS: u64 = 5 * 60 * 1000;

/// How much of the vault is injected into the prompt context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextMode {
    /// Global context only
    Minimal,
    /// All sections, each truncated to a budget
    #[default]
    Compact,
    /// All sections, untruncated
    Full,
}

impl ContextMode {
    fn parse(value: Option<&Value>) -> Self {
        match value.and_then(Value::as_str) {
            Some("minimal") => ContextMode::Minimal,
            Some("full") => ContextMode::Full,
            _ => ContextMode::Compact,
        }
    }

    /// Lowercase name as used in settings
    pub fn as_str(&self) -> &'static str {
        match self {
            ContextMode::Minimal => "minimal",
            ContextMode::Compact => "compact",
            ContextMode::Full => "full",
        }
    }
}

/// Main IPCRAE configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IpcraeConfig {
    /// Vault root directory
    pub ipcrae_root: PathBuf,

    /// Prompt context assembly mode
    pub context_mode: ContextMode,

    /// Append a journal entry at session end
    pub auto_journal: bool,

    /// Enable the inbox capture command
    pub auto_capture: bool,

    /// Explicit domain, overrides state.json and context.md
    pub domain: Option<String>,

    /// Explicit project slug, overrides state.json and context.md
    pub project_slug: Option<String>,

    /// TTL applied to every cached vault read
    pub context_cache_ttl_ms: u64,
}

impl Default for IpcraeConfig {
    fn default() -> Self {
        Self {
            ipcrae_root: expand_tilde(DEFAULT_ROOT),
            context_mode: ContextMode::Compact,
            auto_journal: true,
            auto_capture: true,
            domain: None,
            project_slug: Some(DEFAULT_PROJECT_SLUG.to_string()),
            context_cache_ttl_ms: DEFAULT_CACHE_TTL_MS,
        }
    }
}

impl IpcraeConfig {
    /// Config rooted at `root` with every other field at its default
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            ipcrae_root: root.into(),
            ..Default::default()
        }
    }

    /// Resolve a config from a host-supplied value.
    ///
    /// Keys are accepted in camelCase (`ipcraeRoot`) or snake_case
    /// (`ipcrae_root`). A relative root that does not start with `~` is passed
    /// through `resolve_path` when the host supplies one.
    pub fn from_value(value: &Value, resolve_path: Option<&dyn Fn(&str) -> PathBuf>) -> Self {
        let empty = Map::new();
        let raw = value.as_object().unwrap_or(&empty);

        let root_raw = optional_string(field(raw, "ipcraeRoot", "ipcrae_root"))
            .unwrap_or_else(|| DEFAULT_ROOT.to_string());
        let ipcrae_root = match resolve_path {
            Some(resolve) if !root_raw.starts_with('~') => resolve(&root_raw),
            _ => expand_tilde(&root_raw),
        };

        Self {
            ipcrae_root,
            context_mode: ContextMode::parse(field(raw, "contextMode", "context_mode")),
            auto_journal: boolean(field(raw, "autoJournal", "auto_journal"), true),
            auto_capture: boolean(field(raw, "autoCapture", "auto_capture"), true),
            domain: optional_string(field(raw, "domain", "domain")),
            project_slug: optional_string(field(raw, "projectSlug", "project_slug"))
                .or_else(|| Some(DEFAULT_PROJECT_SLUG.to_string())),
            context_cache_ttl_ms: positive_number(
                field(raw, "contextCacheTtlMs", "context_cache_ttl_ms"),
                DEFAULT_CACHE_TTL_MS,
            ),
        }
    }

    /// Load a config from a TOML file, normalising it like a host value
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let value: Value = toml::from_str(&content)?;
        tracing::debug!("Loaded IPCRAE config from {}", path.display());
        Ok(Self::from_value(&value, None))
    }

    /// Cache TTL as a `Duration`
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.context_cache_ttl_ms)
    }
}

fn field<'a>(raw: &'a Map<String, Value>, camel: &str, snake: &str) -> Option<&'a Value> {
    raw.get(camel).or_else(|| raw.get(snake))
}

fn optional_string(value: Option<&Value>) -> Option<String> {
    let trimmed = value?.as_str()?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn boolean(value: Option<&Value>, fallback: bool) -> bool {
    value.and_then(Value::as_bool).unwrap_or(fallback)
}

fn positive_number(value: Option<&Value>, fallback: u64) -> u64 {
    match value.and_then(Value::as_f64) {
        Some(n) if n.is_finite() && n > 0.0 => n as u64,
        _ => fallback,
    }
}

/// Expand a leading `~` to the home directory
pub fn expand_tilde(input: &str) -> PathBuf {
    let home = || dirs_next::home_dir().unwrap_or_else(|| PathBuf::from("."));
    if input == "~" {
        home()
    } else if let Some(rest) = input.strip_prefix("~/") {
        home().join(rest)
    } else {
        PathBuf::from(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_config() {
        let config = IpcraeConfig::default();
        assert_eq!(config.context_mode, ContextMode::Compact);
        assert!(config.auto_journal);
        assert!(config.auto_capture);
        assert_eq!(config.domain, None);
        assert_eq!(config.project_slug.as_deref(), Some(DEFAULT_PROJECT_SLUG));
        assert_eq!(config.cache_ttl(), Duration::from_secs(300));
        assert!(config.ipcrae_root.ends_with("IPCRAE"));
    }

    #[test]
    fn test_non_object_value_uses_defaults() {
        let config = IpcraeConfig::from_value(&json!("nonsense"), None);
        assert_eq!(config, IpcraeConfig::default());
    }

    #[test]
    fn test_from_value_reads_fields() {
        let config = IpcraeConfig::from_value(
            &json!({
                "ipcraeRoot": "/vault",
                "contextMode": "full",
                "autoJournal": false,
                "autoCapture": false,
                "domain": "  devops ",
                "projectSlug": "demo",
                "contextCacheTtlMs": 1500
            }),
            None,
        );
        assert_eq!(config.ipcrae_root, PathBuf::from("/vault"));
        assert_eq!(config.context_mode, ContextMode::Full);
        assert!(!config.auto_journal);
        assert!(!config.auto_capture);
        assert_eq!(config.domain.as_deref(), Some("devops"));
        assert_eq!(config.project_slug.as_deref(), Some("demo"));
        assert_eq!(config.context_cache_ttl_ms, 1500);
    }

    #[test]
    fn test_wrong_types_fall_back_per_field() {
        let config = IpcraeConfig::from_value(
            &json!({
                "contextMode": "verbose",
                "autoJournal": "yes",
                "domain": "   ",
                "projectSlug": 42,
                "contextCacheTtlMs": -5
            }),
            None,
        );
        assert_eq!(config.context_mode, ContextMode::Compact);
        assert!(config.auto_journal);
        assert_eq!(config.domain, None);
        assert_eq!(config.project_slug.as_deref(), Some(DEFAULT_PROJECT_SLUG));
        assert_eq!(config.context_cache_ttl_ms, DEFAULT_CACHE_TTL_MS);
    }

    #[test]
    fn test_cache_ttl_accepts_any_positive_value() {
        let ttl = |raw: Value| {
            IpcraeConfig::from_value(&json!({ "contextCacheTtlMs": raw }), None)
                .context_cache_ttl_ms
        };
        assert_eq!(ttl(json!(0.5)), 0);
        assert_eq!(ttl(json!(1500.9)), 1500);
        assert_eq!(ttl(json!(0)), DEFAULT_CACHE_TTL_MS);
        assert_eq!(ttl(json!(-0.5)), DEFAULT_CACHE_TTL_MS);
    }

    #[test]
    fn test_config_serializes_to_toml() {
        let toml = toml::to_string_pretty(&IpcraeConfig::with_root("/vault")).unwrap();
        assert!(toml.contains("ipcraeRoot = \"/vault\""));
        assert!(toml.contains("contextMode = \"compact\""));
        assert!(toml.contains("contextCacheTtlMs = 300000"));
    }

    #[test]
    fn test_resolve_path_only_for_non_tilde_roots() {
        let resolver = |input: &str| PathBuf::from("/workspace").join(input);

        let config = IpcraeConfig::from_value(&json!({ "ipcraeRoot": "vault" }), Some(&resolver));
        assert_eq!(config.ipcrae_root, PathBuf::from("/workspace/vault"));

        let config =
            IpcraeConfig::from_value(&json!({ "ipcraeRoot": "~/notes" }), Some(&resolver));
        assert!(config.ipcrae_root.ends_with("notes"));
        assert!(!config.ipcrae_root.starts_with("/workspace"));
    }

    #[test]
    fn test_expand_tilde() {
        assert_eq!(expand_tilde("/abs/path"), PathBuf::from("/abs/path"));
        assert!(expand_tilde("~/IPCRAE").ends_with("IPCRAE"));
        assert!(!expand_tilde("~").to_string_lossy().contains('~'));
    }

    #[test]
    fn test_load_toml_snake_case() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("ipcrae.toml");
        std::fs::write(
            &path,
            "ipcrae_root = \"/srv/vault\"\ncontext_mode = \"minimal\"\ndomain = \"qa\"\ncontext_cache_ttl_ms = 2000\n",
        )
        .unwrap();

        let config = IpcraeConfig::load(&path).unwrap();
        assert_eq!(config.ipcrae_root, PathBuf::from("/srv/vault"));
        assert_eq!(config.context_mode, ContextMode::Minimal);
        assert_eq!(config.domain.as_deref(), Some("qa"));
        assert_eq!(config.context_cache_ttl_ms, 2000);
    }

    #[test]
    fn test_load_invalid_toml_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "ipcrae_root = [unterminated").unwrap();
        assert!(IpcraeConfig::load(&path).is_err());
    }
}
