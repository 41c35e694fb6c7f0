//! Fixed relative layout of an IPCRAE vault

use std::path::{Path, PathBuf};

const IPCRAE_DIR: &str = ".ipcrae";
const LOCAL_PROJECT_DIR: &str = ".ipcrae-project";
const SESSION_FILE: &str = "openclaw.md";

/// Path derivation for a vault rooted at a directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultLayout {
    root: PathBuf,
}

impl VaultLayout {
    /// Create a layout for the given vault root
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Vault root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Global context document (required)
    pub fn context_path(&self) -> PathBuf {
        self.root.join(IPCRAE_DIR).join("context.md")
    }

    /// Instructions document (required)
    pub fn instructions_path(&self) -> PathBuf {
        self.root.join(IPCRAE_DIR).join("instructions.md")
    }

    /// Structured state document
    pub fn state_path(&self) -> PathBuf {
        self.root.join(IPCRAE_DIR).join("state.json")
    }

    /// Pre-treatment gate prompt, used for context assembly only
    pub fn rule_zero_path(&self) -> PathBuf {
        self.root
            .join(IPCRAE_DIR)
            .join("prompts")
            .join("core_ai_pretreatment_gate.md")
    }

    /// Phase index document (required)
    pub fn phase_index_path(&self) -> PathBuf {
        self.root.join("Phases").join("index.md")
    }

    /// Directory holding a project's artifacts
    pub fn project_dir(&self, project_slug: &str) -> PathBuf {
        self.root.join("Projets").join(project_slug)
    }

    /// Project index, regenerated wholesale by sync
    pub fn project_index_path(&self, project_slug: &str) -> PathBuf {
        self.project_dir(project_slug).join("index.md")
    }

    /// Project tracking, merged by sync
    pub fn project_tracking_path(&self, project_slug: &str) -> PathBuf {
        self.project_dir(project_slug).join("tracking.md")
    }

    /// Project memory, merged by sync
    pub fn project_memory_path(&self, project_slug: &str) -> PathBuf {
        self.project_dir(project_slug).join("memory.md")
    }

    /// Read-only memory for a domain
    pub fn domain_memory_path(&self, domain: &str) -> PathBuf {
        self.root.join("memory").join(format!("{}.md", domain))
    }

    /// Per-day session journal
    pub fn journal_path(&self, ymd: &str) -> PathBuf {
        self.root
            .join("Journal")
            .join("Daily")
            .join(ymd)
            .join(SESSION_FILE)
    }

    /// Inbox capture directory
    pub fn inbox_dir(&self) -> PathBuf {
        self.root.join("Inbox").join("idees")
    }

    /// Per-day local working notes
    pub fn local_notes_path(&self, ymd: &str) -> PathBuf {
        self.root
            .join(LOCAL_PROJECT_DIR)
            .join("local-notes")
            .join(ymd)
            .join(SESSION_FILE)
    }

    /// Stable knowledge directory
    pub fn knowledge_dir(&self) -> PathBuf {
        self.root.join("Knowledge")
    }

    /// The files whose absence puts the vault in degraded mode
    pub fn required_paths(&self) -> [PathBuf; 3] {
        [
            self.context_path(),
            self.instructions_path(),
            self.phase_index_path(),
        ]
    }
}
