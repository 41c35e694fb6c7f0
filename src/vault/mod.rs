//! Vault layout and low-level helpers
//!
//! All paths are derived from the vault root by a fixed relative layout:
//!
//! ```text
//! <root>/
//! ├── .ipcrae/
//! │   ├── context.md                       (required)
//! │   ├── instructions.md                  (required)
//! │   ├── state.json                       (optional)
//! │   └── prompts/core_ai_pretreatment_gate.md
//! ├── .ipcrae-project/local-notes/<YYYY-MM-DD>/openclaw.md
//! ├── Phases/index.md                      (required)
//! ├── Projets/<slug>/{index,tracking,memory}.md
//! ├── memory/<domain>.md
//! ├── Journal/Daily/<YYYY-MM-DD>/openclaw.md
//! ├── Inbox/idees/<timestamp>-<slug>.md
//! └── Knowledge/<YYYY-MM-DD>-<slug>.md
//! ```

pub mod fs;
pub mod layout;
pub mod text;

pub use layout::VaultLayout;
