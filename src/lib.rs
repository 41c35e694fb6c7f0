//! IPCRAE - Vault consistency and sync for agent hosts
//!
//! IPCRAE keeps a file-backed knowledge vault coherent while an agent host
//! reads from it and writes into it. A cached snapshot of the vault decides
//! whether the vault is in normal or degraded mode; a write policy uses that
//! mode to allow or block stable writes; note writers and the project
//! synchronizer persist captures, knowledge and project artifacts.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Host (CLI / agent runtime)                │
//! │        commands: capture, capture-local, promote-note,        │
//! │        ipcrae-sync, ipcrae-status   events: prompt, session   │
//! └───────────────────────────────┬──────────────────────────────┘
//!                                 │
//! ┌───────────────────────────────▼──────────────────────────────┐
//! │                         IpcraePlugin                          │
//! │  ┌──────────────────┐   ┌──────────────┐   ┌──────────────┐  │
//! │  │ Snapshot Reader  │──▶│ Write Policy │──▶│ Note Writers │  │
//! │  │  (TTL TextCache) │   │  (CDE mode)  │   │ Project Sync │  │
//! │  └──────────────────┘   └──────────────┘   └──────┬───────┘  │
//! └───────────────────────────────────────────────────┼──────────┘
//!                                                     │
//!                        ┌────────────────────────────▼─────────┐
//!                        │  Vault: .ipcrae/, Phases/, Projets/,  │
//!                        │  Inbox/, Knowledge/, Journal/, memory/ │
//!                        └──────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`config`]: Plugin configuration and host value resolution
//! - [`error`]: Error types
//! - [`vault`]: Vault layout, text helpers and file primitives
//! - [`status`]: Text cache, snapshot, write policy and prompt context
//! - [`notes`]: Inbox captures, local notes, journal, knowledge and promotion
//! - [`sync`]: Managed-block merge and project artifact sync
//! - [`plugin`]: Command and event surface for hosts

pub mod config;
pub mod error;
pub mod notes;
pub mod plugin;
pub mod status;
pub mod sync;
pub mod vault;

pub use config::{ContextMode, IpcraeConfig};
pub use error::{Error, Result};
pub use plugin::{CommandContext, CommandReply, IpcraePlugin, SessionEndEvent};
pub use status::{CdeMode, SnapshotReader, StatusSnapshot, TextCache};
