//! Vault consistency status
//!
//! - [`cache`]: TTL read-through cache for vault text files
//! - [`snapshot`]: identity resolution and normal/degraded mode
//! - [`policy`]: write gate keyed on mode and write stability
//! - [`context`]: prompt context assembly from the vault

pub mod cache;
pub mod context;
pub mod policy;
pub mod snapshot;

pub use cache::TextCache;
pub use context::build_context;
pub use policy::{evaluate, WritePolicyResult, WriteStability};
pub use snapshot::{resolve_identity, CdeMode, Identity, SnapshotReader, StatusSnapshot};
