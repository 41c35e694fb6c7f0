//! Project artifact synchronization
//!
//! - [`managed_block`]: marker-delimited regions and their merge
//! - [`commit`]: ordered multi-file replacement with partial-failure reporting
//! - [`artifacts`]: `Projets/<slug>/` index, tracking and memory files

pub mod artifacts;
pub mod commit;
pub mod managed_block;

pub use artifacts::{
    stage_project_artifacts, sync_project_artifacts, ProjectArtifacts, ProjectSyncEntry,
    MEMORY_BLOCK_ID, TRACKING_BLOCK_ID,
};
pub use commit::SyncCommit;
pub use managed_block::{BlockRegion, ManagedBlock};
