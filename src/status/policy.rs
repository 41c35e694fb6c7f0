//! Write policy gate
//!
//! Volatile writes (inbox captures, local notes, journal entries) are always
//! allowed. Stable writes (knowledge notes, promotions, project sync) require
//! the vault to be in normal mode.

use super::snapshot::{CdeMode, StatusSnapshot};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Stability class of a write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteStability {
    /// Transient material, allowed even in degraded mode
    Volatile,
    /// Curated vault content, requires normal mode
    Stable,
}

/// Outcome of a policy evaluation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WritePolicyResult {
    /// Whether the write may proceed
    pub allowed: bool,
    /// Why the write was denied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl WritePolicyResult {
    fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    fn deny(reason: String) -> Self {
        Self {
            allowed: false,
            reason: Some(reason),
        }
    }
}

/// Evaluate a write of the given stability against a snapshot
pub fn evaluate(snapshot: &StatusSnapshot, stability: WriteStability) -> WritePolicyResult {
    evaluate_mode(
        snapshot.cde_mode(),
        &snapshot.missing_required_paths,
        stability,
    )
}

/// Evaluate against a bare mode and missing-path list
pub fn evaluate_mode(
    mode: CdeMode,
    missing_required_paths: &[PathBuf],
    stability: WriteStability,
) -> WritePolicyResult {
    if stability == WriteStability::Volatile || mode == CdeMode::Normal {
        return WritePolicyResult::allow();
    }

    let missing = if missing_required_paths.is_empty() {
        "unknown prerequisites".to_string()
    } else {
        missing_required_paths
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    };

    WritePolicyResult::deny(format!(
        "IPCRAE write policy blocked: CDE mode is degraded. Missing required files: {}. \
         Use /capture-local for volatile notes, then restore required CDE files before stable writes.",
        missing
    ))
}
