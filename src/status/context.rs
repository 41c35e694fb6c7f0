//! Prompt context assembly
//!
//! Builds the markdown block prepended to an agent prompt from the vault's
//! global context, instructions, rule-zero prompt, domain memory and the
//! snapshot summaries. Compact mode truncates each section to a budget.

use super::snapshot::SnapshotReader;
use crate::config::{ContextMode, IpcraeConfig};
use crate::vault::text::truncate_text;
use crate::vault::VaultLayout;
use futures::future::OptionFuture;

const RULE_ZERO_BUDGET: usize = 1200;
const INSTRUCTIONS_BUDGET: usize = 1200;
const GLOBAL_CONTEXT_BUDGET: usize = 2200;
const DOMAIN_MEMORY_BUDGET: usize = 1400;

/// `## <title>\n<body>` or `None` when the body is absent or blank
fn section(title: &str, body: Option<&str>) -> Option<String> {
    let trimmed = body?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(format!("## {}\n{}", title, trimmed))
    }
}

/// Build the prompt context for `config`.
///
/// Returns an empty string when the global context document is missing.
pub async fn build_context(config: &IpcraeConfig, reader: &SnapshotReader) -> String {
    let layout = VaultLayout::new(&config.ipcrae_root);
    let ttl = config.cache_ttl();

    let Some(context_md) = reader.read_text(&layout.context_path(), ttl).await else {
        return String::new();
    };

    if config.context_mode == ContextMode::Minimal {
        return [
            Some("# IPCRAE Context (minimal)".to_string()),
            section(
                "Global Context",
                Some(truncate_text(context_md.trim(), GLOBAL_CONTEXT_BUDGET).as_str()),
            ),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join("\n\n");
    }

    let status = reader.resolve(config).await;
    let domain = status.domain.as_deref();
    let memory_path = domain.map(|d| layout.domain_memory_path(d));
    let rule_zero_path = layout.rule_zero_path();
    let instructions_path = layout.instructions_path();

    let (rule_zero, instructions, domain_memory) = tokio::join!(
        reader.read_text(&rule_zero_path, ttl),
        reader.read_text(&instructions_path, ttl),
        OptionFuture::from(memory_path.as_deref().map(|p| reader.read_text(p, ttl))),
    );
    let domain_memory = domain_memory.flatten();

    let compact = config.context_mode == ContextMode::Compact;
    let budget = |text: Option<String>, max: usize| -> Option<String> {
        if compact {
            text.map(|t| truncate_text(&t, max))
        } else {
            text
        }
    };

    let memory_title = match domain {
        Some(d) => format!("Domain Memory ({})", d),
        None => "Domain Memory".to_string(),
    };
    let tracking_title = match status.project_slug.as_deref() {
        Some(slug) => format!("Project Tracking ({})", slug),
        None => "Project Tracking".to_string(),
    };
    let global_context = if compact {
        truncate_text(context_md.trim(), GLOBAL_CONTEXT_BUDGET)
    } else {
        context_md
    };

    [
        Some("# IPCRAE Context".to_string()),
        section("Rule 0", budget(rule_zero, RULE_ZERO_BUDGET).as_deref()),
        section(
            "Instructions",
            budget(instructions, INSTRUCTIONS_BUDGET).as_deref(),
        ),
        section("Global Context", Some(global_context.as_str())),
        section(
            &memory_title,
            budget(domain_memory, DOMAIN_MEMORY_BUDGET).as_deref(),
        ),
        section("Active Phase", status.phase_summary.as_deref()),
        section(&tracking_title, status.project_tracking_summary.as_deref()),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join("\n\n")
}
