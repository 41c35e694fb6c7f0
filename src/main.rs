//! IPCRAE - Vault consistency and sync for agent hosts
//!
//! Command-line host for the IPCRAE plugin: every subcommand goes through
//! the same surface an agent runtime would use.

use anyhow::Result;
use clap::{Parser, Subcommand};
use ipcrae::{
    notes::{KnowledgeEntry, PromoteRequest},
    plugin::{render_status, CommandContext, IpcraePlugin, SessionEndEvent},
    status::build_context,
    IpcraeConfig,
};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "ipcrae")]
#[command(version)]
#[command(about = "IPCRAE vault consistency and sync")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "IPCRAE_CONFIG")]
    config: Option<PathBuf>,

    /// Vault root, overrides the configuration
    #[arg(short, long, env = "IPCRAE_ROOT")]
    root: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show vault status and next fixes
    Status {
        /// Print the snapshot as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the prompt context for the current mode
    Context,

    /// Capture text into the inbox
    Capture {
        /// Text to capture
        #[arg(required = true)]
        text: Vec<String>,
    },

    /// Append a volatile local note
    Note {
        /// Note text
        #[arg(required = true)]
        text: Vec<String>,
    },

    /// Write a stable knowledge note
    Knowledge {
        /// Note body
        #[arg(required = true)]
        text: Vec<String>,

        /// Knowledge domain (defaults to the active domain)
        #[arg(long)]
        domain: Option<String>,

        /// Tag, repeatable (defaults to the domain)
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Source path, repeatable
        #[arg(long = "source")]
        sources: Vec<String>,

        /// Note title
        #[arg(long)]
        title: Option<String>,

        /// Allow a note without sources
        #[arg(long)]
        no_strict: bool,
    },

    /// Promote a local note file into stable knowledge
    Promote {
        /// Local note path
        path: String,

        /// Knowledge title
        #[arg(long)]
        title: Option<String>,
    },

    /// Sync the active project's index, tracking and memory
    Sync {
        /// Next action text
        action: Vec<String>,
    },

    /// Append a session entry to today's journal
    Journal {
        /// Session identifier
        #[arg(long)]
        session: String,

        /// Message count
        #[arg(long, default_value = "0")]
        messages: u64,

        /// Session duration in milliseconds
        #[arg(long)]
        duration_ms: Option<u64>,

        /// Agent identifier
        #[arg(long)]
        agent: Option<String>,
    },

    /// Show configuration
    Config {
        /// Show default configuration
        #[arg(long)]
        default: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("ipcrae={}", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(root) = cli.root {
        config.ipcrae_root = root;
    }

    let plugin = IpcraePlugin::new(config);
    let ctx = |text: Vec<String>| CommandContext {
        args: Some(text.join(" ")),
        channel: Some("cli".to_string()),
        sender_id: std::env::var("USER").ok(),
    };

    match cli.command {
        Commands::Status { json } => {
            let snapshot = plugin.snapshot().await;
            if json {
                println!("{}", serde_json::to_string_pretty(&snapshot_json(&snapshot))?);
            } else {
                println!("{}", render_status(plugin.config(), &snapshot));
            }
        }
        Commands::Context => {
            let context = build_context(plugin.config(), plugin.reader()).await;
            if context.is_empty() {
                anyhow::bail!(
                    "No context document under {}",
                    plugin.config().ipcrae_root.display()
                );
            }
            println!("{}", context);
        }
        Commands::Capture { text } => reply(&plugin, "capture", &ctx(text)).await,
        Commands::Note { text } => reply(&plugin, "capture-local", &ctx(text)).await,
        Commands::Knowledge {
            text,
            domain,
            tags,
            sources,
            title,
            no_strict,
        } => {
            let entry = KnowledgeEntry {
                text: text.join(" "),
                title,
                project_slug: None,
                domain,
                tags: if tags.is_empty() { None } else { Some(tags) },
                sources,
                strict: !no_strict,
            };
            let path = plugin.write_knowledge(entry).await?;
            println!("Knowledge note written to {}", path.display());
        }
        Commands::Promote { path, title } => {
            let promotion = plugin
                .promote(PromoteRequest {
                    title,
                    ..PromoteRequest::new(path)
                })
                .await?;
            println!(
                "Local note promoted to stable knowledge:\n- knowledge: {}\n- source: {}",
                promotion.knowledge_path.display(),
                promotion.source_path.display()
            );
        }
        Commands::Sync { action } => reply(&plugin, "ipcrae-sync", &ctx(action)).await,
        Commands::Journal {
            session,
            messages,
            duration_ms,
            agent,
        } => {
            let event = SessionEndEvent {
                session_id: session,
                message_count: messages,
                duration_ms,
            };
            let path = plugin.write_journal(&event, agent.as_deref()).await?;
            println!("Journal entry appended to {}", path.display());
        }
        Commands::Config { default } => {
            show_config(if default { None } else { Some(plugin.config()) })?;
        }
    }

    Ok(())
}

/// Explicit path, else `<config dir>/ipcrae/config.toml` when present, else defaults
fn load_config(path: Option<&std::path::Path>) -> Result<IpcraeConfig> {
    if let Some(path) = path {
        return Ok(IpcraeConfig::load(path)?);
    }
    let default_path = dirs_next::config_dir().map(|p| p.join("ipcrae").join("config.toml"));
    match default_path {
        Some(path) if path.exists() => Ok(IpcraeConfig::load(&path)?),
        _ => Ok(IpcraeConfig::default()),
    }
}

async fn reply(plugin: &IpcraePlugin, command: &str, ctx: &CommandContext) {
    println!("{}", plugin.handle_command(command, ctx).await.text);
}

fn snapshot_json(snapshot: &ipcrae::StatusSnapshot) -> serde_json::Value {
    serde_json::json!({
        "cdeMode": snapshot.cde_mode(),
        "domain": snapshot.domain,
        "projectSlug": snapshot.project_slug,
        "contextPath": snapshot.context_path,
        "instructionsPath": snapshot.instructions_path,
        "phaseIndexPath": snapshot.phase_index_path,
        "projectTrackingPath": snapshot.project_tracking_path,
        "missingRequiredPaths": snapshot.missing_required_paths,
        "phaseSummary": snapshot.phase_summary,
        "projectTrackingSummary": snapshot.project_tracking_summary,
    })
}

fn show_config(config: Option<&IpcraeConfig>) -> Result<()> {
    let config = config.cloned().unwrap_or_default();
    let toml = toml::to_string_pretty(&config)?;
    println!("{}", toml);
    Ok(())
}
