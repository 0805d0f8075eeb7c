//! Embargoes - developer CLI
//!
//! Runs access decisions and notices against a JSON fixture of the
//! content store.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use embargoes::{
    config::EmbargoConfig,
    embargo::{NodeId, ResourceRef},
    fixture::Fixture,
    notice::compose_messages,
    Principal,
};
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "embargoes")]
#[command(author = "LDbase Team")]
#[command(version)]
#[command(about = "Embargo resolution for protected content")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "EMBARGOES_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decide access to a resource
    Check {
        /// JSON fixture of the content store
        #[arg(short, long)]
        fixture: PathBuf,

        /// Resource as kind:id, e.g. node:1, file:2, media:3
        #[arg(short, long)]
        resource: ResourceRef,

        /// Requesting principal id; omit for an anonymous visitor
        #[arg(short, long)]
        principal: Option<u64>,

        /// Permission held by the principal (repeatable)
        #[arg(long = "permission")]
        permissions: Vec<String>,

        /// Evaluate as of this RFC 3339 instant instead of now
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },

    /// Show the embargo notification for a node
    Notice {
        /// JSON fixture of the content store
        #[arg(short, long)]
        fixture: PathBuf,

        /// Node id
        #[arg(short, long)]
        node: u64,

        /// Viewing principal id; omit for an anonymous visitor
        #[arg(short, long)]
        principal: Option<u64>,

        /// Evaluate as of this RFC 3339 instant instead of now
        #[arg(long)]
        at: Option<DateTime<Utc>>,
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
                .unwrap_or_else(|_| format!("embargoes={}", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = EmbargoConfig::load_or_default(cli.config.as_deref())
        .context("failed to load configuration")?;

    match cli.command {
        Commands::Check {
            fixture,
            resource,
            principal,
            permissions,
            at,
        } => {
            let principal = principal_from(principal, permissions);
            let now = at.unwrap_or_else(Utc::now);
            run_check(config, &fixture, resource, &principal, now).await?;
        }
        Commands::Notice {
            fixture,
            node,
            principal,
            at,
        } => {
            let principal = principal_from(principal, Vec::new());
            let now = at.unwrap_or_else(Utc::now);
            run_notice(config, &fixture, NodeId(node), &principal, now).await?;
        }
        Commands::Config { default } => {
            show_config(if default { None } else { Some(&config) })?;
        }
    }

    Ok(())
}

fn principal_from(id: Option<u64>, permissions: Vec<String>) -> Principal {
    let base = match id {
        Some(id) => Principal::new(id),
        None => Principal::anonymous(),
    };
    permissions
        .into_iter()
        .fold(base, |principal, permission| principal.with_permission(permission))
}

async fn run_check(
    config: EmbargoConfig,
    fixture: &Path,
    resource: ResourceRef,
    principal: &Principal,
    now: DateTime<Utc>,
) -> Result<()> {
    let seeded = Fixture::load(fixture)
        .await
        .with_context(|| format!("failed to load fixture {}", fixture.display()))?
        .seed()
        .await?;
    let engine = seeded.engine(config)?;

    let decision = engine
        .access(resource.kind())
        .is_actively_embargoed_at(resource, principal, now)
        .await?;
    let messages = compose_messages(&decision, &engine.config().messages);
    let requests = engine.access_request_targets_for(&decision).await;

    let output = json!({
        "decision": decision,
        "messages": messages,
        "access_requests": requests,
        "dependencies": decision.dependencies(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn run_notice(
    config: EmbargoConfig,
    fixture: &Path,
    node: NodeId,
    principal: &Principal,
    now: DateTime<Utc>,
) -> Result<()> {
    let seeded = Fixture::load(fixture)
        .await
        .with_context(|| format!("failed to load fixture {}", fixture.display()))?
        .seed()
        .await?;
    let engine = seeded.engine(config)?;

    let summary = engine.notice_summary_at(node, principal, now).await?;
    let messages = engine.notice_messages_at(node, principal, now).await?;

    let output = json!({
        "summary": summary,
        "messages": messages,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn show_config(config: Option<&EmbargoConfig>) -> Result<()> {
    let config = config.cloned().unwrap_or_default();
    let toml = toml::to_string_pretty(&config)?;
    println!("{}", toml);
    Ok(())
}
