//! MyGov archiver: binary entrypoint.
//! Loads config, wires the real collaborators and runs one workflow.

use anyhow::Result;
use clap::{Parser, Subcommand};
use mygov_archiver::{ArchiveConfig, Archiver, LatestReport};
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "mygov-archiver", about = "Keep a local archive of weekly MyGov issues complete")]
#[command(version)]
struct Cli {
    /// Config file (falls back to $ARCHIVER_CONFIG_PATH, then config/archiver.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Cancel the run after this many seconds
    #[arg(long, global = true)]
    deadline_secs: Option<u64>,

    /// Emit JSON log lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Download the newest listed issue if it is not held yet
    Latest,
    /// Download every missing scheduled issue, searching the web for unlisted ones
    Backfill,
    /// Show which scheduled issues are held, listed, or unaccounted for
    Plan,
    /// List issues held locally
    List,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("mygov_archiver=info,warn"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

/// Ctrl-C and the optional deadline both cancel the same token.
fn cancellation(deadline: Option<u64>) -> CancellationToken {
    let token = CancellationToken::new();

    let on_signal = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received; cancelling run");
            on_signal.cancel();
        }
    });

    if let Some(secs) = deadline {
        let on_deadline = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            tracing::warn!(secs, "deadline reached; cancelling run");
            on_deadline.cancel();
        });
    }
    token
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present; secrets (SMTP_*, SERPER_API_KEY) usually live there.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let cfg = ArchiveConfig::load(cli.config.as_deref())?;
    let archiver = Archiver::from_config(cfg).await?;
    let cancel = cancellation(cli.deadline_secs);

    match cli.command {
        Command::Latest => match archiver.check_latest(&cancel).await? {
            LatestReport::NoneFound => println!("No current issue found."),
            LatestReport::AlreadyPresent { filename } => println!("Already downloaded: {filename}"),
            LatestReport::Downloaded { filename, url } => println!("Downloaded: {filename} <- {url}"),
            LatestReport::Failed { filename, reason } => {
                println!("Failed to download {filename}: {reason}")
            }
            LatestReport::Cancelled => println!("Cancelled."),
        },
        Command::Backfill => {
            let report = archiver.backfill(&cancel).await?;
            for name in &report.downloaded {
                println!("downloaded  {name}");
            }
            for (name, reason) in &report.failed {
                println!("failed      {name} ({reason})");
            }
            for name in &report.no_link {
                println!("no link     {name}");
            }
            println!("{}", report.summary());
        }
        Command::Plan => {
            let plan = archiver.plan(&cancel).await?;
            for issue in &plan.resolved {
                println!("listed      {} <- {}", issue.filename, issue.url.as_deref().unwrap_or_default());
            }
            for issue in &plan.unresolved {
                println!("unlisted    {}", issue.filename);
            }
            println!(
                "expected {}, held {}, listed {}, unlisted {}",
                plan.expected(),
                plan.satisfied.len(),
                plan.resolved.len(),
                plan.unresolved.len()
            );
        }
        Command::List => {
            let inventory = archiver.storage().list().await?;
            for name in inventory.sorted() {
                println!("{name}");
            }
            println!("{} file(s)", inventory.len());
        }
    }
    Ok(())
}
