//! PlayBuddy CLI - browse and administer the PlayBuddy events directory.
//!
//! Every read goes through the shared query cache, so a command that lists
//! events after a mutation sees fresh data, and an unreachable API falls
//! back to the last responses stored on disk.

mod commands;
mod context;
mod output;

use std::io;
use std::path::Path;

use anyhow::Result;
use clap::Parser;
use tracing::debug;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use context::Context;

/// Set to `1` to also write logs to a daily file in the cache directory
const LOG_FILE_ENV: &str = "PLAYBUDDY_LOG_FILE";

/// Prefix of the daily log files
const LOG_FILE_PREFIX: &str = "playbuddy.log";

#[derive(Debug, Parser)]
#[command(name = "playbuddy", version)]
#[command(about = "Browse and administer the PlayBuddy events directory", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: Global,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Base URL of the PlayBuddy API
    #[arg(long, global = true, env = "PLAYBUDDY_API_URL")]
    pub api_url: Option<String>,

    /// Print JSON instead of a table
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Debug, clap::Subcommand)]
pub enum Commands {
    /// List events
    Events {
        /// Include hidden, facilitator-only, non-NY and unapproved events
        #[arg(long)]
        admin: bool,
        /// Only events waiting for review
        #[arg(long, conflicts_with = "admin")]
        unapproved: bool,
    },
    /// List organizers
    Organizers,
    /// Show who saved which event
    Attendees {
        /// Only list the attendees of this event
        #[arg(long)]
        event: Option<i64>,
    },
    /// List the kinks catalog
    Kinks,
    /// List event import sources
    ImportSources {
        /// Include sources that are not approved yet
        #[arg(long)]
        all: bool,
    },
    /// Show the festival schedule (requires login)
    FestivalSchedule {
        /// Only sessions whose name, location or organizers match
        #[arg(long)]
        search: Option<String>,
    },
    /// List promo codes
    PromoCodes,
    /// Change an organizer
    #[command(subcommand)]
    Organizer(OrganizerCommand),
    /// Review or remove an import source
    #[command(subcommand)]
    ImportSource(ImportSourceCommand),
    /// Add the affiliate tag and a promo code to a ticket URL
    PromoUrl {
        url: String,
        code: String,
    },
    /// Store an access token for authenticated commands
    Login {
        #[arg(long, env = "PLAYBUDDY_TOKEN", hide_env_values = true)]
        token: String,
        #[arg(long)]
        user_id: String,
        #[arg(long)]
        email: Option<String>,
        /// Minutes until the token expires
        #[arg(long)]
        expires_in: Option<i64>,
    },
    /// Forget the stored access token
    Logout,
    /// Show login and cache status
    Status,
    /// Manage the offline response store
    #[command(subcommand)]
    Cache(CacheCommand),
}

#[derive(Debug, clap::Subcommand)]
pub enum OrganizerCommand {
    /// Update an organizer's fields
    Update {
        id: i64,
        #[arg(long)]
        hidden: Option<bool>,
        #[arg(long)]
        name: Option<String>,
    },
    /// Move all events of one organizer to another
    Merge {
        source: i64,
        target: i64,
        /// Keep the source organizer after moving its events
        #[arg(long)]
        keep_source: bool,
    },
    /// Delete all events of an organizer
    DeleteEvents {
        id: i64,
        #[arg(long)]
        only_without_attendees: bool,
    },
}

#[derive(Debug, clap::Subcommand)]
pub enum ImportSourceCommand {
    /// Mark an import source approved
    Approve { id: String },
    /// Delete an import source
    Delete { id: String },
}

#[derive(Debug, clap::Subcommand)]
pub enum CacheCommand {
    /// List stored responses
    List,
    /// Drop expired responses and enforce size limits
    Prune,
    /// Remove every stored response
    Clear,
}

/// Initialize the tracing subscriber for logging.
///
/// `RUST_LOG` controls the level (default `warn`). The returned guard
/// flushes the log file and must live until exit.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = context::load_config(&cli.global)?;
    let cache_dir = config.cache_dir()?;

    let log_to_file = std::env::var(LOG_FILE_ENV).is_ok_and(|v| v == "1");
    let _guard = init_tracing(log_to_file.then_some(cache_dir.as_path()));
    debug!(api_url = %config.api_url(), cache_dir = %cache_dir.display(), "Starting");

    let ctx = Context::new(config, cache_dir, cli.global.json)?;
    commands::run(&ctx, cli.command).await
}
