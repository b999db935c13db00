//! Sim Console - terminal client for chat and notifications.

mod app;
mod terminal;

use std::convert::Infallible;
use std::path::PathBuf;

use chat_reconciler::{Destination, EntityId};
use clap::{ArgGroup, Parser, Subcommand};
use console_core::{init_logging, Config, LogFormat, Paths};

/// Sim console command-line interface.
#[derive(Parser)]
#[command(name = "sim-console")]
#[command(about = "Realtime chat and notification console")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error). Overrides the config file.
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Base directory for config and local storage. Defaults to ~/.sim-console
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Keep chat history in memory only
    #[arg(long, global = true)]
    ephemeral: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Sync history, then apply live updates until Ctrl-C
    Watch,
    /// Fetch and print conversations
    History,
    /// Send one message
    #[command(group(ArgGroup::new("destination").required(true).args(["user", "group"])))]
    Send {
        /// Recipient user id
        #[arg(long, value_parser = parse_id)]
        user: Option<EntityId>,
        /// Target group id
        #[arg(long, value_parser = parse_id)]
        group: Option<EntityId>,
        /// Message text
        text: String,
    },
    /// List notifications
    Notifications {
        /// Mark one notification read first
        #[arg(long, value_parser = parse_id)]
        mark_read: Option<EntityId>,
    },
}

/// Numeric ids go over the wire as numbers.
fn parse_id(raw: &str) -> Result<EntityId, Infallible> {
    raw.parse()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration
    let paths = match cli.base_dir {
        Some(base) => Paths::with_base_dir(base),
        None => Paths::new()?,
    };
    let config = Config::load(&paths)?;

    // Initialize logging
    let format = if cli.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };
    init_logging(cli.log_level.as_deref().unwrap_or(&config.log_level), format);

    let app = app::App::new(config, paths, cli.ephemeral);

    match cli.command {
        Some(Commands::Watch) | None => app.watch().await?,
        Some(Commands::History) => app.history().await?,
        Some(Commands::Send { user, group, text }) => {
            let destination = match group {
                Some(group) => Destination::Group(group),
                None => Destination::Direct(user.ok_or("--user or --group is required")?),
            };
            app.send(destination, &text).await?;
        }
        Some(Commands::Notifications { mark_read }) => {
            app.notifications(mark_read.as_ref()).await?;
        }
    }

    Ok(())
}
