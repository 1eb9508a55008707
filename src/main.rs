//! Binary entry point for keyword-notifier.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stdout and print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
#![allow(clippy::multiple_crate_versions)]

use clap::{Parser, Subcommand};
use keyword_notifier::cli;
use keyword_notifier::config::AppConfig;
use keyword_notifier::models::{ChannelId, ServerId, UserId};
use keyword_notifier::observability::{self, ObservabilityConfig};
use keyword_notifier::platform::{ChannelCatalog, StaticDirectory};
use keyword_notifier::services::SubscriptionService;
use keyword_notifier::storage::{SqliteSubscriptionBackend, SubscriptionBackend};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

/// Keyword notifier - DM users when their keywords appear in chat.
#[derive(Parser)]
#[command(name = "keyword-notifier")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true, env = "KEYWORD_BOT_CONFIG_PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Track a keyword in one channel.
    AddChannel {
        /// Requesting user id.
        #[arg(long)]
        user: UserId,
        /// Server id.
        #[arg(long)]
        server: ServerId,
        /// Channel id.
        #[arg(long)]
        channel: ChannelId,
        /// Platform directory file (TOML).
        #[arg(long)]
        directory: PathBuf,
        /// Keyword to track.
        keyword: String,
    },

    /// Track a keyword in every accessible channel of a server.
    AddServer {
        /// Requesting user id.
        #[arg(long)]
        user: UserId,
        /// Server id.
        #[arg(long)]
        server: ServerId,
        /// Keyword to track.
        keyword: String,
    },

    /// List your keywords in a server.
    List {
        /// Requesting user id.
        #[arg(long)]
        user: UserId,
        /// Server id.
        #[arg(long)]
        server: ServerId,
        /// Platform directory file, for channel names.
        #[arg(long)]
        directory: Option<PathBuf>,
    },

    /// Stop tracking a keyword in a server (all scopes).
    Remove {
        /// Requesting user id.
        #[arg(long)]
        user: UserId,
        /// Server id.
        #[arg(long)]
        server: ServerId,
        /// Keyword to remove.
        keyword: String,
    },

    /// Run recorded messages through the watcher.
    Replay {
        /// Platform directory file (TOML).
        #[arg(long)]
        directory: PathBuf,
        /// Messages file (JSON Lines).
        #[arg(long)]
        messages: PathBuf,
    },

    /// Manage configuration.
    Config {
        /// Show current configuration.
        #[arg(long)]
        show: bool,
    },
}

/// Main entry point.
#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match AppConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    let observability =
        match observability::init(ObservabilityConfig::from_app_config(&config, cli.verbose)) {
            Ok(handle) => handle,
            Err(e) => {
                eprintln!("Failed to initialize observability: {e}");
                return ExitCode::FAILURE;
            },
        };
    tracing::debug!(
        log_file = ?observability.log_file(),
        metrics = observability.metrics().is_some(),
        "Observability initialized"
    );

    match run_command(cli.command, &config).await {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        },
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        },
    }
}

/// Runs the selected command and returns its output.
async fn run_command(command: Commands, config: &AppConfig) -> keyword_notifier::Result<String> {
    match command {
        Commands::AddChannel {
            user,
            server,
            channel,
            directory,
            keyword,
        } => {
            let directory = StaticDirectory::load(&directory)?;
            let service = subscription_service(config)?;
            cli::cmd_add_channel(&service, &directory, user, server, channel, &keyword).await
        },
        Commands::AddServer {
            user,
            server,
            keyword,
        } => cli::cmd_add_server(&subscription_service(config)?, user, server, &keyword),
        Commands::List {
            user,
            server,
            directory,
        } => {
            let directory = directory.as_deref().map(StaticDirectory::load).transpose()?;
            let catalog = directory.as_ref().map(|d| d as &dyn ChannelCatalog);
            cli::cmd_list(&subscription_service(config)?, catalog, user, server)
        },
        Commands::Remove {
            user,
            server,
            keyword,
        } => cli::cmd_remove(&subscription_service(config)?, user, server, &keyword),
        Commands::Replay {
            directory,
            messages,
        } => {
            let directory = Arc::new(StaticDirectory::load(&directory)?);
            cli::cmd_replay(
                open_store(&config.db_path)?,
                directory,
                &messages,
                config.identity_cache_capacity,
            )
            .await
        },
        Commands::Config { show } => {
            if show {
                Ok(cli::cmd_config_show(config))
            } else {
                Ok("Use --show to display the current configuration.".to_string())
            }
        },
    }
}

fn open_store(path: &Path) -> keyword_notifier::Result<Arc<dyn SubscriptionBackend>> {
    Ok(Arc::new(SqliteSubscriptionBackend::new(path)?))
}

fn subscription_service(config: &AppConfig) -> keyword_notifier::Result<SubscriptionService> {
    Ok(SubscriptionService::new(open_store(&config.db_path)?)
        .with_limit(config.max_keywords_per_server))
}
