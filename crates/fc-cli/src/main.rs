//! CLI entry point for the file-courier agent.
//!
//! Watches one directory and copies newly created files with matching
//! extensions into a target directory once they have finished being written.
//!
//! # Usage
//!
//! ```bash
//! # Run the agent in the foreground (same as `file-courier run`)
//! file-courier --config /etc/file-courier/config.json
//!
//! # Validate the configuration and both directories, then exit
//! file-courier check --config config.json
//! ```
//!
//! The process runs until SIGINT (Ctrl-C) or, on Unix, SIGTERM. Service
//! managers supervise it as a plain foreground process.

#![deny(clippy::all)]
#![warn(missing_docs)]

use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use color_eyre::eyre::WrapErr;
use fc_agent::Agent;
use fc_core::AgentConfig;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// CLI ARGUMENT TYPES
// =============================================================================

/// Watches a directory and copies new files to a target directory.
#[derive(Parser)]
#[command(name = "file-courier", version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Command to execute. Defaults to `run`.
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to the JSON configuration file.
    #[arg(short, long, global = true, env = "FILE_COURIER_CONFIG", default_value = "config.json")]
    config: Utf8PathBuf,

    /// Path to the append-only log file.
    #[arg(long, global = true, env = "FILE_COURIER_LOG", default_value = "service.log")]
    log_file: Utf8PathBuf,

    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
}

/// Available subcommands.
#[derive(Clone, Copy, Subcommand)]
enum Commands {
    /// Watch and copy until interrupted.
    Run,

    /// Validate the configuration and directories without watching.
    Check,
}

// =============================================================================
// INITIALIZATION FUNCTIONS
// =============================================================================

/// Initializes the tracing subscriber: console plus the log file.
///
/// Respects `RUST_LOG` if set. Otherwise uses `debug` with `--verbose` and
/// `info` by default, with `notify` held at `warn`. If the log file cannot
/// be opened, logging continues on the console only and the failure is
/// logged once the subscriber is up.
///
/// The returned guard flushes the file writer on drop and must be held for
/// the life of the process.
fn init_tracing(log_file: &Utf8Path, verbose: bool, no_color: bool) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if verbose { "debug" } else { "info" };
        EnvFilter::new(format!("{level},notify=warn"))
    });

    // Check if colors should be disabled (flag or NO_COLOR env var)
    let use_ansi = !no_color && std::env::var("NO_COLOR").is_err();

    let (file_layer, guard, file_error) = match open_log_file(log_file) {
        Ok(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard), None)
        }
        Err(err) => (None, None, Some(err)),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_ansi(use_ansi))
        .with(file_layer)
        .init();

    if let Some(err) = file_error {
        warn!(path = %log_file, error = %err, "Cannot open log file, logging to console only");
    }

    guard
}

/// Opens `path` for appending without rotation.
fn open_log_file(
    path: &Utf8Path,
) -> Result<RollingFileAppender, tracing_appender::rolling::InitError> {
    let directory = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    let file_name = path.file_name().unwrap_or("service.log");

    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(directory)
}

/// Loads the configuration file, logging the failure.
fn load_config(path: &Utf8Path) -> color_eyre::Result<AgentConfig> {
    AgentConfig::load(path)
        .inspect_err(|err| error!(path = %path, error = %err, "Failed to load configuration"))
        .wrap_err_with(|| format!("Failed to load configuration from {path}"))
}

// =============================================================================
// COMMAND IMPLEMENTATIONS
// =============================================================================

/// Runs the agent until a shutdown signal arrives.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or the agent
/// fails to start.
async fn run_agent(config_path: &Utf8Path) -> color_eyre::Result<()> {
    let config = load_config(config_path)?;
    info!(path = %config_path, "Configuration loaded");

    let running = Agent::new(config)
        .start()
        .await
        .inspect_err(|err| error!(phase = err.phase(), error = %err, "Agent failed to start"))?;

    let shutdown = CancellationToken::new();
    tokio::spawn(cancel_on_signal(shutdown.clone()));

    let summary = running.run(shutdown).await;
    if !summary.is_clean() {
        warn!(
            failed = summary.failed,
            unstable = summary.unstable,
            dropped = summary.dropped,
            "Some files were not copied"
        );
    }

    Ok(())
}

/// Cancels `shutdown` on Ctrl-C or, on Unix, SIGTERM.
async fn cancel_on_signal(shutdown: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    result = tokio::signal::ctrl_c() => log_ctrl_c(result),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
                }
            }
            Err(err) => {
                warn!(error = %err, "Cannot listen for SIGTERM, only Ctrl-C will stop the agent");
                log_ctrl_c(tokio::signal::ctrl_c().await);
            }
        }
    }

    #[cfg(not(unix))]
    {
        log_ctrl_c(tokio::signal::ctrl_c().await);
    }

    shutdown.cancel();
}

fn log_ctrl_c(result: std::io::Result<()>) {
    match result {
        Ok(()) => info!("Received Ctrl-C, shutting down"),
        Err(err) => error!(error = %err, "Failed to listen for Ctrl-C, shutting down"),
    }
}

/// Validates the configuration and both directories, then prints a summary.
///
/// Does not mount the remote target or open a watcher.
///
/// # Errors
///
/// Returns an error if loading or any validation step fails.
fn run_check(config_path: &Utf8Path) -> color_eyre::Result<()> {
    let config = load_config(config_path)?;
    config
        .validate()
        .and_then(|()| config.validate_directories())
        .inspect_err(|err| error!(error = %err, "Configuration check failed"))?;

    if config.file_extensions.is_empty() {
        warn!("No file extensions configured, nothing will be copied");
    } else if config.file_extensions.iter().any(String::is_empty) {
        warn!("An empty file extension is configured, every new file will be copied");
    }

    print_config_summary(config_path, &config)?;
    Ok(())
}

// =============================================================================
// OUTPUT HELPERS
// =============================================================================

/// Prints the validated configuration.
fn print_config_summary(path: &Utf8Path, config: &AgentConfig) -> std::io::Result<()> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    let transfer = &config.transfer;

    writeln!(handle, "Configuration OK: {path}")?;
    writeln!(handle)?;
    writeln!(handle, "  Watch directory:   {}", config.watch_directory)?;
    writeln!(handle, "  Target directory:  {}", config.target_directory)?;
    writeln!(handle, "  Extensions:        {}", config.file_extensions.join(" "))?;
    writeln!(
        handle,
        "  Remote mount:      {}",
        config
            .remote_credentials()
            .map_or_else(|| "no".to_owned(), |creds| format!("yes (user {})", creds.user))
    )?;
    writeln!(handle)?;
    writeln!(handle, "  Poll interval:     {} ms", transfer.poll_interval_ms)?;
    writeln!(handle, "  Stabilize timeout: {} ms", transfer.stabilization_timeout_ms)?;
    writeln!(handle, "  Copy attempts:     {}", transfer.max_attempts)?;
    writeln!(handle, "  Retry delay:       {} ms", transfer.retry_delay_ms)?;
    writeln!(handle, "  Pending limit:     {}", transfer.max_pending_transfers)?;
    Ok(())
}

// =============================================================================
// MAIN ENTRY POINT
// =============================================================================

/// Application entry point.
#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    // 1. Install color-eyre FIRST (before any potential panics)
    color_eyre::install()?;

    // 2. Parse CLI arguments
    let cli = Cli::parse();

    // 3. Initialize tracing; the guard flushes the log file on exit
    let _log_guard = init_tracing(&cli.log_file, cli.verbose, cli.no_color);

    // 4. Route to the selected command
    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_agent(&cli.config).await,
        Commands::Check => run_check(&cli.config),
    }
}
