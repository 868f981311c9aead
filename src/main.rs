//! airwatch - Stream web videos to your Apple TV
//!
//! # Usage
//!
//! ```bash
//! export APPLE_TV_IP=192.168.1.20
//! airwatch https://vimeo.com/channels/staffpicks/157239808
//! airwatch https://streamable.com/4914 --start 00:01:30
//! airwatch https://www.youtube.com/watch?v=UfJ-i4Y6DGU --list-streams
//! ```

use clap::Parser;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use airwatch::airplay::progress::show_cursor;
use airwatch::cli::{Cli, ExitCode, LogLevel, Output};
use airwatch::commands;

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_level());

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_signal(cancel.clone()));

    let exit_code = run_cli(cli, &cancel).await;

    // Always restore the cursor, even after an interrupted progress bar
    show_cursor();
    exit_code.into()
}

/// Run the CLI and return exit code
async fn run_cli(cli: Cli, cancel: &CancellationToken) -> ExitCode {
    let output = Output::new(&cli);
    commands::watch_cmd(&cli, &output, cancel).await
}

/// Install the tracing subscriber. RUST_LOG takes precedence over the flags.
fn init_logging(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.directive()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Cancel the session on Ctrl+C or SIGTERM
async fn cancel_on_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::debug!("Shutdown signal received");
    cancel.cancel();
}
