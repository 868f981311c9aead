//! CLI Command Handlers
//!
//! Implements the watch and list-streams flows by calling the backend
//! services. Each handler takes the parsed CLI and Output, returns ExitCode.

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::airplay::{
    AirPlayReceiver, NoProgress, Outcome, ProgressReporter, Session, TimedBar,
};
use crate::api::{resolve_source, ContentProbe, ResolvedSource, Resolver, YtDlpResolver};
use crate::cli::{Cli, ExitCode, ListedStream, Output, WatchResponse};
use crate::config::{Config, RECEIVER_ENV};
use crate::error::WatchError;
use crate::models::PlaybackRequest;
use crate::select;

/// Run `fut` unless the user cancels first
async fn or_cancel<F: Future>(cancel: &CancellationToken, fut: F) -> Option<F::Output> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        out = fut => Some(out),
    }
}

/// Map a library error to a user message and exit code
pub fn report_error(err: &WatchError, url: &str, output: &Output) -> ExitCode {
    match err {
        WatchError::NoCompatibleStream => output.error(err.to_string(), ExitCode::NoStreams),
        WatchError::UnsupportedSource(_) => output.error(
            format!(
                "Unsupported video URL: {}\n\n\
                 If this URL contains a streamable video that you expect to work, \
                 please file an issue and include the full output from:\n\
                 airwatch --verbose {}",
                url, url
            ),
            ExitCode::UnsupportedSource,
        ),
        WatchError::Receiver(_) => output.error(err.to_string(), ExitCode::PlaybackFailed),
        WatchError::Resolver(_) => output.error(err.to_string(), ExitCode::Error),
        e if e.is_network() => output.error(e.to_string(), ExitCode::NetworkError),
        e => output.error(e.to_string(), ExitCode::Error),
    }
}

fn load_config(cli: &Cli) -> Config {
    match cli.config {
        Some(ref path) => Config::load_from(path),
        None => Config::load(),
    }
}

// =============================================================================
// List Streams Command
// =============================================================================

pub async fn list_streams_cmd<R: Resolver + ?Sized>(
    cli: &Cli,
    resolver: &R,
    output: &Output,
    cancel: &CancellationToken,
) -> ExitCode {
    output.info(format!("Resolving {}...", cli.url));

    let renditions = match or_cancel(cancel, resolver.resolve(&cli.url)).await {
        None => return ExitCode::Success,
        Some(Ok(r)) => r,
        Some(Err(e)) => return report_error(&e, &cli.url, output),
    };

    if renditions.is_empty() {
        return output.error("No streams found for this URL", ExitCode::NoStreams);
    }

    if output.json {
        let listed: Vec<ListedStream> = renditions
            .into_iter()
            .map(|rendition| ListedStream {
                compatible: select::is_compatible(&rendition),
                rendition,
            })
            .collect();
        if let Err(e) = output.print(&listed) {
            return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
        }
    } else {
        println!(
            "  {:<10} {:<5} {:<12} {:>9} {:<10}",
            "FORMAT", "EXT", "AUDIO", "BITRATE", "SIZE"
        );
        for rendition in &renditions {
            let marker = if select::is_compatible(rendition) { "✓" } else { " " };
            println!("{} {}", marker, rendition);
        }
    }

    ExitCode::Success
}

// =============================================================================
// Watch Command
// =============================================================================

pub async fn watch_cmd(cli: &Cli, output: &Output, cancel: &CancellationToken) -> ExitCode {
    let config = load_config(cli);

    let start = match cli.start_position() {
        Ok(s) => s,
        Err(e) => return output.error(e, ExitCode::InvalidArgs),
    };

    if cli.list_streams {
        return list_streams_cmd(cli, &YtDlpResolver::new(), output, cancel).await;
    }

    let Some(host) = config.receiver_address(cli.apple_tv.as_deref()) else {
        return output.error(
            format!(
                "Please provide your Apple TV's IP address with the `--apple-tv` option \
                 or by setting it in your environment with `export {}=<ip_address>`.",
                RECEIVER_ENV
            ),
            ExitCode::NoReceiver,
        );
    };

    // Step 1: Find the URL the receiver should fetch
    let media_url = if cli.direct {
        cli.url.clone()
    } else {
        let probe = ContentProbe::new();
        let resolver = YtDlpResolver::new();
        match or_cancel(cancel, resolve_source(&cli.url, &probe, &resolver)).await {
            None => return ExitCode::Success,
            Some(Ok(source)) => {
                if let ResolvedSource::Selected(ref r) = source {
                    output.info(format!("Selected: {}", r));
                }
                source.media_url().to_string()
            }
            Some(Err(e)) => return report_error(&e, &cli.url, output),
        }
    };

    // Step 2: Make sure the receiver is there
    let receiver = AirPlayReceiver::new(&host);
    match or_cancel(cancel, receiver.server_info()).await {
        None => return ExitCode::Success,
        Some(Ok(_)) => {}
        Some(Err(e)) => {
            return output.error(
                format!("Receiver at {} is not reachable: {}", host, e),
                ExitCode::NetworkError,
            )
        }
    }

    // Step 3: Play and follow progress
    output.info(format!("Playing on {}...", host));
    let reporter: Box<dyn ProgressReporter> = if output.show_progress() {
        Box::new(TimedBar::default())
    } else {
        Box::new(NoProgress)
    };
    let request = PlaybackRequest::new(&host, &media_url, start);
    let mut session = Session::new(receiver, reporter, config.session_config());

    match session.play(&request, cancel).await {
        Ok(outcome) => {
            let status = match outcome {
                Outcome::Finished => "finished",
                Outcome::Cancelled => "cancelled",
            };
            if output.json {
                let response = WatchResponse {
                    status: status.to_string(),
                    receiver: host,
                    stream_url: media_url,
                };
                if let Err(e) = output.print(&response) {
                    return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
                }
            }
            ExitCode::Success
        }
        Err(e) => report_error(&e, &cli.url, output),
    }
}
