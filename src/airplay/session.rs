//! Playback session
//!
//! Drives one playback on one receiver: sends the play request, polls the
//! position until the receiver goes idle again, keeps the play connection
//! alive and issues a deferred seek once playback is underway. Everything
//! runs in a single loop; the keep-alive and the seek are decided from the
//! result of the latest poll.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::connection::ControlConnection;
use super::progress::ProgressReporter;
use super::receiver::Receiver;
use crate::error::Result;
use crate::models::{PlaybackRequest, PositionSample};

/// Default delay between position polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Default delay between keep-alive probes
pub const DEFAULT_KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(10);

/// Ticks emitted in one go before yielding back to the runtime
const TICK_BATCH: u64 = 1024;

/// Timing knobs for a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub poll_interval: Duration,
    pub keep_alive_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            keep_alive_interval: DEFAULT_KEEP_ALIVE_INTERVAL,
        }
    }
}

/// Deferred seek progress. Only moves forward: NotRequested stays put,
/// Pending becomes Issued after the first confirmed position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekState {
    NotRequested,
    Pending(u64),
    Issued(u64),
}

impl SeekState {
    fn from_request(target: Option<u64>) -> Self {
        match target {
            Some(secs) => SeekState::Pending(secs),
            None => SeekState::NotRequested,
        }
    }
}

/// Mutable state of one `play` call
#[derive(Debug, Clone)]
pub struct PlaybackState {
    /// A position was reported at least once
    pub has_started: bool,
    pub seek: SeekState,
    pub last_keep_alive: Instant,
    /// Last whole second forwarded to the progress reporter
    pub last_whole_second: u64,
}

impl PlaybackState {
    pub fn new(deferred_seek: Option<u64>) -> Self {
        Self {
            has_started: false,
            seek: SeekState::from_request(deferred_seek),
            last_keep_alive: Instant::now(),
            last_whole_second: 0,
        }
    }
}

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The receiver played the media and went idle
    Finished,
    /// The caller cancelled the session
    Cancelled,
}

/// Playback session against a single receiver
pub struct Session<R, P> {
    receiver: R,
    reporter: P,
    config: SessionConfig,
}

impl<R: Receiver, P: ProgressReporter> Session<R, P> {
    pub fn new(receiver: R, reporter: P, config: SessionConfig) -> Self {
        Self {
            receiver,
            reporter,
            config,
        }
    }

    /// Play `request` until the receiver reports playback has ended.
    ///
    /// A lost connection while polling is returned as an error; it is not
    /// retried. The play connection is closed exactly once on every path.
    pub async fn play(
        &mut self,
        request: &PlaybackRequest,
        cancel: &CancellationToken,
    ) -> Result<Outcome> {
        let fraction = request.start.play_fraction();
        info!("Streaming: {}", request.url);

        let mut connection = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(Outcome::Cancelled),
            conn = self.receiver.open_play(&request.url, fraction) => conn?,
        };

        let mut state = PlaybackState::new(request.start.deferred_seek());
        let result = self.poll_loop(&mut connection, &mut state, cancel).await;

        if let Err(e) = connection.close().await {
            warn!("Failed to close play connection: {}", e);
        }
        self.reporter.on_complete();

        match &result {
            Ok(outcome) => debug!("Session ended: {:?}", outcome),
            Err(e) => warn!("Session aborted: {}", e),
        }
        result
    }

    async fn poll_loop(
        &mut self,
        connection: &mut R::Connection,
        state: &mut PlaybackState,
        cancel: &CancellationToken,
    ) -> Result<Outcome> {
        loop {
            let sample = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(Outcome::Cancelled),
                sample = self.receiver.position() => sample?,
            };

            match sample {
                PositionSample::Playing {
                    position, duration, ..
                } => {
                    if let Some(outcome) = self
                        .on_playing(connection, state, position, duration, cancel)
                        .await
                    {
                        return Ok(outcome);
                    }
                }
                PositionSample::Idle if state.has_started => {
                    info!("Playback finished");
                    return Ok(Outcome::Finished);
                }
                PositionSample::Idle => {
                    debug!("Waiting for the receiver to start playback");
                }
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(Outcome::Cancelled),
                _ = tokio::time::sleep(self.config.poll_interval) => {}
            }
        }
    }

    /// Handle one position report. Returns an outcome only when the session
    /// was cancelled while catching up on ticks.
    async fn on_playing(
        &mut self,
        connection: &mut R::Connection,
        state: &mut PlaybackState,
        position: f64,
        duration: f64,
        cancel: &CancellationToken,
    ) -> Option<Outcome> {
        if !state.has_started {
            info!("Playback started ({:.0}s total)", duration);
            state.has_started = true;
        }

        if state.last_keep_alive.elapsed() > self.config.keep_alive_interval {
            if let Err(e) = connection.keep_alive().await {
                warn!("Keep-alive probe failed: {}", e);
            }
            state.last_keep_alive = Instant::now();
        }

        if let SeekState::Pending(target) = state.seek {
            info!("Seeking to {}s", target);
            if let Err(e) = self.receiver.seek(target).await {
                warn!("Seek to {}s failed: {}", target, e);
            }
            state.seek = SeekState::Issued(target);
        }

        // Positions past the end are not trusted beyond the duration
        let total = duration.max(0.0) as u64;
        let whole = (position.max(0.0).floor() as u64).min(total);
        let mut emitted = 0u64;
        while state.last_whole_second < whole {
            if cancel.is_cancelled() {
                return Some(Outcome::Cancelled);
            }
            state.last_whole_second += 1;
            self.reporter.on_tick(state.last_whole_second, total);

            emitted += 1;
            if emitted % TICK_BATCH == 0 {
                tokio::task::yield_now().await;
            }
        }
        None
    }
}
