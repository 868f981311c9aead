//! AirPlay video receiver client
//!
//! Speaks the HTTP remote-control protocol on port 7000: `/server-info`,
//! `/scrub` for position and seeking, and `/play` (via [`PlayConnection`]).

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::connection::{ControlConnection, PlayConnection, USER_AGENT};
use crate::error::{Result, WatchError};
use crate::models::PositionSample;

/// Port the receiver listens on for video remote control
pub const AIRPLAY_PORT: u16 = 7000;

/// Per-request timeout; a stalled receiver surfaces as a lost connection
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Operations a playback session needs from a receiver
#[async_trait]
pub trait Receiver: Send + Sync {
    type Connection: ControlConnection;

    /// Ask the receiver to play `url` from `start_fraction` and return the
    /// connection that must stay open for the rest of the session
    async fn open_play(&self, url: &str, start_fraction: f64) -> Result<Self::Connection>;

    /// Current playback position.
    ///
    /// Unreachable receivers yield `ConnectionLost`; anything the receiver
    /// says that is not a usable position is `PositionSample::Idle`.
    async fn position(&self) -> Result<PositionSample>;

    /// Seek to an absolute offset in seconds
    async fn seek(&self, seconds: u64) -> Result<()>;
}

/// HTTP client for one receiver
pub struct AirPlayReceiver {
    base_url: String,
    play_addr: String,
    client: reqwest::Client,
}

impl AirPlayReceiver {
    /// Create a client for the receiver at `host` (name or IP address)
    pub fn new(host: &str) -> Self {
        let play_addr = host_port(host, AIRPLAY_PORT);
        Self {
            base_url: format!("http://{}", play_addr),
            play_addr,
            client: build_client(),
        }
    }

    /// Create a client with a custom base URL (for testing)
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let play_addr = reqwest::Url::parse(&base_url)
            .ok()
            .and_then(|u| {
                let host = u.host_str()?.to_string();
                let port = u.port_or_known_default()?;
                Some(format!("{}:{}", host, port))
            })
            .unwrap_or_else(|| base_url.trim_start_matches("http://").to_string());

        Self {
            base_url,
            play_addr,
            client: build_client(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Address the play connection is opened to
    pub fn play_addr(&self) -> &str {
        &self.play_addr
    }

    /// Fetch `/server-info`.
    ///
    /// Only used as a reachability check; the plist body is returned as-is.
    pub async fn server_info(&self) -> Result<String> {
        let url = format!("{}/server-info", self.base_url);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(WatchError::Receiver(format!(
                "/server-info returned HTTP {}",
                status
            )));
        }

        Ok(response.text().await?)
    }
}

/// `host:port`, with IPv6 literals in brackets
fn host_port(host: &str, port: u16) -> String {
    let bare = host.trim().trim_start_matches('[').trim_end_matches(']');
    match bare.parse::<IpAddr>() {
        Ok(IpAddr::V6(ip)) => SocketAddr::from((ip, port)).to_string(),
        _ => format!("{}:{}", host.trim(), port),
    }
}

fn build_client() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .unwrap_or_default()
}

#[async_trait]
impl Receiver for AirPlayReceiver {
    type Connection = PlayConnection;

    async fn open_play(&self, url: &str, start_fraction: f64) -> Result<PlayConnection> {
        PlayConnection::open(&self.play_addr, url, start_fraction).await
    }

    async fn position(&self) -> Result<PositionSample> {
        let url = format!("{}/scrub", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| WatchError::ConnectionLost(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| WatchError::ConnectionLost(e.to_string()))?;

        if !status.is_success() {
            debug!("/scrub returned HTTP {}, treating as idle", status);
            return Ok(PositionSample::Idle);
        }

        let sample = PositionSample::parse_scrub(&body);
        if !sample.is_playing() {
            debug!("No active playback in /scrub response: {:?}", body.trim());
        }
        Ok(sample)
    }

    async fn seek(&self, seconds: u64) -> Result<()> {
        let url = format!("{}/scrub?position={}", self.base_url, seconds);
        debug!("POST /scrub?position={}", seconds);
        let response = self.client.post(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(WatchError::Receiver(format!(
                "seek returned HTTP {}",
                status
            )));
        }
        Ok(())
    }
}
