//! Error types for airwatch
//!
//! Library code returns [`WatchError`]. The command layer maps these onto
//! process exit codes.

use thiserror::Error;

/// Errors surfaced by stream selection, source resolution and playback
#[derive(Debug, Error)]
pub enum WatchError {
    /// Renditions were found but none can be played by the receiver
    #[error("No compatible stream found (the receiver plays mp4/mp3 with AAC audio)")]
    NoCompatibleStream,

    /// The resolver could not handle the source URL at all
    #[error("Unsupported video URL: {0}")]
    UnsupportedSource(String),

    /// The receiver stopped answering in the middle of a session
    #[error("Lost connection to receiver: {0}")]
    ConnectionLost(String),

    /// The receiver answered with something we did not expect
    #[error("Receiver error: {0}")]
    Receiver(String),

    /// The resolver backend failed to run
    #[error("Resolver failed: {0}")]
    Resolver(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, WatchError>;

impl WatchError {
    /// True for failures caused by the network or the receiver going away
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            WatchError::ConnectionLost(_) | WatchError::Http(_) | WatchError::Io(_)
        )
    }
}
