//! airwatch - Stream web videos to your Apple TV
//!
//! Resolves a video page to a playable stream, hands it to an AirPlay video
//! receiver and follows playback until it ends.
//!
//! # Modules
//!
//! - `models` - Renditions, playback requests, position samples
//! - `select` - Compatibility filter and best-stream ranking
//! - `airplay` - Receiver client, retained play connection, playback session
//! - `api` - Content-type probe, streamable extractor, yt-dlp resolver
//! - `cli` / `commands` - Command line surface and flows
//! - `config` - Receiver address and session timing

pub mod airplay;
pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod models;
pub mod select;

// Re-export commonly used types
pub use models::{PlaybackRequest, PositionSample, RankKey, Rendition, StartPosition};

pub use airplay::{AirPlayReceiver, Outcome, Session, SessionConfig};
pub use error::{Result, WatchError};
