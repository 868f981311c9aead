//! AirPlay video remote control
//!
//! - Receiver: HTTP client for the receiver's control endpoints
//! - Connection: the retained `/play` socket and its keep-alive probes
//! - Session: the playback loop
//! - Progress: elapsed / total display

pub mod connection;
pub mod progress;
pub mod receiver;
pub mod session;

pub use connection::{ControlConnection, PlayConnection};
pub use progress::{NoProgress, ProgressReporter, TimedBar};
pub use receiver::{AirPlayReceiver, Receiver};
pub use session::{Outcome, Session, SessionConfig};
