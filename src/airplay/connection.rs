//! Retained `/play` connection
//!
//! The receiver ties a playback session to the TCP connection that carried
//! the `POST /play` request. Reading that response to completion (or closing
//! the socket) makes the receiver stop playing, so the request is written by
//! hand and only the socket is kept, for keep-alive probes.

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::debug;

use crate::error::{Result, WatchError};

/// User agent the receiver expects from a remote control
pub const USER_AGENT: &str = "MediaControl/1.0";

/// Probe written on the retained socket to keep the session alive.
/// Its response is never read.
pub const KEEP_ALIVE_PROBE: &[u8] = b"GET /scrub HTTP/1.1\r\n\r\n";

/// A long-lived connection that keeps a receiver session valid
#[async_trait]
pub trait ControlConnection: Send {
    /// Write a keep-alive probe on the connection
    async fn keep_alive(&mut self) -> Result<()>;

    /// Close the connection. Calling it again is a no-op.
    async fn close(&mut self) -> Result<()>;
}

/// Body of a `POST /play` request
pub fn play_body(url: &str, start_fraction: f64) -> String {
    format!(
        "Content-Location: {}\nStart-Position:{:.4}\n",
        url, start_fraction
    )
}

/// Full `POST /play` request as written on the wire
pub fn play_request(host: &str, url: &str, start_fraction: f64, session_id: &str) -> String {
    let body = play_body(url, start_fraction);
    format!(
        "POST /play HTTP/1.1\r\n\
         Host: {}\r\n\
         User-Agent: {}\r\n\
         Content-Type: text/parameters\r\n\
         X-Apple-Session-ID: {}\r\n\
         Content-Length: {}\r\n\
         \r\n\
         {}",
        host,
        USER_AGENT,
        session_id,
        body.len(),
        body
    )
}

/// Socket that carried the `POST /play` request
#[derive(Debug)]
pub struct PlayConnection {
    stream: Option<TcpStream>,
    session_id: String,
}

impl PlayConnection {
    /// Connect to `addr` (host:port) and send the play request.
    ///
    /// The response is left unread on the socket.
    pub async fn open(addr: &str, url: &str, start_fraction: f64) -> Result<Self> {
        let session_id = uuid::Uuid::new_v4().simple().to_string();
        let mut stream = TcpStream::connect(addr).await?;

        let request = play_request(addr, url, start_fraction, &session_id);
        debug!(
            session_id = %session_id,
            "POST /play -> {} (start {:.4})",
            addr,
            start_fraction
        );
        stream.write_all(request.as_bytes()).await?;
        stream.flush().await?;

        Ok(Self {
            stream: Some(stream),
            session_id,
        })
    }

    /// Session identifier sent with the play request
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Check if the socket is still held
    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }
}

#[async_trait]
impl ControlConnection for PlayConnection {
    async fn keep_alive(&mut self) -> Result<()> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| WatchError::ConnectionLost("play connection already closed".into()))?;
        stream.write_all(KEEP_ALIVE_PROBE).await?;
        stream.flush().await?;
        debug!(session_id = %self.session_id, "Sent keep-alive probe");
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut stream) = self.stream.take() {
            debug!(session_id = %self.session_id, "Closing play connection");
            // The peer may already be gone; dropping the stream closes it anyway
            if let Err(e) = stream.shutdown().await {
                if e.kind() != std::io::ErrorKind::NotConnected {
                    return Err(e.into());
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_play_body_format() {
        assert_eq!(
            play_body("http://cdn/video.mp4", 0.0001),
            "Content-Location: http://cdn/video.mp4\nStart-Position:0.0001\n"
        );
        assert_eq!(
            play_body("http://cdn/video.mp4", 0.25),
            "Content-Location: http://cdn/video.mp4\nStart-Position:0.2500\n"
        );
    }

    #[test]
    fn test_play_request_headers() {
        let req = play_request("10.0.0.2:7000", "http://cdn/v.mp4", 0.5, "abc123");
        assert!(req.starts_with("POST /play HTTP/1.1\r\n"));
        assert!(req.contains("Host: 10.0.0.2:7000\r\n"));
        assert!(req.contains("User-Agent: MediaControl/1.0\r\n"));
        assert!(req.contains("Content-Type: text/parameters\r\n"));
        assert!(req.contains("X-Apple-Session-ID: abc123\r\n"));

        let body = play_body("http://cdn/v.mp4", 0.5);
        assert!(req.contains(&format!("Content-Length: {}\r\n\r\n", body.len())));
        assert!(req.ends_with(&body));
    }
}
