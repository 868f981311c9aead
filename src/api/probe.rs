//! Content-type negotiation
//!
//! A HEAD request tells whether a URL already points at media the receiver
//! can fetch itself, in which case no resolution is needed.

use tracing::debug;

use crate::error::Result;

/// Content types the receiver streams directly
pub const STREAMABLE_TYPES: &[&str] = &[
    "video/mp4",
    "application/vnd.apple.mpegurl",
    "application/x-mpegurl",
    "application/octet-stream",
];

/// Check a content-type header value, ignoring parameters and case
pub fn is_streamable_type(content_type: &str) -> bool {
    let media_type = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase();
    STREAMABLE_TYPES.contains(&media_type.as_str())
}

/// Issues HEAD requests to discover a URL's content type
pub struct ContentProbe {
    client: reqwest::Client,
}

impl ContentProbe {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Content type of `url` after following redirects, if the server sends one
    pub async fn content_type(&self, url: &str) -> Result<Option<String>> {
        let response = self.client.head(url).send().await?;
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        debug!("Content-Type: {:?}", content_type);
        Ok(content_type)
    }

    /// True when `url` can be handed to the receiver as-is
    pub async fn is_direct_media(&self, url: &str) -> Result<bool> {
        Ok(self
            .content_type(url)
            .await?
            .map(|ct| is_streamable_type(&ct))
            .unwrap_or(false))
    }
}

impl Default for ContentProbe {
    fn default() -> Self {
        Self::new()
    }
}
