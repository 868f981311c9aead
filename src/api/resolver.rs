//! Media URL resolution via yt-dlp
//!
//! Turns an arbitrary web page URL into the list of renditions it offers.
//! yt-dlp is run as a subprocess with `-J` and its JSON is mapped onto
//! [`Rendition`]s.

use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use crate::error::{Result, WatchError};
use crate::models::Rendition;

/// Produces candidate renditions for a source URL
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Fails with `UnsupportedSource` when the URL cannot be resolved at all
    async fn resolve(&self, url: &str) -> Result<Vec<Rendition>>;
}

/// Top-level yt-dlp info dict (video or playlist)
#[derive(Debug, Deserialize)]
struct YtDlpInfo {
    #[serde(default)]
    formats: Option<Vec<YtDlpFormat>>,
    #[serde(default)]
    entries: Option<Vec<YtDlpInfo>>,
    /// Single-format extractors put the format fields on the info dict itself
    #[serde(flatten)]
    single: YtDlpFormat,
}

/// One format entry from yt-dlp
#[derive(Debug, Default, Deserialize)]
struct YtDlpFormat {
    #[serde(default)]
    format_id: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    ext: Option<String>,
    #[serde(default)]
    acodec: Option<String>,
    #[serde(default)]
    tbr: Option<f64>,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
}

impl YtDlpFormat {
    fn into_rendition(self) -> Option<Rendition> {
        Some(Rendition {
            format_id: self.format_id,
            ext: self.ext.unwrap_or_else(|| "unknown".to_string()),
            acodec: self.acodec,
            bitrate: self.tbr,
            width: self.width,
            height: self.height,
            url: self.url?,
        })
    }
}

/// Parse `yt-dlp -J` output into renditions.
///
/// Playlists are reduced to their first entry.
pub fn parse_info(json: &str) -> Result<Vec<Rendition>> {
    let mut info: YtDlpInfo = serde_json::from_str(json)
        .map_err(|e| WatchError::Resolver(format!("Failed to parse yt-dlp output: {}", e)))?;

    while let Some(mut entries) = info.entries.take() {
        if entries.is_empty() {
            return Ok(vec![]);
        }
        debug!("Playlist with {} entries, using the first", entries.len());
        info = entries.swap_remove(0);
    }

    let renditions = match info.formats {
        Some(formats) => formats
            .into_iter()
            .filter_map(YtDlpFormat::into_rendition)
            .collect(),
        None => info.single.into_rendition().into_iter().collect(),
    };
    Ok(renditions)
}

/// Resolver backed by the yt-dlp CLI
pub struct YtDlpResolver {
    /// Path to yt-dlp binary
    binary: String,
}

impl YtDlpResolver {
    pub fn new() -> Self {
        Self {
            binary: "yt-dlp".to_string(),
        }
    }

    /// Create with custom yt-dlp path
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            binary: path.into(),
        }
    }
}

impl Default for YtDlpResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Resolver for YtDlpResolver {
    async fn resolve(&self, url: &str) -> Result<Vec<Rendition>> {
        debug!("Resolving {} with {}", url, self.binary);
        let output = Command::new(&self.binary)
            .args(["-J", "--no-warnings", url])
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    WatchError::Resolver(format!(
                        "{} not found. Install with: pip install yt-dlp",
                        self.binary
                    ))
                } else {
                    WatchError::Resolver(e.to_string())
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!("{} failed: {}", self.binary, stderr.trim());
            return Err(WatchError::UnsupportedSource(url.to_string()));
        }

        parse_info(&String::from_utf8_lossy(&output.stdout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_formats() {
        let json = r#"{
            "title": "Clip",
            "formats": [
                {"format_id": "18", "ext": "mp4", "acodec": "mp4a.40.2", "tbr": 500.5,
                 "width": 640, "height": 360, "url": "https://cdn/18.mp4"},
                {"format_id": "251", "ext": "webm", "acodec": "opus", "url": "https://cdn/251.webm"},
                {"format_id": "sb0", "ext": "mhtml"}
            ]
        }"#;
        let renditions = parse_info(json).unwrap();
        assert_eq!(renditions.len(), 2);
        assert_eq!(renditions[0].format_id.as_deref(), Some("18"));
        assert_eq!(renditions[0].bitrate, Some(500.5));
        assert_eq!(renditions[0].width, Some(640));
        assert_eq!(renditions[1].acodec.as_deref(), Some("opus"));
        assert_eq!(renditions[1].height, None);
    }

    #[test]
    fn test_parse_playlist_uses_first_entry() {
        let json = r#"{
            "_type": "playlist",
            "entries": [
                {"formats": [{"ext": "mp4", "url": "https://cdn/first.mp4"}]},
                {"formats": [{"ext": "mp4", "url": "https://cdn/second.mp4"}]}
            ]
        }"#;
        let renditions = parse_info(json).unwrap();
        assert_eq!(renditions.len(), 1);
        assert_eq!(renditions[0].url, "https://cdn/first.mp4");
    }

    #[test]
    fn test_parse_single_format_info() {
        let json = r#"{"ext": "mp4", "url": "https://cdn/only.mp4", "width": 1920}"#;
        let renditions = parse_info(json).unwrap();
        assert_eq!(renditions.len(), 1);
        assert_eq!(renditions[0].width, Some(1920));
    }

    #[test]
    fn test_parse_invalid_json() {
        assert!(matches!(
            parse_info("not json"),
            Err(WatchError::Resolver(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_binary_is_resolver_error() {
        let resolver = YtDlpResolver::with_path("/nonexistent/yt-dlp-airwatch");
        let err = resolver.resolve("https://example.com").await.unwrap_err();
        assert!(matches!(err, WatchError::Resolver(_)));
    }
}
