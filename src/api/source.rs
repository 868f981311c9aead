//! Source URL to media URL
//!
//! Decides what the receiver is given: the URL itself when it already serves
//! playable media, a streamable.com CDN link, or the best rendition the
//! resolver finds.

use tracing::{info, warn};

use super::probe::ContentProbe;
use super::resolver::Resolver;
use super::streamable;
use crate::error::Result;
use crate::models::Rendition;
use crate::select;

/// Where the media URL came from
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedSource {
    /// The source URL serves playable media itself
    Direct(String),
    /// Built-in extractor mapped the page to a direct URL
    Extracted(String),
    /// Chosen from the resolver's renditions
    Selected(Rendition),
}

impl ResolvedSource {
    /// URL to hand to the receiver
    pub fn media_url(&self) -> &str {
        match self {
            ResolvedSource::Direct(url) | ResolvedSource::Extracted(url) => url,
            ResolvedSource::Selected(rendition) => &rendition.url,
        }
    }
}

/// Find a media URL the receiver can play for `url`
pub async fn resolve_source<R: Resolver + ?Sized>(
    url: &str,
    probe: &ContentProbe,
    resolver: &R,
) -> Result<ResolvedSource> {
    match probe.is_direct_media(url).await {
        Ok(true) => {
            info!("Streaming directly: {}", url);
            return Ok(ResolvedSource::Direct(url.to_string()));
        }
        Ok(false) => {}
        Err(e) => warn!("Content-type check failed for {}: {}", url, e),
    }

    if let Some(direct) = streamable::direct_url(url) {
        info!("Streamable clip: {}", direct);
        return Ok(ResolvedSource::Extracted(direct));
    }

    let renditions = resolver.resolve(url).await?;
    info!("Resolver returned {} renditions", renditions.len());
    select::select_best(renditions).map(ResolvedSource::Selected)
}
