//! Stream selection
//!
//! Filters resolver output down to renditions the receiver can decode, then
//! picks the single best one by a deterministic ranking rule.

use std::fmt;

use tracing::{debug, info};

use crate::error::{Result, WatchError};
use crate::models::{RankKey, Rendition};

/// Container extensions the receiver plays
pub const COMPATIBLE_CONTAINERS: &[&str] = &["mp4", "mp3"];

/// Audio codec prefixes the receiver decodes (matched case-insensitively)
pub const COMPATIBLE_AUDIO_CODECS: &[&str] = &["mp4", "aac"];

/// Why a rendition was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incompatibility {
    Container(String),
    AudioCodec(String),
}

impl fmt::Display for Incompatibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Incompatibility::Container(ext) => {
                write!(f, "{} is not a supported container", ext)
            }
            Incompatibility::AudioCodec(codec) => {
                write!(f, "{} is not a supported audio format", codec)
            }
        }
    }
}

/// Check whether the receiver can play a rendition
pub fn check_compatible(rendition: &Rendition) -> std::result::Result<(), Incompatibility> {
    let ext = rendition.ext.trim().to_lowercase();
    if !COMPATIBLE_CONTAINERS.contains(&ext.as_str()) {
        return Err(Incompatibility::Container(rendition.ext.clone()));
    }

    if let Some(ref codec) = rendition.acodec {
        let folded = codec.trim().to_lowercase();
        if !COMPATIBLE_AUDIO_CODECS
            .iter()
            .any(|prefix| folded.starts_with(prefix))
        {
            return Err(Incompatibility::AudioCodec(codec.clone()));
        }
    }

    Ok(())
}

pub fn is_compatible(rendition: &Rendition) -> bool {
    check_compatible(rendition).is_ok()
}

/// Keep only compatible renditions, logging each rejection
pub fn compatible(renditions: Vec<Rendition>) -> Vec<Rendition> {
    renditions
        .into_iter()
        .filter(|r| match check_compatible(r) {
            Ok(()) => true,
            Err(reason) => {
                debug!(url = %r.url, "Incompatible rendition: {}", reason);
                false
            }
        })
        .collect()
}

/// Choose the field to rank renditions by.
///
/// First key (bitrate, width, height) present on every rendition wins; failing
/// that, the first key present on any rendition; failing that, width.
pub fn ranking_key(renditions: &[Rendition]) -> RankKey {
    let present_on_all = |key: RankKey| renditions.iter().all(|r| r.rank_value(key).is_some());
    let present_on_any = |key: RankKey| renditions.iter().any(|r| r.rank_value(key).is_some());

    if let Some(key) = RankKey::PRIORITY.into_iter().find(|&k| present_on_all(k)) {
        return key;
    }
    if let Some(key) = RankKey::PRIORITY.into_iter().find(|&k| present_on_any(k)) {
        return key;
    }
    RankKey::Width
}

/// Rendition with the strictly greatest value for `key`; first one wins ties.
/// A rendition without the key never beats one that has it.
pub fn best_by(renditions: &[Rendition], key: RankKey) -> Option<&Rendition> {
    let mut iter = renditions.iter();
    let mut best = iter.next()?;

    for candidate in iter {
        let wins = match (candidate.rank_value(key), best.rank_value(key)) {
            (Some(c), Some(b)) => c > b,
            (Some(_), None) => true,
            (None, _) => false,
        };
        if wins {
            best = candidate;
        }
    }

    Some(best)
}

/// Filter `renditions` for compatibility and return the best one
pub fn select_best(renditions: Vec<Rendition>) -> Result<Rendition> {
    let total = renditions.len();
    let candidates = compatible(renditions);
    debug!("{} of {} renditions are compatible", candidates.len(), total);

    if candidates.is_empty() {
        return Err(WatchError::NoCompatibleStream);
    }

    let key = ranking_key(&candidates);
    info!("Using key: {}", key);

    let best = best_by(&candidates, key)
        .cloned()
        .ok_or(WatchError::NoCompatibleStream)?;
    debug!(url = %best.url, "Best: {}", best);
    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mp4(url: &str) -> Rendition {
        Rendition::new("mp4", url)
    }

    #[test]
    fn test_webm_always_rejected() {
        assert!(!is_compatible(&Rendition::new("webm", "u")));
        assert!(!is_compatible(&Rendition::new("webm", "u").with_acodec("aac")));
        assert_eq!(
            check_compatible(&Rendition::new("webm", "u")),
            Err(Incompatibility::Container("webm".to_string()))
        );
    }

    #[test]
    fn test_codec_rules() {
        assert!(is_compatible(&mp4("u")));
        assert!(is_compatible(&mp4("u").with_acodec("AAC-LC")));
        assert!(is_compatible(&mp4("u").with_acodec("mp4a.40.2")));
        assert!(is_compatible(&mp4("u").with_acodec("  aac ")));
        assert!(!is_compatible(&mp4("u").with_acodec("opus")));
        assert!(!is_compatible(&mp4("u").with_acodec("none")));
        assert!(is_compatible(&Rendition::new("mp3", "u")));
    }

    #[test]
    fn test_ranking_key_present_on_all() {
        let list = vec![
            mp4("a").with_bitrate(100.0).with_size(640, 360),
            mp4("b").with_bitrate(200.0).with_size(1280, 720),
        ];
        assert_eq!(ranking_key(&list), RankKey::Bitrate);
    }

    #[test]
    fn test_ranking_key_skips_partial_bitrate() {
        // Bitrate is missing on one, width is on all: width wins the first pass
        let list = vec![
            mp4("a").with_bitrate(100.0).with_size(640, 360),
            mp4("b").with_size(1280, 720),
        ];
        assert_eq!(ranking_key(&list), RankKey::Width);
    }

    #[test]
    fn test_ranking_key_second_pass() {
        let mut only_height = mp4("b");
        only_height.height = Some(720);
        let list = vec![mp4("a").with_bitrate(100.0), only_height];
        assert_eq!(ranking_key(&list), RankKey::Bitrate);
    }

    #[test]
    fn test_ranking_key_fallback() {
        let list = vec![mp4("a"), mp4("b")];
        assert_eq!(ranking_key(&list), RankKey::Width);
    }

    #[test]
    fn test_best_by_first_wins_ties() {
        let list = vec![
            mp4("first").with_bitrate(500.0),
            mp4("second").with_bitrate(500.0),
            mp4("low").with_bitrate(100.0),
        ];
        assert_eq!(best_by(&list, RankKey::Bitrate).unwrap().url, "first");
    }

    #[test]
    fn test_best_by_missing_never_wins() {
        let list = vec![mp4("none"), mp4("some").with_bitrate(10.0), mp4("none2")];
        assert_eq!(best_by(&list, RankKey::Bitrate).unwrap().url, "some");
    }

    #[test]
    fn test_select_best_filters_then_ranks() {
        let list = vec![
            Rendition::new("webm", "webm-hi").with_bitrate(9000.0),
            mp4("opus").with_acodec("opus").with_bitrate(5000.0),
            mp4("mid").with_acodec("mp4a.40.2").with_bitrate(1200.0),
            mp4("hi").with_acodec("aac").with_bitrate(2500.0),
        ];
        let best = select_best(list).unwrap();
        assert_eq!(best.url, "hi");
    }

    #[test]
    fn test_select_best_none_compatible() {
        let list = vec![Rendition::new("webm", "a"), mp4("b").with_acodec("opus")];
        assert!(matches!(
            select_best(list),
            Err(WatchError::NoCompatibleStream)
        ));
        assert!(matches!(
            select_best(vec![]),
            Err(WatchError::NoCompatibleStream)
        ));
    }
}
