//! Built-in extractor for streamable.com
//!
//! Streamable serves every clip as a plain mp4 from its CDN, so there is no
//! need to run the resolver for it.

/// Map `https://streamable.com/<id>` to the clip's direct mp4 URL
pub fn direct_url(page_url: &str) -> Option<String> {
    let (_, rest) = page_url.split_once("streamable.com/")?;
    let id = rest.split(['?', '#', '/']).next()?.trim();
    if id.is_empty() {
        return None;
    }
    Some(format!("https://cdn.streamable.com/video/mp4/{}.mp4", id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_url() {
        assert_eq!(
            direct_url("https://streamable.com/4914").as_deref(),
            Some("https://cdn.streamable.com/video/mp4/4914.mp4")
        );
        assert_eq!(
            direct_url("https://streamable.com/abc12?autoplay=1").as_deref(),
            Some("https://cdn.streamable.com/video/mp4/abc12.mp4")
        );
    }

    #[test]
    fn test_not_streamable() {
        assert_eq!(direct_url("https://vimeo.com/157239808"), None);
        assert_eq!(direct_url("https://streamable.com/"), None);
    }
}
