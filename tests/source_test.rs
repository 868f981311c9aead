//! Source Resolution Tests
//!
//! Content-type probe, streamable extractor and resolver fallback, with the
//! source served by mockito and a canned resolver.

use async_trait::async_trait;
use mockito::Server;

use airwatch::api::resolver::parse_info;
use airwatch::api::{resolve_source, ContentProbe, ResolvedSource, Resolver, YtDlpResolver};
use airwatch::{Rendition, WatchError};

/// Resolver returning a fixed answer
struct CannedResolver {
    renditions: Option<Vec<Rendition>>,
}

#[async_trait]
impl Resolver for CannedResolver {
    async fn resolve(&self, url: &str) -> airwatch::Result<Vec<Rendition>> {
        match &self.renditions {
            Some(r) => Ok(r.clone()),
            None => Err(WatchError::UnsupportedSource(url.to_string())),
        }
    }
}

fn canned(renditions: Vec<Rendition>) -> CannedResolver {
    CannedResolver {
        renditions: Some(renditions),
    }
}

// =============================================================================
// resolve_source Tests
// =============================================================================

#[tokio::test]
async fn test_direct_media_skips_resolver() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("HEAD", "/video.mp4")
        .with_status(200)
        .with_header("content-type", "video/mp4")
        .create_async()
        .await;

    let url = format!("{}/video.mp4", server.url());
    let resolver = CannedResolver { renditions: None };
    let source = resolve_source(&url, &ContentProbe::new(), &resolver)
        .await
        .unwrap();

    assert_eq!(source, ResolvedSource::Direct(url.clone()));
    assert_eq!(source.media_url(), url);
}

#[tokio::test]
async fn test_hls_playlist_is_direct() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("HEAD", "/master.m3u8")
        .with_status(200)
        .with_header("content-type", "application/vnd.apple.mpegurl")
        .create_async()
        .await;

    let url = format!("{}/master.m3u8", server.url());
    let source = resolve_source(&url, &ContentProbe::new(), &canned(vec![]))
        .await
        .unwrap();
    assert!(matches!(source, ResolvedSource::Direct(_)));
}

#[tokio::test]
async fn test_page_goes_through_resolver() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("HEAD", "/watch")
        .with_status(200)
        .with_header("content-type", "text/html; charset=utf-8")
        .create_async()
        .await;

    let resolver = canned(vec![
        Rendition::new("webm", "http://cdn/high.webm").with_bitrate(4000.0),
        Rendition::new("mp4", "http://cdn/low.mp4").with_bitrate(800.0),
        Rendition::new("mp4", "http://cdn/mid.mp4").with_bitrate(1600.0),
    ]);
    let url = format!("{}/watch", server.url());
    let source = resolve_source(&url, &ContentProbe::new(), &resolver)
        .await
        .unwrap();

    match &source {
        ResolvedSource::Selected(r) => assert_eq!(r.url, "http://cdn/mid.mp4"),
        other => panic!("Expected Selected, got {:?}", other),
    }
    assert_eq!(source.media_url(), "http://cdn/mid.mp4");
}

#[tokio::test]
async fn test_streamable_page_extracted() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("HEAD", "/streamable.com/4914")
        .with_status(200)
        .with_header("content-type", "text/html")
        .create_async()
        .await;

    let url = format!("{}/streamable.com/4914", server.url());
    let resolver = CannedResolver { renditions: None };
    let source = resolve_source(&url, &ContentProbe::new(), &resolver)
        .await
        .unwrap();

    assert_eq!(
        source,
        ResolvedSource::Extracted("https://cdn.streamable.com/video/mp4/4914.mp4".to_string())
    );
}

#[tokio::test]
async fn test_all_incompatible() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("HEAD", "/watch")
        .with_status(200)
        .with_header("content-type", "text/html")
        .create_async()
        .await;

    let resolver = canned(vec![
        Rendition::new("webm", "http://cdn/a.webm"),
        Rendition::new("mp4", "http://cdn/b.mp4").with_acodec("opus"),
    ]);
    let url = format!("{}/watch", server.url());
    let err = resolve_source(&url, &ContentProbe::new(), &resolver)
        .await
        .unwrap_err();
    assert!(matches!(err, WatchError::NoCompatibleStream));
}

#[tokio::test]
async fn test_unsupported_source_propagates() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("HEAD", "/nothing")
        .with_status(404)
        .create_async()
        .await;

    let url = format!("{}/nothing", server.url());
    let resolver = CannedResolver { renditions: None };
    let err = resolve_source(&url, &ContentProbe::new(), &resolver)
        .await
        .unwrap_err();
    assert!(matches!(err, WatchError::UnsupportedSource(ref u) if *u == url));
}

/// An unreachable source is not fatal; the resolver still gets a chance
#[tokio::test]
async fn test_probe_failure_falls_through() {
    let resolver = canned(vec![Rendition::new("mp4", "http://cdn/v.mp4")]);
    let source = resolve_source("http://127.0.0.1:9/page", &ContentProbe::new(), &resolver)
        .await
        .unwrap();
    assert_eq!(source.media_url(), "http://cdn/v.mp4");
}

// =============================================================================
// yt-dlp Output Tests
// =============================================================================

#[test]
fn test_parse_playlist_of_single_format_entries() {
    let json = r#"{
        "_type": "playlist",
        "entries": [
            {"url": "http://cdn/first.mp4", "ext": "mp4"},
            {"url": "http://cdn/second.mp4", "ext": "mp4"}
        ]
    }"#;

    let renditions = parse_info(json).unwrap();
    assert_eq!(renditions.len(), 1);
    assert_eq!(renditions[0].url, "http://cdn/first.mp4");
}

#[tokio::test]
async fn test_missing_binary() {
    let resolver = YtDlpResolver::with_path("/nonexistent/yt-dlp-binary");
    let err = resolver.resolve("https://vimeo.com/1").await.unwrap_err();
    match err {
        WatchError::Resolver(msg) => assert!(msg.contains("not found")),
        other => panic!("Expected Resolver error, got {:?}", other),
    }
}
