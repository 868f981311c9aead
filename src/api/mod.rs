//! External collaborators
//!
//! - Probe: content-type check for direct media URLs
//! - Streamable: built-in streamable.com extractor
//! - Resolver: yt-dlp backed rendition lookup
//! - Source: picks the URL handed to the receiver

pub mod probe;
pub mod resolver;
pub mod source;
pub mod streamable;

pub use probe::ContentProbe;
pub use resolver::{Resolver, YtDlpResolver};
pub use source::{resolve_source, ResolvedSource};
