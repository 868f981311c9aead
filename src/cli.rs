//! CLI - Command Line Interface for airwatch
//!
//! One positional media URL plus flags. Output is human-readable on a TTY
//! and JSON otherwise (or with `--json`).
//!
//! # Examples
//!
//! ```bash
//! # Play a page URL on the Apple TV from $APPLE_TV_IP
//! airwatch https://vimeo.com/channels/staffpicks/157239808
//!
//! # Start 1m30s in, on a specific receiver
//! airwatch https://streamable.com/4914 --apple-tv 192.168.1.20 --start 00:01:30
//!
//! # Show what the resolver found
//! airwatch https://www.youtube.com/watch?v=UfJ-i4Y6DGU --list-streams --json
//! ```

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::io::IsTerminal;
use std::path::PathBuf;

use crate::models::{Rendition, StartPosition};

// =============================================================================
// Exit Codes
// =============================================================================

/// Exit codes for CLI operations (semantic for scripting)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success (also used when the user cancels)
    Success = 0,
    /// General error
    Error = 1,
    /// Invalid arguments
    InvalidArgs = 2,
    /// Network error
    NetworkError = 3,
    /// No receiver address configured
    NoReceiver = 4,
    /// No compatible streams available
    NoStreams = 5,
    /// Receiver rejected or broke off playback
    PlaybackFailed = 6,
    /// The resolver cannot handle the URL
    UnsupportedSource = 7,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> std::process::ExitCode {
        std::process::ExitCode::from(code as u8)
    }
}

// =============================================================================
// Log Level
// =============================================================================

/// Verbosity chosen on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Errors only
    Quiet,
    /// Warnings and errors
    #[default]
    Normal,
    /// Everything, for debugging
    Verbose,
}

impl LogLevel {
    /// `tracing_subscriber::EnvFilter` directive for this level
    pub fn directive(&self) -> &'static str {
        match self {
            LogLevel::Quiet => "airwatch=error",
            LogLevel::Normal => "airwatch=warn",
            LogLevel::Verbose => "airwatch=debug",
        }
    }
}

// =============================================================================
// Main CLI Structure
// =============================================================================

/// airwatch - Stream web videos to your Apple TV
#[derive(Parser, Debug)]
#[command(
    name = "airwatch",
    version,
    about = "Stream web videos to your Apple TV",
    long_about = "Plays a video URL on an AirPlay video receiver and follows \
                  playback until it ends.\n\n\
                  Page URLs are resolved with yt-dlp; direct media URLs \
                  are streamed as-is.",
    after_help = "EXAMPLES:\n\
                  airwatch https://vimeo.com/157239808              Play on $APPLE_TV_IP\n\
                  airwatch URL -a 192.168.1.20 -s 00:01:30          Start at 1m30s\n\
                  airwatch URL -s 0.5                               Start halfway\n\
                  airwatch URL --list-streams --json                Show candidate streams"
)]
pub struct Cli {
    /// Video page or direct media URL
    #[arg(required = true)]
    pub url: String,

    /// Receiver address (overrides the APPLE_TV_IP environment variable)
    #[arg(long = "apple-tv", short = 'a', value_name = "ADDRESS")]
    pub apple_tv: Option<String>,

    /// Start position: hh:mm:ss timestamp or fraction complete (0.xx)
    #[arg(long, short = 's', default_value = "0.0")]
    pub start: String,

    /// Send the URL to the receiver as-is (skip content-type check and resolver)
    #[arg(long)]
    pub direct: bool,

    /// Print candidate streams and exit
    #[arg(long, short = 'l')]
    pub list_streams: bool,

    /// Enable detailed logging for debugging
    #[arg(long, short = 'v', conflicts_with = "quiet")]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q')]
    pub quiet: bool,

    /// Output format as JSON (default for non-TTY)
    #[arg(long, short = 'j')]
    pub json: bool,

    /// Path to config file
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Check if JSON output should be used
    pub fn should_json(&self) -> bool {
        self.json || !std::io::stdout().is_terminal()
    }

    pub fn log_level(&self) -> LogLevel {
        if self.verbose {
            LogLevel::Verbose
        } else if self.quiet {
            LogLevel::Quiet
        } else {
            LogLevel::Normal
        }
    }

    /// Parse the --start argument
    pub fn start_position(&self) -> Result<StartPosition, &'static str> {
        StartPosition::parse(&self.start)
    }
}

// =============================================================================
// JSON Output Types
// =============================================================================

/// Generic JSON output wrapper with status
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonOutput<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "is_zero")]
    pub exit_code: i32,
}

fn is_zero(n: &i32) -> bool {
    *n == 0
}

impl<T: Serialize> JsonOutput<T> {
    /// Create success output with data
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            exit_code: 0,
        }
    }

    /// Create error output (no data)
    pub fn error_msg(msg: impl Into<String>, code: ExitCode) -> JsonOutput<()> {
        JsonOutput::<()> {
            data: None,
            error: Some(msg.into()),
            exit_code: code.into(),
        }
    }
}

/// One line of `--list-streams` output
#[derive(Debug, Serialize, Deserialize)]
pub struct ListedStream {
    #[serde(flatten)]
    pub rendition: Rendition,
    pub compatible: bool,
}

/// Result of a finished or cancelled playback
#[derive(Debug, Serialize, Deserialize)]
pub struct WatchResponse {
    pub status: String,
    pub receiver: String,
    pub stream_url: String,
}

// =============================================================================
// Output Helpers
// =============================================================================

/// Output handler for consistent formatting
pub struct Output {
    pub json: bool,
    pub quiet: bool,
}

impl Output {
    pub fn new(cli: &Cli) -> Self {
        Self {
            json: cli.should_json(),
            quiet: cli.quiet,
        }
    }

    /// Print success data
    pub fn print<T: Serialize>(&self, data: T) -> anyhow::Result<()> {
        if self.json {
            let output = JsonOutput::success(data);
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            // For non-JSON, caller should handle formatting
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
        Ok(())
    }

    /// Print error and return exit code
    pub fn error(&self, msg: impl Into<String>, code: ExitCode) -> ExitCode {
        let msg = msg.into();
        if self.json {
            let output = JsonOutput::<()>::error_msg(&msg, code);
            if let Ok(json) = serde_json::to_string_pretty(&output) {
                eprintln!("{}", json);
            }
        } else if !self.quiet {
            eprintln!("Error: {}", msg);
        }
        code
    }

    /// Print info message (suppressed in quiet mode)
    pub fn info(&self, msg: impl std::fmt::Display) {
        if !self.quiet && !self.json {
            eprintln!("{}", msg);
        }
    }

    /// Whether a live progress bar should be drawn
    pub fn show_progress(&self) -> bool {
        !self.quiet && !self.json
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        // Verify CLI structure is valid
        Cli::command().debug_assert();
    }

    #[test]
    fn test_url_is_required() {
        assert!(Cli::try_parse_from(["airwatch"]).is_err());
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["airwatch", "https://streamable.com/4914"]);
        assert_eq!(cli.url, "https://streamable.com/4914");
        assert_eq!(cli.apple_tv, None);
        assert!(!cli.direct);
        assert!(!cli.list_streams);
        assert_eq!(cli.log_level(), LogLevel::Normal);
        assert_eq!(cli.start_position(), Ok(StartPosition::Beginning));
    }

    #[test]
    fn test_all_flags() {
        let cli = Cli::parse_from([
            "airwatch",
            "http://cdn/video.mp4",
            "-a",
            "192.168.1.20",
            "-s",
            "00:01:30",
            "--direct",
            "--verbose",
            "--json",
        ]);
        assert_eq!(cli.apple_tv.as_deref(), Some("192.168.1.20"));
        assert_eq!(cli.start_position(), Ok(StartPosition::Timestamp(90)));
        assert!(cli.direct);
        assert!(cli.json);
        assert_eq!(cli.log_level(), LogLevel::Verbose);
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(Cli::try_parse_from(["airwatch", "u", "-v", "-q"]).is_err());
    }

    #[test]
    fn test_log_directives() {
        assert_eq!(LogLevel::Quiet.directive(), "airwatch=error");
        assert_eq!(LogLevel::Verbose.directive(), "airwatch=debug");
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(i32::from(ExitCode::Success), 0);
        assert_eq!(i32::from(ExitCode::Error), 1);
        assert_eq!(i32::from(ExitCode::InvalidArgs), 2);
        assert_eq!(i32::from(ExitCode::NetworkError), 3);
        assert_eq!(i32::from(ExitCode::NoReceiver), 4);
        assert_eq!(i32::from(ExitCode::NoStreams), 5);
        assert_eq!(i32::from(ExitCode::PlaybackFailed), 6);
        assert_eq!(i32::from(ExitCode::UnsupportedSource), 7);
    }

    #[test]
    fn test_json_error_output_shape() {
        let out = JsonOutput::<()>::error_msg("boom", ExitCode::NoStreams);
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["error"], "boom");
        assert_eq!(json["exit_code"], 5);
        assert!(json.get("data").is_none());
    }
}
