//! Playback progress display
//!
//! The session reports one tick per whole second of media that elapsed, so
//! the bar advances with the video rather than with the poll rate.

use std::io::{stderr, Write};

use crossterm::{
    cursor, execute, queue,
    style::Print,
    terminal::{Clear, ClearType},
};

use crate::models::format_progress;

/// Receives progress updates from a playback session.
///
/// Implementations must not influence the session; they only present.
pub trait ProgressReporter: Send {
    /// Playback reached `current` seconds of `total`
    fn on_tick(&mut self, current: u64, total: u64);

    /// The session ended (finished, failed or cancelled)
    fn on_complete(&mut self);
}

impl<P: ProgressReporter + ?Sized> ProgressReporter for Box<P> {
    fn on_tick(&mut self, current: u64, total: u64) {
        (**self).on_tick(current, total)
    }

    fn on_complete(&mut self) {
        (**self).on_complete()
    }
}

/// Reporter that shows nothing (quiet mode)
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn on_tick(&mut self, _current: u64, _total: u64) {}
    fn on_complete(&mut self) {}
}

/// Cells in the bar
const BAR_WIDTH: usize = 32;

/// Render one progress line: `Playing |████░░░░| 02:05 / 10:00`
pub fn render_line(label: &str, current: u64, total: u64, width: usize) -> String {
    let filled = if total == 0 {
        0
    } else {
        ((current.min(total) as f64 / total as f64) * width as f64) as usize
    };
    format!(
        "{} |{}{}| {}",
        label,
        "█".repeat(filled),
        "░".repeat(width - filled),
        format_progress(current, total)
    )
}

/// Progress bar on stderr with elapsed / total time
pub struct TimedBar {
    label: String,
    width: usize,
    active: bool,
}

impl TimedBar {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            width: BAR_WIDTH,
            active: false,
        }
    }
}

impl Default for TimedBar {
    fn default() -> Self {
        Self::new("Playing")
    }
}

impl ProgressReporter for TimedBar {
    fn on_tick(&mut self, current: u64, total: u64) {
        let mut err = stderr();
        if !self.active {
            let _ = execute!(err, cursor::Hide);
            self.active = true;
        }
        let line = render_line(&self.label, current, total, self.width);
        let _ = queue!(
            err,
            cursor::MoveToColumn(0),
            Clear(ClearType::CurrentLine),
            Print(line)
        );
        let _ = err.flush();
    }

    fn on_complete(&mut self) {
        if self.active {
            let _ = execute!(stderr(), Print("\n"), cursor::Show);
            self.active = false;
        }
    }
}

impl Drop for TimedBar {
    fn drop(&mut self) {
        self.on_complete();
    }
}

/// Make the terminal cursor visible again
pub fn show_cursor() {
    let _ = execute!(stderr(), cursor::Show);
}
