//! Log output setup
//!
//! All user-facing progress goes through `tracing`. Lines carry no target
//! or level; `deploy` output is prefixed with a wall-clock time.

use std::fmt;

use chrono::Local;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;

/// `HH:MM:SS` local time
struct ClockTime;

impl FormatTime for ClockTime {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        write!(w, "{}", Local::now().format("%H:%M:%S"))
    }
}

/// Filter directive: LOGGING=debug,info,warn,error (or LOG_LEVEL), else by `--verbose`
pub fn filter(verbose: bool) -> String {
    std::env::var("LOGGING")
        .or_else(|_| std::env::var("LOG_LEVEL"))
        .unwrap_or_else(|_| default_filter(verbose).to_string())
}

fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "info"
    }
}

/// Install the global subscriber. Call once, before any command runs.
pub fn init(verbose: bool, timestamps: bool) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter(verbose))
        .with_target(false)
        .with_level(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_ansi(false);

    if timestamps {
        builder.with_timer(ClockTime).init();
    } else {
        builder.without_time().init();
    }
}
