//! Terminal line formatting. Pure text transforms, no lifecycle state.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

#[allow(clippy::expect_used)]
static ANSI_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1b\[[0-9;?]*[ -/]*[@-~]|\x1b\][^\x07]*\x07").expect("valid ansi regex")
});

#[allow(clippy::expect_used)]
static ERROR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\berr!|\b(error|failed|exception|cannot find module|unhandled)\b)")
        .expect("valid error regex")
});

#[allow(clippy::expect_used)]
static WARN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(warn|warning|deprecated)\b").expect("valid warn regex")
});

#[allow(clippy::expect_used)]
static SUCCESS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\bready\b|\bcompiled\b|\bsuccess|\bstarted\b|✓|added \d+ packages)")
        .expect("valid success regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineLevel {
    Error,
    Warn,
    Success,
    Info,
}

impl LineLevel {
    fn color(self) -> &'static str {
        match self {
            Self::Error => "\x1b[31m",
            Self::Warn => "\x1b[33m",
            Self::Success => "\x1b[32m",
            Self::Info => "",
        }
    }
}

/// Remove ANSI color and OSC sequences.
pub fn strip_ansi(line: &str) -> String {
    ANSI_RE.replace_all(line, "").into_owned()
}

/// Classify a line by keyword. Error wins over warn, warn over success.
pub fn classify(line: &str) -> LineLevel {
    let plain = strip_ansi(line);
    if ERROR_RE.is_match(&plain) {
        LineLevel::Error
    } else if WARN_RE.is_match(&plain) {
        LineLevel::Warn
    } else if SUCCESS_RE.is_match(&plain) {
        LineLevel::Success
    } else {
        LineLevel::Info
    }
}

/// Strip the line's own escapes and color it by level.
pub fn colorize(line: &str) -> String {
    let plain = strip_ansi(line);
    let level = classify(&plain);
    match level {
        LineLevel::Info => plain,
        _ => format!("{}{plain}\x1b[0m", level.color()),
    }
}

/// Phase banner written into the terminal log between phases.
pub fn phase_banner(phase: crate::BootPhase) -> String {
    format!("── {phase} ──")
}
