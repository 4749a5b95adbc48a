use std::io::{self, IsTerminal};

const RESET: &str = "\x1b[0m";

/// How the user asked for colored diffs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorChoice {
    Auto,
    Always,
    Never,
}

impl ColorChoice {
    /// `--no-color` wins over `--color`
    pub fn from_flags(force_color: bool, no_color: bool) -> Self {
        if no_color {
            ColorChoice::Never
        } else if force_color {
            ColorChoice::Always
        } else {
            ColorChoice::Auto
        }
    }
}

/// ANSI sequences for unified diff lines
#[derive(Debug, Clone, Copy)]
pub struct Colors {
    pub header: &'static str,
    pub hunk: &'static str,
    pub removed: &'static str,
    pub added: &'static str,
    enabled: bool,
}

impl Colors {
    pub fn new(enabled: bool) -> Self {
        if enabled {
            Self {
                header: "\x1b[1m",   // Bold
                hunk: "\x1b[36m",    // Cyan
                removed: "\x1b[31m", // Red
                added: "\x1b[32m",   // Green
                enabled: true,
            }
        } else {
            Self {
                header: "",
                hunk: "",
                removed: "",
                added: "",
                enabled: false,
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn reset(&self) -> &'static str {
        if self.enabled {
            RESET
        } else {
            ""
        }
    }

    /// Color to use for one line of a unified diff
    pub fn for_diff_line(&self, line: &[u8]) -> &'static str {
        if line.starts_with(b"---") || line.starts_with(b"+++") {
            self.header
        } else if line.starts_with(b"@@") {
            self.hunk
        } else if line.starts_with(b"-") {
            self.removed
        } else if line.starts_with(b"+") {
            self.added
        } else {
            ""
        }
    }
}

pub fn should_use_colors(choice: ColorChoice) -> bool {
    // Priority: explicit flag > NO_COLOR env > TTY detection
    match choice {
        ColorChoice::Never => false,
        ColorChoice::Always => true,
        ColorChoice::Auto => std::env::var("NO_COLOR").is_err() && io::stdout().is_terminal(),
    }
}
