//! TOML schema definitions for mycnf-upgrade.toml

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;

use crate::rules::TargetVersion;

/// Root structure for mycnf-upgrade.toml
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct UpgradeToml {
    /// Upgrade settings
    #[serde(default)]
    pub upgrade: UpgradeSection,
}

/// `[upgrade]` section in mycnf-upgrade.toml
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpgradeSection {
    /// Option file to upgrade (default: /etc/my.cnf)
    pub config: Option<PathBuf>,

    /// Server version to target (default: 5.1)
    pub target: Option<TargetVersion>,

    /// Output a unified diff instead of the whole file (default: false)
    pub patch: Option<bool>,

    /// Diagnostic verbosity (default: info)
    pub log_level: Option<LogLevel>,

    /// Treat malformed lines as fatal (default: false)
    pub strict: Option<bool>,
}

/// Diagnostic verbosity, named after the classic syslog-style levels
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
    Fatal,
}

impl LogLevel {
    const ALL: [LogLevel; 5] = [
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warning,
        LogLevel::Error,
        LogLevel::Fatal,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
            LogLevel::Fatal => "fatal",
        }
    }

    /// tracing has no fatal level; it shares ERROR
    pub fn as_filter(self) -> LevelFilter {
        match self {
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warning => LevelFilter::WARN,
            LogLevel::Error | LogLevel::Fatal => LevelFilter::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        LogLevel::ALL
            .into_iter()
            .find(|level| level.as_str() == wanted)
            .ok_or_else(|| {
                format!("unknown log level '{s}' (expected debug, info, warning, error or fatal)")
            })
    }
}
