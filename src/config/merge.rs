//! Settings merging logic
//!
//! Priority: CLI args > mycnf-upgrade.toml > defaults

use std::path::PathBuf;

use crate::rules::TargetVersion;

use super::toml_schema::{LogLevel, UpgradeSection};

/// Option file upgraded when nothing else is specified
pub const DEFAULT_OPTION_FILE: &str = "/etc/my.cnf";

/// CLI options that can override settings file values.
///
/// Uses `Option<T>` to distinguish "not specified" from "explicitly set".
#[derive(Debug, Default)]
pub struct CliUpgradeOptions {
    pub config: Option<PathBuf>,
    pub target: Option<TargetVersion>,
    pub patch: Option<bool>,
    pub log_level: Option<LogLevel>,
    pub strict: Option<bool>,
}

/// Fully resolved settings for one run
#[derive(Debug, Clone, PartialEq)]
pub struct UpgradeSettings {
    pub config: PathBuf,
    pub target: TargetVersion,
    pub patch: bool,
    pub log_level: LogLevel,
    pub strict: bool,
}

impl Default for UpgradeSettings {
    fn default() -> Self {
        Self {
            config: PathBuf::from(DEFAULT_OPTION_FILE),
            target: TargetVersion::default(),
            patch: false,
            log_level: LogLevel::default(),
            strict: false,
        }
    }
}

/// Merge settings from CLI, TOML, and defaults.
///
/// Priority: CLI > TOML > defaults
pub fn merge_settings(cli: &CliUpgradeOptions, toml: Option<&UpgradeSection>) -> UpgradeSettings {
    let defaults = UpgradeSettings::default();

    UpgradeSettings {
        config: cli
            .config
            .clone()
            .or_else(|| toml.and_then(|t| t.config.clone()))
            .unwrap_or(defaults.config),
        target: cli
            .target
            .or_else(|| toml.and_then(|t| t.target))
            .unwrap_or(defaults.target),
        patch: cli
            .patch
            .or_else(|| toml.and_then(|t| t.patch))
            .unwrap_or(defaults.patch),
        log_level: cli
            .log_level
            .or_else(|| toml.and_then(|t| t.log_level))
            .unwrap_or(defaults.log_level),
        strict: cli
            .strict
            .or_else(|| toml.and_then(|t| t.strict))
            .unwrap_or(defaults.strict),
    }
}
