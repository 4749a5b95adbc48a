//! Configuration file support for mycnf-upgrade.
//!
//! This module provides:
//! - Loading settings from `mycnf-upgrade.toml`
//! - Settings file discovery (search upward from current directory)
//! - Merging CLI args, settings file, and defaults
//! - Template generation with `--init`

mod file;
mod init;
mod merge;
mod toml_schema;

pub use file::{find_file_upward, find_settings_file, load_settings, ConfigError};
pub use init::{generate_init_file, generate_init_file_in, SETTINGS_TEMPLATE};
pub use merge::{merge_settings, CliUpgradeOptions, UpgradeSettings, DEFAULT_OPTION_FILE};
pub use toml_schema::{LogLevel, UpgradeSection, UpgradeToml};
