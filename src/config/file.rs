//! Settings file discovery and loading

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::toml_schema::UpgradeToml;

/// Name of the settings file searched for upward from the working directory
pub const SETTINGS_FILE_NAME: &str = "mycnf-upgrade.toml";

/// Error type for settings loading
#[derive(Error, Debug)]
pub enum ConfigError {
    /// IO error reading the file
    #[error("failed to read settings file: {0}")]
    Io(#[from] io::Error),
    /// TOML parsing error
    #[error("failed to parse settings file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Search upward from `start_dir` for a file with the given name.
///
/// If `stop_at_git_root` is true, stops searching when a `.git` directory is found.
/// Returns `None` if the file is not found.
pub fn find_file_upward(
    start_dir: &Path,
    filename: &str,
    stop_at_git_root: bool,
) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();

    loop {
        let file_path = current.join(filename);
        if file_path.exists() {
            return Some(file_path);
        }

        if stop_at_git_root && current.join(".git").exists() {
            return None;
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Find mycnf-upgrade.toml by searching upward from the given directory.
///
/// Stops at the first match, or at the git repository root
/// (directory containing `.git`), whichever comes first.
pub fn find_settings_file(start_dir: &Path) -> Option<PathBuf> {
    find_file_upward(start_dir, SETTINGS_FILE_NAME, true)
}

/// Load and parse a settings file from the given path.
pub fn load_settings(path: &Path) -> Result<UpgradeToml, ConfigError> {
    let content = fs::read_to_string(path)?;
    let settings: UpgradeToml = toml::from_str(&content)?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;
    use crate::rules::TargetVersion;
    use tempfile::TempDir;

    #[test]
    fn test_find_settings_in_current_dir() {
        let dir = TempDir::new().unwrap();
        let settings_path = dir.path().join(SETTINGS_FILE_NAME);
        fs::write(&settings_path, "[upgrade]\n").unwrap();

        let found = find_settings_file(dir.path());
        assert_eq!(found, Some(settings_path));
    }

    #[test]
    fn test_find_settings_in_parent_dir() {
        let parent = TempDir::new().unwrap();
        let settings_path = parent.path().join(SETTINGS_FILE_NAME);
        fs::write(&settings_path, "[upgrade]\n").unwrap();

        let child = parent.path().join("subdir");
        fs::create_dir(&child).unwrap();

        let found = find_settings_file(&child);
        assert_eq!(found, Some(settings_path));
    }

    #[test]
    fn test_find_settings_stops_at_git_root() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();

        let subdir = dir.path().join("subdir");
        fs::create_dir(&subdir).unwrap();

        let found = find_settings_file(&subdir);
        assert_eq!(found, None);
    }

    #[test]
    fn test_load_settings_full() {
        let dir = TempDir::new().unwrap();
        let settings_path = dir.path().join(SETTINGS_FILE_NAME);
        fs::write(
            &settings_path,
            r#"
[upgrade]
config = "/etc/mysql/my.cnf"
target = "5.6"
patch = true
log_level = "warning"
strict = true
"#,
        )
        .unwrap();

        let settings = load_settings(&settings_path).unwrap();
        assert_eq!(
            settings.upgrade.config,
            Some(PathBuf::from("/etc/mysql/my.cnf"))
        );
        assert_eq!(settings.upgrade.target, Some(TargetVersion::Mysql56));
        assert_eq!(settings.upgrade.patch, Some(true));
        assert_eq!(settings.upgrade.log_level, Some(LogLevel::Warning));
        assert_eq!(settings.upgrade.strict, Some(true));
    }

    #[test]
    fn test_load_settings_empty() {
        let dir = TempDir::new().unwrap();
        let settings_path = dir.path().join(SETTINGS_FILE_NAME);
        fs::write(&settings_path, "").unwrap();

        let settings = load_settings(&settings_path).unwrap();
        assert_eq!(settings.upgrade.target, None);
        assert_eq!(settings.upgrade.patch, None);
    }

    #[test]
    fn test_load_settings_unknown_target() {
        let dir = TempDir::new().unwrap();
        let settings_path = dir.path().join(SETTINGS_FILE_NAME);
        fs::write(&settings_path, "[upgrade]\ntarget = \"8.0\"\n").unwrap();

        let result = load_settings(&settings_path);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_settings_invalid_toml() {
        let dir = TempDir::new().unwrap();
        let settings_path = dir.path().join(SETTINGS_FILE_NAME);
        fs::write(&settings_path, "invalid toml {{{\n").unwrap();

        let result = load_settings(&settings_path);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_settings_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = load_settings(&dir.path().join(SETTINGS_FILE_NAME));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
