//! Template generation for `--init` command

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::file::SETTINGS_FILE_NAME;

/// Template mycnf-upgrade.toml with documentation
pub const SETTINGS_TEMPLATE: &str = r#"# mycnf-upgrade.toml - Settings for the MySQL option file upgrader
#
# mycnf-upgrade rewrites deprecated [mysqld] options for a target
# server version and leaves everything else untouched.
#
# Command line flags override these settings - uncomment and modify
# as needed.

[upgrade]
# Option file to upgrade. !include and !includedir are followed.
# Default: "/etc/my.cnf"
# config = "/etc/my.cnf"

# Server version to upgrade for: "5.1", "5.5", "5.6" or "5.7".
# Default: "5.1"
# target = "5.1"

# Print a unified diff instead of the whole rewritten file.
# Default: false
# patch = false

# Diagnostic verbosity: debug, info, warning, error or fatal.
# Default: "info"
# log_level = "info"

# Abort on lines in [mysqld] that cannot be parsed.
# Default: false
# strict = false
"#;

/// Generate the settings file in the specified directory (or current directory if None).
///
/// Returns an error if the file already exists.
pub fn generate_init_file_in(dir: Option<&Path>) -> io::Result<PathBuf> {
    let path = dir.map_or_else(
        || PathBuf::from(SETTINGS_FILE_NAME),
        |d| d.join(SETTINGS_FILE_NAME),
    );

    if path.exists() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{SETTINGS_FILE_NAME} already exists"),
        ));
    }

    fs::write(&path, SETTINGS_TEMPLATE)?;
    Ok(path)
}

/// Generate the settings file in the current directory.
///
/// Returns an error if the file already exists.
pub fn generate_init_file() -> io::Result<PathBuf> {
    generate_init_file_in(None)
}
