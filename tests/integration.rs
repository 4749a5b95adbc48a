use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn upgrade_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_mycnf-upgrade"));
    // keep settings discovery and color detection inside the fixture
    cmd.current_dir(dir).env_remove("RUST_LOG").env("NO_COLOR", "1");
    cmd
}

fn run(dir: &Path, args: &[&str]) -> Output {
    upgrade_cmd(dir).args(args).output().unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

fn setup(content: &str) -> (TempDir, String) {
    let dir = TempDir::new().unwrap();
    // settings discovery stops at the git root
    fs::create_dir(dir.path().join(".git")).unwrap();
    let path = dir.path().join("my.cnf");
    fs::write(&path, content).unwrap();
    (dir, path.to_string_lossy().to_string())
}

const LEGACY_CNF: &str = "\
# legacy server config
[client]
port = 3306

[mysqld]
port = 3306
table_cache = 64
skip-innodb
log-slow-queries
default-character-set = utf8 # keep utf8
";

// ===========================================
// Output modes
// ===========================================

#[test]
fn test_full_output_is_rewritten_file() {
    let (dir, path) = setup(LEGACY_CNF);

    let output = run(dir.path(), &["-c", &path]);

    assert!(output.status.success());
    assert_eq!(
        stdout(&output),
        "\
# legacy server config
[client]
port = 3306

[mysqld]
port = 3306
table-open-cache = 64
table-definition-cache = 64
slow-query-log = 1
log-slow-slave-statements
character-set-server = utf8
"
    );
    // Original file is not modified
    assert_eq!(fs::read_to_string(&path).unwrap(), LEGACY_CNF);
}

#[test]
fn test_diagnostics_go_to_stderr() {
    let (dir, path) = setup(LEGACY_CNF);

    let output = run(dir.path(), &["-c", &path]);

    let stderr = stderr(&output);
    assert!(stderr.contains("Removing option 'skip-innodb'"));
    assert!(stderr.contains("Rewriting option 'table-cache'"));
    assert!(!stdout(&output).contains("Rewriting"));
}

#[test]
fn test_log_level_filters_diagnostics() {
    let (dir, path) = setup(LEGACY_CNF);

    let output = run(dir.path(), &["-c", &path, "-l", "warning"]);

    assert!(output.status.success());
    assert!(!stderr(&output).contains("Rewriting"));
}

#[test]
fn test_patch_mode_shows_unified_diff() {
    let (dir, path) = setup("[mysqld]\ntable-cache = 64\n");

    let output = run(dir.path(), &["--config", &path, "--patch"]);

    let stdout = stdout(&output);
    let label = mycnf_upgrade::path_from_root(Path::new(&path)).unwrap();
    assert!(stdout.contains(&format!("--- a/{}", label.display())));
    assert!(stdout.contains(&format!("+++ b/{}", label.display())));
    assert!(stdout.contains("-table-cache = 64\n"));
    assert!(stdout.contains("+table-open-cache = 64\n"));
    assert!(stdout.contains("+table-definition-cache = 64\n"));
}

#[test]
fn test_patch_mode_without_changes_is_empty() {
    let (dir, path) = setup("[mysqld]\nport = 3306\n");

    let output = run(dir.path(), &["-c", &path, "-p"]);

    assert!(output.status.success());
    assert_eq!(stdout(&output), "");
}

#[test]
fn test_in_place_writes_file() {
    let (dir, path) = setup("[mysqld]\nskip-locking\nport = 3306\n");

    let output = run(dir.path(), &["-c", &path, "--in-place"]);

    assert!(output.status.success());
    assert_eq!(fs::read_to_string(&path).unwrap(), "[mysqld]\nport = 3306\n");
    assert!(stdout(&output).contains("Upgraded:"));
}

#[test]
fn test_check_mode_exit_codes() {
    let (dir, path) = setup("[mysqld]\nskip-bdb\n");
    let output = run(dir.path(), &["-c", &path, "--check"]);
    assert!(!output.status.success());
    assert!(stdout(&output).contains("my.cnf"));
    assert_eq!(fs::read_to_string(&path).unwrap(), "[mysqld]\nskip-bdb\n");

    let (dir, path) = setup("[mysqld]\nport = 3306\n");
    let output = run(dir.path(), &["-c", &path, "--check"]);
    assert!(output.status.success());
}

// ===========================================
// Targets
// ===========================================

#[test]
fn test_target_selects_rule_table() {
    let (dir, path) = setup("[mysqld]\none-thread\n");

    let output = run(dir.path(), &["-c", &path, "-t", "5.1"]);
    assert_eq!(stdout(&output), "[mysqld]\none-thread\n");

    let output = run(dir.path(), &["-c", &path, "-t", "5.5"]);
    assert_eq!(stdout(&output), "[mysqld]\nthread-handling = no-threads\n");
}

#[test]
fn test_unknown_target_is_rejected() {
    let (dir, path) = setup("[mysqld]\n");

    let output = run(dir.path(), &["-c", &path, "-t", "8.0"]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("8.0"));
}

// ===========================================
// Errors
// ===========================================

#[test]
fn test_ambiguous_option_aborts_without_output() {
    let (dir, path) = setup("[mysqld]\ntable_cache = 64\np = 3306\n");

    let output = run(dir.path(), &["-c", &path]);

    assert!(!output.status.success());
    assert_eq!(stdout(&output), "");
    assert!(stderr(&output).contains("ambiguous option 'p' (password,port)"));
}

#[test]
fn test_missing_include_aborts_before_output() {
    let (dir, path) = setup("[mysqld]\nskip-innodb\n!include /nonexistent/extra.cnf\n");

    let output = run(dir.path(), &["-c", &path]);

    assert!(!output.status.success());
    assert_eq!(stdout(&output), "");
    assert!(stderr(&output).contains("/nonexistent/extra.cnf"));
}

#[test]
fn test_missing_config_fails() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent.cnf");

    let output = run(dir.path(), &["-c", missing.to_str().unwrap()]);

    assert!(!output.status.success());
}

#[test]
fn test_strict_mode_rejects_malformed_lines() {
    let (dir, path) = setup("[mysqld]\nnot a directive\n");

    let lenient = run(dir.path(), &["-c", &path]);
    assert!(lenient.status.success());
    assert_eq!(stdout(&lenient), "[mysqld]\nnot a directive\n");
    assert!(stderr(&lenient).contains("malformed"));

    let strict = run(dir.path(), &["-c", &path, "--strict"]);
    assert!(!strict.status.success());
    assert_eq!(stdout(&strict), "");
}

#[test]
fn test_strict_mode_only_checks_server_section() {
    let (dir, path) = setup("[client]\n!include\n[mysqld]\nskip-bdb\n");

    let output = run(dir.path(), &["-c", &path, "--strict"]);

    assert!(output.status.success());
    assert_eq!(stdout(&output), "[client]\n!include\n[mysqld]\n");
}

// ===========================================
// Encoding
// ===========================================

const LATIN1_CNF: &[u8] = b"# Configuraci\xf3n del servidor\n[mysqld]\nskip-innodb\ntable_cache = 64\n";

#[test]
fn test_non_utf8_file_is_upgraded_byte_for_byte() {
    let (dir, path) = setup("");
    fs::write(&path, LATIN1_CNF).unwrap();

    let output = run(dir.path(), &["-c", &path]);

    assert!(output.status.success());
    assert_eq!(
        output.stdout,
        b"# Configuraci\xf3n del servidor\n[mysqld]\ntable-open-cache = 64\ntable-definition-cache = 64\n"
    );
}

#[test]
fn test_non_utf8_file_in_place() {
    let (dir, path) = setup("");
    fs::write(&path, LATIN1_CNF).unwrap();

    let output = run(dir.path(), &["-c", &path, "--in-place"]);

    assert!(output.status.success());
    let written = fs::read(&path).unwrap();
    assert!(written.starts_with(b"# Configuraci\xf3n del servidor\n[mysqld]\ntable-open-cache = 64\n"));
}

// ===========================================
// Includes and duplicates
// ===========================================

#[test]
fn test_includes_are_upgraded_in_order() {
    let (dir, path) = setup("");
    let conf_d = dir.path().join("conf.d");
    fs::create_dir(&conf_d).unwrap();
    fs::write(conf_d.join("b.cnf"), "[mysqld]\nskip-bdb\nport = 1\n").unwrap();
    fs::write(conf_d.join("a.cnf"), "[mysqld]\ndefault-collation = utf8_bin\n").unwrap();
    fs::write(
        &path,
        format!("[mysqld]\n!includedir {}\nuser = mysql\n", conf_d.display()),
    )
    .unwrap();

    let output = run(dir.path(), &["-c", &path]);

    assert!(output.status.success());
    assert_eq!(
        stdout(&output),
        format!(
            "[mysqld]\n!includedir {}\nuser = mysql\n[mysqld]\ncollation-server = utf8_bin\n[mysqld]\nport = 1\n",
            conf_d.display()
        )
    );
}

#[test]
fn test_duplicate_warning() {
    let (dir, path) = setup("[mysqld]\nport = 3306\nreplicate-do-table = a.b\nreplicate-do-table = a.c\nport = 3307\n");

    let output = run(dir.path(), &["-c", &path]);

    let stderr = stderr(&output);
    assert!(output.status.success());
    assert!(stderr.contains("Duplicate options for 'port'"));
    assert!(stderr.contains("2:port = 3306"));
    assert!(stderr.contains("5:port = 3307"));
    assert!(stderr.contains(&format!("path={path}")));
    assert!(!stderr.contains("Duplicate options for 'replicate-do-table'"));
}

// ===========================================
// Settings file
// ===========================================

#[test]
fn test_settings_file_provides_defaults() {
    let (dir, path) = setup("[mysqld]\ntable-cache = 64\n");
    fs::write(
        dir.path().join("mycnf-upgrade.toml"),
        format!("[upgrade]\nconfig = \"{path}\"\npatch = true\n"),
    )
    .unwrap();

    let output = run(dir.path(), &[]);

    assert!(output.status.success());
    assert!(stdout(&output).contains("+table-open-cache = 64"));
}

#[test]
fn test_cli_overrides_settings_file() {
    let (dir, path) = setup("[mysqld]\none-thread\n");
    fs::write(
        dir.path().join("mycnf-upgrade.toml"),
        "[upgrade]\ntarget = \"5.1\"\n",
    )
    .unwrap();

    let output = run(dir.path(), &["-c", &path, "-t", "5.7"]);

    assert_eq!(stdout(&output), "[mysqld]\nthread-handling = no-threads\n");
}

#[test]
fn test_invalid_settings_file_is_ignored_with_warning() {
    let (dir, path) = setup("[mysqld]\nport = 3306\n");
    fs::write(dir.path().join("mycnf-upgrade.toml"), "not toml {{{\n").unwrap();

    let output = run(dir.path(), &["-c", &path]);

    assert!(output.status.success());
    assert!(stderr(&output).contains("Warning: Failed to load"));
    assert_eq!(stdout(&output), "[mysqld]\nport = 3306\n");
}

#[test]
fn test_init_creates_settings_file() {
    let dir = TempDir::new().unwrap();

    let output = run(dir.path(), &["--init"]);
    assert!(output.status.success());
    assert!(dir.path().join("mycnf-upgrade.toml").exists());

    let output = run(dir.path(), &["--init"]);
    assert!(!output.status.success());
}
