use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use mycnf_upgrade::{
    find_settings_file, generate_init_file, load_settings, merge_settings, run,
    should_use_colors, CliUpgradeOptions, ColorChoice, Config, LogLevel, OutputContext,
    OutputMode, TargetVersion, UpgradeToml,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mycnf-upgrade")]
#[command(
    version,
    about = "Rewrite deprecated MySQL server options for a target version"
)]
struct Cli {
    /// my.cnf file to upgrade [default: /etc/my.cnf]
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// MySQL version to target: 5.1, 5.5, 5.6 or 5.7 [default: 5.1]
    #[arg(short, long, value_name = "VERSION")]
    target: Option<TargetVersion>,

    /// Diagnostic verbosity: debug, info, warning, error or fatal [default: info]
    #[arg(short, long, value_name = "LEVEL")]
    log_level: Option<LogLevel>,

    /// Output a unified diff rather than the entire file
    #[arg(short, long, conflicts_with_all = ["in_place", "check"])]
    patch: bool,

    /// Write upgraded files back in place
    #[arg(long, conflicts_with = "check")]
    in_place: bool,

    /// Check only (no output), exit 1 if any file needs an upgrade
    #[arg(long)]
    check: bool,

    /// Abort on malformed lines in the [mysqld] section
    #[arg(long)]
    strict: bool,

    /// Force colored diff output
    #[arg(long)]
    color: bool,

    /// Disable colored diff output
    #[arg(long)]
    no_color: bool,

    /// Generate a template mycnf-upgrade.toml settings file
    #[arg(long)]
    init: bool,

    /// Specify settings file path (overrides auto-discovery)
    #[arg(long, value_name = "PATH")]
    settings: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Handle --init command
    if cli.init {
        return handle_init();
    }

    // Load settings file
    let toml_settings = load_settings_file(&cli.settings);

    // Merge configurations: CLI > TOML > defaults
    let settings = merge_settings(
        &build_cli_options(&cli),
        toml_settings.as_ref().map(|s| &s.upgrade),
    );

    init_logging(settings.log_level);

    let mode = if cli.check {
        OutputMode::Check
    } else if cli.in_place {
        OutputMode::InPlace
    } else if settings.patch {
        OutputMode::Patch
    } else {
        OutputMode::Full
    };

    let use_colors = should_use_colors(ColorChoice::from_flags(cli.color, cli.no_color));
    let ctx = OutputContext::new(mode, use_colors);

    let config = Config {
        path: settings.config,
        target: settings.target,
        strict: settings.strict,
    };

    match run(&config, &ctx) {
        Ok(result) => {
            if mode == OutputMode::Check && result.has_changes() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::from(1)
        }
    }
}

fn init_logging(level: LogLevel) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::default().add_directive(level.as_filter().into())),
        )
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .without_time()
        .init();
}

fn handle_init() -> ExitCode {
    match generate_init_file() {
        Ok(path) => {
            println!("Created {}", path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

fn load_settings_file(explicit_path: &Option<PathBuf>) -> Option<UpgradeToml> {
    let settings_path = explicit_path.clone().or_else(|| {
        std::env::current_dir()
            .ok()
            .and_then(|d| find_settings_file(&d))
    });

    // logging is not set up yet, the log level may come from this file
    settings_path.and_then(|p| match load_settings(&p) {
        Ok(settings) => Some(settings),
        Err(e) => {
            eprintln!("Warning: Failed to load {}: {}", p.display(), e);
            None
        }
    })
}

fn build_cli_options(cli: &Cli) -> CliUpgradeOptions {
    // Boolean flags in clap are always present (default false), so we
    // treat false as "not set" for proper merging with the settings file.
    CliUpgradeOptions {
        config: cli.config.clone(),
        target: cli.target,
        patch: cli.patch.then_some(true),
        log_level: cli.log_level,
        strict: cli.strict.then_some(true),
    }
}
