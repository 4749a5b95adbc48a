pub mod colors;
pub mod config;
pub mod document;
pub mod error;
mod output;
pub mod resolve;
pub mod rules;
pub mod tokenize;
pub mod upgrade;
pub mod walker;

pub use colors::{should_use_colors, ColorChoice, Colors};
pub use config::{
    find_settings_file, generate_init_file, load_settings, merge_settings, CliUpgradeOptions,
    ConfigError, LogLevel, UpgradeSection, UpgradeSettings, UpgradeToml, SETTINGS_TEMPLATE,
};
pub use document::{
    classify, Diagnostic, DiagnosticKind, Document, KeyIndex, Line, Loader, OptionOccurrence,
    SERVER_SECTION,
};
pub use error::UpgradeError;
pub use output::{path_from_root, render_diff, Config, OutputContext, OutputMode, RunResult};
pub use resolve::{resolve_option, AmbiguousOption};
pub use rules::{RewriteRule, RuleKind, RuleTable, TargetVersion, Template};
pub use tokenize::{parse_directive, remove_inline_comment, strip_obsolete_syntax, Directive};
pub use upgrade::{upgrade, UpgradeResult};

use std::fs;

use tracing::info;

/// Main entry point: upgrade the include closure of `config.path`.
///
/// Every file is loaded before anything is printed or written, so a fatal
/// error never leaves partial output behind.
pub fn run(config: &Config, ctx: &OutputContext) -> Result<RunResult, UpgradeError> {
    let table = RuleTable::for_target(config.target);
    info!(
        "Upgrading {} for MySQL {}",
        config.path.display(),
        table.target()
    );

    let documents = Loader::new(&config.path, config.strict).collect::<Result<Vec<_>, _>>()?;
    let results: Vec<UpgradeResult> = documents.iter().map(|d| upgrade(d, table)).collect();

    let mut run_result = RunResult::default();

    for result in &results {
        run_result.files_checked += 1;
        run_result.duplicates += result.duplicates();
        if result.has_changes() {
            run_result.files_changed += 1;
        }

        process_result(result, ctx)?;
    }

    output::log_summary(&run_result, ctx);

    Ok(run_result)
}

fn process_result(result: &UpgradeResult, ctx: &OutputContext) -> Result<(), UpgradeError> {
    match ctx.mode {
        OutputMode::Full => {
            output::print_content(result).map_err(|e| UpgradeError::io(&result.path, e))?
        }
        OutputMode::Patch => {
            output::print_diff(result, ctx).map_err(|e| UpgradeError::io(&result.path, e))?
        }
        OutputMode::InPlace => {
            // Only write if content changed
            if result.has_changes() {
                fs::write(&result.path, result.content())
                    .map_err(|e| UpgradeError::io(&result.path, e))?;
                output::print_upgraded(&result.path);
            }
        }
        OutputMode::Check => {
            if result.has_changes() {
                output::print_needs_upgrade(&result.path);
            }
        }
    }
    Ok(())
}
