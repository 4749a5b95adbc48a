use crate::colors::Colors;
use crate::rules::TargetVersion;
use crate::upgrade::UpgradeResult;
use similar::TextDiff;
use std::io::{self, Write};
use std::path::{absolute, Component, Path, PathBuf};
use tracing::info;

/// Lines of context around each diff hunk
const DIFF_CONTEXT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputMode {
    /// Print every upgraded file in full
    Full,
    /// Print a unified diff per file
    Patch,
    /// Write upgraded files back to disk
    InPlace,
    /// List files that need an upgrade, write nothing
    Check,
}

pub struct Config {
    pub path: PathBuf,
    pub target: TargetVersion,
    pub strict: bool,
}

pub struct OutputContext {
    pub mode: OutputMode,
    pub colors: Colors,
}

impl OutputContext {
    pub fn new(mode: OutputMode, use_colors: bool) -> Self {
        Self {
            mode,
            colors: Colors::new(use_colors),
        }
    }
}

#[derive(Debug, Default)]
pub struct RunResult {
    pub files_checked: usize,
    pub files_changed: usize,
    pub duplicates: usize,
}

impl RunResult {
    pub fn has_changes(&self) -> bool {
        self.files_changed > 0
    }
}

/// `path` made absolute, normalized and relative to `/`
pub fn path_from_root(path: &Path) -> io::Result<PathBuf> {
    let mut relative = PathBuf::new();
    for component in absolute(path)?.components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::ParentDir => {
                relative.pop();
            }
            _ => {}
        }
    }
    Ok(relative)
}

/// Unified diff between the original and upgraded file, empty when unchanged.
///
/// Diff lines carry the file's raw bytes, which need not be UTF-8.
pub fn render_diff(result: &UpgradeResult, colors: &Colors) -> io::Result<Vec<u8>> {
    if !result.has_changes() {
        return Ok(Vec::new());
    }

    let label = path_from_root(&result.path)?;
    let from = Path::new("a").join(&label);
    let to = Path::new("b").join(&label);

    let original = result.original_content();
    let content = result.content();
    let diff = TextDiff::from_lines(&original, &content);
    let mut patch = Vec::with_capacity(original.len() + content.len());
    diff.unified_diff()
        .context_radius(DIFF_CONTEXT)
        .header(&from.to_string_lossy(), &to.to_string_lossy())
        .to_writer(&mut patch)?;

    if !colors.is_enabled() {
        return Ok(patch);
    }

    let mut colored = Vec::with_capacity(patch.len());
    for line in patch.split_inclusive(|&b| b == b'\n') {
        let text = line.strip_suffix(b"\n").unwrap_or(line);
        let color = colors.for_diff_line(text);
        if color.is_empty() {
            colored.extend_from_slice(line);
        } else {
            colored.extend_from_slice(color.as_bytes());
            colored.extend_from_slice(text);
            colored.extend_from_slice(colors.reset().as_bytes());
            colored.extend_from_slice(&line[text.len()..]);
        }
    }
    Ok(colored)
}

pub fn print_content(result: &UpgradeResult) -> io::Result<()> {
    io::stdout().lock().write_all(&result.content())
}

pub fn print_diff(result: &UpgradeResult, ctx: &OutputContext) -> io::Result<()> {
    io::stdout().lock().write_all(&render_diff(result, &ctx.colors)?)
}

pub fn print_upgraded(path: &Path) {
    println!("Upgraded: {}", path.display());
}

pub fn print_needs_upgrade(path: &Path) {
    println!("{}", path.display());
}

/// Summary goes to the diagnostic channel so it never mixes with file output
pub fn log_summary(result: &RunResult, ctx: &OutputContext) {
    let action = match ctx.mode {
        OutputMode::InPlace => "upgraded",
        OutputMode::Check => "need an upgrade",
        OutputMode::Full | OutputMode::Patch => "changed",
    };
    info!(
        "{} of {} file(s) {}, {} duplicate option(s)",
        result.files_changed, result.files_checked, action, result.duplicates
    );
}
