//! Apply a rule table to a parsed document

use std::collections::BTreeMap;
use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::document::{is_multi_valued, Diagnostic, DiagnosticKind, Document};
use crate::rules::RuleTable;

/// Outcome of upgrading one document
#[derive(Debug, Clone)]
pub struct UpgradeResult {
    pub path: PathBuf,
    pub original: Vec<Vec<u8>>,
    pub rewritten: Vec<Vec<u8>>,
    /// Load-time diagnostics followed by rewrite diagnostics
    pub diagnostics: Vec<Diagnostic>,
}

impl UpgradeResult {
    pub fn has_changes(&self) -> bool {
        self.original != self.rewritten
    }

    pub fn original_content(&self) -> Vec<u8> {
        self.original.concat()
    }

    pub fn content(&self) -> Vec<u8> {
        self.rewritten.concat()
    }

    pub fn duplicates(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| matches!(d.kind, DiagnosticKind::DuplicateOption { .. }))
            .count()
    }
}

/// Rewrite every indexed directive that `table` has a rule for.
///
/// The document is left untouched; replacements are collected per line
/// index and only materialized into the returned line list.
pub fn upgrade(document: &Document, table: &RuleTable) -> UpgradeResult {
    let path = document.path.display();
    let mut diagnostics = document.diagnostics.clone();
    let mut pending: BTreeMap<usize, Vec<String>> = BTreeMap::new();

    for (key, occurrences) in document.index.iter() {
        if occurrences.len() > 1 && !is_multi_valued(key) {
            warn!(path = %path, "Duplicate options for '{}'", key);
            for occurrence in occurrences {
                warn!(
                    path = %path,
                    "  - {}:{}",
                    occurrence.line + 1,
                    String::from_utf8_lossy(&document.lines[occurrence.line]).trim_end()
                );
            }
            diagnostics.push(Diagnostic {
                line: occurrences[0].line + 1,
                kind: DiagnosticKind::DuplicateOption {
                    key: key.to_string(),
                    lines: occurrences.iter().map(|o| o.line + 1).collect(),
                },
            });
        }

        for occurrence in occurrences {
            let lineno = occurrence.line + 1;
            match table.get(key) {
                Some(rule) => {
                    let output = rule.apply(key, occurrence.value.as_deref());
                    let kind = if output.is_empty() {
                        info!(
                            path = %path,
                            line = lineno,
                            before = %occurrence.text,
                            "Removing option '{}'. Reason: {}",
                            key,
                            rule.reason
                        );
                        DiagnosticKind::Removed {
                            key: key.to_string(),
                            reason: rule.reason.to_string(),
                        }
                    } else {
                        info!(
                            path = %path,
                            line = lineno,
                            before = %occurrence.text,
                            after = ?output,
                            "Rewriting option '{}'. Reason: {}",
                            key,
                            rule.reason
                        );
                        DiagnosticKind::Rewritten {
                            key: key.to_string(),
                            reason: rule.reason.to_string(),
                        }
                    };
                    diagnostics.push(Diagnostic { line: lineno, kind });
                    pending.insert(occurrence.line, output);
                }
                None if occurrence.normalized => {
                    pending.insert(occurrence.line, vec![occurrence.text.clone()]);
                }
                None => debug!("No rule to rewrite '{}'", key),
            }
        }
    }

    let rewritten = materialize(&document.lines, &pending);

    UpgradeResult {
        path: document.path.clone(),
        original: document.lines.clone(),
        rewritten,
        diagnostics,
    }
}

/// Walk the original lines, substituting pending replacements in place.
/// Untouched lines are copied byte for byte.
fn materialize(lines: &[Vec<u8>], pending: &BTreeMap<usize, Vec<String>>) -> Vec<Vec<u8>> {
    let mut result = Vec::with_capacity(lines.len());

    for (idx, line) in lines.iter().enumerate() {
        let Some(replacement) = pending.get(&idx) else {
            result.push(line.clone());
            continue;
        };

        debug!(
            "Rewriting {}:{}",
            idx + 1,
            String::from_utf8_lossy(line).trim_end()
        );
        let eol = line_ending(line);
        let last = replacement.len().saturating_sub(1);
        for (n, new_line) in replacement.iter().enumerate() {
            debug!("  + {}", new_line);
            // an unterminated last line stays unterminated
            let terminator = match eol {
                None if n == last => "",
                None => "\n",
                Some(eol) => eol,
            };
            result.push(format!("{new_line}{terminator}").into_bytes());
        }
    }

    result
}

fn line_ending(line: &[u8]) -> Option<&'static str> {
    if line.ends_with(b"\r\n") {
        Some("\r\n")
    } else if line.ends_with(b"\n") {
        Some("\n")
    } else {
        None
    }
}
