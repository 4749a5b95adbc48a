//! Option file loading and line classification
//!
//! A [`Document`] holds the untouched lines of one physical file together
//! with an index of the server-section directives found in it. The
//! [`Loader`] walks the include closure of a root file breadth-first and
//! yields one document per file.

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::UpgradeError;
use crate::resolve::resolve_option;
use crate::tokenize::{parse_directive, strip_obsolete_syntax};
use crate::walker::option_files_in;

/// Section whose directives are rewritten
pub const SERVER_SECTION: &str = "mysqld";

/// Options that may legitimately appear more than once in a server section
pub const MULTI_VALUED_OPTIONS: &[&str] = &[
    "binlog-do-db",
    "binlog-ignore-db",
    "replicate-do-db",
    "replicate-ignore-db",
    "replicate-do-table",
    "replicate-ignore-table",
    "replicate-wild-do-table",
    "replicate-wild-ignore-table",
];

pub fn is_multi_valued(key: &str) -> bool {
    MULTI_VALUED_OPTIONS.contains(&key)
}

/// Shape of one physical line
#[derive(Debug, Clone, PartialEq)]
pub enum Line<'a> {
    Blank,
    Section(&'a str),
    Comment,
    Include(&'a str),
    IncludeDir(&'a str),
    Directive(&'a str),
    Malformed,
}

/// Classify a line. Leading and trailing whitespace is ignored.
pub fn classify(line: &str) -> Line<'_> {
    let line = line.trim();

    if line.is_empty() {
        return Line::Blank;
    }

    if let Some(header) = line.strip_prefix('[') {
        return match header.split_once(']') {
            Some((name, _)) => Line::Section(name.trim()),
            None => Line::Malformed,
        };
    }

    if line.starts_with('#') || line.starts_with(';') {
        return Line::Comment;
    }

    if line.starts_with('!') {
        let (token, rest) = line
            .split_once(char::is_whitespace)
            .unwrap_or((line, ""));
        let target = rest.trim();
        match token {
            "!include" | "!includedir" if target.is_empty() => return Line::Malformed,
            "!include" => return Line::Include(target),
            "!includedir" => return Line::IncludeDir(target),
            _ => {}
        }
    }

    Line::Directive(line)
}

/// Normalize an option name to the hyphen separator convention
pub fn canonical_key(key: &str) -> String {
    key.replace('_', "-")
}

/// One directive of the server section
#[derive(Debug, Clone, PartialEq)]
pub struct OptionOccurrence {
    pub key: String,
    pub value: Option<String>,
    /// Line text after `set-variable` normalization, right-trimmed
    pub text: String,
    /// 0-based index into [`Document::lines`]
    pub line: usize,
    pub section: String,
    /// True when the obsolete `set-variable` syntax was stripped
    pub normalized: bool,
}

/// Canonical option name -> occurrences in document order
#[derive(Debug, Clone, Default)]
pub struct KeyIndex {
    entries: BTreeMap<String, Vec<OptionOccurrence>>,
}

impl KeyIndex {
    pub fn insert(&mut self, occurrence: OptionOccurrence) {
        self.entries
            .entry(occurrence.key.clone())
            .or_default()
            .push(occurrence);
    }

    pub fn get(&self, key: &str) -> Option<&[OptionOccurrence]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[OptionOccurrence])> {
        self.entries
            .iter()
            .map(|(key, list)| (key.as_str(), list.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Include directive found while parsing
#[derive(Debug, Clone, PartialEq)]
pub enum Include {
    File { path: PathBuf, line: usize },
    Dir { path: PathBuf, line: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// 1-based line number
    pub line: usize,
    pub kind: DiagnosticKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DiagnosticKind {
    Normalized { before: String, after: String },
    Malformed { text: String },
    Rewritten { key: String, reason: String },
    Removed { key: String, reason: String },
    DuplicateOption { key: String, lines: Vec<usize> },
}

/// One physical option file
#[derive(Debug, Clone)]
pub struct Document {
    pub path: PathBuf,
    /// Raw lines as read, each with its original terminator. Bytes are not
    /// required to be UTF-8.
    pub lines: Vec<Vec<u8>>,
    pub index: KeyIndex,
    pub includes: Vec<Include>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Document {
    /// Parse file content into lines and a server-section index.
    ///
    /// Lines are classified through a lossy UTF-8 view; the raw bytes are
    /// kept as read. Malformed lines are reported and left alone unless
    /// `strict` is set and they sit in the server section.
    pub fn parse(path: &Path, content: &[u8], strict: bool) -> Result<Self, UpgradeError> {
        let lines: Vec<Vec<u8>> = content
            .split_inclusive(|&b| b == b'\n')
            .map(<[u8]>::to_vec)
            .collect();
        let mut index = KeyIndex::default();
        let mut includes = vec![];
        let mut diagnostics = vec![];
        let mut section: Option<String> = None;

        for (idx, raw) in lines.iter().enumerate() {
            let lineno = idx + 1;
            let view = String::from_utf8_lossy(raw);
            let line = view.trim_end();
            let in_server = section.as_deref() == Some(SERVER_SECTION);

            let malformed = |diagnostics: &mut Vec<Diagnostic>| {
                if strict && in_server {
                    return Err(UpgradeError::MalformedDirective {
                        path: path.to_path_buf(),
                        line: lineno,
                        text: line.to_string(),
                    });
                }
                warn!("Ignoring malformed line {}:{}: {}", path.display(), lineno, line);
                diagnostics.push(Diagnostic {
                    line: lineno,
                    kind: DiagnosticKind::Malformed {
                        text: line.to_string(),
                    },
                });
                Ok(())
            };

            match classify(line) {
                Line::Blank | Line::Comment => {}
                Line::Section(name) => section = Some(name.to_string()),
                Line::Malformed => {
                    section = None;
                    malformed(&mut diagnostics)?;
                }
                Line::Include(target) => includes.push(Include::File {
                    path: PathBuf::from(target),
                    line: lineno,
                }),
                Line::IncludeDir(target) => includes.push(Include::Dir {
                    path: PathBuf::from(target),
                    line: lineno,
                }),
                Line::Directive(_) if !in_server => {
                    debug!(
                        "Ignoring section [{}] option {} on line {}",
                        section.as_deref().unwrap_or(""),
                        line,
                        lineno
                    );
                }
                Line::Directive(_) => {
                    let (text, normalized) = match strip_obsolete_syntax(line) {
                        Some(rest) => {
                            let rest = rest.trim_end();
                            info!(
                                path = %path.display(),
                                line = lineno,
                                "Rewrote obsolete syntax '{}' to '{}'",
                                line,
                                rest
                            );
                            diagnostics.push(Diagnostic {
                                line: lineno,
                                kind: DiagnosticKind::Normalized {
                                    before: line.to_string(),
                                    after: rest.to_string(),
                                },
                            });
                            (rest, true)
                        }
                        None => (line, false),
                    };

                    let Some(directive) = parse_directive(text) else {
                        malformed(&mut diagnostics)?;
                        continue;
                    };

                    let key = resolve_option(&directive.key).map_err(|source| {
                        UpgradeError::AmbiguousOption {
                            path: path.to_path_buf(),
                            line: lineno,
                            source,
                        }
                    })?;

                    index.insert(OptionOccurrence {
                        key: canonical_key(&key),
                        value: directive.value,
                        text: text.to_string(),
                        line: idx,
                        section: SERVER_SECTION.to_string(),
                        normalized,
                    });
                }
            }
        }

        Ok(Self {
            path: path.to_path_buf(),
            lines,
            index,
            includes,
            diagnostics,
        })
    }

    /// Read and parse a file. The file is closed before parsing starts.
    pub fn load(path: &Path, strict: bool) -> Result<Self, UpgradeError> {
        let content = fs::read(path).map_err(|e| UpgradeError::io(path, e))?;
        Self::parse(path, &content, strict)
    }
}

#[derive(Debug)]
struct Pending {
    path: PathBuf,
    /// Including file and 1-based line, `None` for the root file
    origin: Option<(PathBuf, usize)>,
}

/// Breadth-first iterator over the include closure of a root file
#[derive(Debug)]
pub struct Loader {
    queue: VecDeque<Pending>,
    seen: HashSet<PathBuf>,
    strict: bool,
}

impl Loader {
    pub fn new(root: impl Into<PathBuf>, strict: bool) -> Self {
        let mut queue = VecDeque::new();
        queue.push_back(Pending {
            path: root.into(),
            origin: None,
        });
        Self {
            queue,
            seen: HashSet::new(),
            strict,
        }
    }

    fn open(&mut self, pending: Pending) -> Result<Option<Document>, UpgradeError> {
        let not_found = |source: io::Error| match &pending.origin {
            Some((from, line)) => UpgradeError::MissingInclude {
                path: pending.path.clone(),
                included_from: from.clone(),
                line: *line,
                source,
            },
            None => UpgradeError::io(&pending.path, source),
        };

        let canonical = fs::canonicalize(&pending.path).map_err(not_found)?;
        if !self.seen.insert(canonical) {
            warn!(
                "Skipping {}: already processed (include cycle?)",
                pending.path.display()
            );
            return Ok(None);
        }

        let document = Document::load(&pending.path, self.strict)?;

        for include in &document.includes {
            match include {
                Include::File { path, line } => self.queue.push_back(Pending {
                    path: path.clone(),
                    origin: Some((document.path.clone(), *line)),
                }),
                Include::Dir { path, line } => {
                    let files = option_files_in(path).map_err(|source| {
                        UpgradeError::MissingInclude {
                            path: path.clone(),
                            included_from: document.path.clone(),
                            line: *line,
                            source,
                        }
                    })?;
                    if files.is_empty() {
                        debug!("No option files in {}", path.display());
                    }
                    self.queue.extend(files.into_iter().map(|file| Pending {
                        path: file,
                        origin: Some((document.path.clone(), *line)),
                    }));
                }
            }
        }

        Ok(Some(document))
    }
}

impl Iterator for Loader {
    type Item = Result<Document, UpgradeError>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(pending) = self.queue.pop_front() {
            match self.open(pending) {
                Ok(Some(document)) => return Some(Ok(document)),
                Ok(None) => continue,
                Err(e) => {
                    self.queue.clear();
                    return Some(Err(e));
                }
            }
        }
        None
    }
}
