//! Versioned rewrite rules for deprecated server options
//!
//! Each target version owns one immutable [`RuleTable`]. Newer tables are
//! built from the previous version's table plus additions, so a rule can be
//! overridden by a later version but never dropped.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Server version an option file is upgraded for
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum TargetVersion {
    #[default]
    #[serde(rename = "5.1")]
    Mysql51,
    #[serde(rename = "5.5")]
    Mysql55,
    #[serde(rename = "5.6")]
    Mysql56,
    #[serde(rename = "5.7")]
    Mysql57,
}

impl TargetVersion {
    pub const ALL: [TargetVersion; 4] = [
        TargetVersion::Mysql51,
        TargetVersion::Mysql55,
        TargetVersion::Mysql56,
        TargetVersion::Mysql57,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TargetVersion::Mysql51 => "5.1",
            TargetVersion::Mysql55 => "5.5",
            TargetVersion::Mysql56 => "5.6",
            TargetVersion::Mysql57 => "5.7",
        }
    }
}

impl fmt::Display for TargetVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("unknown target version '{0}' (expected one of 5.1, 5.5, 5.6, 5.7)")]
pub struct UnknownTarget(pub String);

impl FromStr for TargetVersion {
    type Err = UnknownTarget;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TargetVersion::ALL
            .into_iter()
            .find(|target| target.as_str() == s.trim())
            .ok_or_else(|| UnknownTarget(s.to_string()))
    }
}

/// When a template contributes an output line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emit {
    Always,
    /// Only when the original directive carried a non-empty value
    WithValue,
}

/// One output directive with `${key}` / `${value}` placeholders
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Template {
    pub text: &'static str,
    pub emit: Emit,
}

impl Template {
    pub const fn always(text: &'static str) -> Self {
        Self {
            text,
            emit: Emit::Always,
        }
    }

    pub const fn with_value(text: &'static str) -> Self {
        Self {
            text,
            emit: Emit::WithValue,
        }
    }

    /// Substitute the placeholders. Unknown placeholders are kept as written.
    pub fn render(&self, key: &str, value: Option<&str>) -> String {
        let rendered = self
            .text
            .replace("${key}", key)
            .replace("${value}", value.unwrap_or(""));

        if value.is_none() && self.text.contains("${value}") {
            // bare directives carry no value forward
            return rendered
                .trim_end()
                .trim_end_matches('=')
                .trim_end()
                .to_string();
        }
        rendered
    }

    /// The option name this template writes
    pub fn output_key(&self) -> &'static str {
        let end = self
            .text
            .find(|c: char| c.is_whitespace() || c == '=')
            .unwrap_or(self.text.len());
        &self.text[..end]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    Deletion,
    Rename,
    FanOut,
    ConditionalFanOut,
}

/// Rewrite one option into zero or more options
#[derive(Debug, Clone, PartialEq)]
pub struct RewriteRule {
    pub reason: &'static str,
    pub templates: Vec<Template>,
}

impl RewriteRule {
    pub fn new(templates: &[Template], reason: &'static str) -> Self {
        Self {
            reason,
            templates: templates.to_vec(),
        }
    }

    pub fn remove(reason: &'static str) -> Self {
        Self::new(&[], reason)
    }

    pub fn rename(template: &'static str, reason: &'static str) -> Self {
        Self::new(&[Template::always(template)], reason)
    }

    pub fn kind(&self) -> RuleKind {
        if self.templates.iter().any(|t| t.emit == Emit::WithValue) {
            return RuleKind::ConditionalFanOut;
        }
        match self.templates.len() {
            0 => RuleKind::Deletion,
            1 => RuleKind::Rename,
            _ => RuleKind::FanOut,
        }
    }

    /// Output lines for `key` with its original value, in template order
    pub fn apply(&self, key: &str, value: Option<&str>) -> Vec<String> {
        let has_value = value.is_some_and(|v| !v.is_empty());
        self.templates
            .iter()
            .filter(|t| t.emit == Emit::Always || has_value)
            .map(|t| t.render(key, value))
            .collect()
    }
}

type Rules = BTreeMap<&'static str, RewriteRule>;

/// Immutable option → rule mapping for one target version
#[derive(Debug)]
pub struct RuleTable {
    target: TargetVersion,
    rules: Rules,
}

impl RuleTable {
    /// The precomputed table for `target`
    pub fn for_target(target: TargetVersion) -> &'static RuleTable {
        static TABLES: OnceLock<[RuleTable; 4]> = OnceLock::new();

        let tables = TABLES.get_or_init(|| {
            let mysql51 = mysql51_rules();
            let mysql55 = merge(&mysql51, mysql55_additions());
            let mysql56 = merge(&mysql55, mysql56_additions());
            let mysql57 = merge(&mysql56, mysql57_additions());
            [
                RuleTable::new(TargetVersion::Mysql51, mysql51),
                RuleTable::new(TargetVersion::Mysql55, mysql55),
                RuleTable::new(TargetVersion::Mysql56, mysql56),
                RuleTable::new(TargetVersion::Mysql57, mysql57),
            ]
        });

        match target {
            TargetVersion::Mysql51 => &tables[0],
            TargetVersion::Mysql55 => &tables[1],
            TargetVersion::Mysql56 => &tables[2],
            TargetVersion::Mysql57 => &tables[3],
        }
    }

    fn new(target: TargetVersion, rules: Rules) -> Self {
        Self { target, rules }
    }

    pub fn target(&self) -> TargetVersion {
        self.target
    }

    /// Look up the rule for a canonical option name
    pub fn get(&self, key: &str) -> Option<&RewriteRule> {
        self.rules.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.rules.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.rules.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &RewriteRule)> + '_ {
        self.rules.iter().map(|(key, rule)| (*key, rule))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Base rules plus additions. Additions win on conflict; nothing is removed.
fn merge(base: &Rules, additions: Vec<(&'static str, RewriteRule)>) -> Rules {
    let mut rules = base.clone();
    rules.extend(additions);
    rules
}

const REMOVED_IN_55: &str = "Deprecated in MySQL 5.1.17. Removed in 5.5";

fn mysql51_rules() -> Rules {
    let mut rules = Rules::new();

    rules.insert(
        "default-character-set",
        RewriteRule::rename(
            "character-set-server = ${value}",
            "Deprecated in MySQL 5.0 in favor of character-set-server",
        ),
    );
    rules.insert(
        "default-collation",
        RewriteRule::rename(
            "collation-server = ${value}",
            "Deprecated in MySQL 4.1.3 in favor of collation-server",
        ),
    );
    rules.insert(
        "default-table-type",
        RewriteRule::rename(
            "default-storage-engine = ${value}",
            "Deprecated in MySQL 5.0 in favor of default-storage-engine",
        ),
    );
    rules.insert(
        "log-slow-queries",
        RewriteRule::new(
            &[
                Template::always("slow-query-log = 1"),
                // without a path the server keeps its host_name-slow.log default
                Template::with_value("slow-query-log-file = ${value}"),
                Template::always("log-slow-slave-statements"),
            ],
            "Logging options changed in MySQL 5.1",
        ),
    );
    rules.insert(
        "table-cache",
        RewriteRule::new(
            &[
                Template::always("table-open-cache = ${value}"),
                Template::always("table-definition-cache = ${value}"),
            ],
            "Table cache options changed in MySQL 5.1",
        ),
    );

    let removals: [(&'static str, &'static str); 16] = [
        ("enable-pstack", "Deprecated in MySQL 5.1.54"),
        ("log-long-format", "Deprecated in MySQL 4.1"),
        (
            "log-short-format",
            "Deprecated in MySQL 4.1. This option now does nothing.",
        ),
        ("master-connect-retry", REMOVED_IN_55),
        ("master-host", REMOVED_IN_55),
        ("master-password", REMOVED_IN_55),
        ("master-port", REMOVED_IN_55),
        ("master-user", REMOVED_IN_55),
        ("master-ssl", REMOVED_IN_55),
        ("safe-mode", "Deprecated in MySQL 5.0"),
        ("safe-show-database", "Deprecated in MySQL 4.0.2"),
        ("skip-locking", "Deprecated in MySQL 4.0.3. Removed in 5.5"),
        ("skip-external-locking", "Default behavior in MySQL 4.1+"),
        ("skip-bdb", "Removed in MySQL 5.1.11"),
        ("skip-innodb", "Default storage engine in 5.5"),
        ("skip-thread-priority", "Deprecated in MySQL 5.1.29"),
    ];
    for (key, reason) in removals {
        rules.insert(key, RewriteRule::remove(reason));
    }

    rules
}

fn mysql55_additions() -> Vec<(&'static str, RewriteRule)> {
    vec![
        (
            "one-thread",
            RewriteRule::rename(
                "thread-handling = no-threads",
                "Deprecated and removed in MySQL 5.6",
            ),
        ),
        (
            "table-lock-wait-timeout",
            RewriteRule::remove("Removed in MySQL 5.5.3"),
        ),
    ]
}

fn mysql56_additions() -> Vec<(&'static str, RewriteRule)> {
    vec![(
        "log",
        RewriteRule::new(
            &[
                Template::always("general-log = 1"),
                Template::with_value("general-log-file = ${value}"),
            ],
            "Removed in MySQL 5.6.1 in favor of general-log",
        ),
    )]
}

fn mysql57_additions() -> Vec<(&'static str, RewriteRule)> {
    vec![
        (
            "storage-engine",
            RewriteRule::rename(
                "default-storage-engine = ${value}",
                "Removed in MySQL 5.7.5 in favor of default-storage-engine",
            ),
        ),
        (
            "innodb-additional-mem-pool-size",
            RewriteRule::remove("Removed in MySQL 5.7.4"),
        ),
        (
            "innodb-use-sys-malloc",
            RewriteRule::remove("Removed in MySQL 5.7.4"),
        ),
        ("timed-mutexes", RewriteRule::remove("Removed in MySQL 5.7.5")),
        (
            "thread-concurrency",
            RewriteRule::remove("Removed in MySQL 5.7.2"),
        ),
    ]
}
