//! Expansion of abbreviated connection option names

use std::borrow::Cow;

use thiserror::Error;

/// Full names the server accepts as unambiguous abbreviations
const CONNECTION_OPTIONS: &[&str] = &["host", "password", "port", "socket", "user"];

#[derive(Error, Debug, Clone, PartialEq)]
#[error("ambiguous option '{option}' ({})", candidates.join(","))]
pub struct AmbiguousOption {
    pub option: String,
    pub candidates: Vec<&'static str>,
}

/// Expand an option prefix to the full name of the option.
///
/// Names that prefix none of the connection options are returned unchanged.
pub fn resolve_option(key: &str) -> Result<Cow<'_, str>, AmbiguousOption> {
    let candidates: Vec<&'static str> = CONNECTION_OPTIONS
        .iter()
        .copied()
        .filter(|name| name.starts_with(key))
        .collect();

    match candidates.as_slice() {
        [] => Ok(Cow::Borrowed(key)),
        [name] => Ok(Cow::Borrowed(*name)),
        _ => Err(AmbiguousOption {
            option: key.to_string(),
            candidates,
        }),
    }
}
