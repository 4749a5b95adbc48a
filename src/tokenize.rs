//! Option file directive tokenizer
//!
//! Splits a single physical line into a key, an optional value and a
//! trailing comment, following the server's own option file rules:
//!
//! - `#` starts an inline comment unless it appears inside a quoted value
//! - a backslash inside quotes escapes the next character
//! - quotes do not span lines; an unterminated quote absorbs the rest of
//!   the line, including any `#`
//! - keys are the longest run of non-whitespace, non-`=` characters

/// A parsed `key[=value]` directive
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    /// Key as written, before prefix resolution and separator normalization
    pub key: String,
    /// `None` for bare options such as `skip-name-resolve`
    pub value: Option<String>,
    /// Trailing comment including its `#`, or empty
    pub comment: String,
}

const OBSOLETE_PREFIXES: [&str; 2] = ["set-variable", "set_variable"];

/// Strip the obsolete `set-variable = ` prefix from a line.
///
/// Returns the remainder when the line uses the legacy syntax.
pub fn strip_obsolete_syntax(line: &str) -> Option<&str> {
    let line = line.trim_start();
    let head = line.get(..OBSOLETE_PREFIXES[0].len())?;
    if !OBSOLETE_PREFIXES
        .iter()
        .any(|prefix| head.eq_ignore_ascii_case(prefix))
    {
        return None;
    }

    let rest = line[head.len()..].trim_start();
    rest.strip_prefix('=').map(str::trim_start)
}

/// Split off an inline comment, honoring quotes and escapes.
pub fn remove_inline_comment(text: &str) -> (&str, &str) {
    let mut escaped = false;
    let mut quote: Option<char> = None;

    for (idx, ch) in text.char_indices() {
        if (ch == '"' || ch == '\'') && !escaped {
            match quote {
                None => quote = Some(ch),
                Some(open) if open == ch => quote = None,
                Some(_) => {}
            }
        }
        if quote.is_none() && ch == '#' {
            return (&text[..idx], &text[idx..]);
        }
        escaped = quote.is_some() && ch == '\\' && !escaped;
    }

    (text, "")
}

/// Parse a directive line. Returns `None` when the line is not a valid
/// `key`, `key = value` or `key # comment` form.
pub fn parse_directive(line: &str) -> Option<Directive> {
    let line = line.trim();
    let key_end = line
        .find(|c: char| c.is_whitespace() || c == '=')
        .unwrap_or(line.len());
    if key_end == 0 {
        return None;
    }

    let (key, rest) = line.split_at(key_end);
    let rest = rest.trim_start();

    if let Some(value) = rest.strip_prefix('=') {
        let (value, comment) = remove_inline_comment(value);
        return Some(Directive {
            key: key.to_string(),
            value: Some(value.trim().to_string()),
            comment: comment.to_string(),
        });
    }

    if !rest.is_empty() && !rest.starts_with('#') {
        return None;
    }

    // bare option: the comment may be glued to the key (`skip-innodb#x`)
    let (key, comment) = remove_inline_comment(line);
    let key = key.trim_end();
    if key.is_empty() || key.contains(char::is_whitespace) {
        return None;
    }

    Some(Directive {
        key: key.to_string(),
        value: None,
        comment: comment.to_string(),
    })
}
