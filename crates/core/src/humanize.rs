//! Rewrites raw grammar-failure text into user-facing messages.
//!
//! Purely text level: the rules know nothing about the grammar. They were
//! written against the output of the old grammar-library frontend
//! (`Expected "do", but got "in" at line 1 char 8.`) and leave messages
//! that are already phrased for users untouched.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::token::Location;

const KEYWORDS: &str = "schema|input|value|trait|let|do|end|on|base|import";

/// Ordered most specific first; the first matching rule wins.
static RULES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    let patterns: [(String, &'static str); 9] = [
        (
            format!(r#"^Expected "({})", but got (.+)$"#, KEYWORDS),
            "Missing '$1' keyword, but got $2",
        ),
        (
            format!(r#"^Expected "({})"$"#, KEYWORDS),
            "Missing '$1' keyword",
        ),
        (
            r#"^Expected ":", but got (.+)$"#.to_owned(),
            "Missing ':' before symbol, but got $1",
        ),
        (
            r#"^Expected "([^"]+)", but got (.+)$"#.to_owned(),
            "Missing '$1', but got $2",
        ),
        (r#"^Expected "([^"]+)"$"#.to_owned(), "Missing '$1'"),
        (
            r"^Expected one of \[(.+)\], but got (.+)$".to_owned(),
            "Expected one of $1, but got $2",
        ),
        (
            r"^Premature end of input$".to_owned(),
            "Unexpected end of input",
        ),
        (
            r"^(Extra input after last repetition|Don't know what to do with .*)$".to_owned(),
            "Unexpected content after the end of the schema",
        ),
        (r"^Failed to match .*$".to_owned(), "Invalid syntax"),
    ];
    patterns
        .into_iter()
        .map(|(p, r)| (Regex::new(&p).expect("humanize rule must compile"), r))
        .collect()
});

static LOCATION_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s+at line (\d+) char (\d+)\.?\s*$").expect("location pattern must compile")
});

/// Leading `|`, `` `- `` and `+-` markers of a nested cause tree.
static TREE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\s|`+\-]*").expect("tree pattern must compile"));

/// Rewrite a raw error message into friendly phrasing.
///
/// Multi-line cause trees are reduced to their most specific line first.
pub fn humanize_error_message(raw: &str) -> String {
    let line = most_specific_line(raw);
    let stripped = LOCATION_SUFFIX.replace(&line, "");
    let text = stripped.trim();
    for (pattern, replacement) in RULES.iter() {
        if pattern.is_match(text) {
            return pattern.replace(text, *replacement).into_owned();
        }
    }
    text.to_owned()
}

/// The `line N char M` position of a raw message, if it carries one.
pub fn extract_location(raw: &str) -> Option<Location> {
    let line = most_specific_line(raw);
    let caps = LOCATION_SUFFIX.captures(&line)?;
    let l = caps.get(1)?.as_str().parse().ok()?;
    let c = caps.get(2)?.as_str().parse().ok()?;
    Some(Location::new(l, c))
}

/// Deepest cause that is not a generic sequence failure.
fn most_specific_line(raw: &str) -> String {
    let lines: Vec<String> = raw
        .lines()
        .map(|l| TREE_PREFIX.replace(l, "").trim().to_owned())
        .filter(|l| !l.is_empty())
        .collect();
    lines
        .iter()
        .rev()
        .find(|l| !l.starts_with("Failed to match sequence"))
        .or_else(|| lines.first())
        .cloned()
        .unwrap_or_default()
}
