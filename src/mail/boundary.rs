//! Detection of the two-line pattern that opens every email in a pipermail
//! text archive:
//!
//! ```text
//! From alice at example.com  Mon Jan  1 10:00:00 2007
//! From: alice at example.com (Alice)
//! ```
//!
//! A bare `From ` line is common in message bodies, so a boundary is only
//! accepted when the following line is a `From:` header carrying an address
//! in the same `user at domain` form.

use regex::Regex;
use std::sync::OnceLock;

/// `user at domain.tld` where the domain may have several dotted segments and
/// ends in an alphanumeric top-level segment.
const ADDRESS: &str = r"\S+ at [^\s.]+(?:\.[^\s.]+)*\.[A-Za-z0-9]+";

static DELIMITER_REGEX: OnceLock<Regex> = OnceLock::new();
static CONFIRM_REGEX: OnceLock<Regex> = OnceLock::new();

fn delimiter_regex() -> &'static Regex {
    DELIMITER_REGEX.get_or_init(|| {
        Regex::new(&format!(r"^From (?P<addr>{ADDRESS})"))
            .expect("Invalid delimiter line regex")
    })
}

fn confirm_regex() -> &'static Regex {
    CONFIRM_REGEX.get_or_init(|| {
        Regex::new(&format!(r"^From:[ \t]+{ADDRESS}")).expect("Invalid From header regex")
    })
}

/// A matched delimiter + confirming header pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Boundary {
    /// Offset of the `From ` delimiter line
    pub start: usize,
    /// Offset just past the confirming `From:` line (newline excluded)
    pub end: usize,
}

/// Address token of a delimiter line, or `None` if the line is not one.
pub fn delimiter_address(line: &str) -> Option<&str> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    delimiter_regex()
        .captures(line)
        .and_then(|caps| caps.name("addr"))
        .map(|m| m.as_str())
}

/// Whether `line` is a `From:` header naming a `user at domain` address.
pub fn is_confirming_line(line: &str) -> bool {
    confirm_regex().is_match(line.strip_suffix('\r').unwrap_or(line))
}

/// Try to match a boundary whose delimiter line starts exactly at `start`.
/// `start` must be a line start.
pub fn boundary_at(text: &str, start: usize) -> Option<Boundary> {
    let (first, rest) = split_line(&text[start..]);
    delimiter_address(first)?;

    let rest = rest?;
    let (second, _) = split_line(rest);
    if !is_confirming_line(second) {
        return None;
    }

    let second_start = text.len() - rest.len();
    Some(Boundary {
        start,
        end: second_start + second.len(),
    })
}

/// Find the first boundary whose delimiter line starts at or after `from`.
pub fn find_boundary(text: &str, from: usize) -> Option<Boundary> {
    line_starts(text, from).find_map(|start| boundary_at(text, start))
}

/// Split off the first line; the remainder is `None` when there is no newline.
fn split_line(text: &str) -> (&str, Option<&str>) {
    match text.find('\n') {
        Some(pos) => (&text[..pos], Some(&text[pos + 1..])),
        None => (text, None),
    }
}

/// Offsets of every line start at or after `from`.
fn line_starts(text: &str, from: usize) -> impl Iterator<Item = usize> + '_ {
    let first = (from == 0 || text.as_bytes().get(from - 1) == Some(&b'\n'))
        .then_some(from)
        .filter(|&f| f < text.len());

    let after = text.as_bytes()[from.min(text.len())..]
        .iter()
        .enumerate()
        .filter(|&(_, &b)| b == b'\n')
        .map(move |(i, _)| from + i + 1)
        .filter(move |&pos| pos < text.len());

    first.into_iter().chain(after)
}
