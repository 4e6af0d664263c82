use regex::Regex;
use std::sync::OnceLock;

use super::boundary::delimiter_address;
use super::types::EmailHeaders;

static MESSAGE_ID_REGEX: OnceLock<Regex> = OnceLock::new();
static REFERENCES_REGEX: OnceLock<Regex> = OnceLock::new();

fn message_id_regex() -> &'static Regex {
    MESSAGE_ID_REGEX
        .get_or_init(|| Regex::new(r"Message-ID:\s+<([^<>]+)>").expect("Invalid Message-ID regex"))
}

fn references_regex() -> &'static Regex {
    REFERENCES_REGEX
        .get_or_init(|| Regex::new(r"References:\s+<([^<>]+)>").expect("Invalid References regex"))
}

/// Extract sender, own identifier and reference identifier from one record.
///
/// Header lines are searched anywhere in the record: quoted messages may
/// embed older headers, and the first occurrence wins. Non-ASCII bytes in the
/// body do not affect the search.
pub fn extract_headers(record: &str) -> EmailHeaders {
    EmailHeaders {
        sender: extract_sender(record),
        message_id: extract_message_id(record),
        reference: extract_reference(record),
    }
}

/// Sender from the record's own delimiter line: `user at domain` -> `user@domain`
pub fn extract_sender(record: &str) -> Option<String> {
    let first_line = record.lines().next()?;
    delimiter_address(first_line).map(normalize_address)
}

pub fn extract_message_id(record: &str) -> Option<String> {
    first_bracketed(message_id_regex(), record)
}

pub fn extract_reference(record: &str) -> Option<String> {
    first_bracketed(references_regex(), record)
}

/// Content-derived name for a record: hex MD5 of its Message-ID.
pub fn message_digest(message_id: &str) -> String {
    format!("{:x}", md5::compute(message_id.as_bytes()))
}

fn normalize_address(addr: &str) -> String {
    addr.replace(" at ", "@").trim().to_string()
}

fn first_bracketed(regex: &Regex, text: &str) -> Option<String> {
    let id = regex.captures(text)?.get(1)?.as_str().trim();
    (!id.is_empty()).then(|| id.to_string())
}
