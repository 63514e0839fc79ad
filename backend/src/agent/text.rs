//! Text helpers used when reading user messages and formatting replies.

use regex::Regex;
use std::sync::OnceLock;

/// Stored in place of a name that fails sanitization
pub const PLACEHOLDER_NAME: &str = "Explorer";

const MAX_NAME_CHARS: usize = 25;
const MAX_NAME_WORDS: usize = 3;

/// Terms this short must match as whole words
const SHORT_TERM_CHARS: usize = 3;

/// Phrases that introduce a name in free text
pub const NAME_INTRODUCTIONS: &[&str] = &["my name is", "call me"];

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)\b(?:my name is|call me|i am|i'm)\b\s*([a-z\s]+)")
            .expect("name pattern is a valid regex")
    })
}

/// Lower-case and trim a message for keyword matching
pub fn normalize_message(message: &str) -> String {
    message.trim().to_lowercase()
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Capitalize the first letter of every alphabetic run, lower-casing the rest.
/// "scikit-learn" becomes "Scikit-Learn", "c++" becomes "C++".
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for ch in text.chars() {
        if ch.is_alphabetic() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(ch);
            at_word_start = true;
        }
    }
    out
}

/// Canonical comparison form for skills: lower-case, underscores as spaces, trimmed
pub fn normalize_skill(skill: &str) -> String {
    skill.to_lowercase().replace('_', " ").trim().to_string()
}

/// Display form for a knowledge-base token such as `senior_data_scientist`
pub fn humanize_token(token: &str) -> String {
    title_case(&token.replace('_', " "))
}

/// Split a comma-separated skill list into lower-cased, trimmed tokens
pub fn parse_skill_list(message: &str) -> Vec<String> {
    let trimmed = message.trim();
    let body = strip_prefix_ignore_case(trimmed, "i know ").unwrap_or(trimmed);
    body.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        text.get(prefix.len()..)
    } else {
        None
    }
}

/// Pull a display name out of a message and sanitize it.
///
/// A labeled phrase ("my name is", "call me", "I am", "I'm") wins over the raw
/// message. Candidates mentioning "anonymous", longer than 25 characters, with
/// more than three words, or with anything but letters and spaces become
/// [`PLACEHOLDER_NAME`].
pub fn extract_name(message: &str) -> String {
    let candidate = match name_pattern().captures(message) {
        Some(caps) => caps
            .get(1)
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default(),
        None => message.trim().to_string(),
    };

    let acceptable = !candidate.is_empty()
        && !candidate.to_lowercase().contains("anonymous")
        && candidate.chars().count() <= MAX_NAME_CHARS
        && word_count(&candidate) <= MAX_NAME_WORDS
        && candidate.chars().all(|c| c.is_alphabetic() || c == ' ');

    if acceptable {
        title_case(&candidate)
    } else {
        PLACEHOLDER_NAME.to_string()
    }
}

/// Phrase containment that only counts matches bounded by non-alphanumerics,
/// so a one-letter category like "r" does not match inside "resources".
pub fn contains_phrase(haystack: &str, phrase: &str) -> bool {
    find_bounded(haystack, phrase, true)
}

/// Containment for role names and aliases. The match must start a word but
/// may carry a suffix ("data scientists", "software engineering"). Short
/// aliases such as "pm" or "swe" still need a boundary on both sides.
pub fn mentions_term(haystack: &str, term: &str) -> bool {
    find_bounded(haystack, term, term.chars().count() <= SHORT_TERM_CHARS)
}

fn find_bounded(haystack: &str, phrase: &str, bound_end: bool) -> bool {
    if phrase.is_empty() {
        return false;
    }
    haystack.match_indices(phrase).any(|(start, _)| {
        let end = start + phrase.len();
        let before_ok = haystack[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric());
        let after_ok = !bound_end
            || haystack[end..]
                .chars()
                .next()
                .map_or(true, |c| !c.is_alphanumeric());
        before_ok && after_ok
    })
}

/// True if the message carries an explicit name introduction
pub fn has_name_introduction(normalized: &str) -> bool {
    NAME_INTRODUCTIONS.iter().any(|p| normalized.contains(p))
}
