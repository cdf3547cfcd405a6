//! Best-effort keyword scraping from free-form model output.
//!
//! Chat backends return a single block of text containing both a mood
//! description and search keyword hints. This module separates the two.
//! It is advisory text scraping, not a parser with guarantees.

use lazy_static::lazy_static;
use regex::Regex;

/// Maximum number of keyword phrases returned.
pub const MAX_KEYWORDS: usize = 3;

/// Maximum words per keyword phrase.
pub const MAX_PHRASE_WORDS: usize = 4;

/// Known delimiters introducing the keyword list, in the locales the
/// steering prompts ask for.
const KEYWORD_DELIMITERS: &[&str] = &["標籤：", "音樂關鍵字：", "Keywords:", "keywords:"];

lazy_static! {
    // Quoted substrings, or short bare runs of letters/digits/hyphens/spaces.
    static ref PHRASE_RE: Regex =
        Regex::new(r#""([^"]{2,})"|([A-Za-z0-9][A-Za-z0-9 \-]*[A-Za-z0-9])"#).unwrap();
}

/// Split a block of model output into a description and up to
/// [`MAX_KEYWORDS`] keyword phrases.
///
/// If the text contains a known delimiter, everything before its first
/// occurrence is the description and the remainder is treated as a
/// comma-separated keyword list. Otherwise the whole text is the description
/// and keywords are scraped out of it heuristically.
pub fn split_mood_text(text: &str) -> (String, Vec<String>) {
    if let Some((at, delimiter)) = earliest_delimiter(text) {
        let description = text[..at].trim().to_string();
        let remainder = &text[at + delimiter.len()..];
        let keywords = remainder
            .split(['，', ',', '、', '\n'])
            .map(str::trim)
            .filter(|phrase| !phrase.is_empty())
            .filter(|phrase| phrase.split_whitespace().count() <= MAX_PHRASE_WORDS)
            .take(MAX_KEYWORDS)
            .map(str::to_string)
            .collect();
        return (description, keywords);
    }

    let keywords = PHRASE_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().trim())
        .filter(|phrase| phrase.len() >= 2)
        .filter(|phrase| {
            let words = phrase.split_whitespace().count();
            words >= 1 && words <= MAX_PHRASE_WORDS
        })
        .take(MAX_KEYWORDS)
        .map(str::to_string)
        .collect();

    (text.trim().to_string(), keywords)
}

fn earliest_delimiter(text: &str) -> Option<(usize, &'static str)> {
    KEYWORD_DELIMITERS
        .iter()
        .filter_map(|delimiter| text.find(delimiter).map(|at| (at, *delimiter)))
        .min_by_key(|(at, _)| *at)
}
