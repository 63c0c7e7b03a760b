//! Digit extraction: reduces recognized text to its decimal digit runs.
//!
//! A digit run is a maximal stretch of ASCII `0`–`9`. Runs are collected
//! segment by segment, left to right, and joined with a single space.
//! Extraction is pure and never fails: text without digits yields the
//! sentinel chosen by [`NoDigitsPolicy`].

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Fallback message the gallery screen shows when nothing numeric was read.
pub const NO_NUMBERS_FOUND: &str = "No numbers found";

/// What to produce when no segment contains a digit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoDigitsPolicy {
    /// Empty result; the edit field stays hidden.
    #[default]
    Empty,
    /// Literal message placed into the result field instead.
    Fallback(String),
}

impl NoDigitsPolicy {
    pub fn fallback_message() -> Self {
        NoDigitsPolicy::Fallback(NO_NUMBERS_FOUND.to_string())
    }
}

/// Canonical digit string derived from one recognition result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedDigits {
    text: String,
    is_fallback: bool,
}

impl ExtractedDigits {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// True when the text is the no-digits fallback message, not digits.
    pub fn is_fallback(&self) -> bool {
        self.is_fallback
    }

    /// Individual digit runs. Empty for the fallback sentinel.
    pub fn runs(&self) -> impl Iterator<Item = &str> {
        let text = if self.is_fallback { "" } else { self.text.as_str() };
        text.split(' ').filter(|run| !run.is_empty())
    }

    pub fn run_count(&self) -> usize {
        self.runs().count()
    }
}

impl std::fmt::Display for ExtractedDigits {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

fn digit_run() -> &'static Regex {
    static DIGIT_RUN: OnceLock<Regex> = OnceLock::new();
    // `\d` would also match non-ASCII decimal digits.
    DIGIT_RUN.get_or_init(|| Regex::new("[0-9]+").expect("digit run pattern is valid"))
}

/// Extract every digit run from `segments`, in order, joined by single spaces.
pub fn extract_digits<S: AsRef<str>>(segments: &[S], policy: &NoDigitsPolicy) -> ExtractedDigits {
    let runs: Vec<&str> = segments
        .iter()
        .flat_map(|segment| digit_run().find_iter(segment.as_ref()).map(|m| m.as_str()))
        .collect();

    log::debug!(
        "[EXTRACT] {} digit runs across {} segments",
        runs.len(),
        segments.len()
    );

    if !runs.is_empty() {
        return ExtractedDigits {
            text: runs.join(" "),
            is_fallback: false,
        };
    }

    match policy {
        NoDigitsPolicy::Empty => ExtractedDigits::default(),
        NoDigitsPolicy::Fallback(message) => ExtractedDigits {
            text: message.clone(),
            is_fallback: true,
        },
    }
}
