// 🧑‍🤝‍🧑 Name Extractor - couples and session headers from roster cells
// Two shapes of couple names are recognized, everything else is ignored:
//   "John & Jane Smith"        → John Smith, Jane Smith
//   "John Smith & Jane Doe"    → John Smith, Jane Doe

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

use crate::session::SessionLabel;

// ============================================================================
// CANDIDATE NAME
// ============================================================================

/// A (first, last) pair pulled out of a roster cell, before it is matched
/// against the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateName {
    pub first: String,
    pub last: String,
}

impl CandidateName {
    pub fn new(first: impl Into<String>, last: impl Into<String>) -> Self {
        CandidateName {
            first: first.into(),
            last: last.into(),
        }
    }

    /// Parse console input like "John Smith".
    ///
    /// Only the first two words are used; anything shorter is rejected.
    pub fn from_words(input: &str) -> Option<Self> {
        let mut words = input.split_whitespace();
        let first = words.next()?;
        let last = words.next()?;
        Some(CandidateName::new(first, last))
    }
}

impl fmt::Display for CandidateName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.first, self.last)
    }
}

// ============================================================================
// EXTRACTOR
// ============================================================================

/// Compiled patterns for roster cells. Patterns are checked in order and the
/// first full match wins.
pub struct NameExtractor {
    /// "First1 & First2 Last"
    shared_last_name: Regex,

    /// "First1 Last1 & First2 Last2"
    distinct_last_names: Regex,

    /// "<year> Spring" / "<year> Fall" anywhere in the cell
    session_header: Regex,
}

impl Default for NameExtractor {
    fn default() -> Self {
        Self {
            shared_last_name: Regex::new(r"^(\w+)\s&\s(\w+)\s(\w+)$").unwrap(),
            distinct_last_names: Regex::new(r"^(\w+)\s(\w+)\s&\s(\w+)\s(\w+)$").unwrap(),
            session_header: Regex::new(r"[0-9]{4}\s(?:Spring|Fall)").unwrap(),
        }
    }
}

impl NameExtractor {
    /// Extract the couple named in a cell.
    ///
    /// Returns zero or two candidates. Header rows, notes and anything that
    /// is not exactly one of the two couple shapes give an empty vector.
    pub fn extract_names(&self, text: &str) -> Vec<CandidateName> {
        let text = text.trim();

        // One last name for two people
        if let Some(caps) = self.shared_last_name.captures(text) {
            return vec![
                CandidateName::new(&caps[1], &caps[3]),
                CandidateName::new(&caps[2], &caps[3]),
            ];
        }

        // Two last names for two people
        if let Some(caps) = self.distinct_last_names.captures(text) {
            return vec![
                CandidateName::new(&caps[1], &caps[2]),
                CandidateName::new(&caps[3], &caps[4]),
            ];
        }

        Vec::new()
    }

    /// Recognize a session header such as "2023 Fall".
    ///
    /// Returns only the matched "<year> <season>" token, not the whole cell.
    pub fn parse_session_header(&self, text: &str) -> Option<SessionLabel> {
        self.session_header
            .find(text.trim())
            .map(|m| SessionLabel::new(m.as_str()))
    }
}

fn default_extractor() -> &'static NameExtractor {
    static EXTRACTOR: OnceLock<NameExtractor> = OnceLock::new();
    EXTRACTOR.get_or_init(NameExtractor::default)
}

/// Shorthand for `NameExtractor::extract_names` with the default patterns
pub fn extract_names(text: &str) -> Vec<CandidateName> {
    default_extractor().extract_names(text)
}

/// Shorthand for `NameExtractor::parse_session_header` with the default patterns
pub fn parse_session_header(text: &str) -> Option<SessionLabel> {
    default_extractor().parse_session_header(text)
}

// ============================================================================
// TESTS
// ============================================================================
