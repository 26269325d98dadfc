// 📅 Session Tracker - which semester a roster row belongs to
// Session headers ("2023 Fall") appear sparsely in the spreadsheet and apply
// to every row below them until the next header in the same column group.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::names::parse_session_header;

// ============================================================================
// SESSION LABEL
// ============================================================================

/// "<year> <Spring|Fall>", exactly as it appeared in the header cell
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionLabel(String);

impl SessionLabel {
    pub fn new(label: impl Into<String>) -> Self {
        SessionLabel(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// TRACK
// ============================================================================

/// The two class systems kept side by side in the spreadsheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Track {
    /// First column group
    #[serde(rename = "SDOE")]
    Sdoe,

    /// Second column group
    #[serde(rename = "MR&MRS")]
    MrMrs,
}

impl Track {
    pub const ALL: [Track; 2] = [Track::Sdoe, Track::MrMrs];

    /// Label used in the intermediate file and in prompts
    pub fn label(&self) -> &'static str {
        match self {
            Track::Sdoe => "SDOE",
            Track::MrMrs => "MR&MRS",
        }
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// SESSION TRACKER
// ============================================================================

/// Current session for one track. Threaded by value through the row loop:
/// `tracker = tracker.observe(cell)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionTracker {
    current: Option<SessionLabel>,
}

impl SessionTracker {
    /// Fresh tracker with no session; every extraction run starts here
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a names cell. A header replaces the current session, anything
    /// else keeps it.
    pub fn observe(self, cell: &str) -> Self {
        match parse_session_header(cell) {
            Some(label) => SessionTracker {
                current: Some(label),
            },
            None => self,
        }
    }

    pub fn current(&self) -> Option<&SessionLabel> {
        self.current.as_ref()
    }
}
