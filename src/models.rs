// Core data structures for jepwatch

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// JEP type as shown in the first column of the index table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Process,
    Informational,
    Feature,
    Infrastructure,
}

/// Short code table for [`EntryKind`], in declaration order.
const KIND_CODES: &[(EntryKind, &str)] = &[
    (EntryKind::Process, "P"),
    (EntryKind::Informational, "I"),
    (EntryKind::Feature, "F"),
    (EntryKind::Infrastructure, "S"),
];

impl EntryKind {
    /// One-letter code used by the index table
    pub fn short_code(&self) -> &'static str {
        KIND_CODES
            .iter()
            .find(|(kind, _)| kind == self)
            .map(|(_, code)| *code)
            .unwrap_or("?")
    }

    /// Reverse lookup of [`EntryKind::short_code`]
    pub fn from_short_code(code: &str) -> Option<Self> {
        KIND_CODES
            .iter()
            .find(|(_, c)| *c == code)
            .map(|(kind, _)| *kind)
    }

    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Process => "process",
            Self::Informational => "informational",
            Self::Feature => "feature",
            Self::Infrastructure => "infrastructure",
        }
    }

    /// Get all kinds
    pub fn all() -> Vec<Self> {
        KIND_CODES.iter().map(|(kind, _)| *kind).collect()
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EntryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown entry kind: {s}"))
    }
}

/// JEP lifecycle state as shown in the second column of the index table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryState {
    Drafted,
    Submitted,
    Candidate,
    ProposedToTarget,
    Targeted,
    Integrated,
    ClosedDelivered,
    Completed,
    Active,
}

/// Short code table for [`EntryState`], in declaration order.
const STATE_CODES: &[(EntryState, &str)] = &[
    (EntryState::Drafted, "Dra"),
    (EntryState::Submitted, "Sub"),
    (EntryState::Candidate, "Can"),
    (EntryState::ProposedToTarget, "Pro"),
    (EntryState::Targeted, "Tar"),
    (EntryState::Integrated, "Int"),
    (EntryState::ClosedDelivered, "Clo"),
    (EntryState::Completed, "Com"),
    (EntryState::Active, "Act"),
];

impl EntryState {
    /// Three-letter code used by the index table
    pub fn short_code(&self) -> &'static str {
        STATE_CODES
            .iter()
            .find(|(state, _)| state == self)
            .map(|(_, code)| *code)
            .unwrap_or("???")
    }

    /// Reverse lookup of [`EntryState::short_code`]
    pub fn from_short_code(code: &str) -> Option<Self> {
        STATE_CODES
            .iter()
            .find(|(_, c)| *c == code)
            .map(|(state, _)| *state)
    }

    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Drafted => "drafted",
            Self::Submitted => "submitted",
            Self::Candidate => "candidate",
            Self::ProposedToTarget => "proposed_to_target",
            Self::Targeted => "targeted",
            Self::Integrated => "integrated",
            Self::ClosedDelivered => "closed_delivered",
            Self::Completed => "completed",
            Self::Active => "active",
        }
    }

    /// Get all states
    pub fn all() -> Vec<Self> {
        STATE_CODES.iter().map(|(state, _)| *state).collect()
    }
}

impl fmt::Display for EntryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EntryState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| format!("unknown entry state: {s}"))
    }
}

/// One row of the JEP index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub kind: EntryKind,
    pub state: EntryState,
    pub release: Option<String>,
    pub component: Option<String>,
    pub sub_component: Option<String>,
    /// Stable identifier, absent only for entries not yet numbered
    pub number: Option<String>,
    pub title: Option<String>,
}

impl Entry {
    /// Create an entry with only kind and state set
    pub fn new(kind: EntryKind, state: EntryState) -> Self {
        Self {
            kind,
            state,
            release: None,
            component: None,
            sub_component: None,
            number: None,
            title: None,
        }
    }

    pub fn with_number(mut self, number: impl Into<String>) -> Self {
        self.number = Some(number.into());
        self
    }

    pub fn with_release(mut self, release: impl Into<String>) -> Self {
        self.release = Some(release.into());
        self
    }

    pub fn with_component(
        mut self,
        component: impl Into<String>,
        sub_component: Option<&str>,
    ) -> Self {
        self.component = Some(component.into());
        self.sub_component = sub_component.map(String::from);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Number or `?` for log output
    pub fn display_number(&self) -> &str {
        self.number.as_deref().unwrap_or("?")
    }
}
