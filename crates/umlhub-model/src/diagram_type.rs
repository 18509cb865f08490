//! Diagram type enumeration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Category of an indexed diagram.
///
/// The set is closed: anything the syntax checker reports that does not map
/// to a known category becomes [`DiagramType::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagramType {
    Sequence,
    Usecase,
    Class,
    Activity,
    Component,
    State,
    Unknown,
}

impl DiagramType {
    /// All variants in display order.
    pub const ALL: [Self; 7] = [
        Self::Sequence,
        Self::Usecase,
        Self::Class,
        Self::Activity,
        Self::Component,
        Self::State,
        Self::Unknown,
    ];

    /// Wire name used in storage, query strings, and JSON.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sequence => "sequence",
            Self::Usecase => "usecase",
            Self::Class => "class",
            Self::Activity => "activity",
            Self::Component => "component",
            Self::State => "state",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DiagramType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not a diagram type wire name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDiagramTypeError(String);

impl fmt::Display for ParseDiagramTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown diagram type: {}", self.0)
    }
}

impl std::error::Error for ParseDiagramTypeError {}

impl FromStr for DiagramType {
    type Err = ParseDiagramTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ParseDiagramTypeError(s.to_owned()))
    }
}
