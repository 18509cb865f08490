//! Persisted diagram records.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{ContentHash, DiagramType};

/// Store-assigned record identifier.
///
/// Ids are positive, strictly increasing in insertion order and never reused,
/// so a search document keyed by an old id cannot alias a newer record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiagramId(i64);

impl DiagramId {
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for DiagramId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DiagramId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

/// Artifacts produced by the render service for one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderArtifact {
    /// Opaque identifier issued by the render service.
    pub render_id: String,
    pub svg: String,
    /// PNG bytes, base64 encoded (standard alphabet, padded).
    pub png_base64: String,
    /// Plain-text (ASCII art) rendering.
    pub ascii: String,
}

/// A diagram record ready to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDiagram {
    pub origin_url: String,
    pub source: String,
    pub content_hash: ContentHash,
    pub diagram_type: DiagramType,
    pub svg: String,
    pub png_base64: String,
    pub ascii: String,
}

impl NewDiagram {
    /// Assemble a record from a block and its rendered artifacts.
    #[must_use]
    pub fn new(
        origin_url: impl Into<String>,
        source: impl Into<String>,
        content_hash: ContentHash,
        diagram_type: DiagramType,
        artifact: RenderArtifact,
    ) -> Self {
        Self {
            origin_url: origin_url.into(),
            source: source.into(),
            content_hash,
            diagram_type,
            svg: artifact.svg,
            png_base64: artifact.png_base64,
            ascii: artifact.ascii,
        }
    }

    /// Attach the id assigned by the store.
    #[must_use]
    pub fn with_id(self, id: DiagramId) -> IndexedDiagram {
        IndexedDiagram {
            id,
            origin_url: self.origin_url,
            source: self.source,
            content_hash: self.content_hash,
            diagram_type: self.diagram_type,
            svg: self.svg,
            png_base64: self.png_base64,
            ascii: self.ascii,
        }
    }
}

/// A persisted diagram record.
///
/// Records are immutable once written. Re-ingesting an origin deletes its
/// records and inserts new ones rather than updating in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexedDiagram {
    pub id: DiagramId,
    pub origin_url: String,
    pub source: String,
    pub content_hash: ContentHash,
    pub diagram_type: DiagramType,
    pub svg: String,
    pub png_base64: String,
    pub ascii: String,
}
