//! Canonical data model for umlhub.
//!
//! Both the ingestion pipeline and the read path use these types, so a record
//! written by the indexer is exactly the record returned by queries:
//!
//! - [`DiagramType`]: closed set of diagram categories
//! - [`ContentHash`]: SHA-256 content address of a diagram block
//! - [`NewDiagram`] / [`IndexedDiagram`]: persisted record before and after insert
//! - [`Cursor`]: opaque pagination token
//! - [`RequestContext`]: per-request value threaded through every call

mod context;
mod cursor;
mod diagram_type;
mod hash;
mod record;

pub use context::RequestContext;
pub use cursor::Cursor;
pub use diagram_type::{DiagramType, ParseDiagramTypeError};
pub use hash::ContentHash;
pub use record::{DiagramId, IndexedDiagram, NewDiagram, RenderArtifact};
