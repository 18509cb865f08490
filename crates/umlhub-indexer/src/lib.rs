//! Diagram ingestion for umlhub.
//!
//! The [`Indexer`] fetches a document from a [`ContentSource`], extracts its
//! `PlantUML` blocks and, for each block in order, skips it if its content is
//! already indexed ([`Deduplicator`]), asks the syntax checker whether it is
//! worth keeping, classifies it, renders it and writes the record
//! ([`IndexWriter`]).
//!
//! The [`batch`] module turns object-store notifications into deferred
//! ingestion tasks.

pub mod batch;
mod dedup;
mod error;
mod indexer;
mod source;
mod writer;

pub use dedup::Deduplicator;
pub use error::IndexError;
pub use indexer::{FailedBlock, FailurePolicy, Indexer, IngestReport, SkipReason, SkippedBlock};
pub use source::{
    ContentSource, GITHUB_API_URL, GitHubSource, OriginRef, RawDocument, SourceError,
};
pub use writer::IndexWriter;
