//! Ingestion orchestrator.
//!
//! One ingestion turns one document into zero or more indexed diagrams:
//!
//! 1. Delete records left by a previous ingestion of the same origin
//! 2. Extract blocks
//! 3. For each block, in document order: dedup, validate, classify, render, write
//!
//! Blocks are processed one at a time and every external call blocks, so
//! callers on an async runtime run ingestion on a blocking thread.

use std::sync::Arc;

use serde::Serialize;
use umlhub_diagrams::{Classifier, DiagramRenderer, Extractor, SyntaxValidator};
use umlhub_model::{ContentHash, DiagramId, NewDiagram, RequestContext};
use umlhub_store::{DiagramStore, SearchIndex};

use crate::dedup::Deduplicator;
use crate::error::IndexError;
use crate::source::{ContentSource, RawDocument};
use crate::writer::IndexWriter;

/// What to do when a block fails with a service or store error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Abort the ingestion. Records written for earlier blocks stay.
    #[default]
    FailFast,
    /// Record the failure in the report and move on to the next block.
    Continue,
}

/// Why a block was not indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SkipReason {
    /// A record with the same content hash already exists.
    Duplicate,
    /// The syntax checker rejected the block.
    InvalidSyntax,
    /// The syntax checker found no entities in the block.
    NoEntities,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedBlock {
    /// Position of the block among the extracted blocks.
    pub index: usize,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedBlock {
    pub index: usize,
    pub error: String,
}

/// Outcome of one ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    pub origin_url: String,
    /// Ids of the records written, in block order.
    pub indexed: Vec<DiagramId>,
    pub skipped: Vec<SkippedBlock>,
    /// Only populated under [`FailurePolicy::Continue`].
    pub failed: Vec<FailedBlock>,
}

impl IngestReport {
    fn new(origin_url: &str) -> Self {
        Self {
            origin_url: origin_url.to_owned(),
            indexed: Vec::new(),
            skipped: Vec::new(),
            failed: Vec::new(),
        }
    }
}

enum BlockOutcome {
    Indexed(DiagramId),
    Skipped(SkipReason),
}

/// The ingestion pipeline.
pub struct Indexer {
    source: Arc<dyn ContentSource>,
    validator: Arc<dyn SyntaxValidator>,
    renderer: Arc<dyn DiagramRenderer>,
    store: Arc<dyn DiagramStore>,
    search: Arc<dyn SearchIndex>,
    extractor: Extractor,
    classifier: Classifier,
    failure_policy: FailurePolicy,
}

impl Indexer {
    /// Create an indexer with the default extractor, classifier and
    /// [`FailurePolicy::FailFast`].
    pub fn new(
        source: Arc<dyn ContentSource>,
        validator: Arc<dyn SyntaxValidator>,
        renderer: Arc<dyn DiagramRenderer>,
        store: Arc<dyn DiagramStore>,
        search: Arc<dyn SearchIndex>,
    ) -> Self {
        Self {
            source,
            validator,
            renderer,
            store,
            search,
            extractor: Extractor::default(),
            classifier: Classifier::default(),
            failure_policy: FailurePolicy::default(),
        }
    }

    #[must_use]
    pub fn with_extractor(mut self, extractor: Extractor) -> Self {
        self.extractor = extractor;
        self
    }

    #[must_use]
    pub fn with_classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        self
    }

    #[must_use]
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Fetch the document at `url` and index it.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Source`] if the URL is not recognized or cannot
    /// be fetched (nothing is modified in that case), otherwise see
    /// [`index_document`](Self::index_document).
    pub fn ingest_url(&self, ctx: &RequestContext, url: &str) -> Result<IngestReport, IndexError> {
        tracing::info!(request_id = ctx.request_id(), origin = url, "Fetching document");
        let document = self.source.fetch(url)?;
        self.index_document(ctx, &document)
    }

    /// Index an already fetched document.
    ///
    /// # Errors
    ///
    /// Under [`FailurePolicy::FailFast`], the first service or store error
    /// aborts the ingestion. Cleanup of previous records failing is always fatal.
    pub fn index_document(
        &self,
        ctx: &RequestContext,
        document: &RawDocument,
    ) -> Result<IngestReport, IndexError> {
        let span = tracing::info_span!(
            "ingest",
            request_id = ctx.request_id(),
            origin = %document.origin_url
        );
        let _guard = span.enter();

        self.remove_previous(&document.origin_url)?;

        let mut report = IngestReport::new(&document.origin_url);

        for (index, block) in self.extractor.extract(&document.text).enumerate() {
            match self.process_block(ctx, &document.origin_url, block.text) {
                Ok(BlockOutcome::Indexed(id)) => report.indexed.push(id),
                Ok(BlockOutcome::Skipped(reason)) => {
                    tracing::info!(index, ?reason, "Block skipped");
                    report.skipped.push(SkippedBlock { index, reason });
                }
                Err(e) => match self.failure_policy {
                    FailurePolicy::FailFast => {
                        tracing::error!(index, error = %e, "Block failed, aborting ingestion");
                        return Err(e);
                    }
                    FailurePolicy::Continue => {
                        tracing::warn!(index, error = %e, "Block failed, continuing");
                        report.failed.push(FailedBlock {
                            index,
                            error: e.to_string(),
                        });
                    }
                },
            }
        }

        tracing::info!(
            indexed = report.indexed.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "Ingestion finished"
        );

        Ok(report)
    }

    /// Delete the records of a previous ingestion of `origin_url`.
    ///
    /// Search documents are removed best-effort; a leftover one points at an
    /// id the store no longer has, which queries filter out.
    fn remove_previous(&self, origin_url: &str) -> Result<(), IndexError> {
        let removed = self.store.delete_by_origin(origin_url)?;
        if removed.is_empty() {
            return Ok(());
        }

        for id in &removed {
            if let Err(e) = self.search.remove(*id) {
                tracing::warn!(id = %id, error = %e, "Failed to remove search document");
            }
        }

        tracing::info!(count = removed.len(), "Removed previous records");
        Ok(())
    }

    fn process_block(
        &self,
        ctx: &RequestContext,
        origin_url: &str,
        text: &str,
    ) -> Result<BlockOutcome, IndexError> {
        let hash = ContentHash::of(text);

        if Deduplicator::new(self.store.as_ref()).contains(&hash)? {
            return Ok(BlockOutcome::Skipped(SkipReason::Duplicate));
        }

        let verdict = self.validator.check(text)?;
        if !verdict.valid {
            return Ok(BlockOutcome::Skipped(SkipReason::InvalidSyntax));
        }
        if !verdict.has_entities() {
            return Ok(BlockOutcome::Skipped(SkipReason::NoEntities));
        }

        let diagram_type = self.classifier.classify(text, &verdict);
        let artifact = self.renderer.render(text)?;

        tracing::debug!(
            content_hash = %hash,
            render_id = %artifact.render_id,
            diagram_type = %diagram_type,
            "Block rendered"
        );

        let writer = IndexWriter::new(self.store.as_ref(), self.search.as_ref());
        let id = writer.write(
            ctx,
            NewDiagram::new(origin_url, text, hash, diagram_type, artifact),
        )?;

        Ok(BlockOutcome::Indexed(id))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_report_json_shape() {
        let mut report = IngestReport::new("https://github.com/o/r/blob/main/a.md");
        report.indexed.push(DiagramId::new(4));
        report.skipped.push(SkippedBlock {
            index: 1,
            reason: SkipReason::NoEntities,
        });

        let value = serde_json::to_value(&report).unwrap();

        assert_eq!(
            value,
            serde_json::json!({
                "originUrl": "https://github.com/o/r/blob/main/a.md",
                "indexed": [4],
                "skipped": [{"index": 1, "reason": "noEntities"}],
                "failed": [],
            })
        );
    }

    #[test]
    fn test_default_policy_is_fail_fast() {
        assert_eq!(FailurePolicy::default(), FailurePolicy::FailFast);
    }
}
