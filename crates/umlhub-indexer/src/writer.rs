//! Persisting finished records.

use umlhub_model::{DiagramId, NewDiagram, RequestContext};
use umlhub_store::{DiagramStore, SearchIndex, StoreError};

/// Writes records to the store and mirrors their text into the search index.
pub struct IndexWriter<'a> {
    store: &'a dyn DiagramStore,
    search: &'a dyn SearchIndex,
}

impl<'a> IndexWriter<'a> {
    pub fn new(store: &'a dyn DiagramStore, search: &'a dyn SearchIndex) -> Self {
        Self { store, search }
    }

    /// Insert `diagram` and index its source text.
    ///
    /// Only the insert can fail the write. A record whose search mirror could
    /// not be written is still listed, it just cannot be found by search.
    pub fn write(&self, ctx: &RequestContext, diagram: NewDiagram) -> Result<DiagramId, StoreError> {
        let source = diagram.source.clone();
        let content_hash = diagram.content_hash.clone();

        let id = self.store.insert(diagram)?;

        if let Err(e) = self.search.put(id, &source) {
            tracing::warn!(
                request_id = ctx.request_id(),
                id = %id,
                content_hash = %content_hash,
                error = %e,
                "Failed to index diagram for search"
            );
        }

        tracing::debug!(request_id = ctx.request_id(), id = %id, "Diagram written");
        Ok(id)
    }
}
