//! Read path for indexed diagrams.
//!
//! [`QueryService`] serves fixed-size pages of records, either straight from
//! the store (optionally filtered by [`DiagramType`]) or driven by full-text
//! search hits. The search index is not kept transactionally in sync with the
//! store, so hits whose record is gone are dropped from the page.

use std::sync::Arc;

use serde::Serialize;
use umlhub_model::{Cursor, DiagramId, DiagramType, IndexedDiagram, RequestContext};
use umlhub_store::{DiagramStore, Page, SearchIndex, StoreError, search_terms};

/// Default number of records per page.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// A page of records as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramPage {
    pub items: Vec<IndexedDiagram>,
    /// Encoded cursor for the next page, present iff this page was full.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
    /// The search query, for search pages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

impl DiagramPage {
    fn from_page(page: Page<IndexedDiagram>) -> Self {
        Self {
            items: page.items,
            next_cursor: page.next_cursor.map(Cursor::encode),
            query: None,
        }
    }
}

/// Listing and search over the store and search index.
pub struct QueryService {
    store: Arc<dyn DiagramStore>,
    search: Arc<dyn SearchIndex>,
    page_size: usize,
}

impl QueryService {
    pub fn new(store: Arc<dyn DiagramStore>, search: Arc<dyn SearchIndex>) -> Self {
        Self {
            store,
            search,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Set the page size (at least 1).
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// List records in store order, optionally of one type only.
    ///
    /// An undecodable `cursor` is ignored and the listing starts over.
    pub fn list(
        &self,
        ctx: &RequestContext,
        filter: Option<DiagramType>,
        cursor: Option<&str>,
    ) -> Result<DiagramPage, StoreError> {
        let cursor = decode_cursor(ctx, cursor);
        let page = self.store.list(filter, cursor, self.page_size)?;

        tracing::debug!(
            request_id = ctx.request_id(),
            filter = ?filter,
            count = page.items.len(),
            "Listed diagrams"
        );

        Ok(DiagramPage::from_page(page))
    }

    /// Search block text for records containing every whitespace-separated term.
    ///
    /// The page carries a cursor whenever the index returned a full page of
    /// hits, even if some of those hits were dropped, so a short page does not
    /// mean the results are exhausted. An empty query yields an empty page.
    pub fn search(
        &self,
        ctx: &RequestContext,
        query: &str,
        cursor: Option<&str>,
    ) -> Result<DiagramPage, StoreError> {
        let terms = search_terms(query);
        if terms.is_empty() {
            return Ok(DiagramPage {
                items: Vec::new(),
                next_cursor: None,
                query: Some(query.to_owned()),
            });
        }

        let cursor = decode_cursor(ctx, cursor);
        let hits = self.search.search(&terms, cursor, self.page_size)?;
        let items = self.store.get_many(&hits.items)?;

        if items.len() < hits.items.len() {
            let dangling: Vec<DiagramId> = hits
                .items
                .iter()
                .filter(|id| !items.iter().any(|item| item.id == **id))
                .copied()
                .collect();
            tracing::warn!(
                request_id = ctx.request_id(),
                ids = ?dangling,
                "Search hits without a stored record"
            );
        }

        Ok(DiagramPage {
            items,
            next_cursor: hits.next_cursor.map(Cursor::encode),
            query: Some(query.to_owned()),
        })
    }

    /// Fetch one record.
    pub fn fetch_by_id(
        &self,
        ctx: &RequestContext,
        id: DiagramId,
    ) -> Result<Option<IndexedDiagram>, StoreError> {
        tracing::debug!(request_id = ctx.request_id(), id = %id, "Fetching diagram");
        self.store.get(id)
    }
}

fn decode_cursor(ctx: &RequestContext, token: Option<&str>) -> Option<Cursor> {
    let token = token.filter(|t| !t.is_empty())?;
    let cursor = Cursor::decode(token);
    if cursor.is_none() {
        tracing::warn!(
            request_id = ctx.request_id(),
            cursor = token,
            "Ignoring invalid cursor"
        );
    }
    cursor
}
