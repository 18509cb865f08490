//! Store and search index traits.

use umlhub_model::{ContentHash, Cursor, DiagramId, DiagramType, IndexedDiagram, NewDiagram};

use crate::error::StoreError;

/// One page of results plus the cursor for the next page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Present iff the page is full; following it yields the next disjoint page.
    pub next_cursor: Option<Cursor>,
}

impl<T> Page<T> {
    /// An empty page with no continuation.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            next_cursor: None,
        }
    }

    /// Build a page, issuing `cursor` only when `items` filled the page.
    #[must_use]
    pub fn new(items: Vec<T>, limit: usize, cursor: impl FnOnce(&[T]) -> Option<Cursor>) -> Self {
        let next_cursor = if limit > 0 && items.len() == limit {
            cursor(&items)
        } else {
            None
        };
        Self { items, next_cursor }
    }

    /// Convert the items, keeping the cursor.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            next_cursor: self.next_cursor,
        }
    }
}

/// Split a free-text query into search terms.
///
/// Terms are separated by whitespace and combined with AND by every index.
pub fn search_terms(query: &str) -> Vec<&str> {
    query.split_whitespace().collect()
}

/// Primary store for indexed diagrams.
///
/// Writes are insert-only: a record is never modified after [`insert`](Self::insert),
/// only deleted when its origin is re-ingested. Implementations make no
/// atomicity promise across calls, so a lookup followed by an insert may race
/// with a concurrent writer.
pub trait DiagramStore: Send + Sync {
    /// Insert a record and return its newly assigned id.
    ///
    /// Ids increase with every insert and are never reused.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend rejects the write.
    fn insert(&self, diagram: NewDiagram) -> Result<DiagramId, StoreError>;

    /// Find any record with the given content hash (at most one is returned).
    fn find_by_hash(&self, hash: &ContentHash) -> Result<Option<DiagramId>, StoreError>;

    /// Delete every record for `origin_url`, returning the deleted ids.
    fn delete_by_origin(&self, origin_url: &str) -> Result<Vec<DiagramId>, StoreError>;

    /// List records in ascending id order.
    ///
    /// # Arguments
    ///
    /// * `filter` - Only return records of this type
    /// * `cursor` - Resume after a previous page (`None` starts at the beginning)
    /// * `limit` - Page size; a full page carries a `next_cursor`
    fn list(
        &self,
        filter: Option<DiagramType>,
        cursor: Option<Cursor>,
        limit: usize,
    ) -> Result<Page<IndexedDiagram>, StoreError>;

    /// Fetch a record by id.
    fn get(&self, id: DiagramId) -> Result<Option<IndexedDiagram>, StoreError>;

    /// Fetch several records, preserving the order of `ids`.
    ///
    /// Ids without a record are omitted from the result.
    fn get_many(&self, ids: &[DiagramId]) -> Result<Vec<IndexedDiagram>, StoreError>;
}

/// Full-text index over diagram sources.
///
/// Documents are keyed by the record id they mirror, but the index never
/// checks that the record exists.
pub trait SearchIndex: Send + Sync {
    /// Index `document` under `id`, replacing any previous document.
    fn put(&self, id: DiagramId, document: &str) -> Result<(), StoreError>;

    /// Remove the document for `id`, if any.
    fn remove(&self, id: DiagramId) -> Result<(), StoreError>;

    /// Return ids of documents containing every term, in ascending id order.
    ///
    /// An empty term list matches nothing. A full page carries a
    /// `next_cursor` (the offset of the next hit).
    fn search(
        &self,
        terms: &[&str],
        cursor: Option<Cursor>,
        limit: usize,
    ) -> Result<Page<DiagramId>, StoreError>;
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_search_terms_split_on_whitespace() {
        assert_eq!(search_terms("alice  bob\tcarol"), vec!["alice", "bob", "carol"]);
        assert!(search_terms("   ").is_empty());
    }

    #[test]
    fn test_page_cursor_only_when_full() {
        let full = Page::new(vec![1, 2], 2, |_| Some(Cursor::new(2)));
        let short = Page::new(vec![1], 2, |_| Some(Cursor::new(1)));
        let zero = Page::new(Vec::<i32>::new(), 0, |_| Some(Cursor::new(0)));

        assert_eq!(full.next_cursor, Some(Cursor::new(2)));
        assert_eq!(short.next_cursor, None);
        assert_eq!(zero.next_cursor, None);
    }
}
