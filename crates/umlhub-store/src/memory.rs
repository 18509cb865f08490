//! In-process store and search index.
//!
//! Used when no database is configured and throughout the test suites.
//! State lives behind `RwLock`s; a poisoned lock is recovered rather than
//! propagated since every mutation leaves the maps consistent.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use umlhub_model::{ContentHash, Cursor, DiagramId, DiagramType, IndexedDiagram, NewDiagram};

use crate::error::StoreError;
use crate::store::{DiagramStore, Page, SearchIndex};

#[derive(Debug)]
struct StoreState {
    next_id: i64,
    records: BTreeMap<DiagramId, IndexedDiagram>,
}

/// In-memory [`DiagramStore`].
#[derive(Debug)]
pub struct MemoryStore {
    state: RwLock<StoreState>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: RwLock::new(StoreState {
                next_id: 1,
                records: BTreeMap::new(),
            }),
        }
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .records
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// First id strictly after the cursor position.
fn first_id_after(cursor: Option<Cursor>) -> DiagramId {
    let after = cursor.map_or(0, |c| i64::try_from(c.position()).unwrap_or(i64::MAX));
    DiagramId::new(after.saturating_add(1))
}

fn id_cursor(items: &[IndexedDiagram]) -> Option<Cursor> {
    let last = items.last()?;
    u64::try_from(last.id.get()).ok().map(Cursor::new)
}

impl DiagramStore for MemoryStore {
    fn insert(&self, diagram: NewDiagram) -> Result<DiagramId, StoreError> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let id = DiagramId::new(state.next_id);
        state.next_id += 1;
        state.records.insert(id, diagram.with_id(id));
        Ok(id)
    }

    fn find_by_hash(&self, hash: &ContentHash) -> Result<Option<DiagramId>, StoreError> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        Ok(state
            .records
            .values()
            .find(|r| &r.content_hash == hash)
            .map(|r| r.id))
    }

    fn delete_by_origin(&self, origin_url: &str) -> Result<Vec<DiagramId>, StoreError> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let ids: Vec<DiagramId> = state
            .records
            .values()
            .filter(|r| r.origin_url == origin_url)
            .map(|r| r.id)
            .collect();
        for id in &ids {
            state.records.remove(id);
        }
        Ok(ids)
    }

    fn list(
        &self,
        filter: Option<DiagramType>,
        cursor: Option<Cursor>,
        limit: usize,
    ) -> Result<Page<IndexedDiagram>, StoreError> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        let items: Vec<IndexedDiagram> = state
            .records
            .range(first_id_after(cursor)..)
            .map(|(_, record)| record)
            .filter(|r| filter.is_none_or(|ty| r.diagram_type == ty))
            .take(limit)
            .cloned()
            .collect();
        Ok(Page::new(items, limit, id_cursor))
    }

    fn get(&self, id: DiagramId) -> Result<Option<IndexedDiagram>, StoreError> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        Ok(state.records.get(&id).cloned())
    }

    fn get_many(&self, ids: &[DiagramId]) -> Result<Vec<IndexedDiagram>, StoreError> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        Ok(ids
            .iter()
            .filter_map(|id| state.records.get(id).cloned())
            .collect())
    }
}

/// Lowercased alphanumeric tokens of `text`.
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

/// In-memory [`SearchIndex`] with token-level AND matching.
#[derive(Debug, Default)]
pub struct MemorySearchIndex {
    documents: RwLock<BTreeMap<DiagramId, Vec<String>>>,
}

impl MemorySearchIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a document is indexed under `id`.
    pub fn contains(&self, id: DiagramId) -> bool {
        self.documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&id)
    }
}

impl SearchIndex for MemorySearchIndex {
    fn put(&self, id: DiagramId, document: &str) -> Result<(), StoreError> {
        let mut tokens: Vec<String> = tokenize(document).collect();
        tokens.sort_unstable();
        tokens.dedup();
        self.documents
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, tokens);
        Ok(())
    }

    fn remove(&self, id: DiagramId) -> Result<(), StoreError> {
        self.documents
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
        Ok(())
    }

    fn search(
        &self,
        terms: &[&str],
        cursor: Option<Cursor>,
        limit: usize,
    ) -> Result<Page<DiagramId>, StoreError> {
        let wanted: Vec<String> = terms.iter().flat_map(|t| tokenize(t)).collect();
        if wanted.is_empty() {
            return Ok(Page::empty());
        }

        let offset = cursor.map_or(0, |c| usize::try_from(c.position()).unwrap_or(usize::MAX));
        let documents = self.documents.read().unwrap_or_else(PoisonError::into_inner);
        let hits: Vec<DiagramId> = documents
            .iter()
            .filter(|(_, tokens)| {
                wanted
                    .iter()
                    .all(|w| tokens.binary_search(w).is_ok())
            })
            .map(|(id, _)| *id)
            .skip(offset)
            .take(limit)
            .collect();

        let next = offset.saturating_add(hits.len());
        Ok(Page::new(hits, limit, |_| {
            u64::try_from(next).ok().map(Cursor::new)
        }))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn diagram(origin: &str, source: &str, ty: DiagramType) -> NewDiagram {
        NewDiagram {
            origin_url: origin.to_owned(),
            source: source.to_owned(),
            content_hash: ContentHash::of(source),
            diagram_type: ty,
            svg: "<svg/>".to_owned(),
            png_base64: String::new(),
            ascii: String::new(),
        }
    }

    fn ids(page: &Page<IndexedDiagram>) -> Vec<i64> {
        page.items.iter().map(|r| r.id.get()).collect()
    }

    #[test]
    fn test_insert_assigns_increasing_ids() {
        let store = MemoryStore::new();

        let a = store.insert(diagram("u", "a", DiagramType::Class)).unwrap();
        let b = store.insert(diagram("u", "b", DiagramType::Class)).unwrap();

        assert!(b > a);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_ids_not_reused_after_delete() {
        let store = MemoryStore::new();
        let first = store.insert(diagram("u", "a", DiagramType::Class)).unwrap();
        store.delete_by_origin("u").unwrap();

        let second = store.insert(diagram("u", "a", DiagramType::Class)).unwrap();

        assert!(second > first);
    }

    #[test]
    fn test_find_by_hash() {
        let store = MemoryStore::new();
        let id = store.insert(diagram("u", "a", DiagramType::Class)).unwrap();

        assert_eq!(store.find_by_hash(&ContentHash::of("a")).unwrap(), Some(id));
        assert_eq!(store.find_by_hash(&ContentHash::of("b")).unwrap(), None);
    }

    #[test]
    fn test_delete_by_origin_only_touches_origin() {
        let store = MemoryStore::new();
        let a = store.insert(diagram("one", "a", DiagramType::Class)).unwrap();
        let b = store.insert(diagram("two", "b", DiagramType::Class)).unwrap();
        let c = store.insert(diagram("one", "c", DiagramType::Class)).unwrap();

        let deleted = store.delete_by_origin("one").unwrap();

        assert_eq!(deleted, vec![a, c]);
        assert!(store.get(b).unwrap().is_some());
        assert!(store.get(a).unwrap().is_none());
    }

    #[test]
    fn test_list_pages_are_disjoint() {
        let store = MemoryStore::new();
        for i in 0..5 {
            store
                .insert(diagram("u", &format!("s{i}"), DiagramType::Sequence))
                .unwrap();
        }

        let first = store.list(None, None, 2).unwrap();
        let second = store.list(None, first.next_cursor, 2).unwrap();
        let third = store.list(None, second.next_cursor, 2).unwrap();

        assert_eq!(ids(&first), vec![1, 2]);
        assert_eq!(ids(&second), vec![3, 4]);
        assert_eq!(ids(&third), vec![5]);
        assert!(first.next_cursor.is_some());
        assert!(third.next_cursor.is_none());
    }

    #[test]
    fn test_list_exact_multiple_yields_trailing_empty_page() {
        let store = MemoryStore::new();
        store.insert(diagram("u", "a", DiagramType::Class)).unwrap();
        store.insert(diagram("u", "b", DiagramType::Class)).unwrap();

        let first = store.list(None, None, 2).unwrap();
        let second = store.list(None, first.next_cursor, 2).unwrap();

        assert!(first.next_cursor.is_some());
        assert!(second.items.is_empty());
        assert!(second.next_cursor.is_none());
    }

    #[test]
    fn test_list_with_type_filter() {
        let store = MemoryStore::new();
        store.insert(diagram("u", "a", DiagramType::Class)).unwrap();
        store.insert(diagram("u", "b", DiagramType::Sequence)).unwrap();
        store.insert(diagram("u", "c", DiagramType::Class)).unwrap();

        let page = store.list(Some(DiagramType::Class), None, 10).unwrap();

        assert_eq!(ids(&page), vec![1, 3]);
        assert!(page.next_cursor.is_none());
    }

    #[test]
    fn test_get_many_preserves_order_and_skips_missing() {
        let store = MemoryStore::new();
        let a = store.insert(diagram("u", "a", DiagramType::Class)).unwrap();
        let b = store.insert(diagram("u", "b", DiagramType::Class)).unwrap();

        let records = store.get_many(&[b, DiagramId::new(99), a]).unwrap();

        assert_eq!(records.iter().map(|r| r.id).collect::<Vec<_>>(), vec![b, a]);
    }

    #[test]
    fn test_search_requires_all_terms() {
        let index = MemorySearchIndex::new();
        index.put(DiagramId::new(1), "@startuml\nAlice -> Bob\n@enduml").unwrap();
        index.put(DiagramId::new(2), "@startuml\nAlice -> Carol\n@enduml").unwrap();

        let both = index.search(&["alice"], None, 10).unwrap();
        let one = index.search(&["Alice", "bob"], None, 10).unwrap();
        let none = index.search(&["dave"], None, 10).unwrap();

        assert_eq!(both.items, vec![DiagramId::new(1), DiagramId::new(2)]);
        assert_eq!(one.items, vec![DiagramId::new(1)]);
        assert!(none.items.is_empty());
    }

    #[test]
    fn test_search_empty_terms_match_nothing() {
        let index = MemorySearchIndex::new();
        index.put(DiagramId::new(1), "alice").unwrap();

        assert!(index.search(&[], None, 10).unwrap().items.is_empty());
    }

    #[test]
    fn test_search_pagination_by_offset() {
        let index = MemorySearchIndex::new();
        for i in 1..=3 {
            index.put(DiagramId::new(i), "shared term").unwrap();
        }

        let first = index.search(&["shared"], None, 2).unwrap();
        let second = index.search(&["shared"], first.next_cursor, 2).unwrap();

        assert_eq!(first.items, vec![DiagramId::new(1), DiagramId::new(2)]);
        assert_eq!(first.next_cursor, Some(Cursor::new(2)));
        assert_eq!(second.items, vec![DiagramId::new(3)]);
        assert!(second.next_cursor.is_none());
    }

    #[test]
    fn test_put_replaces_and_remove_deletes() {
        let index = MemorySearchIndex::new();
        let id = DiagramId::new(1);
        index.put(id, "alice").unwrap();
        index.put(id, "bob").unwrap();

        assert!(index.search(&["alice"], None, 10).unwrap().items.is_empty());
        assert_eq!(index.search(&["bob"], None, 10).unwrap().items, vec![id]);

        index.remove(id).unwrap();
        assert!(!index.contains(id));
    }
}
