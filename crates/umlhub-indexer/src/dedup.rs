//! Content-hash deduplication.

use umlhub_model::ContentHash;
use umlhub_store::{DiagramStore, StoreError};

/// Checks whether a block's content is already indexed.
///
/// The check and the later insert are separate store calls, so two
/// ingestions of identical content running at the same time can both pass
/// the check and both insert.
pub struct Deduplicator<'a> {
    store: &'a dyn DiagramStore,
}

impl<'a> Deduplicator<'a> {
    pub fn new(store: &'a dyn DiagramStore) -> Self {
        Self { store }
    }

    /// Hash `text` and look for a record with that hash.
    pub fn is_duplicate(&self, text: &str) -> Result<bool, StoreError> {
        self.contains(&ContentHash::of(text))
    }

    /// Look for a record with an already computed hash.
    pub fn contains(&self, hash: &ContentHash) -> Result<bool, StoreError> {
        Ok(self.store.find_by_hash(hash)?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use umlhub_model::{DiagramType, NewDiagram, RenderArtifact};
    use umlhub_store::MemoryStore;

    use super::*;

    fn record(source: &str) -> NewDiagram {
        NewDiagram::new(
            "https://github.com/o/r/blob/main/a.md",
            source,
            ContentHash::of(source),
            DiagramType::Sequence,
            RenderArtifact {
                render_id: "id".to_owned(),
                svg: String::new(),
                png_base64: String::new(),
                ascii: String::new(),
            },
        )
    }

    #[test]
    fn test_duplicate_after_insert() {
        let store = MemoryStore::new();
        let dedup = Deduplicator::new(&store);
        let text = "@startuml\nAlice -> Bob\n@enduml";

        assert!(!dedup.is_duplicate(text).unwrap());
        store.insert(record(text)).unwrap();
        assert!(dedup.is_duplicate(text).unwrap());
        assert!(dedup.contains(&ContentHash::of(text)).unwrap());
    }

    #[test]
    fn test_different_text_is_not_duplicate() {
        let store = MemoryStore::new();
        store.insert(record("@startuml\nA -> B\n@enduml")).unwrap();

        let dedup = Deduplicator::new(&store);
        assert!(!dedup.is_duplicate("@startuml\nA -> C\n@enduml").unwrap());
    }
}
