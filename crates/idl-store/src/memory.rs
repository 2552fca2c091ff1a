use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::StoreResult;
use crate::traits::DocumentStore;

/// In-memory, HashMap-based document fingerprint table.
///
/// All entries are held behind a `RwLock` for safe concurrent access; this
/// lock is independent of any chain lock, since the table and the chain are
/// logically separate stores.
pub struct InMemoryDocumentStore {
    entries: RwLock<HashMap<String, String>>,
}

impl InMemoryDocumentStore {
    /// Create a new empty table.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn get(&self, document_id: &str) -> StoreResult<Option<String>> {
        let map = self.entries.read().expect("lock poisoned");
        Ok(map.get(document_id).cloned())
    }

    fn put_if_absent(&self, document_id: &str, fingerprint: String) -> StoreResult<String> {
        let mut map = self.entries.write().expect("lock poisoned");
        let winner = map
            .entry(document_id.to_string())
            .or_insert(fingerprint);
        Ok(winner.clone())
    }

    fn put(&self, document_id: &str, fingerprint: String) -> StoreResult<()> {
        let mut map = self.entries.write().expect("lock poisoned");
        map.insert(document_id.to_string(), fingerprint);
        Ok(())
    }

    fn len(&self) -> usize {
        self.entries.read().expect("lock poisoned").len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_on_empty_table_is_none() {
        let store = InMemoryDocumentStore::new();
        assert_eq!(store.get("doc-1").unwrap(), None);
        assert!(store.is_empty());
    }

    #[test]
    fn put_if_absent_first_write_wins() {
        let store = InMemoryDocumentStore::new();
        let first = store.put_if_absent("doc-1", "aaaa".into()).unwrap();
        let second = store.put_if_absent("doc-1", "bbbb".into()).unwrap();
        assert_eq!(first, "aaaa");
        assert_eq!(second, "aaaa");
        assert_eq!(store.get("doc-1").unwrap(), Some("aaaa".into()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn put_overwrites() {
        let store = InMemoryDocumentStore::new();
        store.put("doc-1", "aaaa".into()).unwrap();
        store.put("doc-1", "bbbb".into()).unwrap();
        assert_eq!(store.get("doc-1").unwrap(), Some("bbbb".into()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn put_then_put_if_absent_keeps_stored_value() {
        let store = InMemoryDocumentStore::new();
        store.put("doc-1", "stored".into()).unwrap();
        let winner = store.put_if_absent("doc-1", "issued".into()).unwrap();
        assert_eq!(winner, "stored");
    }

    #[test]
    fn keys_are_independent() {
        let store = InMemoryDocumentStore::new();
        store.put("doc-1", "aaaa".into()).unwrap();
        store.put("doc-2", "bbbb".into()).unwrap();
        assert_eq!(store.get("doc-1").unwrap(), Some("aaaa".into()));
        assert_eq!(store.get("doc-2").unwrap(), Some("bbbb".into()));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn concurrent_issuance_converges_on_one_value() {
        use std::sync::Arc;

        let store = Arc::new(InMemoryDocumentStore::new());
        let mut handles = Vec::new();
        for i in 0..8 {
            let store = Arc::clone(&store);
            handles.push(std::thread::spawn(move || {
                store
                    .put_if_absent("doc-1", format!("fingerprint-{i}"))
                    .unwrap()
            }));
        }

        let winners: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let stored = store.get("doc-1").unwrap().unwrap();
        assert!(winners.iter().all(|w| *w == stored));
    }
}
