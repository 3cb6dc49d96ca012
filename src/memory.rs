//! In-memory reference backend.
//!
//! A complete [`ObjectStore`]/[`Connector`] implementation backed by
//! process memory. Suitable for tests, mocking, and as a reference for how
//! each trait method should behave. State is shared by every store handle
//! a connector produces, namespaced by `(endpoint, database)` — connecting
//! twice to the same pair observes the same objects, just as two clients
//! of a real store would.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::{BlobFsError, Connector, FileObject, ObjectId, ObjectStore, ObjectTimes, ObjectUpdate};

type Namespace = (String, String);

#[derive(Default)]
struct Shared {
    objects: RwLock<HashMap<Namespace, Vec<FileObject>>>,
    next_id: AtomicU64,
}

/// Connector handing out [`MemoryStore`] handles over shared state.
///
/// Cloning a connector shares its contents; `Default` yields an empty one.
#[derive(Clone, Default)]
pub struct MemoryConnector {
    shared: Arc<Shared>,
}

impl MemoryConnector {
    /// Create an empty in-memory store universe.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every stored object in every namespace.
    ///
    /// Test harness convenience; a fresh connector is usually simpler.
    pub fn clear(&self) {
        self.shared.objects.write().clear();
    }
}

impl Connector for MemoryConnector {
    type Store = MemoryStore;

    fn connect(&self, endpoint: &str, database: &str) -> Result<Self::Store, BlobFsError> {
        Ok(MemoryStore {
            shared: Arc::clone(&self.shared),
            namespace: (endpoint.to_string(), database.to_string()),
        })
    }
}

/// One connected `(endpoint, database)` view of a [`MemoryConnector`].
pub struct MemoryStore {
    shared: Arc<Shared>,
    namespace: Namespace,
}

impl ObjectStore for MemoryStore {
    fn insert(
        &self,
        bucket: &str,
        filename: &str,
        content: Vec<u8>,
        times: ObjectTimes,
    ) -> Result<FileObject, BlobFsError> {
        let id = ObjectId(self.shared.next_id.fetch_add(1, Ordering::SeqCst));
        let object = FileObject {
            id,
            bucket: bucket.to_string(),
            filename: filename.to_string(),
            content,
            times,
        };

        self.shared
            .objects
            .write()
            .entry(self.namespace.clone())
            .or_default()
            .push(object.clone());

        Ok(object)
    }

    fn find(&self, bucket: &str, filename: &str) -> Result<Vec<FileObject>, BlobFsError> {
        Ok(self
            .shared
            .objects
            .read()
            .get(&self.namespace)
            .map(|objects| {
                objects
                    .iter()
                    .filter(|o| o.bucket == bucket && o.filename == filename)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn remove(
        &self,
        bucket: &str,
        filename: &str,
        exclude: Option<ObjectId>,
    ) -> Result<u64, BlobFsError> {
        let mut namespaces = self.shared.objects.write();
        let Some(objects) = namespaces.get_mut(&self.namespace) else {
            return Ok(0);
        };

        let before = objects.len();
        objects.retain(|o| {
            o.bucket != bucket || o.filename != filename || exclude == Some(o.id)
        });
        Ok((before - objects.len()) as u64)
    }

    fn update(&self, bucket: &str, id: ObjectId, update: ObjectUpdate) -> Result<(), BlobFsError> {
        let mut namespaces = self.shared.objects.write();
        let object = namespaces
            .get_mut(&self.namespace)
            .and_then(|objects| {
                objects
                    .iter_mut()
                    .find(|o| o.bucket == bucket && o.id == id)
            })
            .ok_or_else(|| BlobFsError::store("update", format!("unknown object id {}", id.0)))?;

        if let Some(filename) = update.filename {
            object.filename = filename;
        }
        if let Some(modified) = update.modified {
            object.times.modified = modified;
        }
        if let Some(accessed) = update.accessed {
            object.times.accessed = accessed;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MemoryStore {
        MemoryConnector::new().connect("localhost", "db").unwrap()
    }

    #[test]
    fn insert_assigns_distinct_ids() {
        let store = store();
        let a = store
            .insert("fs", "a.txt", b"a".to_vec(), ObjectTimes::now())
            .unwrap();
        let b = store
            .insert("fs", "b.txt", b"b".to_vec(), ObjectTimes::now())
            .unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn find_matches_bucket_and_filename() {
        let store = store();
        store
            .insert("fs", "a.txt", b"one".to_vec(), ObjectTimes::now())
            .unwrap();
        store
            .insert("other", "a.txt", b"two".to_vec(), ObjectTimes::now())
            .unwrap();

        let matches = store.find("fs", "a.txt").unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].content, b"one");
        assert!(store.find("fs", "missing.txt").unwrap().is_empty());
    }

    #[test]
    fn remove_honors_exclusion() {
        let store = store();
        store
            .insert("fs", "a.txt", b"old".to_vec(), ObjectTimes::now())
            .unwrap();
        let keep = store
            .insert("fs", "a.txt", b"new".to_vec(), ObjectTimes::now())
            .unwrap();

        let removed = store.remove("fs", "a.txt", Some(keep.id)).unwrap();
        assert_eq!(removed, 1);

        let remaining = store.find("fs", "a.txt").unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, keep.id);
    }

    #[test]
    fn remove_without_exclusion_clears_all_matches() {
        let store = store();
        store
            .insert("fs", "a.txt", b"1".to_vec(), ObjectTimes::now())
            .unwrap();
        store
            .insert("fs", "a.txt", b"2".to_vec(), ObjectTimes::now())
            .unwrap();

        assert_eq!(store.remove("fs", "a.txt", None).unwrap(), 2);
        assert_eq!(store.remove("fs", "a.txt", None).unwrap(), 0);
    }

    #[test]
    fn update_unknown_id_is_a_store_error() {
        let store = store();
        let result = store.update("fs", ObjectId(999), ObjectUpdate::rename_to("x"));
        assert!(matches!(result, Err(BlobFsError::Store { .. })));
    }

    #[test]
    fn namespaces_are_isolated() {
        let connector = MemoryConnector::new();
        let a = connector.connect("localhost", "db_a").unwrap();
        let b = connector.connect("localhost", "db_b").unwrap();

        a.insert("fs", "a.txt", b"data".to_vec(), ObjectTimes::now())
            .unwrap();

        assert_eq!(a.find("fs", "a.txt").unwrap().len(), 1);
        assert!(b.find("fs", "a.txt").unwrap().is_empty());
    }

    #[test]
    fn connections_to_same_namespace_share_state() {
        let connector = MemoryConnector::new();
        let first = connector.connect("localhost", "db").unwrap();
        let second = connector.connect("localhost", "db").unwrap();

        first
            .insert("fs", "a.txt", b"data".to_vec(), ObjectTimes::now())
            .unwrap();
        assert_eq!(second.find("fs", "a.txt").unwrap().len(), 1);
    }

    #[test]
    fn clear_wipes_every_namespace() {
        let connector = MemoryConnector::new();
        let store = connector.connect("localhost", "db").unwrap();
        store
            .insert("fs", "a.txt", b"data".to_vec(), ObjectTimes::now())
            .unwrap();

        connector.clear();
        assert!(store.find("fs", "a.txt").unwrap().is_empty());
    }
}
