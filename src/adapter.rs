//! Store-side CRUD protocol over an [`ObjectStore`].
//!
//! The backing store has no partial write, no append and no in-place
//! content update, so every logical write replaces the object wholesale:
//! insert a fresh version, then delete the older versions sharing the same
//! name. Creation and deletion are two separate store operations, so a
//! stale duplicate may coexist with the new version for a bounded window.
//! Readers resolve that window through [`StoreAdapter::find_latest`]: the
//! match with the greatest modification time is the current version. This
//! is the single seam where "current version" is decided.

use std::time::SystemTime;

use tracing::{debug, info, warn};

use crate::{BlobFsError, FileObject, ObjectStore, ObjectTimes, ObjectUpdate};

/// The only component that talks to the blob store.
///
/// Generic over the transport seam; every session and path-only operation
/// funnels through one of these.
pub struct StoreAdapter<S> {
    store: S,
}

impl<S: ObjectStore> StoreAdapter<S> {
    /// Wrap a connected store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The current version for `(bucket, key)`: the match with the
    /// greatest modification time, or `None` when nothing matches.
    ///
    /// Selection among exact `mtime` ties is store-dependent.
    pub fn find_latest(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<Option<FileObject>, BlobFsError> {
        let matches = self.store.find(bucket, key)?;
        debug!(bucket, key, matches = matches.len(), "resolved versions");
        Ok(matches.into_iter().max_by_key(|o| o.times.modified))
    }

    /// Full-replace write: insert a new version with fresh timestamps,
    /// then delete every older version of the same name.
    ///
    /// A failure of the cleanup step is logged and swallowed — it only
    /// risks a transient duplicate, never data loss, so the write is still
    /// reported successful.
    pub fn write_new_version(
        &self,
        bucket: &str,
        key: &str,
        content: Vec<u8>,
    ) -> Result<FileObject, BlobFsError> {
        let size = content.len();
        let inserted = self.store.insert(bucket, key, content, ObjectTimes::now())?;

        if let Err(err) = self.store.remove(bucket, key, Some(inserted.id)) {
            warn!(bucket, key, error = %err, "stale version cleanup failed");
        }

        info!(bucket, key, size, "wrote new version");
        Ok(inserted)
    }

    /// Delete every version of `(bucket, key)`.
    ///
    /// Returns whether at least one object was removed. A store failure
    /// propagates; deleting nothing is `Ok(false)`.
    pub fn delete(&self, bucket: &str, key: &str) -> Result<bool, BlobFsError> {
        let removed = self.store.remove(bucket, key, None)?;
        debug!(bucket, key, removed, "deleted versions");
        Ok(removed > 0)
    }

    /// Rename the current version of `old_key` to `new_key` in place,
    /// refreshing its modification and access times, then delete anything
    /// already occupying the new name.
    ///
    /// Only defined within a single bucket; callers reject cross-bucket
    /// pairs before reaching this point.
    ///
    /// # Errors
    ///
    /// [`BlobFsError::NotFound`] when the source has no current version.
    pub fn rename(&self, bucket: &str, old_key: &str, new_key: &str) -> Result<(), BlobFsError> {
        let source = self
            .find_latest(bucket, old_key)?
            .ok_or_else(|| BlobFsError::NotFound {
                bucket: bucket.to_string(),
                key: old_key.to_string(),
            })?;

        self.store
            .update(bucket, source.id, ObjectUpdate::rename_to(new_key))?;

        // Same tolerance as the write path: the rename itself landed.
        if let Err(err) = self.store.remove(bucket, new_key, Some(source.id)) {
            warn!(bucket, new_key, error = %err, "displaced version cleanup failed");
        }

        info!(bucket, old_key, new_key, "renamed");
        Ok(())
    }

    /// Create-or-update-timestamps.
    ///
    /// A missing key gets an empty object carrying the given timestamps;
    /// an existing key keeps its content and only its timestamps change.
    /// `mtime` defaults to now, `atime` defaults to the `mtime` value.
    pub fn touch(
        &self,
        bucket: &str,
        key: &str,
        mtime: Option<SystemTime>,
        atime: Option<SystemTime>,
    ) -> Result<(), BlobFsError> {
        let mtime = mtime.unwrap_or_else(SystemTime::now);
        let atime = atime.unwrap_or(mtime);

        match self.find_latest(bucket, key)? {
            Some(existing) => {
                self.store
                    .update(bucket, existing.id, ObjectUpdate::times(mtime, atime))?;
            }
            None => {
                let times = ObjectTimes {
                    created: SystemTime::now(),
                    modified: mtime,
                    accessed: atime,
                };
                self.store.insert(bucket, key, Vec::new(), times)?;
            }
        }

        debug!(bucket, key, "touched");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Connector, MemoryConnector, MemoryStore, ObjectId};
    use std::time::{Duration, UNIX_EPOCH};

    fn adapter() -> StoreAdapter<MemoryStore> {
        StoreAdapter::new(MemoryConnector::new().connect("localhost", "db").unwrap())
    }

    #[test]
    fn find_latest_on_empty_store_is_none() {
        assert!(adapter().find_latest("fs", "tmp.txt").unwrap().is_none());
    }

    #[test]
    fn find_latest_picks_greatest_mtime() {
        let connector = MemoryConnector::new();
        let store = connector.connect("localhost", "db").unwrap();
        store
            .insert(
                "fs",
                "tmp.txt",
                b"old".to_vec(),
                ObjectTimes::at(UNIX_EPOCH + Duration::from_secs(1)),
            )
            .unwrap();
        store
            .insert(
                "fs",
                "tmp.txt",
                b"new".to_vec(),
                ObjectTimes::at(UNIX_EPOCH + Duration::from_secs(2)),
            )
            .unwrap();

        let adapter = StoreAdapter::new(connector.connect("localhost", "db").unwrap());
        let latest = adapter.find_latest("fs", "tmp.txt").unwrap().unwrap();
        assert_eq!(latest.content, b"new");
    }

    #[test]
    fn write_new_version_replaces_older_ones() {
        let adapter = adapter();
        adapter
            .write_new_version("fs", "tmp.txt", b"It works!".to_vec())
            .unwrap();
        adapter
            .write_new_version("fs", "tmp.txt", b"It works wonderful!".to_vec())
            .unwrap();

        let latest = adapter.find_latest("fs", "tmp.txt").unwrap().unwrap();
        assert_eq!(latest.content, b"It works wonderful!");
    }

    #[test]
    fn delete_reports_whether_anything_was_removed() {
        let adapter = adapter();
        adapter
            .write_new_version("fs", "tmp.txt", b"data".to_vec())
            .unwrap();

        assert!(adapter.delete("fs", "tmp.txt").unwrap());
        assert!(!adapter.delete("fs", "tmp.txt").unwrap());
        assert!(adapter.find_latest("fs", "tmp.txt").unwrap().is_none());
    }

    #[test]
    fn rename_moves_content_and_clears_target() {
        let adapter = adapter();
        adapter
            .write_new_version("fs", "old.txt", b"payload".to_vec())
            .unwrap();
        adapter
            .write_new_version("fs", "new.txt", b"displaced".to_vec())
            .unwrap();

        adapter.rename("fs", "old.txt", "new.txt").unwrap();

        assert!(adapter.find_latest("fs", "old.txt").unwrap().is_none());
        let moved = adapter.find_latest("fs", "new.txt").unwrap().unwrap();
        assert_eq!(moved.content, b"payload");
    }

    #[test]
    fn rename_missing_source_fails() {
        let result = adapter().rename("fs", "missing.txt", "new.txt");
        assert!(matches!(result, Err(BlobFsError::NotFound { .. })));
    }

    #[test]
    fn touch_creates_empty_object_with_given_times() {
        let adapter = adapter();
        let mtime = UNIX_EPOCH + Duration::from_secs(1);
        let atime = UNIX_EPOCH + Duration::from_secs(2);

        adapter.touch("fs", "tmp.txt", Some(mtime), Some(atime)).unwrap();

        let object = adapter.find_latest("fs", "tmp.txt").unwrap().unwrap();
        assert!(object.content.is_empty());
        assert_eq!(object.times.modified, mtime);
        assert_eq!(object.times.accessed, atime);
    }

    #[test]
    fn touch_existing_preserves_content() {
        let adapter = adapter();
        adapter
            .write_new_version("fs", "tmp.txt", b"foo".to_vec())
            .unwrap();

        let mtime = UNIX_EPOCH + Duration::from_secs(1);
        let atime = UNIX_EPOCH + Duration::from_secs(2);
        adapter.touch("fs", "tmp.txt", Some(mtime), Some(atime)).unwrap();

        let object = adapter.find_latest("fs", "tmp.txt").unwrap().unwrap();
        assert_eq!(object.content, b"foo");
        assert_eq!(object.times.modified, mtime);
        assert_eq!(object.times.accessed, atime);
    }

    #[test]
    fn touch_atime_defaults_to_mtime() {
        let adapter = adapter();
        let mtime = UNIX_EPOCH + Duration::from_secs(5);

        adapter.touch("fs", "tmp.txt", Some(mtime), None).unwrap();

        let object = adapter.find_latest("fs", "tmp.txt").unwrap().unwrap();
        assert_eq!(object.times.modified, mtime);
        assert_eq!(object.times.accessed, mtime);
    }

    // Store double whose remove always fails, to exercise the tolerated
    // cleanup-failure path.
    struct NoRemoveStore(MemoryStore);

    impl ObjectStore for NoRemoveStore {
        fn insert(
            &self,
            bucket: &str,
            filename: &str,
            content: Vec<u8>,
            times: ObjectTimes,
        ) -> Result<FileObject, BlobFsError> {
            self.0.insert(bucket, filename, content, times)
        }

        fn find(&self, bucket: &str, filename: &str) -> Result<Vec<FileObject>, BlobFsError> {
            self.0.find(bucket, filename)
        }

        fn remove(
            &self,
            _bucket: &str,
            _filename: &str,
            _exclude: Option<ObjectId>,
        ) -> Result<u64, BlobFsError> {
            Err(BlobFsError::store("remove", "injected failure"))
        }

        fn update(
            &self,
            bucket: &str,
            id: ObjectId,
            update: ObjectUpdate,
        ) -> Result<(), BlobFsError> {
            self.0.update(bucket, id, update)
        }
    }

    #[test]
    fn write_new_version_tolerates_cleanup_failure() {
        let inner = MemoryConnector::new().connect("localhost", "db").unwrap();
        let adapter = StoreAdapter::new(NoRemoveStore(inner));

        adapter
            .write_new_version("fs", "tmp.txt", b"first".to_vec())
            .unwrap();
        // The second write cannot clean up, but must still succeed; the
        // stale duplicate loses the mtime race.
        let second = adapter
            .write_new_version("fs", "tmp.txt", b"second".to_vec())
            .unwrap();

        let latest = adapter.find_latest("fs", "tmp.txt").unwrap().unwrap();
        assert_eq!(latest.id, second.id);
    }
}
