//! The transport seam: what a blob store must provide.
//!
//! [`ObjectStore`] captures the minimal contract of the remote store — a
//! flat multiset of [`FileObject`]s keyed by `(bucket, filename)`, with no
//! partial writes, no in-place content updates and no multi-object
//! transactions. Everything the crate layers on top (version selection,
//! full-replace writes, rename, touch) lives in [`StoreAdapter`], so a
//! backend only implements these four primitives.
//!
//! [`StoreAdapter`]: crate::StoreAdapter

use std::time::SystemTime;

use crate::{BlobFsError, FileObject, ObjectId, ObjectTimes};

/// A field-wise metadata update for a stored object.
///
/// Only the fields set to `Some` are changed; content is never updated in
/// place — that is the point of the full-replace write strategy.
#[derive(Debug, Clone, Default)]
pub struct ObjectUpdate {
    /// New filename (rename in place).
    pub filename: Option<String>,
    /// New modification time.
    pub modified: Option<SystemTime>,
    /// New access time.
    pub accessed: Option<SystemTime>,
}

impl ObjectUpdate {
    /// Update only the timestamps.
    pub fn times(modified: SystemTime, accessed: SystemTime) -> Self {
        Self {
            filename: None,
            modified: Some(modified),
            accessed: Some(accessed),
        }
    }

    /// Rename and refresh both timestamps to `now`.
    pub fn rename_to(filename: impl Into<String>) -> Self {
        let now = SystemTime::now();
        Self {
            filename: Some(filename.into()),
            modified: Some(now),
            accessed: Some(now),
        }
    }
}

/// Blocking operations against one connected `(endpoint, database)` store.
///
/// All methods take `&self`; backends manage their own synchronization.
/// Every call is a synchronous round trip that runs to completion or
/// fails — there is no cancellation and no retry at this layer.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn ObjectStore`.
pub trait ObjectStore: Send + Sync {
    /// Insert a brand-new object and return it with its store-assigned id.
    ///
    /// # Errors
    ///
    /// [`BlobFsError::Store`] if the store rejects the insertion.
    fn insert(
        &self,
        bucket: &str,
        filename: &str,
        content: Vec<u8>,
        times: ObjectTimes,
    ) -> Result<FileObject, BlobFsError>;

    /// Every object matching `(bucket, filename)`, in store-dependent order.
    ///
    /// Duplicates are possible by design: a full-replace write briefly
    /// leaves a stale version next to the new one.
    ///
    /// # Errors
    ///
    /// [`BlobFsError::Store`] if the query itself fails. An empty result is
    /// `Ok(vec![])`, not an error.
    fn find(&self, bucket: &str, filename: &str) -> Result<Vec<FileObject>, BlobFsError>;

    /// Remove every object matching `(bucket, filename)`, except `exclude`
    /// when given. Returns the number of objects removed.
    ///
    /// # Errors
    ///
    /// [`BlobFsError::Store`] if the store signals a failure. Removing
    /// nothing is `Ok(0)`.
    fn remove(
        &self,
        bucket: &str,
        filename: &str,
        exclude: Option<ObjectId>,
    ) -> Result<u64, BlobFsError>;

    /// Apply a field-wise metadata update to the object with the given id.
    ///
    /// # Errors
    ///
    /// [`BlobFsError::Store`] if the id is unknown or the store fails.
    fn update(&self, bucket: &str, id: ObjectId, update: ObjectUpdate) -> Result<(), BlobFsError>;
}

/// Produces a connected [`ObjectStore`] for an `(endpoint, database)` pair.
///
/// Path-only operations resolve their own [`PathInfo`] and connect per
/// call, so a connector should hand out cheap handles to shared
/// connections rather than dialing anew each time.
///
/// [`PathInfo`]: crate::PathInfo
pub trait Connector: Send + Sync {
    /// The store type this connector produces.
    type Store: ObjectStore;

    /// Connect to the named database at the named endpoint.
    ///
    /// # Errors
    ///
    /// [`BlobFsError::Store`] if the endpoint is unreachable or the
    /// database cannot be selected.
    fn connect(&self, endpoint: &str, database: &str) -> Result<Self::Store, BlobFsError>;
}
