//! Error types for the blobfs stream adapter.

/// Error type for all blobfs operations, with contextual variants.
///
/// All error variants include relevant context (path, bucket, key, operation)
/// where applicable. Uses `#[non_exhaustive]` for forward compatibility.
///
/// Failures are local to the operation that produced them: the crate never
/// retries and never performs partial-failure recovery beyond the tolerated
/// stale-version cleanup inside a full-replace write.
///
/// # Examples
///
/// ```rust
/// use blobfs::BlobFsError;
///
/// let err = BlobFsError::NotFound {
///     bucket: "fs".into(),
///     key: "missing.txt".into(),
/// };
/// assert_eq!(err.to_string(), "not found: fs/missing.txt");
/// ```
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum BlobFsError {
    /// Path string could not be parsed into `{endpoint, database, bucket, key}`.
    #[error("invalid path {path:?}: {reason}")]
    PathParse {
        /// The path string that failed to parse.
        path: String,
        /// Why parsing failed.
        reason: &'static str,
    },

    /// Open-mode token is not one of the recognized primary letters.
    #[error("invalid mode {token:?}, use r, w, a, x or c, flavoured with t, b and/or +")]
    UnknownMode {
        /// The rejected mode token.
        token: String,
    },

    /// No current version exists for the key.
    #[error("not found: {bucket}/{key}")]
    NotFound {
        /// Bucket that was searched.
        bucket: String,
        /// Key that was not found.
        key: String,
    },

    /// A current version already exists where none was allowed.
    #[error("{operation}: already exists: {bucket}/{key}")]
    AlreadyExists {
        /// Bucket holding the conflicting object.
        bucket: String,
        /// Key of the conflicting object.
        key: String,
        /// The operation that failed.
        operation: &'static str,
    },

    /// Rename across endpoints, databases or buckets is not defined.
    #[error("cannot rename across buckets: {from} -> {to}")]
    CrossBucketRename {
        /// Source path.
        from: String,
        /// Target path.
        to: String,
    },

    /// Seek resolved to a position before the start of the stream.
    #[error("invalid seek to offset {offset}")]
    InvalidSeek {
        /// The offset the seek would have produced.
        offset: i64,
    },

    /// Operation has no meaning for a flat blob store.
    #[error("operation not supported: {operation}")]
    NotSupported {
        /// The unsupported operation.
        operation: &'static str,
    },

    /// The store itself signalled a failure. Surfaced immediately, never retried.
    #[error("store error during {operation}: {message}")]
    Store {
        /// The store operation that failed.
        operation: &'static str,
        /// Store-provided failure description.
        message: String,
    },
}

impl BlobFsError {
    /// Shorthand for a [`BlobFsError::Store`] failure.
    pub fn store(operation: &'static str, message: impl Into<String>) -> Self {
        BlobFsError::Store {
            operation,
            message: message.into(),
        }
    }
}
