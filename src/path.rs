//! Path parsing and key normalization.
//!
//! A blobfs path names one stored object:
//!
//! ```text
//! blobfs://host[:port]/database/bucket/segment[/segment...]
//! ```
//!
//! Parsing is pure and deterministic; identical inputs always yield
//! identical output, and normalizing an already-normalized key is a no-op.

use std::fmt;

use crate::BlobFsError;

/// The URL scheme handled by this crate. Matched exactly, case-sensitive.
pub const SCHEME: &str = "blobfs";

/// A parsed path: where an object lives and what it is called.
///
/// Derived per call and immediately consumed; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PathInfo {
    /// Store endpoint, `host` or `host:port` preserved verbatim.
    pub endpoint: String,
    /// Database within the endpoint.
    pub database: String,
    /// Bucket within the database.
    pub bucket: String,
    /// Normalized object key (never empty).
    pub key: String,
}

impl PathInfo {
    /// Parse a `blobfs://` path string.
    ///
    /// The scheme must match [`SCHEME`] exactly. The path portion must
    /// decompose into at least a database, a bucket, and one key segment.
    /// Key segments are normalized: empty and `.` segments are dropped,
    /// `..` pops the previous segment but never below the first retained
    /// one, and a key that normalizes to nothing is an error — the store
    /// has no directory concept, so a path naming no object is invalid.
    ///
    /// # Errors
    ///
    /// [`BlobFsError::PathParse`] on any malformed input.
    pub fn parse(path: &str) -> Result<Self, BlobFsError> {
        let fail = |reason: &'static str| BlobFsError::PathParse {
            path: path.to_string(),
            reason,
        };

        let rest = path
            .strip_prefix(SCHEME)
            .and_then(|r| r.strip_prefix("://"))
            .ok_or_else(|| fail("scheme must be blobfs://"))?;

        let (endpoint, object_path) = rest.split_once('/').ok_or_else(|| fail("missing path"))?;
        if endpoint.is_empty() {
            return Err(fail("missing host"));
        }

        let mut segments = object_path.split('/');
        let database = segments.next().filter(|s| !s.is_empty());
        let bucket = segments.next().filter(|s| !s.is_empty());
        let (Some(database), Some(bucket)) = (database, bucket) else {
            return Err(fail("expected /database/bucket/key"));
        };

        let key = resolve_key(segments);
        if key.is_empty() {
            return Err(fail("path resolves to an empty key"));
        }

        Ok(Self {
            endpoint: endpoint.to_string(),
            database: database.to_string(),
            bucket: bucket.to_string(),
            key,
        })
    }

    /// Returns `true` when both paths name the same endpoint, database and
    /// bucket. Rename is only defined when this holds.
    pub fn same_bucket(&self, other: &PathInfo) -> bool {
        self.endpoint == other.endpoint
            && self.database == other.database
            && self.bucket == other.bucket
    }
}

impl fmt::Display for PathInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{SCHEME}://{}/{}/{}/{}",
            self.endpoint, self.database, self.bucket, self.key
        )
    }
}

/// Normalize key segments: drop empty and `.`, pop one level on `..` but
/// keep at least the first retained segment, rejoin with `/`.
fn resolve_key<'a>(segments: impl Iterator<Item = &'a str>) -> String {
    let mut retained: Vec<&str> = Vec::new();
    for segment in segments {
        match segment {
            "" | "." => {}
            ".." => {
                if retained.len() > 1 {
                    retained.pop();
                }
            }
            _ => retained.push(segment),
        }
    }
    retained.join("/")
}
