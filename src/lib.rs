//! # blobfs
//!
//! A conventional, seekable **file-stream interface over a versioned
//! remote blob store**.
//!
//! The store itself is primitive: a flat multiset of named binary objects
//! per bucket, with no partial writes, no in-place updates and no
//! transactions. This crate layers familiar file semantics on top —
//! `fopen`-style modes, cursors, append, truncate, rename, unlink, touch,
//! stat — by buffering full file content in memory per open session and
//! replacing the stored object wholesale on flush.
//!
//! ---
//!
//! ## Quick Start
//!
//! ```rust
//! use blobfs::{BlobFs, MemoryConnector};
//!
//! # fn main() -> Result<(), blobfs::BlobFsError> {
//! let fs = BlobFs::new(MemoryConnector::new());
//! let path = "blobfs://localhost/db/fs/greeting.txt";
//!
//! let mut session = fs.open(path, "w")?;
//! session.write(b"It works!");
//! session.close()?;
//!
//! let mut session = fs.open(path, "r")?;
//! let mut buf = [0u8; 32];
//! let n = session.read(&mut buf);
//! assert_eq!(&buf[..n], b"It works!");
//! session.close()?;
//! # Ok(())
//! # }
//! ```
//!
//! Paths follow `blobfs://host[:port]/database/bucket/key...`; see
//! [`PathInfo`] for the parsing and normalization rules and [`OpenMode`]
//! for the mode-token table.
//!
//! ---
//!
//! ## Core Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`BlobFs`] | Entry point — open sessions and path-only operations |
//! | [`FileSession`] | One open stream: read, write, seek, flush, close |
//! | [`ObjectStore`] / [`Connector`] | The transport seam a backend implements |
//! | [`StoreAdapter`] | Versioned CRUD protocol over an [`ObjectStore`] |
//! | [`MemoryConnector`] | Complete in-memory reference backend |
//! | [`PathInfo`] | Parsed `blobfs://` path |
//! | [`OpenMode`] | Classified `fopen`-style mode token |
//! | [`BlobFsError`] | Error type with contextual variants |
//!
//! ---
//!
//! ## Versioning Model
//!
//! A logical write never patches bytes: it inserts a brand-new object and
//! then deletes the versions it supersedes. Those are two separate store
//! operations, so a stale duplicate can briefly coexist with its
//! replacement. Readers tolerate this by always selecting the match with
//! the **greatest modification time** as the current version. Failure of
//! the delete step is logged and swallowed; it risks a transient
//! duplicate, never data loss.
//!
//! ---
//!
//! ## Concurrency
//!
//! Everything is synchronous and blocking. [`ObjectStore`] and
//! [`Connector`] require `Send + Sync` and take `&self`, so backends can
//! be shared freely; a [`FileSession`] holds private buffer state and is
//! meant to be driven from one place at a time. The crate takes no locks
//! around store round trips and never retries.
//!
//! ---
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `serde` | Enable serialization for [`PathInfo`], [`FileObject`], [`FileStat`], etc. |

// Private modules
mod adapter;
mod error;
mod handle;
mod memory;
mod mode;
mod path;
mod session;
mod store;
mod types;

pub mod registry;

// Public re-exports - error type
pub use error::BlobFsError;

// Public re-exports - core data model
pub use types::{AccessClass, FileObject, FileStat, ObjectId, ObjectTimes};

// Public re-exports - path and mode classification
pub use mode::OpenMode;
pub use path::{PathInfo, SCHEME};

// Public re-exports - transport seam
pub use store::{Connector, ObjectStore, ObjectUpdate};

// Public re-exports - store protocol and reference backend
pub use adapter::StoreAdapter;
pub use memory::{MemoryConnector, MemoryStore};

// Public re-exports - sessions
pub use handle::BufferedFileHandle;
pub use session::{BlobFs, FileSession};
