//! Process-wide scheme binding.
//!
//! Embedders that want `blobfs://` paths usable from anywhere in the
//! process, without threading a [`BlobFs`] value around, bind a connector
//! here once at startup. The free functions then mirror the [`BlobFs`]
//! surface through the bound connector. The core API works without the
//! registry; this module is purely a convenience layer.
//!
//! The binding is a single process-global slot. [`register`] is idempotent:
//! binding while already bound leaves the existing connector in place and
//! reports that nothing changed.

use std::io::SeekFrom;
use std::time::SystemTime;

use parking_lot::RwLock;
use tracing::info;

use crate::{BlobFs, BlobFsError, Connector, FileSession, FileStat, ObjectStore, SCHEME};

/// Object-safe view of an open [`FileSession`], as handed out by
/// [`open`].
pub trait StreamSession: Send {
    /// See [`FileSession::read`].
    fn read(&mut self, buf: &mut [u8]) -> usize;
    /// See [`FileSession::write`].
    fn write(&mut self, data: &[u8]) -> usize;
    /// See [`FileSession::seek`].
    fn seek(&mut self, pos: SeekFrom) -> Result<u64, BlobFsError>;
    /// See [`FileSession::tell`].
    fn tell(&self) -> u64;
    /// See [`FileSession::is_eof`].
    fn is_eof(&self) -> bool;
    /// See [`FileSession::truncate`].
    fn truncate(&mut self, new_size: u64);
    /// See [`FileSession::stat`].
    fn stat(&self) -> FileStat;
    /// See [`FileSession::flush`].
    fn flush(&mut self) -> Result<(), BlobFsError>;
    /// See [`FileSession::close`].
    fn close(self: Box<Self>) -> Result<(), BlobFsError>;
}

impl<S: ObjectStore> StreamSession for FileSession<S> {
    fn read(&mut self, buf: &mut [u8]) -> usize {
        FileSession::read(self, buf)
    }

    fn write(&mut self, data: &[u8]) -> usize {
        FileSession::write(self, data)
    }

    fn seek(&mut self, pos: SeekFrom) -> Result<u64, BlobFsError> {
        FileSession::seek(self, pos)
    }

    fn tell(&self) -> u64 {
        FileSession::tell(self)
    }

    fn is_eof(&self) -> bool {
        FileSession::is_eof(self)
    }

    fn truncate(&mut self, new_size: u64) {
        FileSession::truncate(self, new_size)
    }

    fn stat(&self) -> FileStat {
        FileSession::stat(self)
    }

    fn flush(&mut self) -> Result<(), BlobFsError> {
        FileSession::flush(self)
    }

    fn close(self: Box<Self>) -> Result<(), BlobFsError> {
        FileSession::close(*self)
    }
}

/// The [`BlobFs`] surface with the session type erased, so connectors of
/// any store type can share the one global slot.
trait DynFs: Send + Sync {
    fn open(&self, path: &str, mode: &str) -> Result<Box<dyn StreamSession>, BlobFsError>;
    fn unlink(&self, path: &str) -> Result<bool, BlobFsError>;
    fn rename(&self, from: &str, to: &str) -> Result<(), BlobFsError>;
    fn touch(
        &self,
        path: &str,
        mtime: Option<SystemTime>,
        atime: Option<SystemTime>,
    ) -> Result<(), BlobFsError>;
    fn stat(&self, path: &str) -> Result<FileStat, BlobFsError>;
    fn exists(&self, path: &str) -> Result<bool, BlobFsError>;
}

impl<C> DynFs for BlobFs<C>
where
    C: Connector + 'static,
    C::Store: 'static,
{
    fn open(&self, path: &str, mode: &str) -> Result<Box<dyn StreamSession>, BlobFsError> {
        Ok(Box::new(BlobFs::open(self, path, mode)?))
    }

    fn unlink(&self, path: &str) -> Result<bool, BlobFsError> {
        BlobFs::unlink(self, path)
    }

    fn rename(&self, from: &str, to: &str) -> Result<(), BlobFsError> {
        BlobFs::rename(self, from, to)
    }

    fn touch(
        &self,
        path: &str,
        mtime: Option<SystemTime>,
        atime: Option<SystemTime>,
    ) -> Result<(), BlobFsError> {
        BlobFs::touch(self, path, mtime, atime)
    }

    fn stat(&self, path: &str) -> Result<FileStat, BlobFsError> {
        BlobFs::stat(self, path)
    }

    fn exists(&self, path: &str) -> Result<bool, BlobFsError> {
        BlobFs::exists(self, path)
    }
}

static BOUND: RwLock<Option<Box<dyn DynFs>>> = RwLock::new(None);

fn with_bound<R>(f: impl FnOnce(&dyn DynFs) -> Result<R, BlobFsError>) -> Result<R, BlobFsError> {
    let guard = BOUND.read();
    match guard.as_deref() {
        Some(fs) => f(fs),
        None => Err(BlobFsError::store(
            "registry",
            format!("no connector registered for scheme {SCHEME}"),
        )),
    }
}

/// Bind `connector` to the [`SCHEME`] slot for the whole process.
///
/// Returns `true` when the binding was established, `false` when a
/// connector was already bound (the existing one stays).
pub fn register<C>(connector: C) -> bool
where
    C: Connector + 'static,
    C::Store: 'static,
{
    let mut slot = BOUND.write();
    if slot.is_some() {
        return false;
    }
    *slot = Some(Box::new(BlobFs::new(connector)));
    info!(scheme = SCHEME, "registered connector");
    true
}

/// Drop the process-wide binding. Returns whether one existed.
pub fn unregister() -> bool {
    BOUND.write().take().is_some()
}

/// Whether a connector is currently bound.
pub fn is_registered() -> bool {
    BOUND.read().is_some()
}

/// [`BlobFs::open`] through the bound connector.
///
/// # Errors
///
/// [`BlobFsError::Store`] with operation `"registry"` when nothing is
/// bound; otherwise as [`BlobFs::open`].
pub fn open(path: &str, mode: &str) -> Result<Box<dyn StreamSession>, BlobFsError> {
    with_bound(|fs| fs.open(path, mode))
}

/// [`BlobFs::unlink`] through the bound connector.
pub fn unlink(path: &str) -> Result<bool, BlobFsError> {
    with_bound(|fs| fs.unlink(path))
}

/// [`BlobFs::rename`] through the bound connector.
pub fn rename(from: &str, to: &str) -> Result<(), BlobFsError> {
    with_bound(|fs| fs.rename(from, to))
}

/// [`BlobFs::touch`] through the bound connector.
pub fn touch(
    path: &str,
    mtime: Option<SystemTime>,
    atime: Option<SystemTime>,
) -> Result<(), BlobFsError> {
    with_bound(|fs| fs.touch(path, mtime, atime))
}

/// [`BlobFs::stat`] through the bound connector.
pub fn stat(path: &str) -> Result<FileStat, BlobFsError> {
    with_bound(|fs| fs.stat(path))
}

/// [`BlobFs::exists`] through the bound connector.
pub fn exists(path: &str) -> Result<bool, BlobFsError> {
    with_bound(|fs| fs.exists(path))
}
