//! Session orchestration: the file-stream surface over a blob store.
//!
//! [`BlobFs`] ties the pieces together. Opening a path resolves it,
//! classifies the mode, connects to the store and loads the current
//! version into a [`BufferedFileHandle`]; the resulting [`FileSession`]
//! then serves reads, writes and seeks from memory and pushes the whole
//! buffer back as a new version on flush. Path-only operations (rename,
//! unlink, touch, stat) resolve their own path and use a short-lived
//! connection each.

use std::io::SeekFrom;
use std::time::SystemTime;

use tracing::{debug, warn};

use crate::{
    BlobFsError, BufferedFileHandle, Connector, FileStat, ObjectStore, ObjectTimes, OpenMode,
    PathInfo, StoreAdapter,
};

/// File-stream operations over a blob store reached through `C`.
///
/// Stateless beyond the connector; safe to share and reuse across any
/// number of sessions.
pub struct BlobFs<C> {
    connector: C,
}

impl<C: Connector> BlobFs<C> {
    /// Build the stream surface over a connector.
    pub fn new(connector: C) -> Self {
        Self { connector }
    }

    fn adapter_for(&self, info: &PathInfo) -> Result<StoreAdapter<C::Store>, BlobFsError> {
        let store = self.connector.connect(&info.endpoint, &info.database)?;
        Ok(StoreAdapter::new(store))
    }

    /// Open a session on `path` under the given `fopen`-style mode token.
    ///
    /// The current version (greatest modification time) is loaded into the
    /// session buffer unless the mode truncates. Nothing is written to the
    /// store until the session flushes.
    ///
    /// # Errors
    ///
    /// - [`BlobFsError::PathParse`] / [`BlobFsError::UnknownMode`] for bad
    ///   inputs.
    /// - [`BlobFsError::NotFound`] / [`BlobFsError::AlreadyExists`] when
    ///   the mode's existence contract fails.
    /// - [`BlobFsError::Store`] on store failure.
    pub fn open(&self, path: &str, mode: &str) -> Result<FileSession<C::Store>, BlobFsError> {
        let info = PathInfo::parse(path)?;
        let mode = OpenMode::classify(mode)?;
        let adapter = self.adapter_for(&info)?;

        let existing = adapter.find_latest(&info.bucket, &info.key)?;
        let times = existing
            .as_ref()
            .map(|o| o.times)
            .unwrap_or_else(ObjectTimes::now);
        let handle = BufferedFileHandle::open(&mode, existing, &info.bucket, &info.key)?;

        debug!(path, ?mode, "opened session");
        Ok(FileSession {
            adapter,
            handle,
            bucket: info.bucket,
            key: info.key,
            times,
            // A writable session persists on close even if never written,
            // so that opening with a creating mode materializes the file.
            dirty: mode.access.can_write(),
            closed: false,
        })
    }

    /// Delete every version at `path`. Returns whether anything existed.
    pub fn unlink(&self, path: &str) -> Result<bool, BlobFsError> {
        let info = PathInfo::parse(path)?;
        self.adapter_for(&info)?.delete(&info.bucket, &info.key)
    }

    /// Rename `from` to `to` within one bucket, displacing any existing
    /// object at the new name.
    ///
    /// # Errors
    ///
    /// - [`BlobFsError::CrossBucketRename`] when the two paths differ in
    ///   endpoint, database or bucket; the store is not contacted.
    /// - [`BlobFsError::NotFound`] when `from` has no current version.
    pub fn rename(&self, from: &str, to: &str) -> Result<(), BlobFsError> {
        let source = PathInfo::parse(from)?;
        let target = PathInfo::parse(to)?;
        if !source.same_bucket(&target) {
            return Err(BlobFsError::CrossBucketRename {
                from: source.to_string(),
                to: target.to_string(),
            });
        }

        self.adapter_for(&source)?
            .rename(&source.bucket, &source.key, &target.key)
    }

    /// Create `path` as an empty object, or update its timestamps if it
    /// already exists. `mtime` defaults to now, `atime` to the `mtime`
    /// value.
    pub fn touch(
        &self,
        path: &str,
        mtime: Option<SystemTime>,
        atime: Option<SystemTime>,
    ) -> Result<(), BlobFsError> {
        let info = PathInfo::parse(path)?;
        self.adapter_for(&info)?
            .touch(&info.bucket, &info.key, mtime, atime)
    }

    /// Stat the current version at `path`.
    ///
    /// # Errors
    ///
    /// [`BlobFsError::NotFound`] when no version exists.
    pub fn stat(&self, path: &str) -> Result<FileStat, BlobFsError> {
        let info = PathInfo::parse(path)?;
        let object = self
            .adapter_for(&info)?
            .find_latest(&info.bucket, &info.key)?
            .ok_or(BlobFsError::NotFound {
                bucket: info.bucket,
                key: info.key,
            })?;
        Ok(FileStat::of(&object))
    }

    /// Whether a current version exists at `path`.
    pub fn exists(&self, path: &str) -> Result<bool, BlobFsError> {
        let info = PathInfo::parse(path)?;
        Ok(self
            .adapter_for(&info)?
            .find_latest(&info.bucket, &info.key)?
            .is_some())
    }

    /// Directory creation has no meaning in a flat bucket.
    ///
    /// # Errors
    ///
    /// Always [`BlobFsError::NotSupported`].
    pub fn mkdir(&self, _path: &str) -> Result<(), BlobFsError> {
        Err(BlobFsError::NotSupported { operation: "mkdir" })
    }

    /// Directory removal has no meaning in a flat bucket.
    ///
    /// # Errors
    ///
    /// Always [`BlobFsError::NotSupported`].
    pub fn rmdir(&self, _path: &str) -> Result<(), BlobFsError> {
        Err(BlobFsError::NotSupported { operation: "rmdir" })
    }

    /// Directory enumeration has no meaning in a flat bucket.
    ///
    /// # Errors
    ///
    /// Always [`BlobFsError::NotSupported`].
    pub fn read_dir(&self, _path: &str) -> Result<(), BlobFsError> {
        Err(BlobFsError::NotSupported {
            operation: "read_dir",
        })
    }

    /// The store has no permissions model; timestamps via
    /// [`touch`](Self::touch) are the only settable metadata.
    ///
    /// # Errors
    ///
    /// Always [`BlobFsError::NotSupported`].
    pub fn set_permissions(&self, _path: &str, _mode: u32) -> Result<(), BlobFsError> {
        Err(BlobFsError::NotSupported {
            operation: "set_permissions",
        })
    }
}

/// One open file stream.
///
/// Holds the full content in memory for its entire lifetime; every read,
/// write, seek and truncate is a buffer operation. `flush` (and `close`,
/// and as a fallback `Drop`) persists the buffer as a new version through
/// a full-replace write. Not meant to be shared between threads of
/// control; it performs no locking of its own.
pub struct FileSession<S: ObjectStore> {
    adapter: StoreAdapter<S>,
    handle: BufferedFileHandle,
    bucket: String,
    key: String,
    times: ObjectTimes,
    dirty: bool,
    closed: bool,
}

impl<S: ObjectStore> FileSession<S> {
    /// Read up to `buf.len()` bytes at the cursor; returns bytes read.
    /// Write-only sessions read 0 bytes.
    pub fn read(&mut self, buf: &mut [u8]) -> usize {
        self.handle.read(buf)
    }

    /// Write `data` at the cursor (or at end-of-buffer in append mode);
    /// returns bytes written. Read-only sessions write 0 bytes.
    pub fn write(&mut self, data: &[u8]) -> usize {
        let written = self.handle.write(data);
        if written > 0 {
            self.dirty = true;
        }
        written
    }

    /// Relocate the cursor. See [`BufferedFileHandle::seek`].
    ///
    /// # Errors
    ///
    /// [`BlobFsError::InvalidSeek`] when the offset would be negative.
    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64, BlobFsError> {
        self.handle.seek(pos)
    }

    /// Current cursor position.
    pub fn tell(&self) -> u64 {
        self.handle.position()
    }

    /// Whether the cursor sits at or past end-of-buffer.
    pub fn is_eof(&self) -> bool {
        self.handle.is_eof()
    }

    /// Resize the buffer to `new_size`, zero-padding growth.
    pub fn truncate(&mut self, new_size: u64) {
        self.handle.truncate(new_size);
        self.dirty = true;
    }

    /// Stat of the live buffer: current length plus the timestamps of the
    /// version the session last loaded or flushed.
    pub fn stat(&self) -> FileStat {
        FileStat {
            size: self.handle.len(),
            created: self.times.created,
            modified: self.times.modified,
            accessed: self.times.accessed,
            nlink: 1,
        }
    }

    /// Advisory locking is not provided by the store.
    ///
    /// # Errors
    ///
    /// Always [`BlobFsError::NotSupported`].
    pub fn lock(&mut self) -> Result<(), BlobFsError> {
        Err(BlobFsError::NotSupported { operation: "lock" })
    }

    /// Persist the buffer as a new current version.
    ///
    /// A no-op for read-only sessions and for sessions already flushed with
    /// no write since.
    ///
    /// # Errors
    ///
    /// [`BlobFsError::Store`] when the insert fails; the tolerated
    /// stale-cleanup failure inside the replace does not surface here.
    pub fn flush(&mut self) -> Result<(), BlobFsError> {
        if !self.dirty || !self.handle.access().can_write() {
            return Ok(());
        }

        let written = self.adapter.write_new_version(
            &self.bucket,
            &self.key,
            self.handle.contents().to_vec(),
        )?;
        self.times = written.times;
        self.dirty = false;
        Ok(())
    }

    /// Flush and consume the session.
    ///
    /// Prefer this over relying on `Drop`: a flush failure here is
    /// reported, while one during `Drop` can only be logged.
    ///
    /// # Errors
    ///
    /// Propagates the final [`flush`](Self::flush) failure.
    pub fn close(mut self) -> Result<(), BlobFsError> {
        let result = self.flush();
        self.closed = true;
        result
    }
}

impl<S: ObjectStore> Drop for FileSession<S> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(err) = self.flush() {
            warn!(
                bucket = %self.bucket,
                key = %self.key,
                error = %err,
                "flush on drop failed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryConnector;
    use std::time::{Duration, UNIX_EPOCH};

    fn fs() -> BlobFs<MemoryConnector> {
        BlobFs::new(MemoryConnector::new())
    }

    const PATH: &str = "blobfs://localhost/db/fs/tmp.txt";

    #[test]
    fn write_then_read_round_trip() {
        let fs = fs();

        let mut session = fs.open(PATH, "w").unwrap();
        assert_eq!(session.write(b"It works!"), 9);
        session.close().unwrap();

        let mut session = fs.open(PATH, "r").unwrap();
        let mut buf = [0u8; 32];
        let n = session.read(&mut buf);
        assert_eq!(&buf[..n], b"It works!");
        session.close().unwrap();
    }

    #[test]
    fn overwrite_replaces_previous_version() {
        let fs = fs();

        let mut session = fs.open(PATH, "w").unwrap();
        session.write(b"It works!");
        session.close().unwrap();

        let mut session = fs.open(PATH, "w").unwrap();
        session.write(b"It works wonderful!");
        session.close().unwrap();

        let mut session = fs.open(PATH, "r").unwrap();
        let mut buf = [0u8; 64];
        let n = session.read(&mut buf);
        assert_eq!(&buf[..n], b"It works wonderful!");
    }

    #[test]
    fn open_missing_for_read_fails() {
        assert!(matches!(
            fs().open(PATH, "r"),
            Err(BlobFsError::NotFound { .. })
        ));
    }

    #[test]
    fn creating_open_without_writes_materializes_empty_file() {
        let fs = fs();
        fs.open(PATH, "w").unwrap().close().unwrap();

        assert!(fs.exists(PATH).unwrap());
        assert_eq!(fs.stat(PATH).unwrap().size, 0);
    }

    #[test]
    fn read_only_session_never_writes_back() {
        let fs = fs();
        fs.open(PATH, "w").unwrap().write(b"data");

        let before = fs.stat(PATH).unwrap().modified;
        let mut session = fs.open(PATH, "r").unwrap();
        let mut buf = [0u8; 4];
        session.read(&mut buf);
        session.close().unwrap();

        assert_eq!(fs.stat(PATH).unwrap().modified, before);
    }

    #[test]
    fn drop_flushes_unclosed_written_session() {
        let fs = fs();
        {
            let mut session = fs.open(PATH, "w").unwrap();
            session.write(b"dropped");
        }
        let mut session = fs.open(PATH, "r").unwrap();
        let mut buf = [0u8; 16];
        let n = session.read(&mut buf);
        assert_eq!(&buf[..n], b"dropped");
    }

    #[test]
    fn flush_twice_without_writes_stores_once() {
        let fs = fs();
        let mut session = fs.open(PATH, "w").unwrap();
        session.write(b"once");
        session.flush().unwrap();
        let after_first = fs.stat(PATH).unwrap().modified;

        session.flush().unwrap();
        session.close().unwrap();
        assert_eq!(fs.stat(PATH).unwrap().modified, after_first);
    }

    #[test]
    fn unlink_reports_existence() {
        let fs = fs();
        fs.open(PATH, "w").unwrap().close().unwrap();

        assert!(fs.unlink(PATH).unwrap());
        assert!(!fs.unlink(PATH).unwrap());
        assert!(!fs.exists(PATH).unwrap());
    }

    #[test]
    fn touch_then_stat_reflects_given_times() {
        let fs = fs();
        let mtime = UNIX_EPOCH + Duration::from_secs(1);
        let atime = UNIX_EPOCH + Duration::from_secs(2);

        fs.touch(PATH, Some(mtime), Some(atime)).unwrap();

        let stat = fs.stat(PATH).unwrap();
        assert_eq!(stat.size, 0);
        assert_eq!(stat.modified, mtime);
        assert_eq!(stat.accessed, atime);
    }

    #[test]
    fn rename_within_bucket_moves_the_object() {
        let fs = fs();
        let from = "blobfs://localhost/db/fs/old.txt";
        let to = "blobfs://localhost/db/fs/new.txt";

        let mut session = fs.open(from, "w").unwrap();
        session.write(b"payload");
        session.close().unwrap();

        fs.rename(from, to).unwrap();

        assert!(!fs.exists(from).unwrap());
        let mut session = fs.open(to, "r").unwrap();
        let mut buf = [0u8; 16];
        let n = session.read(&mut buf);
        assert_eq!(&buf[..n], b"payload");
    }

    #[test]
    fn rename_across_host_database_or_bucket_fails_untouched() {
        let fs = fs();
        let from = "blobfs://localhost/db/fs/a.txt";
        fs.open(from, "w").unwrap().close().unwrap();

        for to in [
            "blobfs://otherhost/db/fs/a.txt",
            "blobfs://localhost/otherdb/fs/a.txt",
            "blobfs://localhost/db/otherfs/a.txt",
        ] {
            assert!(
                matches!(
                    fs.rename(from, to),
                    Err(BlobFsError::CrossBucketRename { .. })
                ),
                "target {to}"
            );
        }
        // Source untouched by the failed attempts.
        assert!(fs.exists(from).unwrap());
    }

    #[test]
    fn session_stat_tracks_buffer_length() {
        let fs = fs();
        let mut session = fs.open(PATH, "w").unwrap();
        session.write(b"12345");
        assert_eq!(session.stat().size, 5);
        session.truncate(2);
        assert_eq!(session.stat().size, 2);
    }

    #[test]
    fn directory_and_lock_operations_are_unsupported() {
        let fs = fs();
        assert!(matches!(
            fs.mkdir("blobfs://h/db/fs/dir"),
            Err(BlobFsError::NotSupported { .. })
        ));
        assert!(matches!(
            fs.rmdir("blobfs://h/db/fs/dir"),
            Err(BlobFsError::NotSupported { .. })
        ));
        assert!(matches!(
            fs.read_dir("blobfs://h/db/fs/dir"),
            Err(BlobFsError::NotSupported { .. })
        ));
        assert!(matches!(
            fs.set_permissions(PATH, 0o644),
            Err(BlobFsError::NotSupported { .. })
        ));

        fs.open(PATH, "w").unwrap();
        let mut session = fs.open(PATH, "c").unwrap();
        assert!(matches!(
            session.lock(),
            Err(BlobFsError::NotSupported { .. })
        ));
    }

    #[test]
    fn exclusive_session_full_workflow() {
        let fs = fs();
        let mut session = fs.open(PATH, "x+").unwrap();
        assert_eq!(session.write(b"foobar"), 6);
        session.seek(SeekFrom::Start(0)).unwrap();

        let mut buf = [0u8; 3];
        assert_eq!(session.read(&mut buf), 3);
        assert_eq!(&buf, b"foo");
        assert_eq!(session.tell(), 3);

        session.write(b"foo");
        session.close().unwrap();

        let mut session = fs.open(PATH, "r").unwrap();
        let mut buf = [0u8; 16];
        let n = session.read(&mut buf);
        assert_eq!(&buf[..n], b"foofoo");
    }

    #[test]
    fn append_session_writes_land_at_end() {
        let fs = fs();
        let mut session = fs.open(PATH, "w").unwrap();
        session.write(b"foo");
        session.close().unwrap();

        let mut session = fs.open(PATH, "a+").unwrap();
        session.seek(SeekFrom::Start(0)).unwrap();
        session.write(b"bar");
        session.close().unwrap();

        let mut session = fs.open(PATH, "r").unwrap();
        let mut buf = [0u8; 16];
        let n = session.read(&mut buf);
        assert_eq!(&buf[..n], b"foobar");
    }
}
