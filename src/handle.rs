//! The per-session scratch buffer.
//!
//! A [`BufferedFileHandle`] is the full, exact content of a logical file
//! for the duration of one open session. The backing store cannot patch
//! bytes in place, so the handle loads everything up front, serves every
//! read, write, seek and truncate purely in memory, and hands the whole
//! buffer back for a full-replace write on flush.
//!
//! A handle performs no locking and is not meant to be shared between
//! sessions.

use std::io::SeekFrom;

use crate::{AccessClass, BlobFsError, FileObject, OpenMode};

/// Seekable byte stream over an in-memory copy of one file's content.
#[derive(Debug)]
pub struct BufferedFileHandle {
    content: Vec<u8>,
    cursor: u64,
    access: AccessClass,
    append: bool,
}

impl BufferedFileHandle {
    /// Build the scratch buffer for an open session.
    ///
    /// The buffer is pre-filled from the existing version unless the mode
    /// truncates. The cursor starts at 0, or at end-of-buffer for append
    /// mode.
    ///
    /// # Errors
    ///
    /// - [`BlobFsError::NotFound`] when the mode requires an existing
    ///   version and none was found.
    /// - [`BlobFsError::AlreadyExists`] when the mode forbids one and a
    ///   version was found.
    pub fn open(
        mode: &OpenMode,
        existing: Option<FileObject>,
        bucket: &str,
        key: &str,
    ) -> Result<Self, BlobFsError> {
        if mode.must_exist && existing.is_none() {
            return Err(BlobFsError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            });
        }
        if mode.must_not_exist && existing.is_some() {
            return Err(BlobFsError::AlreadyExists {
                bucket: bucket.to_string(),
                key: key.to_string(),
                operation: "open",
            });
        }

        let content = match existing {
            Some(object) if !mode.truncate => object.content,
            _ => Vec::new(),
        };
        let cursor = if mode.append { content.len() as u64 } else { 0 };

        Ok(Self {
            content,
            cursor,
            access: mode.access,
            append: mode.append,
        })
    }

    /// Copy up to `buf.len()` bytes from the cursor into `buf`, advancing
    /// the cursor by the number of bytes copied.
    ///
    /// A write-only handle silently returns 0 without touching the cursor;
    /// so does a cursor at or past end-of-buffer.
    pub fn read(&mut self, buf: &mut [u8]) -> usize {
        if !self.access.can_read() {
            return 0;
        }

        let start = match usize::try_from(self.cursor) {
            Ok(start) if start < self.content.len() => start,
            _ => return 0,
        };

        let end = (start + buf.len()).min(self.content.len());
        let copied = end - start;
        buf[..copied].copy_from_slice(&self.content[start..end]);
        self.cursor += copied as u64;
        copied
    }

    /// Write `data` into the buffer, returning the number of bytes written.
    ///
    /// A read-only handle reports 0 and mutates nothing. In append mode
    /// the write always lands at end-of-buffer and the cursor keeps its
    /// pre-write value; otherwise the write lands at the cursor
    /// (zero-filling any gap past end-of-buffer) and the cursor advances.
    /// The buffer is unbounded, so a permitted write always takes the full
    /// input.
    pub fn write(&mut self, data: &[u8]) -> usize {
        if !self.access.can_write() {
            return 0;
        }

        if self.append {
            self.content.extend_from_slice(data);
            return data.len();
        }

        let start = self.cursor as usize;
        let end = start + data.len();
        if end > self.content.len() {
            self.content.resize(end, 0);
        }
        self.content[start..end].copy_from_slice(data);
        self.cursor = end as u64;
        data.len()
    }

    /// Relocate the cursor relative to start, current position or end.
    ///
    /// Any representable non-negative offset succeeds, including past
    /// end-of-buffer; reads there return nothing and writes zero-fill the
    /// gap. Returns the new cursor position.
    ///
    /// # Errors
    ///
    /// [`BlobFsError::InvalidSeek`] when the resulting offset would be
    /// negative.
    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64, BlobFsError> {
        let target = match pos {
            SeekFrom::Start(offset) => i128::from(offset),
            SeekFrom::Current(delta) => i128::from(self.cursor) + i128::from(delta),
            SeekFrom::End(delta) => self.content.len() as i128 + i128::from(delta),
        };

        self.cursor = u64::try_from(target).map_err(|_| BlobFsError::InvalidSeek {
            offset: target as i64,
        })?;
        Ok(self.cursor)
    }

    /// Resize the buffer to exactly `new_size`, zero-padding growth.
    /// The cursor is left where it was.
    pub fn truncate(&mut self, new_size: u64) {
        self.content.resize(new_size as usize, 0);
    }

    /// The full buffer from offset 0, irrespective of the cursor.
    ///
    /// This is what a flush pushes to the store as a new version; taking
    /// it does not reset the buffer or move the cursor.
    pub fn contents(&self) -> &[u8] {
        &self.content
    }

    /// Current cursor position.
    pub fn position(&self) -> u64 {
        self.cursor
    }

    /// Buffer length in bytes.
    pub fn len(&self) -> u64 {
        self.content.len() as u64
    }

    /// Returns `true` when the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Returns `true` when the cursor sits at or past end-of-buffer.
    pub fn is_eof(&self) -> bool {
        self.cursor >= self.len()
    }

    /// The handle's access class.
    pub fn access(&self) -> AccessClass {
        self.access
    }
}
