//! Core types for the blobfs data model.

use std::time::SystemTime;

/// Opaque, store-assigned identity of a stored object.
///
/// Stable for the object's lifetime. The inner value is backend-defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectId(pub u64);

/// Creation, modification and access timestamps of a stored object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectTimes {
    /// Creation time.
    #[cfg_attr(feature = "serde", serde(with = "system_time_serde"))]
    pub created: SystemTime,
    /// Last modification time. Version selection orders by this field.
    #[cfg_attr(feature = "serde", serde(with = "system_time_serde"))]
    pub modified: SystemTime,
    /// Last access time.
    #[cfg_attr(feature = "serde", serde(with = "system_time_serde"))]
    pub accessed: SystemTime,
}

impl ObjectTimes {
    /// All three timestamps set to the current system time.
    pub fn now() -> Self {
        let now = SystemTime::now();
        Self {
            created: now,
            modified: now,
            accessed: now,
        }
    }

    /// All three timestamps set to the given time.
    pub fn at(time: SystemTime) -> Self {
        Self {
            created: time,
            modified: time,
            accessed: time,
        }
    }
}

impl Default for ObjectTimes {
    fn default() -> Self {
        Self::now()
    }
}

/// The unit of storage: one version of a file in a bucket.
///
/// The `filename` key is not guaranteed unique within a bucket — during a
/// full-replace write a new version briefly coexists with the stale one it
/// supersedes. The current version among duplicates is the one with the
/// greatest `times.modified`.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FileObject {
    /// Store-assigned identity.
    pub id: ObjectId,
    /// Bucket the object lives in.
    pub bucket: String,
    /// Logical name within the bucket.
    pub filename: String,
    /// Full content bytes.
    pub content: Vec<u8>,
    /// Object timestamps.
    pub times: ObjectTimes,
}

/// What a handle is allowed to do with its buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AccessClass {
    /// Reads allowed; writes report zero bytes written.
    ReadOnly,
    /// Writes allowed; reads silently return empty.
    WriteOnly,
    /// Reads and writes allowed.
    ReadWrite,
}

impl AccessClass {
    /// Returns `true` if this class permits reading.
    #[inline]
    pub const fn can_read(&self) -> bool {
        matches!(self, AccessClass::ReadOnly | AccessClass::ReadWrite)
    }

    /// Returns `true` if this class permits writing.
    #[inline]
    pub const fn can_write(&self) -> bool {
        matches!(self, AccessClass::WriteOnly | AccessClass::ReadWrite)
    }
}

/// POSIX-like stat information for a stored file.
///
/// `modified` and `accessed` are taken from the object's metadata when
/// present; a flat blob store has no permissions model, so there is no
/// mode field.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FileStat {
    /// Size in bytes.
    pub size: u64,
    /// Creation time.
    #[cfg_attr(feature = "serde", serde(with = "system_time_serde"))]
    pub created: SystemTime,
    /// Last modification time.
    #[cfg_attr(feature = "serde", serde(with = "system_time_serde"))]
    pub modified: SystemTime,
    /// Last access time.
    #[cfg_attr(feature = "serde", serde(with = "system_time_serde"))]
    pub accessed: SystemTime,
    /// Number of links. Always 1; the store has no hard links.
    pub nlink: u64,
}

impl FileStat {
    /// Stat data derived from a stored object.
    pub fn of(object: &FileObject) -> Self {
        Self {
            size: object.content.len() as u64,
            created: object.times.created,
            modified: object.times.modified,
            accessed: object.times.accessed,
            nlink: 1,
        }
    }
}

/// Serde support for SystemTime (when the serde feature is enabled).
#[cfg(feature = "serde")]
mod system_time_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    pub fn serialize<S>(time: &SystemTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let duration = time.duration_since(UNIX_EPOCH).unwrap_or(Duration::ZERO);
        (duration.as_secs(), duration.subsec_nanos()).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<SystemTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (secs, nanos): (u64, u32) = Deserialize::deserialize(deserializer)?;
        Ok(UNIX_EPOCH + Duration::new(secs, nanos))
    }
}
