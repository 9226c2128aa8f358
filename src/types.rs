//! # Core Types
//!
//! Small value types shared by every backend and by the facade.
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`FileType`] | Enum: `File` or `Directory` |
//! | [`Metadata`] | `stat()` result: kind, size, mtime |
//! | [`AccessMode`] | What [`Backend::access`](crate::Backend::access) checks for |
//! | [`WriteMode`] | How [`Backend::open_write`](crate::Backend::open_write) opens a stream |

use std::time::SystemTime;

/// The type of a filesystem entry.
///
/// Only `File` and `Directory` exist at this layer. Symlinks, if a backend
/// chooses to support them internally, are the backend's private business
/// (see [`OsBackend`](crate::OsBackend)) and never surface as a distinct
/// kind through the `Backend` contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FileType {
    /// A regular file containing bytes.
    File,
    /// A directory containing named children.
    Directory,
}

/// The result of [`Backend::stat`](crate::Backend::stat).
///
/// Deliberately narrow: size, modification time, and kind are the three
/// facts every backend can report without assuming a POSIX permission
/// model or an inode namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Metadata {
    /// File or directory.
    pub file_type: FileType,
    /// Size in bytes. Always `0` for directories.
    pub size: u64,
    /// Last modification time.
    #[cfg_attr(feature = "serde", serde(with = "system_time_serde"))]
    pub modified: SystemTime,
}

impl Metadata {
    /// Returns `true` if this is a regular file.
    #[inline]
    pub fn is_file(&self) -> bool {
        self.file_type == FileType::File
    }

    /// Returns `true` if this is a directory.
    #[inline]
    pub fn is_dir(&self) -> bool {
        self.file_type == FileType::Directory
    }
}

/// What [`Backend::access`](crate::Backend::access) is asked to check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AccessMode {
    /// The path exists at all (as a file or directory).
    Exists,
    /// The path can be read.
    Read,
    /// The path can be written to (or created, for a missing file under an
    /// existing directory).
    Write,
}

/// How [`Backend::open_write`](crate::Backend::open_write) opens its stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WriteMode {
    /// Create the file if absent, or truncate it to empty if present.
    Truncate,
    /// Create the file if absent; existing content is preserved and writes
    /// land at the end of the file.
    Append,
}

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
