//! # Backend Trait
//!
//! The capability set every filesystem implementation provides.
//!
//! ## Responsibility
//! - Define the one contract [`MemoryBackend`](crate::MemoryBackend),
//!   [`OsBackend`](crate::OsBackend), [`ReadOnlyWrapper`](crate::ReadOnlyWrapper),
//!   [`UnionBackend`](crate::UnionBackend), and [`MountTable`](crate::MountTable)
//!   all implement.
//!
//! ## Object Safety
//!
//! `Backend` is object-safe: every method takes `&self` and uses no generic
//! parameters, so it can be used as `Box<dyn Backend>` or `&dyn Backend`.
//! This is what lets [`UnionBackend`](crate::UnionBackend) and
//! [`MountTable`](crate::MountTable) hold heterogeneous collections of
//! backends.
//!
//! ## Thread Safety
//!
//! All implementations must be `Send + Sync`. Methods take `&self`;
//! interior mutability (`RwLock`, `Mutex`, atomics) is the implementor's
//! responsibility.

use std::io::{Read, Write};
use std::path::Path;

use crate::{AccessMode, FsError, Metadata, WriteMode};

/// The capability set every virtual filesystem backend implements.
///
/// # Errors
///
/// Every method returns the taxonomy described in the crate's top-level
/// documentation and in [`FsError`]. Implementations must preserve the
/// distinction between [`FsError::NotFound`], [`FsError::NotADirectory`],
/// [`FsError::IsADirectory`], [`FsError::ReadOnly`], and
/// [`FsError::PermissionDenied`] — callers are expected to match on these.
pub trait Backend: Send + Sync {
    // ---- existence / metadata ----------------------------------------

    /// Return full metadata (kind, size, mtime) for `path`.
    ///
    /// # Errors
    ///
    /// [`FsError::NotFound`] if `path` does not exist.
    fn stat(&self, path: &Path) -> Result<Metadata, FsError>;

    /// Check whether `path` satisfies `mode`.
    ///
    /// `AccessMode::Exists` never fails for a missing path — it simply
    /// returns `Ok(false)`. `AccessMode::Read` and `AccessMode::Write` ask
    /// whether the backend would currently permit that kind of operation.
    fn access(&self, path: &Path, mode: AccessMode) -> Result<bool, FsError>;

    /// Returns `true` if `path` exists (as a file or directory).
    ///
    /// Default implementation built on [`Backend::access`].
    fn exists(&self, path: &Path) -> Result<bool, FsError> {
        self.access(path, AccessMode::Exists)
    }

    /// Returns `true` if `path` exists and is a regular file.
    ///
    /// Default implementation built on [`Backend::stat`]; `NotFound`
    /// collapses to `Ok(false)` rather than propagating.
    fn is_file(&self, path: &Path) -> Result<bool, FsError> {
        match self.stat(path) {
            Ok(meta) => Ok(meta.is_file()),
            Err(FsError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Returns `true` if `path` exists and is a directory.
    ///
    /// Default implementation built on [`Backend::stat`]; `NotFound`
    /// collapses to `Ok(false)` rather than propagating.
    fn is_dir(&self, path: &Path) -> Result<bool, FsError> {
        match self.stat(path) {
            Ok(meta) => Ok(meta.is_dir()),
            Err(FsError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    // ---- reads ----------------------------------------------------------

    /// Open `path` for streaming reads.
    ///
    /// # Errors
    ///
    /// [`FsError::NotFound`] if absent; [`FsError::IsADirectory`] if `path`
    /// names a directory.
    fn open_read(&self, path: &Path) -> Result<Box<dyn Read + Send>, FsError>;

    /// Read the entire contents of `path`.
    ///
    /// # Errors
    ///
    /// Same as [`Backend::open_read`].
    fn read_all(&self, path: &Path) -> Result<Vec<u8>, FsError>;

    /// List the leaf names of `path`'s immediate children.
    ///
    /// Order is unspecified but stable within a single call.
    ///
    /// # Errors
    ///
    /// [`FsError::NotFound`] if `path` does not exist;
    /// [`FsError::NotADirectory`] if `path` is a file.
    fn listdir(&self, path: &Path) -> Result<Vec<String>, FsError>;

    // ---- writes -----------------------------------------------------------

    /// Open `path` for streaming writes in `mode`.
    ///
    /// Creates the file if it does not already exist (the parent directory
    /// must already exist).
    ///
    /// # Errors
    ///
    /// [`FsError::NotFound`] if the parent directory is missing;
    /// [`FsError::IsADirectory`] if `path` names a directory.
    fn open_write(&self, path: &Path, mode: WriteMode) -> Result<Box<dyn Write + Send>, FsError>;

    /// Create the directory at `path`.
    ///
    /// If `parents` is `true`, missing intermediate directories are created
    /// and the call succeeds idempotently if `path` already exists as a
    /// directory. If `parents` is `false`, the immediate parent must already
    /// exist.
    ///
    /// # Errors
    ///
    /// [`FsError::NotFound`] if `parents` is `false` and the parent is
    /// missing; [`FsError::AlreadyExists`] if `path` exists as a file, or as
    /// a directory with `parents == false`.
    fn mkdir(&self, path: &Path, parents: bool) -> Result<(), FsError>;

    /// Remove the file at `path`.
    ///
    /// # Errors
    ///
    /// [`FsError::NotFound`] if absent; [`FsError::IsADirectory`] if `path`
    /// is a directory.
    fn remove_file(&self, path: &Path) -> Result<(), FsError>;

    /// Remove the empty directory at `path`.
    ///
    /// # Errors
    ///
    /// [`FsError::NotFound`] if absent; [`FsError::NotADirectory`] if `path`
    /// is a file; [`FsError::NotEmpty`] if the directory has children.
    fn remove_dir(&self, path: &Path) -> Result<(), FsError>;

    /// Rename `src` to `dst` within this backend.
    ///
    /// # Errors
    ///
    /// [`FsError::NotFound`] if `src` does not exist.
    fn rename(&self, src: &Path, dst: &Path) -> Result<(), FsError>;
}
