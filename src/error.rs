//! # Error Types
//!
//! The error taxonomy every [`Backend`](crate::Backend) implementation and
//! the [`Facade`](crate::Facade) return.
//!
//! ## Overview
//!
//! A single [`FsError`] enum covers every failure mode in the crate. Backend
//! implementors map their own failures onto it; wrappers (`ReadOnlyWrapper`,
//! `UnionBackend`, `MountTable`) mostly pass it through unchanged, per the
//! propagation rules each module documents.

use std::io;
use std::path::{Path, PathBuf};

/// The error type returned by every fallible operation in this crate.
///
/// `#[non_exhaustive]` so new failure modes can be added without breaking
/// downstream `match` arms.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum FsError {
    /// `path` does not exist.
    #[error("not found: {path}", path = .path.display())]
    NotFound {
        /// The path that was looked up.
        path: PathBuf,
    },

    /// `path` exists but is not a directory where one was required.
    #[error("not a directory: {path}", path = .path.display())]
    NotADirectory {
        /// The offending path.
        path: PathBuf,
    },

    /// `path` exists but is a directory where a file was required.
    #[error("is a directory: {path}", path = .path.display())]
    IsADirectory {
        /// The offending path.
        path: PathBuf,
    },

    /// `path` already exists where the operation required it to be absent.
    #[error("already exists: {path}", path = .path.display())]
    AlreadyExists {
        /// The offending path.
        path: PathBuf,
    },

    /// `path` is a non-empty directory where an empty one was required.
    #[error("not empty: {path}", path = .path.display())]
    NotEmpty {
        /// The offending path.
        path: PathBuf,
    },

    /// The backend is read-only; `operation` was refused before touching
    /// any inner state.
    #[error("read-only filesystem: {operation}")]
    ReadOnly {
        /// Name of the rejected operation, e.g. `"open_write"`.
        operation: &'static str,
    },

    /// The underlying system denied `operation` on `path`.
    #[error("permission denied: {operation} on {path}", path = .path.display())]
    PermissionDenied {
        /// The offending path.
        path: PathBuf,
        /// Name of the denied operation.
        operation: &'static str,
    },

    /// `path` is not a well-formed logical path, or (for `OsBackend`)
    /// normalizes to something outside the backend's root.
    #[error("invalid path: {path} ({reason})", path = .path.display())]
    InvalidPath {
        /// The offending path.
        path: PathBuf,
        /// Human-readable reason.
        reason: String,
    },

    /// `path::relative_to` was asked for a path that is not a descendant of
    /// the given base.
    #[error("{path} is not under {base}", path = .path.display(), base = .base.display())]
    NotUnderBase {
        /// The path that was not under `base`.
        path: PathBuf,
        /// The base it was checked against.
        base: PathBuf,
    },

    /// The operation spans two backends that cannot cooperate (a rename
    /// across union branches, or across mount points).
    #[error("cross-backend operation not supported: {operation}")]
    CrossBackend {
        /// Name of the attempted operation.
        operation: &'static str,
    },

    /// An I/O error from the underlying operating system, with no more
    /// specific taxonomy entry.
    #[error("io error during {operation} on {path}: {source}", path = .path.display())]
    Io {
        /// Name of the operation being performed.
        operation: &'static str,
        /// The path involved, if any.
        path: PathBuf,
        /// The underlying OS error.
        #[source]
        source: io::Error,
    },
}

impl From<io::Error> for FsError {
    /// Generic conversion for call sites with no path/operation context.
    ///
    /// [`OsBackend`](crate::OsBackend) prefers [`map_io_error`], which adds
    /// that context and classifies more OS conditions; this impl exists for
    /// ergonomic `?` use where no better information is available.
    fn from(source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::NotFound => FsError::NotFound {
                path: PathBuf::new(),
            },
            io::ErrorKind::PermissionDenied => FsError::PermissionDenied {
                path: PathBuf::new(),
                operation: "io",
            },
            io::ErrorKind::AlreadyExists => FsError::AlreadyExists {
                path: PathBuf::new(),
            },
            _ => FsError::Io {
                operation: "io",
                path: PathBuf::new(),
                source,
            },
        }
    }
}

/// Classify an [`io::Error`] from `operation` on `path` into the taxonomy.
///
/// Uses [`io::ErrorKind`] for the conditions the standard library classifies
/// on every platform (`NotFound`, `PermissionDenied`, `AlreadyExists`), and
/// falls back to the raw OS error number on Unix for the remaining
/// conditions §6's mapping table requires (`NotADirectory`, `IsADirectory`,
/// `NotEmpty`, `ReadOnly`) — the standard library's `ErrorKind` does not yet
/// universally expose these across platforms, so this is the same
/// errno-fallback pattern systems code reaches for rather than adding a
/// `libc` dependency for four constants.
pub fn map_io_error(source: io::Error, operation: &'static str, path: &Path) -> FsError {
    let path = path.to_path_buf();
    match source.kind() {
        io::ErrorKind::NotFound => return FsError::NotFound { path },
        io::ErrorKind::PermissionDenied => {
            return FsError::PermissionDenied { path, operation };
        }
        io::ErrorKind::AlreadyExists => return FsError::AlreadyExists { path },
        _ => {}
    }

    #[cfg(unix)]
    {
        const ENOTDIR: i32 = 20;
        const EISDIR: i32 = 21;
        const ENOTEMPTY: i32 = 39;
        const EROFS: i32 = 30;

        match source.raw_os_error() {
            Some(ENOTDIR) => return FsError::NotADirectory { path },
            Some(EISDIR) => return FsError::IsADirectory { path },
            Some(ENOTEMPTY) => return FsError::NotEmpty { path },
            Some(EROFS) => return FsError::ReadOnly { operation },
            _ => {}
        }
    }

    FsError::Io {
        operation,
        path,
        source,
    }
}
