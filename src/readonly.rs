//! # ReadOnlyWrapper
//!
//! A [`Backend`] decorator that transparently forwards reads and rejects
//! every mutation before it reaches the inner backend.
//!
//! Built as a [`Layer`], following the pack's middleware-decorator shape
//! (a `*Layer` configuration type plus a generic wrapper struct) — but with
//! one correction: the teacher's own read-only example answers rejected
//! mutations with `PermissionDenied`, while this crate's taxonomy reserves
//! a dedicated [`FsError::ReadOnly`] kind for exactly this case.

use std::io::{Read, Write};
use std::path::Path;

use crate::{AccessMode, Backend, FsError, Layer, Metadata, WriteMode};

/// Wraps any [`Backend`] so every mutating operation fails with
/// [`FsError::ReadOnly`] before the inner backend is touched.
pub struct ReadOnlyWrapper<B> {
    inner: B,
}

impl<B: Backend> ReadOnlyWrapper<B> {
    /// Wrap `inner` in a read-only guard.
    pub fn new(inner: B) -> Self {
        Self { inner }
    }

    /// Borrow the wrapped backend.
    pub fn inner(&self) -> &B {
        &self.inner
    }
}

impl<B: Backend> Backend for ReadOnlyWrapper<B> {
    fn stat(&self, path: &Path) -> Result<Metadata, FsError> {
        self.inner.stat(path)
    }

    fn access(&self, path: &Path, mode: AccessMode) -> Result<bool, FsError> {
        match mode {
            AccessMode::Write => Ok(false),
            other => self.inner.access(path, other),
        }
    }

    fn open_read(&self, path: &Path) -> Result<Box<dyn Read + Send>, FsError> {
        self.inner.open_read(path)
    }

    fn read_all(&self, path: &Path) -> Result<Vec<u8>, FsError> {
        self.inner.read_all(path)
    }

    fn listdir(&self, path: &Path) -> Result<Vec<String>, FsError> {
        self.inner.listdir(path)
    }

    fn open_write(&self, _path: &Path, _mode: WriteMode) -> Result<Box<dyn Write + Send>, FsError> {
        Err(FsError::ReadOnly {
            operation: "open_write",
        })
    }

    fn mkdir(&self, _path: &Path, _parents: bool) -> Result<(), FsError> {
        Err(FsError::ReadOnly { operation: "mkdir" })
    }

    fn remove_file(&self, _path: &Path) -> Result<(), FsError> {
        Err(FsError::ReadOnly {
            operation: "remove_file",
        })
    }

    fn remove_dir(&self, _path: &Path) -> Result<(), FsError> {
        Err(FsError::ReadOnly {
            operation: "remove_dir",
        })
    }

    fn rename(&self, _src: &Path, _dst: &Path) -> Result<(), FsError> {
        Err(FsError::ReadOnly { operation: "rename" })
    }
}

/// [`Layer`] that produces a [`ReadOnlyWrapper`].
///
/// ```
/// use unifs::{LayerExt, MemoryBackend, ReadOnlyLayer};
///
/// let backend = MemoryBackend::new().layer(ReadOnlyLayer);
/// ```
pub struct ReadOnlyLayer;

impl<B: Backend> Layer<B> for ReadOnlyLayer {
    type Backend = ReadOnlyWrapper<B>;

    fn layer(self, backend: B) -> Self::Backend {
        ReadOnlyWrapper::new(backend)
    }
}
