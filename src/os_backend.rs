//! # OsBackend
//!
//! Adapter over OS filesystem primitives for a physical root directory.
//!
//! Every logical path handed to an `OsBackend` is normalized, checked for
//! containment within the backend's root, then joined onto that root and
//! delegated to `std::fs`. Symlink handling, if the underlying filesystem
//! has any, is entirely the OS's business — `std::fs`'s default (symlink
//! following) metadata calls are used throughout, and no symlink-specific
//! behavior is exposed through the `Backend` contract.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use crate::error::map_io_error;
use crate::{AccessMode, Backend, FileType, FsError, Metadata, WriteMode};

/// A `Backend` rooted at a physical OS directory.
pub struct OsBackend {
    root: PathBuf,
}

impl OsBackend {
    /// Create a backend rooted at `root`.
    ///
    /// `root` itself is not required to exist yet; the first operation that
    /// needs it to exist will surface [`FsError::NotFound`].
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Translate a logical path into the real OS path, refusing escapes.
    ///
    /// Unlike [`crate::path::normalize`] (which clamps `..` at the logical
    /// root, since a bare absolute path has nowhere above `/` to go), this
    /// walks components while tracking how many `..` were consumed past an
    /// empty stack — a normalized path that would need to climb above the
    /// backend's own root is exactly the escape §4.4 requires this method
    /// to detect and reject, lexically, without ever touching the real
    /// filesystem.
    ///
    /// # Errors
    ///
    /// [`FsError::InvalidPath`] if `logical` is empty, non-absolute,
    /// contains a NUL byte, or lexically escapes the backend root.
    fn real_path(&self, logical: &Path) -> Result<PathBuf, FsError> {
        use std::path::Component;

        if logical.as_os_str().is_empty() {
            return Err(FsError::InvalidPath {
                path: logical.to_path_buf(),
                reason: "path is empty".to_string(),
            });
        }
        if crate::path::contains_nul(logical) {
            return Err(FsError::InvalidPath {
                path: logical.to_path_buf(),
                reason: "path contains a NUL byte".to_string(),
            });
        }
        if !logical.is_absolute() {
            return Err(FsError::InvalidPath {
                path: logical.to_path_buf(),
                reason: "path is not absolute".to_string(),
            });
        }

        let mut stack: Vec<&std::ffi::OsStr> = Vec::new();
        let mut escaped = false;
        for component in logical.components() {
            match component {
                Component::RootDir | Component::Prefix(_) | Component::CurDir => {}
                Component::ParentDir => {
                    if stack.pop().is_none() {
                        escaped = true;
                    }
                }
                Component::Normal(name) => stack.push(name),
            }
        }
        if escaped {
            return Err(FsError::InvalidPath {
                path: logical.to_path_buf(),
                reason: "path escapes the backend root".to_string(),
            });
        }

        let mut real = self.root.clone();
        for segment in stack {
            real.push(segment);
        }
        Ok(real)
    }
}

impl Backend for OsBackend {
    fn stat(&self, path: &Path) -> Result<Metadata, FsError> {
        let real = self.real_path(path)?;
        let meta = fs::metadata(&real).map_err(|e| map_io_error(e, "stat", path))?;
        Ok(Metadata {
            file_type: if meta.is_dir() {
                FileType::Directory
            } else {
                FileType::File
            },
            size: if meta.is_dir() { 0 } else { meta.len() },
            modified: meta.modified().unwrap_or(std::time::SystemTime::UNIX_EPOCH),
        })
    }

    fn access(&self, path: &Path, mode: AccessMode) -> Result<bool, FsError> {
        let real = match self.real_path(path) {
            Ok(r) => r,
            Err(_) => return Ok(false),
        };
        match fs::metadata(&real) {
            Ok(meta) => match mode {
                AccessMode::Exists => Ok(true),
                AccessMode::Read => Ok(true),
                AccessMode::Write => Ok(!meta.permissions().readonly()),
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => match mode {
                AccessMode::Exists | AccessMode::Read => Ok(false),
                AccessMode::Write => {
                    let parent = real.parent().unwrap_or(&real);
                    Ok(fs::metadata(parent).map(|m| m.is_dir()).unwrap_or(false))
                }
            },
            Err(_) => Ok(false),
        }
    }

    fn open_read(&self, path: &Path) -> Result<Box<dyn Read + Send>, FsError> {
        let real = self.real_path(path)?;
        let meta = fs::metadata(&real).map_err(|e| map_io_error(e, "open_read", path))?;
        if meta.is_dir() {
            return Err(FsError::IsADirectory {
                path: path.to_path_buf(),
            });
        }
        let file = fs::File::open(&real).map_err(|e| map_io_error(e, "open_read", path))?;
        Ok(Box::new(file))
    }

    fn read_all(&self, path: &Path) -> Result<Vec<u8>, FsError> {
        let mut stream = self.open_read(path)?;
        let mut buf = Vec::new();
        stream
            .read_to_end(&mut buf)
            .map_err(|e| map_io_error(e, "read_all", path))?;
        Ok(buf)
    }

    fn listdir(&self, path: &Path) -> Result<Vec<String>, FsError> {
        let real = self.real_path(path)?;
        let meta = fs::metadata(&real).map_err(|e| map_io_error(e, "listdir", path))?;
        if !meta.is_dir() {
            return Err(FsError::NotADirectory {
                path: path.to_path_buf(),
            });
        }
        let entries = fs::read_dir(&real).map_err(|e| map_io_error(e, "listdir", path))?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| map_io_error(e, "listdir", path))?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        Ok(names)
    }

    fn open_write(&self, path: &Path, mode: WriteMode) -> Result<Box<dyn Write + Send>, FsError> {
        let real = self.real_path(path)?;
        if let Ok(meta) = fs::metadata(&real) {
            if meta.is_dir() {
                return Err(FsError::IsADirectory {
                    path: path.to_path_buf(),
                });
            }
        }
        let mut options = fs::OpenOptions::new();
        options.write(true).create(true);
        match mode {
            WriteMode::Truncate => {
                options.truncate(true);
            }
            WriteMode::Append => {
                options.append(true);
            }
        }
        let file = options
            .open(&real)
            .map_err(|e| map_io_error(e, "open_write", path))?;
        Ok(Box::new(file))
    }

    fn mkdir(&self, path: &Path, parents: bool) -> Result<(), FsError> {
        let real = self.real_path(path)?;
        if parents {
            if let Ok(meta) = fs::metadata(&real) {
                if meta.is_file() {
                    return Err(FsError::AlreadyExists {
                        path: path.to_path_buf(),
                    });
                }
                return Ok(());
            }
            fs::create_dir_all(&real).map_err(|e| map_io_error(e, "mkdir", path))
        } else {
            fs::create_dir(&real).map_err(|e| map_io_error(e, "mkdir", path))
        }
    }

    fn remove_file(&self, path: &Path) -> Result<(), FsError> {
        let real = self.real_path(path)?;
        fs::remove_file(&real).map_err(|e| map_io_error(e, "remove_file", path))
    }

    fn remove_dir(&self, path: &Path) -> Result<(), FsError> {
        let real = self.real_path(path)?;
        fs::remove_dir(&real).map_err(|e| map_io_error(e, "remove_dir", path))
    }

    fn rename(&self, src: &Path, dst: &Path) -> Result<(), FsError> {
        let real_src = self.real_path(src)?;
        let real_dst = self.real_path(dst)?;
        fs::rename(&real_src, &real_dst).map_err(|e| map_io_error(e, "rename", src))
    }
}
