//! # Facade
//!
//! The single entry point applications use. A thin wrapper around one
//! `Box<dyn Backend>` adding convenience operations that are naturally
//! expressed in terms of the primitive ones (`read_one_line`, `readlines`,
//! `writelines`, `copy`) without widening the `Backend` contract itself.

use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

use crate::{Backend, FsError, WriteMode};

/// Wraps a backend (typically a [`MountTable`](crate::MountTable) or
/// [`UnionBackend`](crate::UnionBackend) sitting at the top of a
/// composition) behind one path-addressed API.
pub struct Facade {
    backend: Box<dyn Backend>,
}

impl Facade {
    /// Wrap `backend` as the root of the virtual filesystem.
    pub fn new(backend: Box<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Borrow the underlying backend directly, for operations the facade
    /// does not wrap.
    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    /// Read the first line of `path`, without its trailing newline.
    ///
    /// # Errors
    ///
    /// Same as [`Backend::open_read`]. Returns an empty string if the file
    /// is empty.
    pub fn read_one_line(&self, path: &Path) -> Result<String, FsError> {
        let stream = self.backend.open_read(path)?;
        let mut reader = BufReader::new(stream);
        let mut line = String::new();
        reader
            .read_line(&mut line)
            .map_err(|e| crate::error::map_io_error(e, "read_one_line", path))?;
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Ok(line)
    }

    /// Read `path` as a sequence of lines, trailing newlines stripped.
    pub fn readlines(&self, path: &Path) -> Result<Vec<String>, FsError> {
        let stream = self.backend.open_read(path)?;
        let reader = BufReader::new(stream);
        let mut lines = Vec::new();
        for line in reader.lines() {
            let line = line.map_err(|e| crate::error::map_io_error(e, "readlines", path))?;
            lines.push(line);
        }
        Ok(lines)
    }

    /// Write `lines` to `path`, each terminated by `\n`, replacing any
    /// existing contents.
    pub fn writelines<S: AsRef<str>>(&self, path: &Path, lines: &[S]) -> Result<(), FsError> {
        let mut stream = self.backend.open_write(path, WriteMode::Truncate)?;
        for line in lines {
            stream
                .write_all(line.as_ref().as_bytes())
                .map_err(|e| crate::error::map_io_error(e, "writelines", path))?;
            stream
                .write_all(b"\n")
                .map_err(|e| crate::error::map_io_error(e, "writelines", path))?;
        }
        Ok(())
    }

    /// Stream-copy `src` to `dst`, truncating `dst` if it exists. `dst`'s
    /// parent directory must already exist.
    pub fn copy(&self, src: &Path, dst: &Path) -> Result<u64, FsError> {
        let mut source = self.backend.open_read(src)?;
        let mut target = self.backend.open_write(dst, WriteMode::Truncate)?;
        io::copy(&mut source, &mut target).map_err(|e| crate::error::map_io_error(e, "copy", dst))
    }
}

impl Backend for Facade {
    fn stat(&self, path: &Path) -> Result<crate::Metadata, FsError> {
        self.backend.stat(path)
    }
    fn access(&self, path: &Path, mode: crate::AccessMode) -> Result<bool, FsError> {
        self.backend.access(path, mode)
    }
    fn open_read(&self, path: &Path) -> Result<Box<dyn io::Read + Send>, FsError> {
        self.backend.open_read(path)
    }
    fn read_all(&self, path: &Path) -> Result<Vec<u8>, FsError> {
        self.backend.read_all(path)
    }
    fn listdir(&self, path: &Path) -> Result<Vec<String>, FsError> {
        self.backend.listdir(path)
    }
    fn open_write(&self, path: &Path, mode: WriteMode) -> Result<Box<dyn Write + Send>, FsError> {
        self.backend.open_write(path, mode)
    }
    fn mkdir(&self, path: &Path, parents: bool) -> Result<(), FsError> {
        self.backend.mkdir(path, parents)
    }
    fn remove_file(&self, path: &Path) -> Result<(), FsError> {
        self.backend.remove_file(path)
    }
    fn remove_dir(&self, path: &Path) -> Result<(), FsError> {
        self.backend.remove_dir(path)
    }
    fn rename(&self, src: &Path, dst: &Path) -> Result<(), FsError> {
        self.backend.rename(src, dst)
    }
}
