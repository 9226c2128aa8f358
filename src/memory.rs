//! # MemoryBackend
//!
//! An in-process tree of bytes, the reference implementation of [`Backend`].
//!
//! Grounded in the same `RwLock<HashMap<PathBuf, _>>` shape the pack uses
//! for its in-memory filesystem examples: one map keyed by normalized
//! absolute path, entries are either a file (bytes + mtime) or a directory
//! (an insertion-ordered list of child names). The root `/` is seeded at
//! construction and can never be removed.

use std::collections::HashMap;
use std::io::{self, Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::time::SystemTime;

use crate::{AccessMode, Backend, FileType, FsError, Metadata, WriteMode};

enum Node {
    File { data: Vec<u8>, modified: SystemTime },
    Directory { children: Vec<String> },
}

/// In-memory filesystem backend; the reference [`Backend`] implementation.
///
/// All operations are synchronous and never block on I/O (there is none).
/// Internally guarded by a single [`RwLock`], so concurrent readers do not
/// block each other but every writer takes an exclusive lock for the
/// duration of its mutation.
pub struct MemoryBackend {
    nodes: RwLock<HashMap<PathBuf, Node>>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    /// Create an empty backend containing only the root directory.
    pub fn new() -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(
            PathBuf::from("/"),
            Node::Directory {
                children: Vec::new(),
            },
        );
        Self {
            nodes: RwLock::new(nodes),
        }
    }

    fn norm(path: &Path) -> Result<PathBuf, FsError> {
        crate::path::normalize(path)
    }

    fn add_child(children: &mut Vec<String>, name: &str) {
        if !children.iter().any(|c| c == name) {
            children.push(name.to_string());
        }
    }

    fn remove_child(children: &mut Vec<String>, name: &str) {
        children.retain(|c| c != name);
    }
}

impl Backend for MemoryBackend {
    fn stat(&self, path: &Path) -> Result<Metadata, FsError> {
        let path = Self::norm(path)?;
        let nodes = self.nodes.read().unwrap();
        match nodes.get(&path) {
            Some(Node::File { data, modified }) => Ok(Metadata {
                file_type: FileType::File,
                size: data.len() as u64,
                modified: *modified,
            }),
            Some(Node::Directory { .. }) => Ok(Metadata {
                file_type: FileType::Directory,
                size: 0,
                modified: SystemTime::UNIX_EPOCH,
            }),
            None => Err(FsError::NotFound { path }),
        }
    }

    fn access(&self, path: &Path, mode: AccessMode) -> Result<bool, FsError> {
        let path = match Self::norm(path) {
            Ok(p) => p,
            Err(_) => return Ok(false),
        };
        let nodes = self.nodes.read().unwrap();
        let exists = nodes.contains_key(&path);
        match mode {
            AccessMode::Exists => Ok(exists),
            AccessMode::Read => Ok(exists),
            AccessMode::Write => {
                if exists {
                    return Ok(matches!(nodes.get(&path), Some(Node::File { .. })));
                }
                let (parent, _) = crate::path::split(&path);
                Ok(matches!(nodes.get(&parent), Some(Node::Directory { .. })))
            }
        }
    }

    fn open_read(&self, path: &Path) -> Result<Box<dyn Read + Send>, FsError> {
        Ok(Box::new(Cursor::new(self.read_all(path)?)))
    }

    fn read_all(&self, path: &Path) -> Result<Vec<u8>, FsError> {
        let path = Self::norm(path)?;
        let nodes = self.nodes.read().unwrap();
        match nodes.get(&path) {
            Some(Node::File { data, .. }) => Ok(data.clone()),
            Some(Node::Directory { .. }) => Err(FsError::IsADirectory { path }),
            None => Err(FsError::NotFound { path }),
        }
    }

    fn listdir(&self, path: &Path) -> Result<Vec<String>, FsError> {
        let path = Self::norm(path)?;
        let nodes = self.nodes.read().unwrap();
        match nodes.get(&path) {
            Some(Node::Directory { children }) => Ok(children.clone()),
            Some(Node::File { .. }) => Err(FsError::NotADirectory { path }),
            None => Err(FsError::NotFound { path }),
        }
    }

    fn open_write(&self, path: &Path, mode: WriteMode) -> Result<Box<dyn Write + Send>, FsError> {
        let path = Self::norm(path)?;
        let (parent, leaf) = crate::path::split(&path);
        if leaf.is_empty() {
            return Err(FsError::IsADirectory { path });
        }

        let mut nodes = self.nodes.write().unwrap();
        match nodes.get(&parent) {
            Some(Node::Directory { .. }) => {}
            Some(Node::File { .. }) => return Err(FsError::NotADirectory { path: parent }),
            None => return Err(FsError::NotFound { path: parent }),
        }
        if matches!(nodes.get(&path), Some(Node::Directory { .. })) {
            return Err(FsError::IsADirectory { path });
        }

        let initial = match (mode, nodes.get(&path)) {
            (WriteMode::Append, Some(Node::File { data, .. })) => data.clone(),
            _ => Vec::new(),
        };
        nodes.insert(
            path.clone(),
            Node::File {
                data: initial.clone(),
                modified: SystemTime::now(),
            },
        );
        if let Some(Node::Directory { children }) = nodes.get_mut(&parent) {
            Self::add_child(children, &leaf);
        }
        drop(nodes);

        Ok(Box::new(MemoryWriteStream {
            backend_nodes: &self.nodes,
            path,
            buffer: initial,
        }))
    }

    fn mkdir(&self, path: &Path, parents: bool) -> Result<(), FsError> {
        let path = Self::norm(path)?;
        if path == Path::new("/") {
            return Ok(());
        }

        if !parents {
            let (parent, leaf) = crate::path::split(&path);
            let mut nodes = self.nodes.write().unwrap();
            match nodes.get(&parent) {
                Some(Node::Directory { .. }) => {}
                Some(Node::File { .. }) => return Err(FsError::NotADirectory { path: parent }),
                None => return Err(FsError::NotFound { path: parent }),
            }
            match nodes.get(&path) {
                Some(Node::Directory { .. }) => return Err(FsError::AlreadyExists { path }),
                Some(Node::File { .. }) => return Err(FsError::AlreadyExists { path }),
                None => {}
            }
            nodes.insert(
                path.clone(),
                Node::Directory {
                    children: Vec::new(),
                },
            );
            if let Some(Node::Directory { children }) = nodes.get_mut(&parent) {
                Self::add_child(children, &leaf);
            }
            return Ok(());
        }

        let mut nodes = self.nodes.write().unwrap();
        if let Some(Node::File { .. }) = nodes.get(&path) {
            return Err(FsError::AlreadyExists { path });
        }
        let mut current = PathBuf::from("/");
        for component in path.components().skip(1) {
            let name = component.as_os_str().to_string_lossy().into_owned();
            let next = current.join(&name);
            match nodes.get(&next) {
                Some(Node::File { .. }) => return Err(FsError::NotADirectory { path: next }),
                Some(Node::Directory { .. }) => {}
                None => {
                    nodes.insert(
                        next.clone(),
                        Node::Directory {
                            children: Vec::new(),
                        },
                    );
                    if let Some(Node::Directory { children }) = nodes.get_mut(&current) {
                        Self::add_child(children, &name);
                    }
                }
            }
            current = next;
        }
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> Result<(), FsError> {
        let path = Self::norm(path)?;
        let mut nodes = self.nodes.write().unwrap();
        match nodes.get(&path) {
            Some(Node::File { .. }) => {}
            Some(Node::Directory { .. }) => return Err(FsError::IsADirectory { path }),
            None => return Err(FsError::NotFound { path }),
        }
        nodes.remove(&path);
        let (parent, leaf) = crate::path::split(&path);
        if let Some(Node::Directory { children }) = nodes.get_mut(&parent) {
            Self::remove_child(children, &leaf);
        }
        Ok(())
    }

    fn remove_dir(&self, path: &Path) -> Result<(), FsError> {
        let path = Self::norm(path)?;
        if path == Path::new("/") {
            return Err(FsError::PermissionDenied {
                path,
                operation: "remove_dir",
            });
        }
        let mut nodes = self.nodes.write().unwrap();
        match nodes.get(&path) {
            Some(Node::Directory { children }) if !children.is_empty() => {
                return Err(FsError::NotEmpty { path });
            }
            Some(Node::Directory { .. }) => {}
            Some(Node::File { .. }) => return Err(FsError::NotADirectory { path }),
            None => return Err(FsError::NotFound { path }),
        }
        nodes.remove(&path);
        let (parent, leaf) = crate::path::split(&path);
        if let Some(Node::Directory { children }) = nodes.get_mut(&parent) {
            Self::remove_child(children, &leaf);
        }
        Ok(())
    }

    fn rename(&self, src: &Path, dst: &Path) -> Result<(), FsError> {
        let src = Self::norm(src)?;
        let dst = Self::norm(dst)?;
        let mut nodes = self.nodes.write().unwrap();
        if !nodes.contains_key(&src) {
            return Err(FsError::NotFound { path: src });
        }
        if nodes.contains_key(&dst) {
            return Err(FsError::AlreadyExists { path: dst });
        }
        let (dst_parent, dst_leaf) = crate::path::split(&dst);
        match nodes.get(&dst_parent) {
            Some(Node::Directory { .. }) => {}
            Some(Node::File { .. }) => return Err(FsError::NotADirectory { path: dst_parent }),
            None => return Err(FsError::NotFound { path: dst_parent }),
        }

        let node = nodes.remove(&src).unwrap();
        let (src_parent, src_leaf) = crate::path::split(&src);
        if let Some(Node::Directory { children }) = nodes.get_mut(&src_parent) {
            Self::remove_child(children, &src_leaf);
        }
        nodes.insert(dst.clone(), node);
        if let Some(Node::Directory { children }) = nodes.get_mut(&dst_parent) {
            Self::add_child(children, &dst_leaf);
        }
        Ok(())
    }
}

/// Write handle returned by [`MemoryBackend::open_write`].
///
/// Buffers writes and commits the final contents back into the backend's
/// map on [`Drop`], so a caller that forgets to flush still leaves the
/// backend in the post-write state rather than losing data silently.
struct MemoryWriteStream<'a> {
    backend_nodes: &'a RwLock<HashMap<PathBuf, Node>>,
    path: PathBuf,
    buffer: Vec<u8>,
}

impl Write for MemoryWriteStream<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        self.commit();
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.commit();
        Ok(())
    }
}

impl MemoryWriteStream<'_> {
    fn commit(&mut self) {
        let mut nodes = self.backend_nodes.write().unwrap();
        nodes.insert(
            self.path.clone(),
            Node::File {
                data: self.buffer.clone(),
                modified: SystemTime::now(),
            },
        );
    }
}

impl Drop for MemoryWriteStream<'_> {
    fn drop(&mut self) {
        self.commit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_all(backend: &MemoryBackend, path: &str, data: &[u8], mode: WriteMode) {
        let mut w = backend.open_write(Path::new(path), mode).unwrap();
        w.write_all(data).unwrap();
        w.flush().unwrap();
        drop(w);
    }

    #[test]
    fn write_then_read_roundtrips() {
        let backend = MemoryBackend::new();
        write_all(&backend, "/hello.txt", b"hi there", WriteMode::Truncate);
        assert_eq!(backend.read_all(Path::new("/hello.txt")).unwrap(), b"hi there");
    }

    #[test]
    fn open_write_fails_without_parent() {
        let backend = MemoryBackend::new();
        let result = backend.open_write(Path::new("/missing/file.txt"), WriteMode::Truncate);
        assert!(matches!(result, Err(FsError::NotFound { .. })));
    }

    #[test]
    fn append_preserves_existing_content() {
        let backend = MemoryBackend::new();
        write_all(&backend, "/log.txt", b"one", WriteMode::Truncate);
        write_all(&backend, "/log.txt", b"two", WriteMode::Append);
        assert_eq!(backend.read_all(Path::new("/log.txt")).unwrap(), b"onetwo");
    }

    #[test]
    fn truncate_replaces_existing_content() {
        let backend = MemoryBackend::new();
        write_all(&backend, "/log.txt", b"one", WriteMode::Truncate);
        write_all(&backend, "/log.txt", b"two", WriteMode::Truncate);
        assert_eq!(backend.read_all(Path::new("/log.txt")).unwrap(), b"two");
    }

    #[test]
    fn mkdir_parents_false_requires_existing_parent() {
        let backend = MemoryBackend::new();
        assert!(matches!(
            backend.mkdir(Path::new("/a/b"), false),
            Err(FsError::NotFound { .. })
        ));
        backend.mkdir(Path::new("/a"), false).unwrap();
        backend.mkdir(Path::new("/a/b"), false).unwrap();
        assert!(backend.is_dir(Path::new("/a/b")).unwrap());
    }

    #[test]
    fn mkdir_parents_true_is_idempotent_on_existing_dir() {
        let backend = MemoryBackend::new();
        backend.mkdir(Path::new("/a/b/c"), true).unwrap();
        backend.mkdir(Path::new("/a/b/c"), true).unwrap();
        assert!(backend.is_dir(Path::new("/a/b/c")).unwrap());
    }

    #[test]
    fn mkdir_fails_already_exists_as_file() {
        let backend = MemoryBackend::new();
        write_all(&backend, "/x", b"data", WriteMode::Truncate);
        assert!(matches!(
            backend.mkdir(Path::new("/x"), true),
            Err(FsError::AlreadyExists { .. })
        ));
    }

    #[test]
    fn descending_into_file_is_not_a_directory() {
        let backend = MemoryBackend::new();
        write_all(&backend, "/file", b"x", WriteMode::Truncate);
        assert!(matches!(
            backend.listdir(Path::new("/file")),
            Err(FsError::NotADirectory { .. })
        ));
        assert!(matches!(
            backend.mkdir(Path::new("/file/sub"), true),
            Err(FsError::NotADirectory { .. })
        ));
    }

    #[test]
    fn listdir_is_insertion_ordered_and_stable() {
        let backend = MemoryBackend::new();
        backend.mkdir(Path::new("/d"), true).unwrap();
        write_all(&backend, "/d/b", b"", WriteMode::Truncate);
        write_all(&backend, "/d/a", b"", WriteMode::Truncate);
        assert_eq!(
            backend.listdir(Path::new("/d")).unwrap(),
            vec!["b".to_string(), "a".to_string()]
        );
    }

    #[test]
    fn remove_file_then_not_found() {
        let backend = MemoryBackend::new();
        write_all(&backend, "/x", b"data", WriteMode::Truncate);
        backend.remove_file(Path::new("/x")).unwrap();
        assert!(matches!(
            backend.read_all(Path::new("/x")),
            Err(FsError::NotFound { .. })
        ));
    }

    #[test]
    fn remove_dir_requires_empty() {
        let backend = MemoryBackend::new();
        backend.mkdir(Path::new("/d"), true).unwrap();
        write_all(&backend, "/d/x", b"", WriteMode::Truncate);
        assert!(matches!(
            backend.remove_dir(Path::new("/d")),
            Err(FsError::NotEmpty { .. })
        ));
        backend.remove_file(Path::new("/d/x")).unwrap();
        backend.remove_dir(Path::new("/d")).unwrap();
        assert!(matches!(
            backend.stat(Path::new("/d")),
            Err(FsError::NotFound { .. })
        ));
    }

    #[test]
    fn rename_moves_file_and_updates_parent_listings() {
        let backend = MemoryBackend::new();
        backend.mkdir(Path::new("/a"), true).unwrap();
        backend.mkdir(Path::new("/b"), true).unwrap();
        write_all(&backend, "/a/x", b"data", WriteMode::Truncate);
        backend.rename(Path::new("/a/x"), Path::new("/b/y")).unwrap();
        assert!(matches!(
            backend.read_all(Path::new("/a/x")),
            Err(FsError::NotFound { .. })
        ));
        assert_eq!(backend.read_all(Path::new("/b/y")).unwrap(), b"data");
        assert_eq!(backend.listdir(Path::new("/a")).unwrap(), Vec::<String>::new());
        assert_eq!(backend.listdir(Path::new("/b")).unwrap(), vec!["y".to_string()]);
    }

    #[test]
    fn invariant_read_after_write_roundtrips() {
        let backend = MemoryBackend::new();
        write_all(&backend, "/inv", b"payload", WriteMode::Truncate);
        assert_eq!(backend.read_all(Path::new("/inv")).unwrap(), b"payload");
        assert_eq!(backend.read_all(Path::new("/inv")).unwrap(), b"payload");
    }
}
