//! # MountTable
//!
//! Dispatches paths to backends mounted at specific prefixes, longest
//! matching prefix wins — the same model a Unix mount namespace uses, built
//! here over the pack's heterogeneous `Box<dyn Backend>` collection pattern
//! rather than kernel mount points.
//!
//! A path that falls strictly between two mount points (e.g. `/mnt` is
//! mounted but nothing is mounted at `/`) still needs to answer `listdir`
//! and `is_dir` for the intermediate component — callers should be able to
//! `listdir("/mnt")` and see the mount's own top-level entries, and
//! `is_dir("/")` should be `true` even if `/` was never itself mounted,
//! whenever at least one mount exists below it.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::{path, AccessMode, Backend, FileType, FsError, Metadata, WriteMode};

/// A table of backends mounted at absolute path prefixes.
///
/// Dispatch walks a path's ancestors from most to least specific and uses
/// the first one with a mounted backend; the path handed to that backend is
/// relative to the mount point, re-rooted at `/`.
pub struct MountTable {
    mounts: RwLock<HashMap<PathBuf, Box<dyn Backend>>>,
}

impl MountTable {
    /// Create an empty mount table. Typically followed by at least one
    /// `mount_fs(Path::new("/"), ...)` call, since most operations on
    /// unmounted paths fail with [`FsError::NotFound`].
    pub fn new() -> Self {
        Self {
            mounts: RwLock::new(HashMap::new()),
        }
    }

    /// Mount `backend` at `mount_path`.
    ///
    /// # Errors
    ///
    /// [`FsError::AlreadyExists`] if something is already mounted at that
    /// exact path. [`FsError::InvalidPath`] if `mount_path` does not
    /// normalize cleanly.
    pub fn mount_fs(&self, mount_path: &Path, backend: Box<dyn Backend>) -> Result<(), FsError> {
        let normalized = path::normalize(mount_path)?;
        let mut mounts = self.mounts.write().expect("mount table lock poisoned");
        if mounts.contains_key(&normalized) {
            return Err(FsError::AlreadyExists {
                path: normalized,
            });
        }
        mounts.insert(normalized.clone(), backend);
        #[cfg(feature = "tracing")]
        tracing::debug!(mount = %normalized.display(), "mounted backend");
        Ok(())
    }

    /// Remove whatever is mounted exactly at `mount_path`.
    ///
    /// # Errors
    ///
    /// [`FsError::NotFound`] if nothing is mounted there.
    pub fn unmount(&self, mount_path: &Path) -> Result<(), FsError> {
        let normalized = path::normalize(mount_path)?;
        let mut mounts = self.mounts.write().expect("mount table lock poisoned");
        mounts
            .remove(&normalized)
            .map(|_| ())
            .ok_or(FsError::NotFound { path: normalized })
    }

    /// Resolve `logical` to `(mount_point, backend_relative_path)` for the
    /// longest mounted prefix, if any.
    fn resolve<'a>(
        mounts: &'a HashMap<PathBuf, Box<dyn Backend>>,
        logical: &Path,
    ) -> Option<(&'a PathBuf, &'a Box<dyn Backend>, PathBuf)> {
        let mut candidate = logical.to_path_buf();
        loop {
            if let Some((mount_point, backend)) = mounts.get_key_value(&candidate) {
                let rel = path::relative_to(logical, mount_point).unwrap_or_default();
                let backend_path = PathBuf::from("/").join(rel);
                return Some((mount_point, backend, backend_path));
            }
            if candidate == Path::new("/") {
                return None;
            }
            candidate = candidate.parent().unwrap_or(Path::new("/")).to_path_buf();
            if candidate.as_os_str().is_empty() {
                candidate = PathBuf::from("/");
            }
        }
    }

    /// `true` if `logical` is a mount point itself, or an ancestor of one —
    /// the synthetic intermediate-directory case.
    fn is_synthetic_intermediate(mounts: &HashMap<PathBuf, Box<dyn Backend>>, logical: &Path) -> bool {
        mounts.keys().any(|mount| path::is_prefix(logical, mount))
    }

    /// The mounted child name directly beneath `logical`, for every mount
    /// point strictly below it — used to populate synthetic directory
    /// listings at intermediate, unmounted components.
    fn synthetic_children(mounts: &HashMap<PathBuf, Box<dyn Backend>>, logical: &Path) -> Vec<String> {
        let mut names = std::collections::BTreeSet::new();
        for mount in mounts.keys() {
            if mount == logical {
                continue;
            }
            if let Ok(rel) = path::relative_to(mount, logical) {
                if let Some(first) = rel.components().next() {
                    names.insert(first.as_os_str().to_string_lossy().into_owned());
                }
            }
        }
        names.into_iter().collect()
    }
}

impl Default for MountTable {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for MountTable {
    fn stat(&self, path: &Path) -> Result<Metadata, FsError> {
        let logical = path::normalize(path)?;
        let mounts = self.mounts.read().expect("mount table lock poisoned");
        if let Some((_, backend, rel)) = Self::resolve(&mounts, &logical) {
            return backend.stat(&rel);
        }
        if Self::is_synthetic_intermediate(&mounts, &logical) {
            return Ok(Metadata {
                file_type: FileType::Directory,
                size: 0,
                modified: std::time::SystemTime::UNIX_EPOCH,
            });
        }
        Err(FsError::NotFound { path: logical })
    }

    fn access(&self, path: &Path, mode: AccessMode) -> Result<bool, FsError> {
        match mode {
            AccessMode::Exists => Ok(self.stat(path).is_ok()),
            AccessMode::Read => Ok(self.stat(path).is_ok()),
            AccessMode::Write => {
                let logical = path::normalize(path)?;
                let mounts = self.mounts.read().expect("mount table lock poisoned");
                match Self::resolve(&mounts, &logical) {
                    Some((_, backend, rel)) => backend.access(&rel, AccessMode::Write),
                    None => Ok(false),
                }
            }
        }
    }

    fn open_read(&self, path: &Path) -> Result<Box<dyn Read + Send>, FsError> {
        let logical = path::normalize(path)?;
        let mounts = self.mounts.read().expect("mount table lock poisoned");
        match Self::resolve(&mounts, &logical) {
            Some((_, backend, rel)) => backend.open_read(&rel),
            None => Err(FsError::NotFound { path: logical }),
        }
    }

    fn read_all(&self, path: &Path) -> Result<Vec<u8>, FsError> {
        let logical = path::normalize(path)?;
        let mounts = self.mounts.read().expect("mount table lock poisoned");
        match Self::resolve(&mounts, &logical) {
            Some((_, backend, rel)) => backend.read_all(&rel),
            None => Err(FsError::NotFound { path: logical }),
        }
    }

    fn listdir(&self, path: &Path) -> Result<Vec<String>, FsError> {
        let logical = path::normalize(path)?;
        let mounts = self.mounts.read().expect("mount table lock poisoned");
        let synthetic = Self::is_synthetic_intermediate(&mounts, &logical);
        if let Some((_, backend, rel)) = Self::resolve(&mounts, &logical) {
            let mut names = match backend.listdir(&rel) {
                Ok(names) => names,
                Err(FsError::NotFound { .. }) if synthetic => Vec::new(),
                Err(e) => return Err(e),
            };
            if synthetic {
                for extra in Self::synthetic_children(&mounts, &logical) {
                    if !names.contains(&extra) {
                        names.push(extra);
                    }
                }
            }
            return Ok(names);
        }
        if synthetic {
            return Ok(Self::synthetic_children(&mounts, &logical));
        }
        Err(FsError::NotFound { path: logical })
    }

    fn open_write(&self, path: &Path, mode: WriteMode) -> Result<Box<dyn Write + Send>, FsError> {
        let logical = path::normalize(path)?;
        let mounts = self.mounts.read().expect("mount table lock poisoned");
        match Self::resolve(&mounts, &logical) {
            Some((_, backend, rel)) => backend.open_write(&rel, mode),
            None => Err(FsError::NotFound { path: logical }),
        }
    }

    fn mkdir(&self, path: &Path, parents: bool) -> Result<(), FsError> {
        let logical = path::normalize(path)?;
        let mounts = self.mounts.read().expect("mount table lock poisoned");
        match Self::resolve(&mounts, &logical) {
            Some((_, backend, rel)) => backend.mkdir(&rel, parents),
            None => Err(FsError::NotFound { path: logical }),
        }
    }

    fn remove_file(&self, path: &Path) -> Result<(), FsError> {
        let logical = path::normalize(path)?;
        let mounts = self.mounts.read().expect("mount table lock poisoned");
        match Self::resolve(&mounts, &logical) {
            Some((_, backend, rel)) => backend.remove_file(&rel),
            None => Err(FsError::NotFound { path: logical }),
        }
    }

    fn remove_dir(&self, path: &Path) -> Result<(), FsError> {
        let logical = path::normalize(path)?;
        let mounts = self.mounts.read().expect("mount table lock poisoned");
        match Self::resolve(&mounts, &logical) {
            Some((mount_point, backend, rel)) => {
                if mount_point == &logical && !Self::synthetic_children(&mounts, &logical).is_empty() {
                    return Err(FsError::NotEmpty { path: logical });
                }
                backend.remove_dir(&rel)
            }
            None => Err(FsError::NotFound { path: logical }),
        }
    }

    fn rename(&self, src: &Path, dst: &Path) -> Result<(), FsError> {
        let src_logical = path::normalize(src)?;
        let dst_logical = path::normalize(dst)?;
        let mounts = self.mounts.read().expect("mount table lock poisoned");
        match (
            Self::resolve(&mounts, &src_logical),
            Self::resolve(&mounts, &dst_logical),
        ) {
            (Some((src_mount, backend, src_rel)), Some((dst_mount, _, dst_rel))) if src_mount == dst_mount => {
                backend.rename(&src_rel, &dst_rel)
            }
            (Some(_), Some(_)) => Err(FsError::CrossBackend { operation: "rename" }),
            _ => Err(FsError::NotFound { path: src_logical }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryBackend;
    use std::io::Write as _;

    fn write_file(backend: &MemoryBackend, path: &str, contents: &[u8]) {
        let mut w = backend.open_write(Path::new(path), WriteMode::Truncate).unwrap();
        w.write_all(contents).unwrap();
    }

    #[test]
    fn longest_prefix_wins() {
        let table = MountTable::new();
        table.mount_fs(Path::new("/"), Box::new(MemoryBackend::new())).unwrap();
        let nested = MemoryBackend::new();
        write_file(&nested, "/file.txt", b"nested");
        table.mount_fs(Path::new("/mnt/data"), Box::new(nested)).unwrap();

        assert_eq!(table.read_all(Path::new("/mnt/data/file.txt")).unwrap(), b"nested");
    }

    #[test]
    fn duplicate_mount_is_rejected() {
        let table = MountTable::new();
        table.mount_fs(Path::new("/mnt"), Box::new(MemoryBackend::new())).unwrap();
        let result = table.mount_fs(Path::new("/mnt"), Box::new(MemoryBackend::new()));
        assert!(matches!(result, Err(FsError::AlreadyExists { .. })));
    }

    #[test]
    fn intermediate_unmounted_component_is_a_synthetic_directory() {
        let table = MountTable::new();
        table.mount_fs(Path::new("/mnt/data"), Box::new(MemoryBackend::new())).unwrap();

        assert!(table.is_dir(Path::new("/mnt")).unwrap());
        assert_eq!(table.listdir(Path::new("/mnt")).unwrap(), vec!["data".to_string()]);
    }

    #[test]
    fn intermediate_component_synthesizes_even_when_root_is_mounted() {
        let table = MountTable::new();
        table.mount_fs(Path::new("/"), Box::new(MemoryBackend::new())).unwrap();
        table
            .mount_fs(Path::new("/a/b/c"), Box::new(MemoryBackend::new()))
            .unwrap();

        assert_eq!(table.listdir(Path::new("/a")).unwrap(), vec!["b".to_string()]);
    }

    #[test]
    fn rename_across_mounts_is_cross_backend() {
        let table = MountTable::new();
        table.mount_fs(Path::new("/a"), Box::new(MemoryBackend::new())).unwrap();
        table.mount_fs(Path::new("/b"), Box::new(MemoryBackend::new())).unwrap();

        let result = table.rename(Path::new("/a/x"), Path::new("/b/y"));
        assert!(matches!(result, Err(FsError::CrossBackend { .. })));
    }

    #[test]
    fn unmount_then_not_found() {
        let table = MountTable::new();
        table.mount_fs(Path::new("/mnt"), Box::new(MemoryBackend::new())).unwrap();
        table.unmount(Path::new("/mnt")).unwrap();
        assert!(matches!(
            table.stat(Path::new("/mnt")),
            Err(FsError::NotFound { .. })
        ));
    }

    #[test]
    fn mount_at_root_serves_top_level_paths() {
        let table = MountTable::new();
        let root = MemoryBackend::new();
        write_file(&root, "/hello.txt", b"hi");
        table.mount_fs(Path::new("/"), Box::new(root)).unwrap();

        assert_eq!(table.read_all(Path::new("/hello.txt")).unwrap(), b"hi");
    }
}
