//! # UnionBackend
//!
//! Overlays several backends into one, in the style of a Unix union mount:
//! reads see through to the lowest-numbered ranked branch that has the
//! path (rank 0 is the topmost, most specific layer), writes land on the
//! lowest-numbered *writable* branch, and directory listings merge every
//! branch's view of a path into one deduplicated set of names.
//!
//! Branches are heterogeneous (`Box<dyn Backend>`), following the pack's
//! `MultiBackend { backends: Vec<Box<dyn Fs>> }` shape rather than a
//! compile-time [`Layer`](crate::Layer) chain — a union's membership is a
//! runtime configuration, not a type.

use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::{AccessMode, Backend, FileType, FsError, Metadata, WriteMode};

/// One layer of a [`UnionBackend`].
struct Branch {
    backend: Box<dyn Backend>,
    /// Lower rank wins on read lookups and is preferred for writes — rank 0
    /// is the topmost layer, the way `0` is the nearest overlay in a stack.
    rank: i64,
    writable: bool,
    /// Tiebreaker for branches added with equal rank: earlier insertion wins.
    insertion_index: u64,
}

/// Overlays multiple backends, lowest rank first.
///
/// Directory shadowing follows the same rule as single-backend lookups: if
/// the topmost branch that contains `path` has it as a file, that file
/// shadows any directory of the same name in a lower branch — the union
/// never merges a file and a directory under one name.
pub struct UnionBackend {
    branches: RwLock<Vec<Branch>>,
    next_index: std::sync::atomic::AtomicU64,
}

impl UnionBackend {
    /// Create an empty union. Add branches with [`UnionBackend::add_branch`].
    pub fn new() -> Self {
        Self {
            branches: RwLock::new(Vec::new()),
            next_index: std::sync::atomic::AtomicU64::new(0),
        }
    }

    /// Add `backend` as a branch with the given `rank` and writability.
    ///
    /// Lower `rank` is preferred on read and is tried first for writes.
    /// Branches of equal rank are ordered by insertion: the first one added
    /// wins ties.
    pub fn add_branch(&self, backend: Box<dyn Backend>, rank: i64, writable: bool) {
        let index = self.next_index.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        let mut branches = self.branches.write().expect("union lock poisoned");
        branches.push(Branch {
            backend,
            rank,
            writable,
            insertion_index: index,
        });
        branches.sort_by(|a, b| a.rank.cmp(&b.rank).then(a.insertion_index.cmp(&b.insertion_index)));
    }

    /// Find the topmost branch that has `path`, in either form.
    fn first_branch_with<'a>(
        branches: &'a [Branch],
        path: &Path,
    ) -> Option<(&'a Branch, Metadata)> {
        branches
            .iter()
            .find_map(|b| b.backend.stat(path).ok().map(|m| (b, m)))
    }

    /// Find the topmost writable branch, creating `path`'s parent in
    /// it if necessary so a write can proceed.
    fn writable_branch<'a>(branches: &'a [Branch]) -> Option<&'a Branch> {
        branches.iter().find(|b| b.writable)
    }
}

impl Default for UnionBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for UnionBackend {
    fn stat(&self, path: &Path) -> Result<Metadata, FsError> {
        let branches = self.branches.read().expect("union lock poisoned");
        if let Some((_, meta)) = Self::first_branch_with(&branches, path) {
            return Ok(meta);
        }
        if Self::union_is_directory(&branches, path)? {
            return Ok(Metadata {
                file_type: FileType::Directory,
                size: 0,
                modified: std::time::SystemTime::UNIX_EPOCH,
            });
        }
        Err(FsError::NotFound {
            path: path.to_path_buf(),
        })
    }

    fn access(&self, path: &Path, mode: AccessMode) -> Result<bool, FsError> {
        match mode {
            AccessMode::Exists => Ok(self.stat(path).is_ok()),
            AccessMode::Read => Ok(self.stat(path).is_ok()),
            AccessMode::Write => {
                let branches = self.branches.read().expect("union lock poisoned");
                Ok(Self::writable_branch(&branches).is_some())
            }
        }
    }

    fn open_read(&self, path: &Path) -> Result<Box<dyn std::io::Read + Send>, FsError> {
        let branches = self.branches.read().expect("union lock poisoned");
        match Self::first_branch_with(&branches, path) {
            Some((_, meta)) if meta.is_dir() => Err(FsError::IsADirectory {
                path: path.to_path_buf(),
            }),
            Some((branch, _)) => branch.backend.open_read(path),
            None => Err(FsError::NotFound {
                path: path.to_path_buf(),
            }),
        }
    }

    fn read_all(&self, path: &Path) -> Result<Vec<u8>, FsError> {
        let mut stream = self.open_read(path)?;
        let mut buf = Vec::new();
        std::io::Read::read_to_end(&mut stream, &mut buf)
            .map_err(|e| crate::error::map_io_error(e, "read_all", path))?;
        Ok(buf)
    }

    fn listdir(&self, path: &Path) -> Result<Vec<String>, FsError> {
        let branches = self.branches.read().expect("union lock poisoned");

        // A name can be a directory in one branch and a file in another;
        // §4.6 only raises `NotADirectory` when *every* branch containing
        // `path` holds it as a file. As long as at least one branch has it
        // as a directory, the listing proceeds over the directory branches.
        if !Self::union_is_directory(&branches, path)? {
            let any_file = branches
                .iter()
                .any(|b| matches!(b.backend.stat(path), Ok(m) if m.is_file()));
            return Err(if any_file {
                FsError::NotADirectory {
                    path: path.to_path_buf(),
                }
            } else {
                FsError::NotFound {
                    path: path.to_path_buf(),
                }
            });
        }

        let mut seen = std::collections::BTreeSet::new();
        let mut names = Vec::new();
        for branch in branches.iter() {
            if let Ok(entries) = branch.backend.listdir(path) {
                for name in entries {
                    if seen.insert(name.clone()) {
                        names.push(name);
                    }
                }
            }
        }
        Ok(names)
    }

    fn open_write(&self, path: &Path, mode: WriteMode) -> Result<Box<dyn std::io::Write + Send>, FsError> {
        let branches = self.branches.read().expect("union lock poisoned");
        let branch = Self::writable_branch(&branches).ok_or(FsError::ReadOnly {
            operation: "open_write",
        })?;
        let (parent, _) = crate::path::split(path);
        if !branch.backend.is_dir(&parent)? {
            branch.backend.mkdir(&parent, true)?;
        }
        branch.backend.open_write(path, mode)
    }

    fn mkdir(&self, path: &Path, parents: bool) -> Result<(), FsError> {
        if self.is_dir(path)? {
            if parents {
                return Ok(());
            }
            return Err(FsError::AlreadyExists {
                path: path.to_path_buf(),
            });
        }
        let branches = self.branches.read().expect("union lock poisoned");
        let branch = Self::writable_branch(&branches).ok_or(FsError::ReadOnly { operation: "mkdir" })?;
        branch.backend.mkdir(path, parents)
    }

    fn remove_file(&self, path: &Path) -> Result<(), FsError> {
        let branches = self.branches.read().expect("union lock poisoned");
        let mut containing: Vec<&Branch> = branches
            .iter()
            .filter(|b| matches!(b.backend.stat(path), Ok(m) if m.is_file()))
            .collect();
        if containing.is_empty() {
            return Err(FsError::NotFound {
                path: path.to_path_buf(),
            });
        }
        if containing.iter().any(|b| !b.writable) {
            return Err(FsError::ReadOnly {
                operation: "remove_file",
            });
        }
        containing.sort_by_key(|b| b.rank);
        let mut failure = None;
        for branch in containing {
            if let Err(e) = branch.backend.remove_file(path) {
                #[cfg(feature = "tracing")]
                tracing::warn!(path = %path.display(), error = %e, "union remove_file: branch removal failed, overlay left inconsistent");
                failure.get_or_insert(e);
            }
        }
        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn remove_dir(&self, path: &Path) -> Result<(), FsError> {
        let branches = self.branches.read().expect("union lock poisoned");
        if !Self::union_is_directory(&branches, path)? {
            return Err(FsError::NotFound {
                path: path.to_path_buf(),
            });
        }
        if !self.listdir(path)?.is_empty() {
            return Err(FsError::NotEmpty {
                path: path.to_path_buf(),
            });
        }
        let containing: Vec<&Branch> = branches
            .iter()
            .filter(|b| matches!(b.backend.stat(path), Ok(m) if m.is_dir()))
            .collect();
        if containing.iter().any(|b| !b.writable) {
            return Err(FsError::ReadOnly {
                operation: "remove_dir",
            });
        }
        for branch in containing {
            branch.backend.remove_dir(path)?;
        }
        Ok(())
    }

    fn rename(&self, src: &Path, dst: &Path) -> Result<(), FsError> {
        let branches = self.branches.read().expect("union lock poisoned");
        let branch = branches
            .iter()
            .find(|b| b.writable && b.backend.stat(src).is_ok())
            .ok_or(FsError::CrossBackend { operation: "rename" })?;
        branch.backend.rename(src, dst)
    }
}

impl UnionBackend {
    /// Returns `true` if any branch implies `path` is a directory by virtue
    /// of containing a child of it, even if no branch has `path` itself.
    fn union_is_directory(branches: &[Branch], path: &Path) -> Result<bool, FsError> {
        if path == Path::new("/") {
            return Ok(true);
        }
        for branch in branches {
            if matches!(branch.backend.stat(path), Ok(m) if m.is_dir()) {
                return Ok(true);
            }
        }
        Ok(false)
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
    fn topmost_branch_shadows_lower_on_read() {
        let lower = MemoryBackend::new();
        write_file(&lower, "/etc/hostname", b"lower\n");
        let upper = MemoryBackend::new();
        write_file(&upper, "/etc/hostname", b"upper\n");

        let union = UnionBackend::new();
        union.add_branch(Box::new(upper), 0, true);
        union.add_branch(Box::new(lower), 1, true);

        assert_eq!(union.read_all(Path::new("/etc/hostname")).unwrap(), b"upper\n");
    }

    #[test]
    fn write_lands_on_topmost_writable_branch() {
        let upper = MemoryBackend::new();
        let lower = MemoryBackend::new();

        let union = UnionBackend::new();
        union.add_branch(Box::new(upper), 0, true);
        union.add_branch(Box::new(lower), 1, true);

        let mut w = union.open_write(Path::new("/new.txt"), WriteMode::Truncate).unwrap();
        w.write_all(b"hi").unwrap();
        drop(w);

        assert_eq!(union.read_all(Path::new("/new.txt")).unwrap(), b"hi");
    }

    #[test]
    fn open_write_creates_missing_parents_in_writable_branch() {
        let upper = MemoryBackend::new();
        let lower = MemoryBackend::new();
        write_file(&lower, "/d/y", b"y");

        let union = UnionBackend::new();
        union.add_branch(Box::new(upper), 0, true);
        union.add_branch(Box::new(lower), 1, false);

        let mut w = union.open_write(Path::new("/d/x"), WriteMode::Truncate).unwrap();
        w.write_all(b"x").unwrap();
        drop(w);

        assert_eq!(union.read_all(Path::new("/d/x")).unwrap(), b"x");
        let mut names = union.listdir(Path::new("/d")).unwrap();
        names.sort();
        assert_eq!(names, vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn read_only_branch_is_skipped_for_writes() {
        let readonly_branch = MemoryBackend::new();

        let union = UnionBackend::new();
        union.add_branch(Box::new(readonly_branch), 1, false);

        let result = union.open_write(Path::new("/x"), WriteMode::Truncate);
        assert!(matches!(result, Err(FsError::ReadOnly { .. })));
    }

    #[test]
    fn listdir_merges_branches() {
        let upper = MemoryBackend::new();
        write_file(&upper, "/a", b"a");
        let lower = MemoryBackend::new();
        write_file(&lower, "/b", b"b");

        let union = UnionBackend::new();
        union.add_branch(Box::new(upper), 0, true);
        union.add_branch(Box::new(lower), 1, true);

        let mut names = union.listdir(Path::new("/")).unwrap();
        names.sort();
        assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn listdir_falls_through_to_a_lower_branch_directory_when_upper_has_a_file() {
        let upper = MemoryBackend::new();
        write_file(&upper, "/d", b"upper has d as a file");
        let lower = MemoryBackend::new();
        lower.mkdir(Path::new("/d"), true).unwrap();
        write_file(&lower, "/d/x", b"x");

        let union = UnionBackend::new();
        union.add_branch(Box::new(upper), 0, true);
        union.add_branch(Box::new(lower), 1, false);

        assert_eq!(union.listdir(Path::new("/d")).unwrap(), vec!["x".to_string()]);
    }

    #[test]
    fn listdir_is_not_a_directory_only_when_every_containing_branch_has_a_file() {
        let upper = MemoryBackend::new();
        write_file(&upper, "/d", b"upper has d as a file");
        let lower = MemoryBackend::new();
        write_file(&lower, "/d", b"lower has d as a file too");

        let union = UnionBackend::new();
        union.add_branch(Box::new(upper), 0, true);
        union.add_branch(Box::new(lower), 1, false);

        assert!(matches!(
            union.listdir(Path::new("/d")),
            Err(FsError::NotADirectory { .. })
        ));
    }

    #[test]
    fn listdir_deduplicates_names_present_in_both_branches() {
        let upper = MemoryBackend::new();
        write_file(&upper, "/shared", b"upper");
        let lower = MemoryBackend::new();
        write_file(&lower, "/shared", b"lower");

        let union = UnionBackend::new();
        union.add_branch(Box::new(upper), 0, true);
        union.add_branch(Box::new(lower), 1, true);

        assert_eq!(union.listdir(Path::new("/")).unwrap(), vec!["shared".to_string()]);
    }

    #[test]
    fn rename_across_branches_is_cross_backend() {
        let lower = MemoryBackend::new();
        write_file(&lower, "/only-in-lower", b"x");
        let upper = MemoryBackend::new();

        let union = UnionBackend::new();
        union.add_branch(Box::new(lower), 1, false);
        union.add_branch(Box::new(upper), 0, true);

        let result = union.rename(Path::new("/only-in-lower"), Path::new("/renamed"));
        assert!(matches!(result, Err(FsError::CrossBackend { .. })));
    }

    #[test]
    fn remove_file_refuses_when_any_containing_branch_is_read_only() {
        let upper = MemoryBackend::new();
        write_file(&upper, "/x", b"x");
        let lower = MemoryBackend::new();
        write_file(&lower, "/x", b"x");

        let union = UnionBackend::new();
        union.add_branch(Box::new(upper), 0, true);
        union.add_branch(Box::new(lower), 1, false);

        let result = union.remove_file(Path::new("/x"));
        assert!(matches!(result, Err(FsError::ReadOnly { .. })));
        assert!(union.exists(Path::new("/x")).unwrap());
    }

    /// A writable backend whose `remove_file` always fails, used to simulate
    /// a branch that rejects removal after an earlier branch already
    /// succeeded.
    struct StubbornBackend(MemoryBackend);

    impl Backend for StubbornBackend {
        fn stat(&self, path: &Path) -> Result<Metadata, FsError> {
            self.0.stat(path)
        }
        fn access(&self, path: &Path, mode: AccessMode) -> Result<bool, FsError> {
            self.0.access(path, mode)
        }
        fn open_read(&self, path: &Path) -> Result<Box<dyn std::io::Read + Send>, FsError> {
            self.0.open_read(path)
        }
        fn read_all(&self, path: &Path) -> Result<Vec<u8>, FsError> {
            self.0.read_all(path)
        }
        fn listdir(&self, path: &Path) -> Result<Vec<String>, FsError> {
            self.0.listdir(path)
        }
        fn open_write(&self, path: &Path, mode: WriteMode) -> Result<Box<dyn std::io::Write + Send>, FsError> {
            self.0.open_write(path, mode)
        }
        fn mkdir(&self, path: &Path, parents: bool) -> Result<(), FsError> {
            self.0.mkdir(path, parents)
        }
        fn remove_file(&self, path: &Path) -> Result<(), FsError> {
            Err(FsError::PermissionDenied {
                path: path.to_path_buf(),
                operation: "remove_file",
            })
        }
        fn remove_dir(&self, path: &Path) -> Result<(), FsError> {
            self.0.remove_dir(path)
        }
        fn rename(&self, src: &Path, dst: &Path) -> Result<(), FsError> {
            self.0.rename(src, dst)
        }
    }

    #[test]
    fn remove_file_surfaces_later_branch_failure_after_partial_removal() {
        let upper = MemoryBackend::new();
        write_file(&upper, "/x", b"x");
        let lower = StubbornBackend(MemoryBackend::new());
        write_file(&lower.0, "/x", b"x");

        let union = UnionBackend::new();
        union.add_branch(Box::new(upper), 0, true);
        union.add_branch(Box::new(lower), 1, true);

        let result = union.remove_file(Path::new("/x"));
        assert!(matches!(result, Err(FsError::PermissionDenied { .. })));
        // Rank 0's removal went through despite the overall failure being
        // reported (the documented non-atomic case); a read now falls
        // through to the rank-1 branch, which still has its copy.
        assert_eq!(union.read_all(Path::new("/x")).unwrap(), b"x");
    }
}
