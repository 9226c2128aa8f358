//! # path
//!
//! Pure, lexical path operations. No I/O, no backend, no symlink awareness —
//! those concerns belong to individual backends (see [`crate::OsBackend`]).
//!
//! Every path handled by this module is treated as a sequence of non-empty,
//! `/`-separated components rooted at `/`. Embedded NUL bytes are rejected.

use crate::FsError;
use std::path::{Component, Path, PathBuf};

/// Normalize `p` into a canonical absolute path.
///
/// Collapses `.` components, resolves `..` lexically (never by touching a
/// filesystem), and collapses repeated separators. The result always starts
/// with `/`.
///
/// # Errors
///
/// [`FsError::InvalidPath`] if `p` is empty, not absolute, or contains a NUL
/// byte.
pub fn normalize(p: &Path) -> Result<PathBuf, FsError> {
    let raw = p.as_os_str();
    if raw.is_empty() {
        return Err(FsError::InvalidPath {
            path: p.to_path_buf(),
            reason: "path is empty".to_string(),
        });
    }
    if contains_nul(p) {
        return Err(FsError::InvalidPath {
            path: p.to_path_buf(),
            reason: "path contains a NUL byte".to_string(),
        });
    }
    if !p.is_absolute() {
        return Err(FsError::InvalidPath {
            path: p.to_path_buf(),
            reason: "path is not absolute".to_string(),
        });
    }

    let mut out = PathBuf::from("/");
    for component in p.components() {
        match component {
            Component::RootDir | Component::Prefix(_) | Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
                if out.as_os_str().is_empty() {
                    out.push("/");
                }
            }
            Component::Normal(name) => out.push(name),
        }
    }
    if out.as_os_str().is_empty() {
        out = PathBuf::from("/");
    }
    Ok(out)
}

/// Split `p` into `(parent, leaf)`.
///
/// For `/` itself, returns `(PathBuf::from("/"), String::new())`. `p` is
/// assumed already normalized; call [`normalize`] first if unsure.
pub fn split(p: &Path) -> (PathBuf, String) {
    if p == Path::new("/") {
        return (PathBuf::from("/"), String::new());
    }
    let leaf = p
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let parent = p.parent().unwrap_or(Path::new("/"));
    let parent = if parent.as_os_str().is_empty() {
        PathBuf::from("/")
    } else {
        parent.to_path_buf()
    };
    (parent, leaf)
}

/// Join `a` and `b`, then normalize the result.
///
/// If `b` is absolute, it replaces `a` entirely (matching the usual
/// `Path::join` semantics); otherwise `b`'s components are appended to `a`.
///
/// # Errors
///
/// [`FsError::InvalidPath`] under the same conditions as [`normalize`].
pub fn join(a: &Path, b: &Path) -> Result<PathBuf, FsError> {
    let combined = if b.is_absolute() {
        b.to_path_buf()
    } else {
        a.join(b)
    };
    normalize(&combined)
}

/// Return the components of `p` beneath `base`.
///
/// Matching is on component boundaries: `/a/bb` is not considered under
/// `/a/b`. If `p == base`, returns an empty path.
///
/// # Errors
///
/// [`FsError::NotUnderBase`] if `p` is not `base` itself or a descendant of
/// it.
pub fn relative_to(p: &Path, base: &Path) -> Result<PathBuf, FsError> {
    if !is_prefix(base, p) {
        return Err(FsError::NotUnderBase {
            path: p.to_path_buf(),
            base: base.to_path_buf(),
        });
    }
    match p.strip_prefix(base) {
        Ok(rel) => Ok(rel.to_path_buf()),
        Err(_) => Ok(PathBuf::new()),
    }
}

/// Returns `true` if `prefix` is a component-boundary-aligned prefix of `p`
/// (or equal to it).
///
/// `is_prefix("/a/b", "/a/bb")` is `false`; `is_prefix("/a/b", "/a/b/c")` and
/// `is_prefix("/a/b", "/a/b")` are both `true`.
pub fn is_prefix(prefix: &Path, p: &Path) -> bool {
    if prefix == Path::new("/") {
        return p.is_absolute();
    }
    let mut prefix_components = prefix.components();
    let mut p_components = p.components();
    loop {
        match prefix_components.next() {
            None => return true,
            Some(pc) => match p_components.next() {
                None => return false,
                Some(qc) if qc == pc => continue,
                Some(_) => return false,
            },
        }
    }
}

#[cfg(unix)]
pub(crate) fn contains_nul(p: &Path) -> bool {
    use std::os::unix::ffi::OsStrExt;
    p.as_os_str().as_bytes().contains(&0)
}

#[cfg(not(unix))]
pub(crate) fn contains_nul(p: &Path) -> bool {
    p.to_string_lossy().contains('\0')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_dot_and_dotdot() {
        assert_eq!(
            normalize(Path::new("/a/./b/../c")).unwrap(),
            PathBuf::from("/a/c")
        );
    }

    #[test]
    fn normalize_root() {
        assert_eq!(normalize(Path::new("/")).unwrap(), PathBuf::from("/"));
    }

    #[test]
    fn normalize_rejects_empty() {
        assert!(matches!(
            normalize(Path::new("")),
            Err(FsError::InvalidPath { .. })
        ));
    }

    #[test]
    fn normalize_rejects_relative() {
        assert!(matches!(
            normalize(Path::new("a/b")),
            Err(FsError::InvalidPath { .. })
        ));
    }

    #[test]
    fn normalize_dotdot_above_root_stays_at_root() {
        assert_eq!(
            normalize(Path::new("/../etc/passwd")).unwrap(),
            PathBuf::from("/etc/passwd")
        );
    }

    #[test]
    fn normalize_is_idempotent() {
        let p = Path::new("/a/./b/../../c/d");
        let once = normalize(p).unwrap();
        let twice = normalize(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn split_root() {
        let (parent, leaf) = split(Path::new("/"));
        assert_eq!(parent, PathBuf::from("/"));
        assert_eq!(leaf, "");
    }

    #[test]
    fn split_file_under_root() {
        let (parent, leaf) = split(Path::new("/a.txt"));
        assert_eq!(parent, PathBuf::from("/"));
        assert_eq!(leaf, "a.txt");
    }

    #[test]
    fn split_nested() {
        let (parent, leaf) = split(Path::new("/a/b/c"));
        assert_eq!(parent, PathBuf::from("/a/b"));
        assert_eq!(leaf, "c");
    }

    #[test]
    fn join_relative_appends() {
        assert_eq!(
            join(Path::new("/a/b"), Path::new("c")).unwrap(),
            PathBuf::from("/a/b/c")
        );
    }

    #[test]
    fn join_absolute_replaces() {
        assert_eq!(
            join(Path::new("/a/b"), Path::new("/x/y")).unwrap(),
            PathBuf::from("/x/y")
        );
    }

    #[test]
    fn relative_to_strips_base() {
        assert_eq!(
            relative_to(Path::new("/a/b/c"), Path::new("/a")).unwrap(),
            PathBuf::from("b/c")
        );
    }

    #[test]
    fn relative_to_equal_paths_is_empty() {
        assert_eq!(
            relative_to(Path::new("/a/b"), Path::new("/a/b")).unwrap(),
            PathBuf::new()
        );
    }

    #[test]
    fn relative_to_not_under_base_fails() {
        assert!(matches!(
            relative_to(Path::new("/x/y"), Path::new("/a")),
            Err(FsError::NotUnderBase { .. })
        ));
    }

    #[test]
    fn is_prefix_respects_component_boundaries() {
        assert!(!is_prefix(Path::new("/a/b"), Path::new("/a/bb")));
        assert!(is_prefix(Path::new("/a/b"), Path::new("/a/b/c")));
        assert!(is_prefix(Path::new("/a/b"), Path::new("/a/b")));
    }

    #[test]
    fn is_prefix_root_matches_everything_absolute() {
        assert!(is_prefix(Path::new("/"), Path::new("/anything/at/all")));
    }
}
