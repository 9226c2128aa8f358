//! # unifs
//!
//! A composable virtual filesystem facade unifying memory, OS, read-only
//! and overlay backends behind one path-addressed API.
//!
//! ---
//!
//! ## Quick Start
//!
//! Most programs only need a [`Facade`] wrapping one [`Backend`]:
//!
//! ```rust
//! use unifs::{Facade, MemoryBackend, WriteMode};
//! use std::path::Path;
//!
//! let facade = Facade::new(Box::new(MemoryBackend::new()));
//! facade.writelines(Path::new("/greeting.txt"), &["hello", "world"]).unwrap();
//! assert_eq!(facade.readlines(Path::new("/greeting.txt")).unwrap(), vec!["hello", "world"]);
//! ```
//!
//! ---
//!
//! ## Core Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`Backend`] | The capability set every filesystem implementation provides |
//! | [`MemoryBackend`] | In-process tree of bytes |
//! | [`OsBackend`] | Adapter over a physical OS directory |
//! | [`ReadOnlyWrapper`] | Decorator rejecting every mutation |
//! | [`UnionBackend`] | Rank-ordered overlay of several backends |
//! | [`MountTable`] | Longest-prefix dispatch across mounted backends |
//! | [`Facade`] | The application-facing entry point |
//! | [`FsError`] | The error taxonomy shared by every backend |
//!
//! ---
//!
//! ## Composing Backends
//!
//! Backends nest through ordinary composition, not inheritance. A writable
//! scratch space laid over a read-only view of the real filesystem:
//!
//! ```rust
//! use unifs::{Backend, LayerExt, MemoryBackend, OsBackend, ReadOnlyLayer, UnionBackend};
//! use std::path::Path;
//!
//! let union = UnionBackend::new();
//! union.add_branch(Box::new(MemoryBackend::new()), 10, true);
//! union.add_branch(Box::new(OsBackend::new("/etc").layer(ReadOnlyLayer)), 0, false);
//! assert!(union.exists(Path::new("/")).unwrap());
//! ```
//!
//! [`Layer`] generalizes single-backend decorators; [`UnionBackend`] and
//! [`MountTable`] instead hold heterogeneous `Box<dyn Backend>` collections
//! assembled at runtime.
//!
//! ---
//!
//! ## Error Handling
//!
//! All operations return `Result<T, FsError>`. Errors carry the path (and,
//! where relevant, the operation name) that failed:
//!
//! ```rust
//! use unifs::FsError;
//! use std::path::PathBuf;
//!
//! let err = FsError::NotFound { path: PathBuf::from("/missing.txt") };
//! assert_eq!(err.to_string(), "not found: /missing.txt");
//! ```
//!
//! ---
//!
//! ## Thread Safety
//!
//! [`Backend`] requires `Send + Sync`. Methods take `&self`; implementations
//! use interior mutability (`RwLock`) internally, so a backend can be shared
//! across threads behind an `Arc` without explicit external locking.
//!
//! ---
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `serde` | Enable serialization for [`Metadata`], [`FileType`], [`AccessMode`], [`WriteMode`] |
//! | `tracing` | Emit structured logs from [`UnionBackend`] and [`MountTable`] |

// Private modules
mod backend;
mod error;
mod facade;
mod layer;
mod memory;
mod mount;
mod os_backend;
pub mod path;
mod readonly;
mod types;
mod union;

// Public re-exports - error types
pub use error::FsError;

// Public re-exports - core types
pub use types::{AccessMode, FileType, Metadata, WriteMode};

// Public re-exports - the backend contract
pub use backend::Backend;

// Public re-exports - concrete backends
pub use memory::MemoryBackend;
pub use os_backend::OsBackend;

// Public re-exports - composition
pub use layer::{Layer, LayerExt};
pub use mount::MountTable;
pub use readonly::{ReadOnlyLayer, ReadOnlyWrapper};
pub use union::UnionBackend;

// Public re-exports - application entry point
pub use facade::Facade;
