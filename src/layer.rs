//! # Layer Trait
//!
//! Tower-style middleware composition for [`Backend`] implementations.
//!
//! ## How It Works
//!
//! ```text
//! Backend ──▶ Layer::layer() ──▶ Wrapped Backend
//! ```
//!
//! [`ReadOnlyWrapper`](crate::ReadOnlyWrapper) is built this way: a
//! `ReadOnlyLayer` wraps any `Backend` in a decorator that rejects
//! mutations. The pattern generalizes to any future single-backend
//! decorator (caching, rate limiting) without touching `UnionBackend` or
//! `MountTable`, which instead hold heterogeneous `Box<dyn Backend>`
//! collections and so compose at runtime rather than via `Layer`.

use crate::Backend;

/// A layer that wraps a backend to add functionality.
///
/// # Type Parameters
///
/// - `B`: the backend type being wrapped (must implement [`Backend`]).
pub trait Layer<B> {
    /// The resulting backend type after applying this layer.
    type Backend;

    /// Wrap `backend` with this layer's functionality.
    fn layer(self, backend: B) -> Self::Backend;
}

/// Extension trait providing `.layer()` on any [`Backend`] for fluent
/// composition.
pub trait LayerExt: Backend + Sized {
    /// Apply `layer` to this backend.
    fn layer<L: Layer<Self>>(self, layer: L) -> L::Backend {
        layer.layer(self)
    }
}

impl<B: Backend> LayerExt for B {}
