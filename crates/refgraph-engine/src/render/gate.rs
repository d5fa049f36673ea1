//! Serialization of renderer calls.
//!
//! Graph selection runs on many worker threads, but the layout backend is a
//! single external tool writing into one directory. Every call into a
//! [`Renderer`] goes through a [`RenderGate`], held for exactly one call.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use parking_lot::Mutex;
use tracing::trace;

use super::{RenderGraph, Renderer};

/// Clonable handle to one shared render lock.
#[derive(Debug, Clone, Default)]
pub struct RenderGate {
    lock: Arc<Mutex<()>>,
}

impl RenderGate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding the gate.
    pub fn run<T>(&self, f: impl FnOnce() -> T) -> T {
        let _guard = self.lock.lock();
        f()
    }

    /// The gate is currently held by some thread.
    #[must_use]
    pub fn is_held(&self) -> bool {
        self.lock.is_locked()
    }
}

/// A renderer whose calls are serialized through a [`RenderGate`].
pub struct SerializedRenderer<R> {
    inner: R,
    gate: RenderGate,
}

impl<R: Renderer> SerializedRenderer<R> {
    #[must_use]
    pub const fn new(inner: R, gate: RenderGate) -> Self {
        Self { inner, gate }
    }

    #[must_use]
    pub const fn gate(&self) -> &RenderGate {
        &self.gate
    }
}

impl<R: Renderer> Renderer for SerializedRenderer<R> {
    fn render(&self, graph: &RenderGraph) -> Result<PathBuf> {
        self.gate.run(|| {
            trace!(name = %graph.name, "render gate acquired");
            self.inner.render(graph)
        })
    }
}
