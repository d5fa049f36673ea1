#![forbid(unsafe_code)]
//! refgraph-engine: the dependency graph engine.
//!
//! Builds an immutable [`DependencyGraph`] from a [`ReferenceIndex`]
//! (closures, transitive reduction, reverse maps, timing) and derives views,
//! leaderboards, export lists and render pages from it.
//!
//! # Conventions
//!
//! - **Edges** run dependent → dependency inside the graph and
//!   dependency → dependent in rendered views.
//! - **Ordering**: every iteration follows the normalized identifier order,
//!   so identical input produces identical output and aliases.
//! - **Errors**: `anyhow::Result` at I/O boundaries, [`SelectError`] for view
//!   selection.
//! - **Logging**: `tracing` macros; construction stages are instrumented.

pub mod engine;
pub mod graph;
pub mod render;
pub mod timing;
pub mod view;

pub use engine::{DependencyGraph, GraphOptions, SelectError};
pub use graph::{GraphStats, ReferenceIndex};
pub use timing::{SubstringMatcher, TimingReport, UnusedReferenceMatcher};
