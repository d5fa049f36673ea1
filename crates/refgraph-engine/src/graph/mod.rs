//! Reference graph construction.
//!
//! # Overview
//!
//! Every derived relation is computed once per run, in this order:
//!
//! ```text
//! scan / edge list
//!        ↓  index::ReferenceIndex::new()
//! ReferenceIndex (direct references, externals materialized)
//!        ↓  build::RawGraph::from_index()
//! RawGraph (petgraph DiGraph, may contain cycles)
//!        ↓  closure::ClosureMap::compute()      Tarjan SCC condensation
//! ClosureMap (P → everything P depends on, P included)
//!        ↓  reduce::MinimalMap::compute()
//! MinimalMap (transitively reduced references)
//!        ↓  reverse::ReverseMaps::compute()
//! ReverseMaps (full and minimal dependents)
//! ```
//!
//! [`crate::engine::DependencyGraph`] owns the results. [`stats::GraphStats`]
//! and [`cycles::find_all_cycles`] are read-only diagnostics over them.

pub mod build;
pub mod closure;
pub mod cycles;
pub mod index;
pub mod reduce;
pub mod reverse;
pub mod stats;

pub use build::RawGraph;
pub use closure::ClosureMap;
pub use cycles::find_all_cycles;
pub use index::ReferenceIndex;
pub use reduce::{MinimalMap, ReductionMode};
pub use reverse::ReverseMaps;
pub use stats::GraphStats;
