//! refgraph-core library.
//!
//! Project model, metadata scanning, build-log parsing and the dependency
//! export database. Everything here is independent of graph algorithms;
//! `refgraph-engine` builds on these types.
//!
//! # Conventions
//!
//! - **Errors**: `thiserror` enums for domain failures (each exposing an
//!   [`error::ErrorCode`]), `anyhow::Result` at I/O boundaries.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod buildlog;
pub mod config;
pub mod db;
pub mod error;
pub mod project;
pub mod scan;

pub use project::{BuildInfo, Project, ProjectId};
