//! Views over a built [`crate::engine::DependencyGraph`].
//!
//! - [`select`]: root lookup and sub-graph selection
//! - [`rank`]: leaderboards
//! - [`flatten`]: per-component dependency lists for export
//! - [`compose`]: pages handed to a [`crate::render::Renderer`]

pub mod alias;
pub mod compose;
pub mod flatten;
pub mod rank;
pub mod select;
pub mod style;

pub use alias::AliasTable;
pub use compose::{PageOptions, dependency_page, leaderboard_page};
pub use flatten::{ExportDirection, export_component, flatten};
pub use rank::{Leaderboard, RankEntry};
pub use select::{RootQuery, SelectedEdge, Selection, ViewDirection};
