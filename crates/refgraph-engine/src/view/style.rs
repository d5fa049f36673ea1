//! Node colors and labels.

use refgraph_core::project::Project;

pub const EXTERNAL_COLOR: &str = "#b0b0b0";
pub const DEFAULT_COLOR: &str = "#ffffff";
pub const UNUSED_EDGE_COLOR: &str = "#ff0000";
pub const EDGE_COLOR: &str = "#000000";

/// Fill color of a project node.
///
/// Timed projects blend from yellow (0 ms) to red (`max_duration_ms`).
#[must_use]
pub fn node_color(project: &Project, max_duration_ms: u64) -> String {
    match &project.build {
        Some(build) => heat_color(build.duration_ms, max_duration_ms),
        None if project.is_external => EXTERNAL_COLOR.to_string(),
        None => DEFAULT_COLOR.to_string(),
    }
}

/// `#ffGG00` with `GG = floor((1 - d / max) * 255)`.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn heat_color(duration_ms: u64, max_duration_ms: u64) -> String {
    let ratio = if max_duration_ms == 0 {
        0.0
    } else {
        (duration_ms as f64 / max_duration_ms as f64).clamp(0.0, 1.0)
    };
    let green = ((1.0 - ratio) * 255.0).floor() as u8;
    format!("#ff{green:02x}00")
}

/// `(#<seq>, MM:SS)` for timed projects, empty otherwise.
#[must_use]
pub fn build_label(project: &Project) -> String {
    project
        .build
        .as_ref()
        .map(|build| format!("(#{}, {})", build.sequence, build.duration_display()))
        .unwrap_or_default()
}

#[must_use]
pub const fn edge_color(unused: bool) -> &'static str {
    if unused { UNUSED_EDGE_COLOR } else { EDGE_COLOR }
}
