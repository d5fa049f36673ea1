//! SQLite schema for exported dependency facts.
//!
//! - `component_dependency` holds one row per (component, direction,
//!   dependency) triple; a component's rows for one direction are always
//!   replaced as a unit
//! - `export_meta` records the schema version and the last export

/// Migration v1: dependency table plus export metadata.
pub const MIGRATION_V1_SQL: &str = r"
CREATE TABLE IF NOT EXISTS component_dependency (
    component TEXT NOT NULL CHECK (length(trim(component)) > 0),
    direction TEXT NOT NULL CHECK (direction IN ('up', 'down')),
    dependency TEXT NOT NULL CHECK (length(trim(dependency)) > 0),
    snapshot TEXT NOT NULL,
    exported_at TEXT NOT NULL,
    PRIMARY KEY (component, direction, dependency)
);

CREATE TABLE IF NOT EXISTS export_meta (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    schema_version INTEGER NOT NULL,
    last_snapshot TEXT,
    last_export_at TEXT
);

INSERT OR IGNORE INTO export_meta (
    id,
    schema_version,
    last_snapshot,
    last_export_at
) VALUES (1, 1, NULL, NULL);
";

/// Migration v2: reverse lookup index (which components pull in X).
pub const MIGRATION_V2_SQL: &str = r"
CREATE INDEX IF NOT EXISTS idx_component_dependency_dependency
    ON component_dependency(dependency, direction, component);
";

/// Indexes the latest schema must contain.
pub const REQUIRED_INDEXES: &[&str] = &["idx_component_dependency_dependency"];
