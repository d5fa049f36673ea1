//! Dependency export database.
//!
//! Runtime pragmas follow the usual local-tool defaults:
//! - `journal_mode = WAL` so readers are not blocked by an export in flight
//! - `busy_timeout = 5s` to ride out a concurrent batch export

pub mod migrations;
pub mod schema;

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use rusqlite::{Connection, params};
use serde::Serialize;
use tracing::{debug, instrument};

/// Busy timeout used for export DB connections.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Flattened dependency list of one component in one direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentExport {
    pub component: String,
    /// `"up"` (projects the component depends on) or `"down"` (projects
    /// that depend on it).
    pub direction: String,
    /// Display names, root excluded, sorted.
    pub dependencies: Vec<String>,
    /// Content hash of the graph the list was derived from.
    pub snapshot: String,
}

/// Destination for flattened dependency lists.
pub trait DependencySink {
    /// Replace every stored row of `export.component` for its direction.
    /// Returns the number of rows stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink cannot be written.
    fn replace(&mut self, export: &ComponentExport) -> Result<usize>;
}

impl DependencySink for Vec<ComponentExport> {
    fn replace(&mut self, export: &ComponentExport) -> Result<usize> {
        self.retain(|e| e.component != export.component || e.direction != export.direction);
        self.push(export.clone());
        Ok(export.dependencies.len())
    }
}

/// Open (or create) the export database, apply pragmas and migrate.
///
/// # Errors
///
/// Returns an error if opening, configuring or migrating the database fails.
pub fn open_export_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create export db directory {}", parent.display()))?;
    }

    let mut conn = Connection::open(path)
        .with_context(|| format!("open export database {}", path.display()))?;

    configure_connection(&conn).context("configure sqlite pragmas")?;
    migrations::migrate(&mut conn).context("apply export migrations")?;

    Ok(conn)
}

fn configure_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    let _journal_mode: String =
        conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
    conn.busy_timeout(DEFAULT_BUSY_TIMEOUT)?;
    Ok(())
}

/// [`DependencySink`] backed by the `component_dependency` table.
pub struct SqliteSink {
    conn: Connection,
}

impl SqliteSink {
    /// Open the database at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self {
            conn: open_export_db(path)?,
        })
    }

    /// Wrap an already open connection, migrating it first.
    ///
    /// # Errors
    ///
    /// Returns an error if migration fails.
    pub fn from_connection(mut conn: Connection) -> Result<Self> {
        migrations::migrate(&mut conn).context("apply export migrations")?;
        Ok(Self { conn })
    }

    /// Stored dependency names of a component, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn dependencies_of(&self, component: &str, direction: &str) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT dependency FROM component_dependency
             WHERE component = ?1 AND direction = ?2
             ORDER BY dependency",
        )?;
        let rows = stmt
            .query_map(params![component, direction], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(rows)
    }
}

impl DependencySink for SqliteSink {
    #[instrument(skip(self, export), fields(component = %export.component, direction = %export.direction))]
    fn replace(&mut self, export: &ComponentExport) -> Result<usize> {
        let exported_at = chrono::Utc::now().to_rfc3339();
        let tx = self.conn.transaction().context("begin export transaction")?;

        tx.execute(
            "DELETE FROM component_dependency WHERE component = ?1 AND direction = ?2",
            params![export.component, export.direction],
        )?;

        let mut stored = 0;
        {
            let mut insert = tx.prepare(
                "INSERT OR IGNORE INTO component_dependency
                    (component, direction, dependency, snapshot, exported_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for dependency in &export.dependencies {
                stored += insert.execute(params![
                    export.component,
                    export.direction,
                    dependency,
                    export.snapshot,
                    exported_at,
                ])?;
            }
        }

        tx.execute(
            "UPDATE export_meta SET last_snapshot = ?1, last_export_at = ?2 WHERE id = 1",
            params![export.snapshot, exported_at],
        )?;
        tx.commit().context("commit export transaction")?;

        debug!(rows = stored, "replaced component dependencies");
        Ok(stored)
    }
}
