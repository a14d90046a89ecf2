//! CRUD operations for [`Location`] records.
//!
//! Locations are the one entity with a restrictive delete rule: a location
//! that still stores objects cannot be removed through [`Database::delete_location`].
//! The schema's ON DELETE SET NULL on `objects.location_id` exists only as a
//! backstop and is never reached through that path.

use chrono::Utc;
use rusqlite::params;

use crate::database::Database;
use crate::error::{not_found, Result, StoreError};
use crate::models::{timestamp_column, Location, LocationSummary, ObjectDetails};
use crate::objects::{row_to_object_details, OBJECT_SELECT_SQL};

const LOCATION_SELECT_SQL: &str =
    "SELECT id, name, description, address, created_at, updated_at FROM locations";

impl Database {
    /// Insert a new location.
    pub fn create_location(
        &self,
        name: &str,
        description: Option<&str>,
        address: Option<&str>,
    ) -> Result<Location> {
        let now = Utc::now().to_rfc3339();
        self.conn().execute(
            "INSERT INTO locations (name, description, address, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![name, description, address, now],
        )?;
        self.get_location(self.conn().last_insert_rowid())
    }

    /// Fetch a single location by id.
    pub fn get_location(&self, id: i64) -> Result<Location> {
        self.conn()
            .query_row(
                &format!("{LOCATION_SELECT_SQL} WHERE id = ?1"),
                params![id],
                row_to_location,
            )
            .map_err(not_found)
    }

    /// List all locations with their derived object counts, ordered by
    /// name.
    pub fn list_locations(&self) -> Result<Vec<LocationSummary>> {
        let mut stmt = self.conn().prepare(
            "SELECT l.id, l.name, l.description, l.address, l.created_at, l.updated_at,
                    COUNT(o.id) AS object_count
             FROM locations l
             LEFT JOIN objects o ON l.id = o.location_id
             GROUP BY l.id
             ORDER BY l.name",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(LocationSummary {
                location: row_to_location(row)?,
                object_count: row.get(6)?,
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::from)
    }

    /// Objects currently stored at the location, with display fields,
    /// ordered by object name.
    pub fn objects_at_location(&self, id: i64) -> Result<Vec<ObjectDetails>> {
        let mut stmt = self
            .conn()
            .prepare(&format!(
                "{OBJECT_SELECT_SQL} WHERE o.location_id = ?1 ORDER BY o.name"
            ))?;

        let rows = stmt.query_map(params![id], row_to_object_details)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::from)
    }

    /// Replace a location's fields and refresh `updated_at`.
    pub fn update_location(
        &self,
        id: i64,
        name: &str,
        description: Option<&str>,
        address: Option<&str>,
    ) -> Result<Location> {
        let now = Utc::now().to_rfc3339();
        let affected = self.conn().execute(
            "UPDATE locations
             SET name = ?1, description = ?2, address = ?3, updated_at = ?4
             WHERE id = ?5",
            params![name, description, address, now, id],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        self.get_location(id)
    }

    /// Delete a location.
    ///
    /// Refused with [`StoreError::Constraint`] while any object still
    /// references the location.  The count check and the delete run inside
    /// one transaction so the rule holds even against a concurrent mover.
    pub fn delete_location(&mut self, id: i64) -> Result<()> {
        let tx = self.conn_mut().transaction()?;

        let object_count: i64 = tx.query_row(
            "SELECT COUNT(*) FROM objects WHERE location_id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        if object_count > 0 {
            return Err(StoreError::Constraint(format!(
                "location {id} still stores {object_count} object(s)"
            )));
        }

        let affected = tx.execute("DELETE FROM locations WHERE id = ?1", params![id])?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }

        tx.commit()?;
        Ok(())
    }
}

/// Map a `rusqlite::Row` to a [`Location`].
fn row_to_location(row: &rusqlite::Row<'_>) -> rusqlite::Result<Location> {
    Ok(Location {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        address: row.get(3)?,
        created_at: timestamp_column(row, 4)?,
        updated_at: timestamp_column(row, 5)?,
    })
}
