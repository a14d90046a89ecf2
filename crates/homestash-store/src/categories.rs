//! CRUD operations for [`Category`] records.
//!
//! Category names are globally unique.  Deletion is unconditional: objects
//! referencing a deleted category get their `category_id` cleared by the
//! schema's ON DELETE SET NULL rule (unlike locations, whose deletion is
//! refused while referenced).

use chrono::Utc;
use rusqlite::params;

use crate::database::Database;
use crate::error::{not_found, Result, StoreError};
use crate::models::{timestamp_column, Category, CategorySummary};

/// Color assigned when a category is created without one.
pub const DEFAULT_CATEGORY_COLOR: &str = "#3B82F6";

impl Database {
    /// Insert a new category.  `color` falls back to
    /// [`DEFAULT_CATEGORY_COLOR`].  A duplicate name fails with
    /// [`StoreError::Constraint`].
    pub fn create_category(&self, name: &str, color: Option<&str>) -> Result<Category> {
        let now = Utc::now().to_rfc3339();
        self.conn().execute(
            "INSERT INTO categories (name, color, created_at) VALUES (?1, ?2, ?3)",
            params![name, color.unwrap_or(DEFAULT_CATEGORY_COLOR), now],
        )?;
        self.get_category(self.conn().last_insert_rowid())
    }

    /// Fetch a single category by id.
    pub fn get_category(&self, id: i64) -> Result<Category> {
        self.conn()
            .query_row(
                "SELECT id, name, color, created_at FROM categories WHERE id = ?1",
                params![id],
                row_to_category,
            )
            .map_err(not_found)
    }

    /// List all categories with their derived object counts, ordered by
    /// name.
    pub fn list_categories(&self) -> Result<Vec<CategorySummary>> {
        let mut stmt = self.conn().prepare(
            "SELECT c.id, c.name, c.color, c.created_at, COUNT(o.id) AS object_count
             FROM categories c
             LEFT JOIN objects o ON c.id = o.category_id
             GROUP BY c.id
             ORDER BY c.name",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(CategorySummary {
                category: row_to_category(row)?,
                object_count: row.get(4)?,
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::from)
    }

    /// Replace a category's name and color.  A name collision with a
    /// different category fails with [`StoreError::Constraint`].
    pub fn update_category(&self, id: i64, name: &str, color: Option<&str>) -> Result<Category> {
        let affected = self.conn().execute(
            "UPDATE categories SET name = ?1, color = ?2 WHERE id = ?3",
            params![name, color.unwrap_or(DEFAULT_CATEGORY_COLOR), id],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        self.get_category(id)
    }

    /// Delete a category.  Objects referencing it get `category_id` cleared
    /// (ON DELETE SET NULL); deletion is never blocked by usage.
    pub fn delete_category(&self, id: i64) -> Result<()> {
        let affected = self
            .conn()
            .execute("DELETE FROM categories WHERE id = ?1", params![id])?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

/// Map a `rusqlite::Row` to a [`Category`].
fn row_to_category(row: &rusqlite::Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        color: row.get(2)?,
        created_at: timestamp_column(row, 3)?,
    })
}
