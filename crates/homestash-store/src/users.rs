//! CRUD operations for [`User`] records.

use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use crate::database::Database;
use crate::error::{not_found, Result, StoreError};
use crate::models::{timestamp_column, Role, User};

const USER_SELECT_SQL: &str = "SELECT id, name, email, password_hash, role, created_at, updated_at
 FROM users";

impl Database {
    /// Insert a new user and return the stored row.
    ///
    /// The very first user ever registered becomes [`Role::Admin`]; everyone
    /// after that is a [`Role::Member`].  The count check and the insert run
    /// inside one transaction so that two concurrent first registrations
    /// cannot both claim the admin role.
    ///
    /// A duplicate email fails with [`StoreError::Constraint`].
    pub fn create_user(&mut self, name: &str, email: &str, password_hash: &str) -> Result<User> {
        let tx = self.conn_mut().transaction()?;

        let existing: i64 = tx.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        let role = if existing == 0 {
            Role::Admin
        } else {
            Role::Member
        };

        let now = Utc::now().to_rfc3339();
        tx.execute(
            "INSERT INTO users (name, email, password_hash, role, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            params![name, email, password_hash, role.as_str(), now],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        self.get_user(id)
    }

    /// Fetch a single user by id.
    pub fn get_user(&self, id: i64) -> Result<User> {
        self.conn()
            .query_row(
                &format!("{USER_SELECT_SQL} WHERE id = ?1"),
                params![id],
                row_to_user,
            )
            .map_err(not_found)
    }

    /// Look up a user by email.  Returns `None` when no account exists.
    pub fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.conn()
            .query_row(
                &format!("{USER_SELECT_SQL} WHERE email = ?1"),
                params![email],
                row_to_user,
            )
            .optional()
            .map_err(StoreError::from)
    }

    /// Total number of registered users.
    pub fn count_users(&self) -> Result<i64> {
        self.conn()
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .map_err(StoreError::from)
    }

    /// Delete a user.  Their objects and the history rows they moved go
    /// with them (ON DELETE CASCADE).
    pub fn delete_user(&self, id: i64) -> Result<()> {
        let affected = self
            .conn()
            .execute("DELETE FROM users WHERE id = ?1", params![id])?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

/// Map a `rusqlite::Row` to a [`User`].
fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    let role_str: String = row.get(4)?;
    let role = Role::parse(&role_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            4,
            rusqlite::types::Type::Text,
            format!("unknown role `{role_str}` in users.role").into(),
        )
    })?;

    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        role,
        created_at: timestamp_column(row, 5)?,
        updated_at: timestamp_column(row, 6)?,
    })
}
