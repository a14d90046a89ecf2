//! Database connection management.
//!
//! The [`Database`] struct owns a [`rusqlite::Connection`] and guarantees
//! that migrations have run before any other operation.  Foreign-key
//! enforcement is switched on for every connection, so the cascade / clear /
//! restrict rules of the schema hold no matter which helper is called.

use std::path::{Path, PathBuf};

use chrono::Utc;
use directories::ProjectDirs;
use rusqlite::{params, Connection};

use crate::error::{Result, StoreError};
use crate::migrations;

/// Fixed category set inserted into an empty database.
const DEFAULT_CATEGORIES: &[(&str, &str)] = &[
    ("Tools", "#EF4444"),
    ("Seasonal Items", "#F59E0B"),
    ("Documents", "#3B82F6"),
    ("Electronics", "#8B5CF6"),
    ("Outdoor Equipment", "#10B981"),
    ("Kitchen Items", "#EC4899"),
    ("Storage Boxes", "#6366F1"),
    ("Other", "#6B7280"),
];

/// Fixed location set inserted into an empty database.
const DEFAULT_LOCATIONS: &[(&str, &str)] = &[
    ("Main House", "Primary residence"),
    ("Garage", "Attached garage"),
    ("Storage Unit", "Off-site storage facility"),
    ("Basement", "Basement storage area"),
    ("Attic", "Attic storage space"),
];

/// Wrapper around a [`rusqlite::Connection`].
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the default application database.
    ///
    /// The database file is placed in the platform-appropriate data directory:
    /// - Linux:   `~/.local/share/homestash/homestash.db`
    /// - macOS:   `~/Library/Application Support/dev.homestash.homestash/homestash.db`
    /// - Windows: `{FOLDERID_RoamingAppData}\homestash\homestash\data\homestash.db`
    pub fn new() -> Result<Self> {
        let project_dirs =
            ProjectDirs::from("dev", "homestash", "homestash").ok_or(StoreError::NoDataDir)?;

        let data_dir = project_dirs.data_dir();
        std::fs::create_dir_all(data_dir)?;

        let db_path = data_dir.join("homestash.db");

        tracing::info!(path = %db_path.display(), "opening database");

        Self::open_at(&db_path)
    }

    /// Open (or create) a database at an explicit path.
    ///
    /// This is useful for tests and for embedding the store inside custom
    /// directory layouts.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::init(conn)
    }

    /// Open a fresh in-memory database.  Used by tests and throwaway
    /// tooling; the data is gone when the handle is dropped.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        migrations::run_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// Return a reference to the underlying `rusqlite::Connection`.
    ///
    /// Callers should prefer the typed CRUD helpers, but direct access is
    /// occasionally needed for ad-hoc queries.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Return a mutable reference to the underlying connection.  Needed for
    /// operations that open a [`rusqlite::Transaction`].
    pub fn conn_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    /// Return the filesystem path of the open database (if any).
    pub fn path(&self) -> Option<PathBuf> {
        self.conn.path().map(PathBuf::from)
    }

    /// Insert the default category and location sets.
    ///
    /// Runs only when both tables are empty, so existing data is never
    /// touched -- reopening a populated database is a no-op.
    pub fn seed_defaults(&self) -> Result<()> {
        let categories: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM categories", [], |row| row.get(0))?;
        let locations: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM locations", [], |row| row.get(0))?;

        if categories > 0 || locations > 0 {
            tracing::debug!("database already seeded");
            return Ok(());
        }

        let now = Utc::now().to_rfc3339();

        let mut insert_category = self
            .conn
            .prepare("INSERT INTO categories (name, color, created_at) VALUES (?1, ?2, ?3)")?;
        for (name, color) in DEFAULT_CATEGORIES {
            insert_category.execute(params![name, color, now])?;
        }

        let mut insert_location = self.conn.prepare(
            "INSERT INTO locations (name, description, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?3)",
        )?;
        for (name, description) in DEFAULT_LOCATIONS {
            insert_location.execute(params![name, description, now])?;
        }

        tracing::info!(
            categories = DEFAULT_CATEGORIES.len(),
            locations = DEFAULT_LOCATIONS.len(),
            "seeded default categories and locations"
        );

        Ok(())
    }
}
