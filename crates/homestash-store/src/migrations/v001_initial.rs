//! v001 -- Initial schema creation.
//!
//! Creates the five core tables: `users`, `locations`, `categories`,
//! `objects`, and `object_history`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Users
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    name          TEXT NOT NULL,
    email         TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    role          TEXT NOT NULL DEFAULT 'member'
                  CHECK (role IN ('admin', 'member')),
    created_at    TEXT NOT NULL,               -- ISO-8601 / RFC-3339
    updated_at    TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_users_email ON users(email);

-- ----------------------------------------------------------------
-- Locations
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS locations (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL,
    description TEXT,
    address     TEXT,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

-- ----------------------------------------------------------------
-- Categories
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS categories (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    name       TEXT NOT NULL UNIQUE,
    color      TEXT NOT NULL DEFAULT '#3B82F6',
    created_at TEXT NOT NULL
);

-- ----------------------------------------------------------------
-- Objects
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS objects (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL,
    description TEXT,
    category_id INTEGER,                       -- nullable FK -> categories(id)
    location_id INTEGER,                       -- nullable FK -> locations(id)
    photo_url   TEXT,
    added_by    INTEGER NOT NULL,              -- FK -> users(id)
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,

    FOREIGN KEY (category_id) REFERENCES categories(id) ON DELETE SET NULL,
    FOREIGN KEY (location_id) REFERENCES locations(id)  ON DELETE SET NULL,
    FOREIGN KEY (added_by)    REFERENCES users(id)      ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_objects_category ON objects(category_id);
CREATE INDEX IF NOT EXISTS idx_objects_location ON objects(location_id);
CREATE INDEX IF NOT EXISTS idx_objects_added_by ON objects(added_by);

-- ----------------------------------------------------------------
-- Object history (location-change audit trail)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS object_history (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    object_id        INTEGER NOT NULL,         -- FK -> objects(id)
    from_location_id INTEGER,
    to_location_id   INTEGER,
    moved_by         INTEGER NOT NULL,         -- FK -> users(id)
    moved_at         TEXT NOT NULL,
    notes            TEXT,

    FOREIGN KEY (object_id)        REFERENCES objects(id)   ON DELETE CASCADE,
    FOREIGN KEY (from_location_id) REFERENCES locations(id) ON DELETE SET NULL,
    FOREIGN KEY (to_location_id)   REFERENCES locations(id) ON DELETE SET NULL,
    FOREIGN KEY (moved_by)         REFERENCES users(id)     ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_object_history_object ON object_history(object_id);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
