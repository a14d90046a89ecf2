//! Domain model structs persisted in the homestash database.
//!
//! Every struct derives `Serialize` so it can be returned directly from the
//! HTTP layer.  The read projections at the bottom of the file are computed
//! per query from joins and are never stored (`object_count` and the
//! `*_name`/`*_color` display fields have no columns of their own).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// Permission role attached to a [`User`].
///
/// The first user ever registered becomes `Admin`; everyone after that is a
/// `Member`.  No operation on the current surface differentiates between the
/// two, but the role is recorded and carried in session tokens.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Member,
}

impl Role {
    /// Database representation (the `users.role` TEXT column).
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Member => "member",
        }
    }

    /// Parse the database representation.
    pub fn parse(value: &str) -> Option<Role> {
        match value {
            "admin" => Some(Role::Admin),
            "member" => Some(Role::Member),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A registered account.  The password hash is kept for verification but is
/// never serialized into a response body.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Location
// ---------------------------------------------------------------------------

/// A physical place where objects may be stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Location {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// A tag classifying objects, with a display color.  Names are unique.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub id: i64,
    pub name: String,
    /// Hex color string, e.g. `#3B82F6`.
    pub color: String,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Object
// ---------------------------------------------------------------------------

/// A tracked household item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Object {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    /// References a [`Category`]; cleared when the category is deleted.
    pub category_id: Option<i64>,
    /// References a [`Location`]; `None` means the object is unplaced.
    pub location_id: Option<i64>,
    /// URL returned by the photo upload service.  Opaque to the store.
    pub photo_url: Option<String>,
    /// The creating user.  Immutable after creation.
    pub added_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// ObjectHistory
// ---------------------------------------------------------------------------

/// An immutable audit record of an object's location change.
///
/// Rows are written only as a side effect of an object update that changes
/// `location_id` and are deleted only when their owning object is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ObjectHistory {
    pub id: i64,
    pub object_id: i64,
    pub from_location_id: Option<i64>,
    pub to_location_id: Option<i64>,
    pub moved_by: i64,
    pub moved_at: DateTime<Utc>,
    pub notes: Option<String>,
}

// ---------------------------------------------------------------------------
// Read projections
// ---------------------------------------------------------------------------

/// An [`Object`] joined with display fields from its related rows.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ObjectDetails {
    #[serde(flatten)]
    pub object: Object,
    pub category_name: Option<String>,
    pub category_color: Option<String>,
    pub location_name: Option<String>,
    pub added_by_name: Option<String>,
}

/// An [`ObjectHistory`] row joined with location and mover names.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ObjectHistoryDetails {
    #[serde(flatten)]
    pub entry: ObjectHistory,
    pub from_location_name: Option<String>,
    pub to_location_name: Option<String>,
    pub moved_by_name: Option<String>,
}

/// A [`Location`] with the number of objects currently stored there.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LocationSummary {
    #[serde(flatten)]
    pub location: Location,
    pub object_count: i64,
}

/// A [`Category`] with the number of objects carrying it.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CategorySummary {
    #[serde(flatten)]
    pub category: Category,
    pub object_count: i64,
}

/// Parse an RFC 3339 `TEXT` column into a `DateTime<Utc>`.
pub(crate) fn timestamp_column(
    row: &rusqlite::Row<'_>,
    idx: usize,
) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trip() {
        assert_eq!(Role::parse(Role::Admin.as_str()), Some(Role::Admin));
        assert_eq!(Role::parse(Role::Member.as_str()), Some(Role::Member));
        assert_eq!(Role::parse("root"), None);
    }

    #[test]
    fn password_hash_is_not_serialized() {
        let user = User {
            id: 1,
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            role: Role::Admin,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "alice@example.com");
        assert_eq!(json["role"], "admin");
    }
}
