//! CRUD and filtered listing for [`Object`] records.
//!
//! The update path carries the system's one non-trivial side effect: when an
//! update changes an object's location, a history row recording the move is
//! inserted in the same transaction as the update itself, so a crash or a
//! concurrent reader can never observe the object moved without its audit
//! record (or the reverse).

use chrono::Utc;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter};

use crate::database::Database;
use crate::error::{not_found, Result, StoreError};
use crate::models::{timestamp_column, Object, ObjectDetails};

pub(crate) const OBJECT_SELECT_SQL: &str = "SELECT
    o.id,
    o.name,
    o.description,
    o.category_id,
    o.location_id,
    o.photo_url,
    o.added_by,
    o.created_at,
    o.updated_at,
    c.name AS category_name,
    c.color AS category_color,
    l.name AS location_name,
    u.name AS added_by_name
 FROM objects o
 LEFT JOIN categories c ON o.category_id = c.id
 LEFT JOIN locations l ON o.location_id = l.id
 LEFT JOIN users u ON o.added_by = u.id";

/// Filter options for [`Database::list_objects`].  Options compose with
/// logical AND; an empty filter matches every object.
#[derive(Debug, Clone, Default)]
pub struct ObjectFilter {
    /// Restrict to objects with this category.
    pub category: Option<i64>,
    /// Restrict to objects with this location.
    pub location: Option<i64>,
    /// Case-insensitive substring match against name or description.
    pub search: Option<String>,
}

/// Fields for inserting an object.
#[derive(Debug, Clone)]
pub struct NewObject {
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<i64>,
    pub location_id: Option<i64>,
    pub photo_url: Option<String>,
    /// The creating user; recorded as the object's immutable owner.
    pub added_by: i64,
}

/// Replacement fields for updating an object.  Applied wholesale: an absent
/// optional field clears the stored value.
#[derive(Debug, Clone)]
pub struct UpdateObject {
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<i64>,
    pub location_id: Option<i64>,
    pub photo_url: Option<String>,
}

impl Database {
    /// List objects matching the filter, joined with display fields,
    /// most-recently-updated first.
    ///
    /// The whole listing is a single SELECT, so a concurrent mutation can
    /// never produce a torn result.
    pub fn list_objects(&self, filter: &ObjectFilter) -> Result<Vec<ObjectDetails>> {
        let mut sql = format!("{OBJECT_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(category) = filter.category {
            sql.push_str(" AND o.category_id = ?");
            bind_values.push(Value::Integer(category));
        }

        if let Some(location) = filter.location {
            sql.push_str(" AND o.location_id = ?");
            bind_values.push(Value::Integer(location));
        }

        if let Some(search) = filter.search.as_deref() {
            sql.push_str(" AND (o.name LIKE ? ESCAPE '\\' OR o.description LIKE ? ESCAPE '\\')");
            let pattern = format!("%{}%", escape_like(search));
            bind_values.push(Value::Text(pattern.clone()));
            bind_values.push(Value::Text(pattern));
        }

        sql.push_str(" ORDER BY o.updated_at DESC");

        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(bind_values), row_to_object_details)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::from)
    }

    /// Fetch a single object by id, joined with display fields.
    pub fn get_object(&self, id: i64) -> Result<ObjectDetails> {
        self.conn()
            .query_row(
                &format!("{OBJECT_SELECT_SQL} WHERE o.id = ?1"),
                params![id],
                row_to_object_details,
            )
            .map_err(not_found)
    }

    /// Insert a new object and return it with display fields.
    ///
    /// Dangling `category_id`/`location_id`/`added_by` references fail with
    /// [`StoreError::Constraint`].
    pub fn create_object(&self, object: &NewObject) -> Result<ObjectDetails> {
        let now = Utc::now().to_rfc3339();
        self.conn().execute(
            "INSERT INTO objects
                 (name, description, category_id, location_id, photo_url, added_by,
                  created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
            params![
                object.name,
                object.description,
                object.category_id,
                object.location_id,
                object.photo_url,
                object.added_by,
                now,
            ],
        )?;
        self.get_object(self.conn().last_insert_rowid())
    }

    /// Apply a wholesale field replacement to an object and refresh
    /// `updated_at`.
    ///
    /// When `update.location_id` is present and differs from the stored
    /// location, a history row recording the move (from the prior location,
    /// by `moved_by`, at now) is inserted in the same transaction as the
    /// update: either both are committed or neither is.  An absent or
    /// unchanged location writes no history row.
    pub fn update_object(
        &mut self,
        id: i64,
        update: &UpdateObject,
        moved_by: i64,
    ) -> Result<ObjectDetails> {
        let now = Utc::now().to_rfc3339();

        let tx = self.conn_mut().transaction()?;

        let current_location: Option<i64> = tx
            .query_row(
                "SELECT location_id FROM objects WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .map_err(not_found)?;

        if let Some(to_location) = update.location_id {
            if Some(to_location) != current_location {
                tx.execute(
                    "INSERT INTO object_history
                         (object_id, from_location_id, to_location_id, moved_by, moved_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![id, current_location, to_location, moved_by, now],
                )?;
            }
        }

        tx.execute(
            "UPDATE objects
             SET name = ?1, description = ?2, category_id = ?3, location_id = ?4,
                 photo_url = ?5, updated_at = ?6
             WHERE id = ?7",
            params![
                update.name,
                update.description,
                update.category_id,
                update.location_id,
                update.photo_url,
                now,
                id,
            ],
        )?;

        tx.commit()?;
        self.get_object(id)
    }

    /// Delete an object.  Its history rows go with it (ON DELETE CASCADE).
    pub fn delete_object(&self, id: i64) -> Result<()> {
        let affected = self
            .conn()
            .execute("DELETE FROM objects WHERE id = ?1", params![id])?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

/// Escape `%` and `_` so user input matches as a literal substring.
fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Map a joined `rusqlite::Row` to an [`ObjectDetails`].
pub(crate) fn row_to_object_details(row: &rusqlite::Row<'_>) -> rusqlite::Result<ObjectDetails> {
    Ok(ObjectDetails {
        object: Object {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            category_id: row.get(3)?,
            location_id: row.get(4)?,
            photo_url: row.get(5)?,
            added_by: row.get(6)?,
            created_at: timestamp_column(row, 7)?,
            updated_at: timestamp_column(row, 8)?,
        },
        category_name: row.get(9)?,
        category_color: row.get(10)?,
        location_name: row.get(11)?,
        added_by_name: row.get(12)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    struct Fixture {
        db: Database,
        user_id: i64,
    }

    fn fixture() -> Fixture {
        let mut db = Database::open_in_memory().unwrap();
        let user = db.create_user("Alice", "alice@example.com", "hash").unwrap();
        assert_eq!(user.role, Role::Admin);
        Fixture { db, user_id: user.id }
    }

    fn new_object(name: &str, user_id: i64) -> NewObject {
        NewObject {
            name: name.to_string(),
            description: None,
            category_id: None,
            location_id: None,
            photo_url: None,
            added_by: user_id,
        }
    }

    fn as_update(details: &ObjectDetails) -> UpdateObject {
        UpdateObject {
            name: details.object.name.clone(),
            description: details.object.description.clone(),
            category_id: details.object.category_id,
            location_id: details.object.location_id,
            photo_url: details.object.photo_url.clone(),
        }
    }

    #[test]
    fn create_records_owner_and_display_fields() {
        let Fixture { db, user_id } = fixture();
        let garage = db.create_location("Garage", None, None).unwrap();
        let tools = db.create_category("Tools", Some("#EF4444")).unwrap();

        let created = db
            .create_object(&NewObject {
                name: "Drill".to_string(),
                description: Some("Cordless drill".to_string()),
                category_id: Some(tools.id),
                location_id: Some(garage.id),
                photo_url: None,
                added_by: user_id,
            })
            .unwrap();

        assert_eq!(created.object.added_by, user_id);
        assert_eq!(created.added_by_name.as_deref(), Some("Alice"));
        assert_eq!(created.category_name.as_deref(), Some("Tools"));
        assert_eq!(created.category_color.as_deref(), Some("#EF4444"));
        assert_eq!(created.location_name.as_deref(), Some("Garage"));
    }

    #[test]
    fn create_with_dangling_owner_is_a_constraint_violation() {
        let db = Database::open_in_memory().unwrap();
        let err = db.create_object(&new_object("Orphan", 999)).unwrap_err();
        assert!(matches!(err, StoreError::Constraint(_)));
    }

    #[test]
    fn list_filters_compose_with_and() {
        let Fixture { db, user_id } = fixture();
        let garage = db.create_location("Garage", None, None).unwrap();
        let attic = db.create_location("Attic", None, None).unwrap();
        let tools = db.create_category("Tools", None).unwrap();
        let seasonal = db.create_category("Seasonal", None).unwrap();

        for (name, description, category, location) in [
            ("Drill", Some("Cordless drill"), Some(tools.id), Some(garage.id)),
            ("Hammer", None, Some(tools.id), Some(attic.id)),
            ("Ski boots", Some("Winter gear"), Some(seasonal.id), Some(attic.id)),
        ] {
            db.create_object(&NewObject {
                name: name.to_string(),
                description: description.map(String::from),
                category_id: category,
                location_id: location,
                photo_url: None,
                added_by: user_id,
            })
            .unwrap();
        }

        // No filters: everything.
        assert_eq!(db.list_objects(&ObjectFilter::default()).unwrap().len(), 3);

        // Category alone.
        let tools_only = db
            .list_objects(&ObjectFilter {
                category: Some(tools.id),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(tools_only.len(), 2);
        assert!(tools_only.iter().all(|o| o.object.category_id == Some(tools.id)));

        // Location alone.
        let in_attic = db
            .list_objects(&ObjectFilter {
                location: Some(attic.id),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(in_attic.len(), 2);

        // Category AND search: the intersection.
        let drills = db
            .list_objects(&ObjectFilter {
                category: Some(tools.id),
                location: None,
                search: Some("drill".to_string()),
            })
            .unwrap();
        assert_eq!(drills.len(), 1);
        assert_eq!(drills[0].object.name, "Drill");
    }

    #[test]
    fn search_matches_name_or_description_case_insensitively() {
        let Fixture { db, user_id } = fixture();

        db.create_object(&NewObject {
            name: "Ski boots".to_string(),
            description: Some("WINTER gear".to_string()),
            category_id: None,
            location_id: None,
            photo_url: None,
            added_by: user_id,
        })
        .unwrap();
        db.create_object(&new_object("Hammer", user_id)).unwrap();

        let by_name = db
            .list_objects(&ObjectFilter {
                search: Some("SKI".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(by_name.len(), 1);

        let by_description = db
            .list_objects(&ObjectFilter {
                search: Some("winter".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(by_description.len(), 1);
        assert_eq!(by_description[0].object.name, "Ski boots");

        let no_match = db
            .list_objects(&ObjectFilter {
                search: Some("canoe".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert!(no_match.is_empty());
    }

    #[test]
    fn search_treats_like_wildcards_as_literals() {
        let Fixture { db, user_id } = fixture();

        db.create_object(&new_object("Box 100%", user_id)).unwrap();
        db.create_object(&new_object("Box 100x", user_id)).unwrap();

        let matches = db
            .list_objects(&ObjectFilter {
                search: Some("100%".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].object.name, "Box 100%");
    }

    #[test]
    fn list_orders_by_most_recently_updated() {
        let Fixture { mut db, user_id } = fixture();

        let drill = db.create_object(&new_object("Drill", user_id)).unwrap();
        db.create_object(&new_object("Hammer", user_id)).unwrap();

        // Touch the drill so it becomes the most recent.
        db.update_object(drill.object.id, &as_update(&drill), user_id)
            .unwrap();

        let listed = db.list_objects(&ObjectFilter::default()).unwrap();
        assert_eq!(listed[0].object.name, "Drill");
    }

    #[test]
    fn moving_an_object_writes_exactly_one_history_row() {
        let Fixture { mut db, user_id } = fixture();
        let garage = db.create_location("Garage", None, None).unwrap();
        let attic = db.create_location("Attic", None, None).unwrap();

        let drill = db
            .create_object(&NewObject {
                location_id: Some(garage.id),
                ..new_object("Drill", user_id)
            })
            .unwrap();

        // Creation itself records no history.
        assert!(db.history_for_object(drill.object.id).unwrap().is_empty());

        let mut update = as_update(&drill);
        update.location_id = Some(attic.id);
        let moved = db.update_object(drill.object.id, &update, user_id).unwrap();
        assert_eq!(moved.object.location_id, Some(attic.id));

        let history = db.history_for_object(drill.object.id).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].entry.from_location_id, Some(garage.id));
        assert_eq!(history[0].entry.to_location_id, Some(attic.id));
        assert_eq!(history[0].entry.moved_by, user_id);
    }

    #[test]
    fn updating_to_the_same_location_writes_no_history() {
        let Fixture { mut db, user_id } = fixture();
        let garage = db.create_location("Garage", None, None).unwrap();

        let drill = db
            .create_object(&NewObject {
                location_id: Some(garage.id),
                ..new_object("Drill", user_id)
            })
            .unwrap();

        let mut update = as_update(&drill);
        update.description = Some("Now with a case".to_string());
        db.update_object(drill.object.id, &update, user_id).unwrap();

        assert!(db.history_for_object(drill.object.id).unwrap().is_empty());
    }

    #[test]
    fn clearing_the_location_writes_no_history() {
        let Fixture { mut db, user_id } = fixture();
        let garage = db.create_location("Garage", None, None).unwrap();

        let drill = db
            .create_object(&NewObject {
                location_id: Some(garage.id),
                ..new_object("Drill", user_id)
            })
            .unwrap();

        let mut update = as_update(&drill);
        update.location_id = None;
        let unplaced = db.update_object(drill.object.id, &update, user_id).unwrap();

        assert_eq!(unplaced.object.location_id, None);
        assert!(db.history_for_object(drill.object.id).unwrap().is_empty());
    }

    #[test]
    fn failed_update_rolls_back_the_history_row() {
        let Fixture { mut db, user_id } = fixture();
        let garage = db.create_location("Garage", None, None).unwrap();
        let attic = db.create_location("Attic", None, None).unwrap();

        let drill = db
            .create_object(&NewObject {
                location_id: Some(garage.id),
                ..new_object("Drill", user_id)
            })
            .unwrap();

        // The location change is valid, but the dangling category makes the
        // object update itself fail -- the already-inserted history row must
        // be rolled back with it.
        let mut update = as_update(&drill);
        update.location_id = Some(attic.id);
        update.category_id = Some(999);
        let err = db
            .update_object(drill.object.id, &update, user_id)
            .unwrap_err();
        assert!(matches!(err, StoreError::Constraint(_)));

        let reloaded = db.get_object(drill.object.id).unwrap();
        assert_eq!(reloaded.object.location_id, Some(garage.id));
        assert!(db.history_for_object(drill.object.id).unwrap().is_empty());
    }

    #[test]
    fn update_missing_object_is_not_found() {
        let Fixture { mut db, user_id } = fixture();
        let err = db
            .update_object(
                404,
                &UpdateObject {
                    name: "Ghost".to_string(),
                    description: None,
                    category_id: None,
                    location_id: None,
                    photo_url: None,
                },
                user_id,
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[test]
    fn update_replaces_fields_wholesale() {
        let Fixture { mut db, user_id } = fixture();

        let drill = db
            .create_object(&NewObject {
                description: Some("Cordless".to_string()),
                photo_url: Some("/api/uploads/abc".to_string()),
                ..new_object("Drill", user_id)
            })
            .unwrap();

        let updated = db
            .update_object(
                drill.object.id,
                &UpdateObject {
                    name: "Impact drill".to_string(),
                    description: None,
                    category_id: None,
                    location_id: None,
                    photo_url: None,
                },
                user_id,
            )
            .unwrap();

        assert_eq!(updated.object.name, "Impact drill");
        assert_eq!(updated.object.description, None);
        assert_eq!(updated.object.photo_url, None);
        assert_eq!(updated.object.added_by, user_id);
        assert_eq!(updated.object.created_at, drill.object.created_at);
    }

    #[test]
    fn delete_removes_object_and_history() {
        let Fixture { mut db, user_id } = fixture();
        let garage = db.create_location("Garage", None, None).unwrap();
        let attic = db.create_location("Attic", None, None).unwrap();

        let drill = db
            .create_object(&NewObject {
                location_id: Some(garage.id),
                ..new_object("Drill", user_id)
            })
            .unwrap();
        let mut update = as_update(&drill);
        update.location_id = Some(attic.id);
        db.update_object(drill.object.id, &update, user_id).unwrap();

        db.delete_object(drill.object.id).unwrap();

        assert!(matches!(db.get_object(drill.object.id), Err(StoreError::NotFound)));
        let remaining: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM object_history", [], |row| row.get(0))
            .unwrap();
        assert_eq!(remaining, 0);
    }

    #[test]
    fn delete_missing_object_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(db.delete_object(1), Err(StoreError::NotFound)));
    }

    // End to end: create, move, audit, then free the emptied location for
    // deletion.
    #[test]
    fn garage_to_attic_round_trip() {
        let Fixture { mut db, user_id } = fixture();

        let garage = db.create_location("Garage", None, None).unwrap();
        let drill = db
            .create_object(&NewObject {
                location_id: Some(garage.id),
                ..new_object("Drill", user_id)
            })
            .unwrap();

        let attic = db.create_location("Attic", None, None).unwrap();
        let mut update = as_update(&drill);
        update.location_id = Some(attic.id);
        db.update_object(drill.object.id, &update, user_id).unwrap();

        let history = db.history_for_object(drill.object.id).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].from_location_name.as_deref(), Some("Garage"));
        assert_eq!(history[0].to_location_name.as_deref(), Some("Attic"));
        assert_eq!(history[0].moved_by_name.as_deref(), Some("Alice"));

        // Nothing is left in the garage, so it can now be deleted.
        db.delete_location(garage.id).unwrap();
        assert!(matches!(db.get_location(garage.id), Err(StoreError::NotFound)));
    }
}
