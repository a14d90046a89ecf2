//! Read access to the object location-change audit trail.
//!
//! History rows are written only inside [`Database::update_object`]'s
//! transaction and are never modified afterwards; they disappear only when
//! their owning object is deleted.  There is deliberately no insert, update,
//! or delete helper here.
//!
//! [`Database::update_object`]: crate::Database::update_object

use rusqlite::params;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{timestamp_column, ObjectHistory, ObjectHistoryDetails};

const HISTORY_SELECT_SQL: &str = "SELECT
    h.id,
    h.object_id,
    h.from_location_id,
    h.to_location_id,
    h.moved_by,
    h.moved_at,
    h.notes,
    fl.name AS from_location_name,
    tl.name AS to_location_name,
    u.name AS moved_by_name
 FROM object_history h
 LEFT JOIN locations fl ON h.from_location_id = fl.id
 LEFT JOIN locations tl ON h.to_location_id = tl.id
 LEFT JOIN users u ON h.moved_by = u.id";

impl Database {
    /// Full movement history of an object, most recent move first.
    pub fn history_for_object(&self, object_id: i64) -> Result<Vec<ObjectHistoryDetails>> {
        let mut stmt = self.conn().prepare(&format!(
            "{HISTORY_SELECT_SQL}
             WHERE h.object_id = ?1
             ORDER BY h.moved_at DESC, h.id DESC"
        ))?;

        let rows = stmt.query_map(params![object_id], row_to_history_details)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::from)
    }
}

/// Map a joined `rusqlite::Row` to an [`ObjectHistoryDetails`].
fn row_to_history_details(row: &rusqlite::Row<'_>) -> rusqlite::Result<ObjectHistoryDetails> {
    Ok(ObjectHistoryDetails {
        entry: ObjectHistory {
            id: row.get(0)?,
            object_id: row.get(1)?,
            from_location_id: row.get(2)?,
            to_location_id: row.get(3)?,
            moved_by: row.get(4)?,
            moved_at: timestamp_column(row, 5)?,
            notes: row.get(6)?,
        },
        from_location_name: row.get(7)?,
        to_location_name: row.get(8)?,
        moved_by_name: row.get(9)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::{NewObject, UpdateObject};

    #[test]
    fn history_is_ordered_most_recent_move_first() {
        let mut db = Database::open_in_memory().unwrap();
        let user = db.create_user("Alice", "alice@example.com", "hash").unwrap();
        let garage = db.create_location("Garage", None, None).unwrap();
        let attic = db.create_location("Attic", None, None).unwrap();
        let basement = db.create_location("Basement", None, None).unwrap();

        let drill = db
            .create_object(&NewObject {
                name: "Drill".to_string(),
                description: None,
                category_id: None,
                location_id: Some(garage.id),
                photo_url: None,
                added_by: user.id,
            })
            .unwrap();

        for destination in [attic.id, basement.id] {
            db.update_object(
                drill.object.id,
                &UpdateObject {
                    name: "Drill".to_string(),
                    description: None,
                    category_id: None,
                    location_id: Some(destination),
                    photo_url: None,
                },
                user.id,
            )
            .unwrap();
        }

        let history = db.history_for_object(drill.object.id).unwrap();
        assert_eq!(history.len(), 2);

        // Latest move (attic -> basement) comes first.
        assert_eq!(history[0].entry.from_location_id, Some(attic.id));
        assert_eq!(history[0].entry.to_location_id, Some(basement.id));
        assert_eq!(history[0].to_location_name.as_deref(), Some("Basement"));
        assert_eq!(history[1].from_location_name.as_deref(), Some("Garage"));
        assert_eq!(history[1].to_location_name.as_deref(), Some("Attic"));
        assert!(history[0].entry.moved_at >= history[1].entry.moved_at);
        assert_eq!(history[0].moved_by_name.as_deref(), Some("Alice"));
    }

    #[test]
    fn history_survives_location_deletion_with_names_cleared() {
        let mut db = Database::open_in_memory().unwrap();
        let user = db.create_user("Alice", "alice@example.com", "hash").unwrap();
        let garage = db.create_location("Garage", None, None).unwrap();
        let attic = db.create_location("Attic", None, None).unwrap();

        let drill = db
            .create_object(&NewObject {
                name: "Drill".to_string(),
                description: None,
                category_id: None,
                location_id: Some(garage.id),
                photo_url: None,
                added_by: user.id,
            })
            .unwrap();
        db.update_object(
            drill.object.id,
            &UpdateObject {
                name: "Drill".to_string(),
                description: None,
                category_id: None,
                location_id: Some(attic.id),
                photo_url: None,
            },
            user.id,
        )
        .unwrap();

        // The garage is empty now, so it can be removed; the audit row keeps
        // existing with its origin reference cleared.
        db.delete_location(garage.id).unwrap();

        let history = db.history_for_object(drill.object.id).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].entry.from_location_id, None);
        assert_eq!(history[0].from_location_name, None);
        assert_eq!(history[0].entry.to_location_id, Some(attic.id));
    }
}
