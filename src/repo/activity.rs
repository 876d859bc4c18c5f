use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension};

use crate::models::{Activity, Category};
use crate::repo::CategoryRepo;

/// Activity repository
///
/// Activities are identified by `(name, category)`. The same name filed under
/// two categories (or under none) yields two separate rows.
pub struct ActivityRepo;

impl ActivityRepo {
    /// Look up an activity, creating it (and its category) on demand
    pub fn get_or_create(conn: &Connection, name: &str, category: Option<&str>) -> Result<Activity> {
        let category = match category {
            Some(category) => Some(CategoryRepo::get_or_create(conn, category)?),
            None => None,
        };
        let category_id = category.as_ref().and_then(|c| c.id);

        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM activities WHERE name = ?1 AND category_id IS ?2",
                rusqlite::params![name, category_id],
                |row| row.get(0),
            )
            .optional()?;

        let id = match existing {
            Some(id) => id,
            None => {
                conn.execute(
                    "INSERT INTO activities (name, category_id) VALUES (?1, ?2)",
                    rusqlite::params![name, category_id],
                )
                .with_context(|| format!("Failed to create activity: {}", name))?;
                log::debug!("Created activity '{}'", name);
                conn.last_insert_rowid()
            }
        };

        Ok(Activity {
            id: Some(id),
            name: name.to_string(),
            category,
        })
    }

    /// All activities, optionally restricted to names containing `search_term`
    /// (case-insensitive). Ordered by activity name, then category name.
    pub fn get_all(conn: &Connection, search_term: Option<&str>) -> Result<Vec<Activity>> {
        let term = search_term.map(str::trim).filter(|t| !t.is_empty());

        let mut stmt = conn.prepare(
            "SELECT a.id, a.name, c.id, c.name
             FROM activities a
             LEFT JOIN categories c ON c.id = a.category_id
             WHERE ?1 IS NULL OR instr(lower(a.name), lower(?1)) > 0
             ORDER BY lower(a.name), c.name, a.id",
        )?;
        let rows = stmt.query_map([term], |row| {
            let category_id: Option<i64> = row.get(2)?;
            let category_name: Option<String> = row.get(3)?;
            let category = match (category_id, category_name) {
                (Some(id), Some(name)) => Some(Category { id: Some(id), name }),
                _ => None,
            };
            Ok(Activity {
                id: Some(row.get(0)?),
                name: row.get(1)?,
                category,
            })
        })?;

        let mut activities = Vec::new();
        for row in rows {
            activities.push(row?);
        }
        Ok(activities)
    }
}
