use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension};

use crate::models::Category;

/// Category repository
pub struct CategoryRepo;

impl CategoryRepo {
    /// Get category by name
    pub fn get_by_name(conn: &Connection, name: &str) -> Result<Option<Category>> {
        let category = conn
            .query_row(
                "SELECT id, name FROM categories WHERE name = ?1",
                [name],
                |row| {
                    Ok(Category {
                        id: Some(row.get(0)?),
                        name: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(category)
    }

    /// Look up a category by name, creating it if it does not exist yet
    pub fn get_or_create(conn: &Connection, name: &str) -> Result<Category> {
        if let Some(category) = Self::get_by_name(conn, name)? {
            return Ok(category);
        }

        conn.execute("INSERT INTO categories (name) VALUES (?1)", [name])
            .with_context(|| format!("Failed to create category: {}", name))?;
        log::debug!("Created category '{}'", name);

        Ok(Category {
            id: Some(conn.last_insert_rowid()),
            name: name.to_string(),
        })
    }

    /// All categories ordered by name
    pub fn get_all(conn: &Connection) -> Result<Vec<Category>> {
        let mut stmt = conn.prepare("SELECT id, name FROM categories ORDER BY name, id")?;
        let rows = stmt.query_map([], |row| {
            Ok(Category {
                id: Some(row.get(0)?),
                name: row.get(1)?,
            })
        })?;

        let mut categories = Vec::new();
        for row in rows {
            categories.push(row?);
        }
        Ok(categories)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbConnection;

    #[test]
    fn test_get_or_create_is_stable() {
        let conn = DbConnection::connect_in_memory().unwrap();
        let first = CategoryRepo::get_or_create(&conn, "work").unwrap();
        let second = CategoryRepo::get_or_create(&conn, "work").unwrap();
        assert!(first.id.is_some());
        assert_eq!(first, second);
    }

    #[test]
    fn test_get_all_sorted() {
        let conn = DbConnection::connect_in_memory().unwrap();
        CategoryRepo::get_or_create(&conn, "work").unwrap();
        CategoryRepo::get_or_create(&conn, "home").unwrap();

        let names: Vec<String> = CategoryRepo::get_all(&conn)
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["home", "work"]);
    }
}
