use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension};
use std::collections::BTreeSet;

/// Tag repository
pub struct TagRepo;

impl TagRepo {
    /// Get the id of a tag, creating the tag if needed
    pub fn get_or_create(conn: &Connection, name: &str) -> Result<i64> {
        let existing: Option<i64> = conn
            .query_row("SELECT id FROM tags WHERE name = ?1", [name], |row| row.get(0))
            .optional()?;
        if let Some(id) = existing {
            return Ok(id);
        }

        conn.execute("INSERT INTO tags (name) VALUES (?1)", [name])
            .with_context(|| format!("Failed to create tag: {}", name))?;
        Ok(conn.last_insert_rowid())
    }

    /// Tag names attached to a fact
    pub fn get_for_fact(conn: &Connection, fact_id: i64) -> Result<BTreeSet<String>> {
        let mut stmt = conn.prepare(
            "SELECT t.name FROM fact_tags ft JOIN tags t ON t.id = ft.tag_id
             WHERE ft.fact_id = ?1 ORDER BY t.name",
        )?;
        let rows = stmt.query_map([fact_id], |row| row.get::<_, String>(0))?;

        let mut tags = BTreeSet::new();
        for row in rows {
            tags.insert(row?);
        }
        Ok(tags)
    }

    /// Replace the tags of a fact
    pub fn set_for_fact(conn: &Connection, fact_id: i64, tags: &BTreeSet<String>) -> Result<()> {
        conn.execute("DELETE FROM fact_tags WHERE fact_id = ?1", [fact_id])?;
        for tag in tags {
            let tag_id = Self::get_or_create(conn, tag)?;
            conn.execute(
                "INSERT OR IGNORE INTO fact_tags (fact_id, tag_id) VALUES (?1, ?2)",
                [fact_id, tag_id],
            )?;
        }
        Ok(())
    }
}
