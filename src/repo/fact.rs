use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OptionalExtension, Row};

use crate::models::{Activity, Category, Fact};
use crate::repo::{ActivityRepo, StoreError, TagRepo};

/// Backend query for [`FactRepo::get_all`]. Unset fields do not restrict.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FactQuery {
    /// Facts starting at or after this instant
    pub start: Option<NaiveDateTime>,
    /// Facts ending at or before this instant
    pub end: Option<NaiveDateTime>,
    /// Case-insensitive substring of the activity name
    pub filter_term: Option<String>,
}

const FACT_SELECT: &str = "SELECT f.id, f.start_ts, f.end_ts, f.description, a.id, a.name, c.id, c.name
     FROM facts f
     JOIN activities a ON a.id = f.activity_id
     LEFT JOIN categories c ON c.id = a.category_id";

/// Fact repository
///
/// Complete facts and the single ongoing fact share the `facts` table. The
/// ongoing fact is the row without an end; a partial unique index keeps it
/// unique, and [`FactRepo::save`] checks for it before inserting.
pub struct FactRepo;

impl FactRepo {
    /// Complete facts matching `query`, ordered by start then id
    pub fn get_all(conn: &Connection, query: &FactQuery) -> Result<Vec<Fact>> {
        let mut sql = format!("{} WHERE f.end_ts IS NOT NULL", FACT_SELECT);
        let mut params: Vec<Value> = Vec::new();

        if let Some(start) = query.start {
            params.push(Value::Integer(to_ts(start)));
            sql.push_str(&format!(" AND f.start_ts >= ?{}", params.len()));
        }
        if let Some(end) = query.end {
            params.push(Value::Integer(to_ts(end)));
            sql.push_str(&format!(" AND f.end_ts <= ?{}", params.len()));
        }
        if let Some(term) = query.filter_term.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            params.push(Value::Text(term.to_string()));
            sql.push_str(&format!(" AND instr(lower(a.name), lower(?{})) > 0", params.len()));
        }
        sql.push_str(" ORDER BY f.start_ts, f.id");

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(params.iter()), fact_from_row)?;

        let mut facts = Vec::new();
        for row in rows {
            facts.push(row?);
        }
        for fact in &mut facts {
            if let Some(id) = fact.id {
                fact.tags = TagRepo::get_for_fact(conn, id)?;
            }
        }
        Ok(facts)
    }

    /// Get a complete fact by id
    pub fn get(conn: &Connection, id: i64) -> Result<Option<Fact>> {
        let sql = format!("{} WHERE f.id = ?1 AND f.end_ts IS NOT NULL", FACT_SELECT);
        let fact = conn.query_row(&sql, [id], fact_from_row).optional()?;

        match fact {
            Some(mut fact) => {
                fact.tags = TagRepo::get_for_fact(conn, id)?;
                Ok(Some(fact))
            }
            None => Ok(None),
        }
    }

    /// Persist a fact.
    ///
    /// A fact without an end becomes the ongoing fact. A fact with an id is
    /// updated in place, anything else is inserted as a new complete fact.
    pub fn save(conn: &Connection, fact: &Fact, min_delta: i64) -> Result<Fact> {
        if fact.id.is_some() {
            return Self::update(conn, fact, min_delta);
        }
        if fact.end.is_none() {
            return Self::start_tmp_fact(conn, fact);
        }

        validate_complete(fact, min_delta)?;
        let start = fact.start.ok_or(StoreError::MissingStart)?;

        let tx = conn.unchecked_transaction()?;
        let activity = resolve_activity(&tx, &fact.activity)?;
        tx.execute(
            "INSERT INTO facts (activity_id, start_ts, end_ts, description) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![
                activity.id,
                to_ts(start),
                fact.end.map(to_ts),
                fact.description
            ],
        )
        .context("Failed to insert fact")?;
        let id = tx.last_insert_rowid();
        TagRepo::set_for_fact(&tx, id, &fact.tags)?;
        tx.commit()?;

        log::info!("Saved fact #{}: {}", id, fact);
        Ok(Fact {
            id: Some(id),
            activity,
            ..fact.clone()
        })
    }

    /// Overwrite a persisted complete fact
    pub fn update(conn: &Connection, fact: &Fact, min_delta: i64) -> Result<Fact> {
        let id = fact.id.context("Cannot update a fact that was never saved")?;
        if Self::get(conn, id)?.is_none() {
            return Err(StoreError::FactNotFound(id).into());
        }
        validate_complete(fact, min_delta)?;
        let start = fact.start.ok_or(StoreError::MissingStart)?;

        let tx = conn.unchecked_transaction()?;
        let activity = resolve_activity(&tx, &fact.activity)?;
        tx.execute(
            "UPDATE facts SET activity_id = ?1, start_ts = ?2, end_ts = ?3, description = ?4
             WHERE id = ?5",
            rusqlite::params![
                activity.id,
                to_ts(start),
                fact.end.map(to_ts),
                fact.description,
                id
            ],
        )
        .with_context(|| format!("Failed to update fact #{}", id))?;
        TagRepo::set_for_fact(&tx, id, &fact.tags)?;
        tx.commit()?;

        log::info!("Updated fact #{}: {}", id, fact);
        Ok(Fact {
            activity,
            ..fact.clone()
        })
    }

    /// Delete a complete fact
    pub fn remove(conn: &Connection, id: i64) -> Result<()> {
        let deleted = conn
            .execute("DELETE FROM facts WHERE id = ?1 AND end_ts IS NOT NULL", [id])
            .with_context(|| format!("Failed to delete fact #{}", id))?;
        if deleted == 0 {
            return Err(StoreError::FactNotFound(id).into());
        }
        log::info!("Removed fact #{}", id);
        Ok(())
    }

    /// The ongoing fact, if any
    pub fn get_tmp_fact(conn: &Connection) -> Result<Option<Fact>> {
        let sql = format!("{} WHERE f.end_ts IS NULL", FACT_SELECT);
        let fact = conn.query_row(&sql, [], fact_from_row).optional()?;

        match fact {
            Some(mut fact) => {
                if let Some(id) = fact.id {
                    fact.tags = TagRepo::get_for_fact(conn, id)?;
                }
                Ok(Some(fact))
            }
            None => Ok(None),
        }
    }

    /// End the ongoing fact at `end` and persist it as a complete fact
    pub fn stop_tmp_fact(conn: &Connection, end: NaiveDateTime, min_delta: i64) -> Result<Fact> {
        let mut fact = Self::get_tmp_fact(conn)?.ok_or(StoreError::NoOngoingFact)?;
        let id = fact.id.context("Ongoing fact has no id")?;
        fact.end = Some(end);
        validate_complete(&fact, min_delta)?;

        conn.execute(
            "UPDATE facts SET end_ts = ?1 WHERE id = ?2",
            rusqlite::params![to_ts(end), id],
        )
        .context("Failed to stop ongoing fact")?;

        log::info!("Stopped ongoing fact #{}: {}", id, fact);
        Ok(fact)
    }

    /// Discard the ongoing fact without persisting it
    pub fn cancel_tmp_fact(conn: &Connection) -> Result<Fact> {
        let fact = Self::get_tmp_fact(conn)?.ok_or(StoreError::NoOngoingFact)?;
        let id = fact.id.context("Ongoing fact has no id")?;

        conn.execute("DELETE FROM facts WHERE id = ?1", [id])
            .context("Failed to cancel ongoing fact")?;

        log::info!("Cancelled ongoing fact: {}", fact);
        Ok(fact)
    }

    fn start_tmp_fact(conn: &Connection, fact: &Fact) -> Result<Fact> {
        if let Some(existing) = Self::get_tmp_fact(conn)? {
            return Err(StoreError::OngoingFactExists(existing.to_string()).into());
        }
        if fact.activity.name.trim().is_empty() {
            return Err(StoreError::EmptyActivity.into());
        }
        let start = fact.start.ok_or(StoreError::MissingStart)?;

        let tx = conn.unchecked_transaction()?;
        let activity = resolve_activity(&tx, &fact.activity)?;
        tx.execute(
            "INSERT INTO facts (activity_id, start_ts, end_ts, description) VALUES (?1, ?2, NULL, ?3)",
            rusqlite::params![activity.id, to_ts(start), fact.description],
        )
        .context("Failed to insert ongoing fact")?;
        let id = tx.last_insert_rowid();
        TagRepo::set_for_fact(&tx, id, &fact.tags)?;
        tx.commit()?;

        log::info!("Started ongoing fact #{}: {}", id, fact);
        Ok(Fact {
            id: Some(id),
            activity,
            ..fact.clone()
        })
    }
}

fn resolve_activity(conn: &Connection, activity: &Activity) -> Result<Activity> {
    ActivityRepo::get_or_create(
        conn,
        activity.name.trim(),
        activity.category.as_ref().map(|c| c.name.as_str()),
    )
}

fn validate_complete(fact: &Fact, min_delta: i64) -> Result<(), StoreError> {
    if fact.activity.name.trim().is_empty() {
        return Err(StoreError::EmptyActivity);
    }
    let start = fact.start.ok_or(StoreError::MissingStart)?;
    if let Some(end) = fact.end {
        if end < start {
            return Err(StoreError::EndBeforeStart { start, end });
        }
        let actual = (end - start).num_seconds();
        if actual < min_delta {
            return Err(StoreError::FactTooShort { actual, min: min_delta });
        }
    }
    Ok(())
}

fn to_ts(dt: NaiveDateTime) -> i64 {
    dt.and_utc().timestamp()
}

fn from_ts(ts: i64, column: usize) -> rusqlite::Result<NaiveDateTime> {
    DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.naive_utc())
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(column, ts))
}

fn fact_from_row(row: &Row) -> rusqlite::Result<Fact> {
    let start = from_ts(row.get(1)?, 1)?;
    let end = match row.get::<_, Option<i64>>(2)? {
        Some(ts) => Some(from_ts(ts, 2)?),
        None => None,
    };
    let category_id: Option<i64> = row.get(6)?;
    let category_name: Option<String> = row.get(7)?;
    let category = match (category_id, category_name) {
        (Some(id), Some(name)) => Some(Category { id: Some(id), name }),
        _ => None,
    };

    Ok(Fact {
        id: Some(row.get(0)?),
        activity: Activity {
            id: Some(row.get(4)?),
            name: row.get(5)?,
            category,
        },
        start: Some(start),
        end,
        description: row.get(3)?,
        tags: Default::default(),
    })
}
