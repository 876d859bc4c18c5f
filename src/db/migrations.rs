use rusqlite::{Connection, Result};
use std::collections::HashMap;

/// Current database schema version
const CURRENT_VERSION: u32 = 2;

/// Migration system for managing database schema versions
pub struct MigrationManager;

impl MigrationManager {
    /// Initialize the database with the current schema
    /// This creates the schema_version table and applies all migrations
    pub fn initialize(conn: &Connection) -> Result<()> {
        conn.execute("PRAGMA foreign_keys=ON", [])?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            )",
            [],
        )?;

        let current_version = Self::get_version(conn)?;

        for version in (current_version + 1)..=CURRENT_VERSION {
            Self::apply_migration(conn, version)?;
        }

        Ok(())
    }

    /// Apply a specific migration by version number
    fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
        let migrations = get_migrations();
        if let Some(migration) = migrations.get(&version) {
            let tx = conn.unchecked_transaction()?;
            migration(&tx)?;
            tx.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                [version],
            )?;
            tx.commit()?;
            Ok(())
        } else {
            Err(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_MISUSE),
                Some(format!("No migration found for version {}", version)),
            ))
        }
    }

    /// Get the current schema version
    pub fn get_version(conn: &Connection) -> Result<u32> {
        conn.query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        )
    }
}

type Migration = fn(&rusqlite::Transaction) -> Result<(), rusqlite::Error>;

/// Get all migrations indexed by version
fn get_migrations() -> HashMap<u32, Migration> {
    let mut migrations: HashMap<u32, Migration> = HashMap::new();
    migrations.insert(1, migration_v1);
    migrations.insert(2, migration_v2);
    migrations
}

/// Migration v1: Initial schema
fn migration_v1(tx: &rusqlite::Transaction) -> Result<(), rusqlite::Error> {
    tx.execute(
        "CREATE TABLE categories (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE
        )",
        [],
    )?;

    tx.execute(
        "CREATE TABLE activities (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            category_id INTEGER NULL REFERENCES categories(id)
        )",
        [],
    )?;
    // NULL categories compare distinct in UNIQUE constraints, so key on IFNULL
    tx.execute(
        "CREATE UNIQUE INDEX ux_activities_name_category ON activities(name, IFNULL(category_id, 0))",
        [],
    )?;

    tx.execute(
        "CREATE TABLE facts (
            id INTEGER PRIMARY KEY,
            activity_id INTEGER NOT NULL REFERENCES activities(id),
            start_ts INTEGER NOT NULL,
            end_ts INTEGER NULL,
            description TEXT NULL
        )",
        [],
    )?;
    tx.execute(
        "CREATE INDEX idx_facts_start ON facts(start_ts)",
        [],
    )?;

    // At most one ongoing fact
    tx.execute(
        "CREATE UNIQUE INDEX ux_facts_single_ongoing ON facts((end_ts IS NULL)) WHERE end_ts IS NULL",
        [],
    )?;

    Ok(())
}

/// Migration v2: Tags
fn migration_v2(tx: &rusqlite::Transaction) -> Result<(), rusqlite::Error> {
    tx.execute(
        "CREATE TABLE tags (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE
        )",
        [],
    )?;

    tx.execute(
        "CREATE TABLE fact_tags (
            fact_id INTEGER NOT NULL REFERENCES facts(id) ON DELETE CASCADE,
            tag_id INTEGER NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
            PRIMARY KEY(fact_id, tag_id)
        )",
        [],
    )?;
    tx.execute(
        "CREATE INDEX idx_fact_tags_tag ON fact_tags(tag_id)",
        [],
    )?;

    Ok(())
}
