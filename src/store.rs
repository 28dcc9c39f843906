//! SQLite storage of factory snapshots

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::models::Factory;

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- One row per factory; the snapshot column holds the full JSON document
        CREATE TABLE IF NOT EXISTS factories (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            snapshot TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_factories_updated ON factories(updated_at);
        "#,
    )?;
    Ok(())
}

/// Insert or replace a factory snapshot
pub fn save_factory(conn: &Connection, factory: &Factory) -> Result<()> {
    let snapshot = serde_json::to_string(factory)?;
    let updated_at = factory.updated_at.format(&Rfc3339)?;
    conn.execute(
        "INSERT OR REPLACE INTO factories (id, name, updated_at, snapshot)
         VALUES (?1, ?2, ?3, ?4)",
        (&factory.id, &factory.name, &updated_at, &snapshot),
    )?;
    Ok(())
}

pub fn load_factory(conn: &Connection, id: &str) -> Result<Option<Factory>> {
    let snapshot: Option<String> = conn
        .query_row(
            "SELECT snapshot FROM factories WHERE id = ?1",
            [id],
            |row| row.get(0),
        )
        .optional()?;

    snapshot
        .map(|text| {
            serde_json::from_str::<Factory>(&text)
                .with_context(|| format!("Corrupt snapshot for {id}"))
        })
        .transpose()
}

/// Remove a factory. Returns whether a row was deleted.
pub fn delete_factory(conn: &Connection, id: &str) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM factories WHERE id = ?1", [id])?;
    Ok(deleted > 0)
}

/// Listing entry for a stored factory
#[derive(Debug, Clone, PartialEq)]
pub struct FactorySummary {
    pub id: String,
    pub name: String,
    pub updated_at: OffsetDateTime,
}

/// List stored factories, most recently updated first
pub fn list_factories(conn: &Connection) -> Result<Vec<FactorySummary>> {
    let mut stmt = conn.prepare("SELECT id, name, updated_at FROM factories")?;

    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
        ))
    })?;

    let mut results = Vec::new();
    for row in rows {
        let (id, name, updated_at) = row?;
        let updated_at = OffsetDateTime::parse(&updated_at, &Rfc3339)
            .with_context(|| format!("Bad timestamp for {id}"))?;
        results.push(FactorySummary {
            id,
            name,
            updated_at,
        });
    }
    // Timestamps may carry different offsets, so sort on the parsed value.
    results.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| a.id.cmp(&b.id)));
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use time::Duration;

    fn open() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn save_and_load_round_trip() {
        let conn = open();
        let catalog = iron_catalog();
        let factory = factory(
            vec![
                building("S", 1.5, catalog.recipe("RecipeIngotIron").unwrap().clone()),
                building("P", 1.0, catalog.recipe("RecipeIronPlateC").unwrap().clone()),
            ],
            vec![link("c1", "S", "P", "IronIngot")],
        );

        save_factory(&conn, &factory).unwrap();
        assert_eq!(load_factory(&conn, &factory.id).unwrap(), Some(factory));
        assert_eq!(load_factory(&conn, "missing").unwrap(), None);
    }

    #[test]
    fn save_replaces_existing_snapshot() {
        let conn = open();
        let mut factory = Factory::new("f1");
        save_factory(&conn, &factory).unwrap();
        factory.name = "Iron works".to_string();
        save_factory(&conn, &factory).unwrap();

        let listed = list_factories(&conn).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "Iron works");
    }

    #[test]
    fn list_orders_by_recency() {
        let conn = open();
        let mut old = Factory::new("old");
        old.updated_at -= Duration::hours(1);
        let new = Factory::new("new");
        save_factory(&conn, &old).unwrap();
        save_factory(&conn, &new).unwrap();

        let ids: Vec<String> = list_factories(&conn)
            .unwrap()
            .into_iter()
            .map(|f| f.id)
            .collect();
        assert_eq!(ids, vec!["new", "old"]);
    }

    #[test]
    fn delete_reports_whether_anything_was_removed() {
        let conn = open();
        save_factory(&conn, &Factory::new("f1")).unwrap();
        assert!(delete_factory(&conn, "f1").unwrap());
        assert!(!delete_factory(&conn, "f1").unwrap());
    }
}
