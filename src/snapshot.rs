//! Snapshot load and save.
//!
//! Grounded on the original's `dynamock.go` (`NewDBFromReader`/`WriteSnap`):
//! decode a structured document into typed tables, indexing each as it
//! loads; encode the reverse. Error variants modeled on `src/input/mod.rs`'s
//! `LoadError`.

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::attribute::{item_from_json, item_to_json};
use crate::config::EngineConfig;
use crate::db::Database;
use crate::error::Error as EngineError;
use crate::schema::Schema;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("table {table}: {source}")]
    Table {
        table: String,
        #[source]
        source: EngineError,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct JsonTable {
    name: String,
    schema: Schema,
    #[serde(default)]
    items: Vec<serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize)]
struct JsonDb {
    tables: Vec<JsonTable>,
}

/// Loads a [`Database`] from a snapshot document, preserving table
/// insertion order and rejecting duplicate primary keys within a table.
pub fn load<R: Read>(reader: R, config: EngineConfig) -> Result<Database, SnapshotError> {
    let doc: JsonDb = serde_json::from_reader(reader)?;
    let mut db = Database::new(config);
    for table in doc.tables {
        let items = table
            .items
            .iter()
            .map(item_from_json)
            .collect::<Result<Vec<_>, EngineError>>()
            .map_err(|source| SnapshotError::Table {
                table: table.name.clone(),
                source,
            })?;
        db.add_table(table.name.clone(), table.schema);
        db.table(&table.name)
            .expect("just added")
            .load_items(items)
            .map_err(|source| SnapshotError::Table {
                table: table.name,
                source,
            })?;
    }
    Ok(db)
}

/// Writes the current state of `db` back out as a snapshot document, in the
/// same table order it was loaded (or created) in.
pub fn save<W: Write>(db: &Database, writer: W) -> Result<(), SnapshotError> {
    let tables = db
        .table_names()
        .iter()
        .map(|name| {
            let table = db.table(name).expect("listed table exists");
            JsonTable {
                name: name.clone(),
                schema: table.schema().clone(),
                items: table.all_items().iter().map(item_to_json).collect(),
            }
        })
        .collect();
    let doc = JsonDb { tables };
    serde_json::to_writer_pretty(writer, &doc)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs::File;

    use super::*;
    use serde_json::json;

    #[test]
    fn loads_a_table_with_items() {
        let doc = json!({
            "tables": [{
                "name": "product",
                "schema": { "primaryKey": { "partitionKey": { "name": "id", "type": "string" } } },
                "items": [{"id": "1", "name": "red pen", "price": 11}]
            }]
        });
        let bytes = serde_json::to_vec(&doc).unwrap();
        let db = load(bytes.as_slice(), EngineConfig::default()).unwrap();
        assert_eq!(db.table_names(), &["product".to_string()]);
        let table = db.table("product").unwrap();
        let key = indexmap::indexmap! { "id".to_string() => crate::attribute::AttributeValue::S("1".into()) };
        let item = table.get(&key).unwrap().unwrap();
        assert_eq!(item.get("price").unwrap().as_n(), Some("11"));
    }

    #[test]
    fn rejects_duplicate_primary_key_at_load() {
        let doc = json!({
            "tables": [{
                "name": "product",
                "schema": { "primaryKey": { "partitionKey": { "name": "id", "type": "string" } } },
                "items": [
                    {"id": "1", "name": "a"},
                    {"id": "1", "name": "b"}
                ]
            }]
        });
        let bytes = serde_json::to_vec(&doc).unwrap();
        let err = load(bytes.as_slice(), EngineConfig::default()).unwrap_err();
        assert!(matches!(err, SnapshotError::Table { .. }));
    }

    #[test]
    fn save_then_load_round_trips_table_order() {
        let doc = json!({
            "tables": [
                {
                    "name": "b_table",
                    "schema": { "primaryKey": { "partitionKey": { "name": "id", "type": "string" } } },
                    "items": []
                },
                {
                    "name": "a_table",
                    "schema": { "primaryKey": { "partitionKey": { "name": "id", "type": "string" } } },
                    "items": [{"id": "x"}]
                }
            ]
        });
        let bytes = serde_json::to_vec(&doc).unwrap();
        let db = load(bytes.as_slice(), EngineConfig::default()).unwrap();

        let mut out = Vec::new();
        save(&db, &mut out).unwrap();
        let reloaded = load(out.as_slice(), EngineConfig::default()).unwrap();
        assert_eq!(reloaded.table_names(), &["b_table".to_string(), "a_table".to_string()]);
    }

    #[test]
    fn load_preserves_declared_table_order() {
        let doc = json!({
            "tables": [
                {
                    "name": "b_table",
                    "schema": { "primaryKey": { "partitionKey": { "name": "id", "type": "string" } } },
                    "items": []
                },
                {
                    "name": "a_table",
                    "schema": { "primaryKey": { "partitionKey": { "name": "id", "type": "string" } } },
                    "items": []
                }
            ]
        });
        let bytes = serde_json::to_vec(&doc).unwrap();
        let db = load(bytes.as_slice(), EngineConfig::default()).unwrap();
        insta::assert_debug_snapshot!(db.table_names(), @r#"
        [
            "b_table",
            "a_table",
        ]
        "#);
    }

    #[test]
    fn save_then_load_round_trips_through_a_real_file() {
        let doc = json!({
            "tables": [{
                "name": "product",
                "schema": { "primaryKey": { "partitionKey": { "name": "id", "type": "string" } } },
                "items": [{"id": "1", "name": "red pen", "price": 11}]
            }]
        });
        let bytes = serde_json::to_vec(&doc).unwrap();
        let db = load(bytes.as_slice(), EngineConfig::default()).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        save(&db, File::create(&path).unwrap()).unwrap();

        let reloaded = load(File::open(&path).unwrap(), EngineConfig::default()).unwrap();
        let key = indexmap::indexmap! { "id".to_string() => crate::attribute::AttributeValue::S("1".into()) };
        let item = reloaded.table("product").unwrap().get(&key).unwrap().unwrap();
        assert_eq!(item.get("name").unwrap().as_s(), Some("red pen"));
    }
}
