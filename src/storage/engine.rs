//! SQLite engine binding
//!
//! Owns the single in-memory connection of a library session. The database
//! never lives on disk directly: it is restored from, and serialized back
//! to, a byte image handed over by the durable store.

use std::path::Path;

use rusqlite::backup::Progress;
use rusqlite::types::Value;
use rusqlite::{Connection, DatabaseName, OptionalExtension, Params, Transaction};
use tracing::debug;

use crate::Result;
use super::schema;

/// One result row: column names paired with values, in select order.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    /// Value of the named column, if the row has it
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Column names in select order
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// In-memory SQLite database handle
pub struct Engine {
    conn: Connection,
}

impl Engine {
    /// Open an empty in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// Restore a serialized database image into a fresh in-memory database.
    ///
    /// Fails with a storage error when the bytes are not a readable
    /// SQLite database.
    pub fn from_image(image: &[u8]) -> Result<Self> {
        let scratch = tempfile::NamedTempFile::new()?;
        std::fs::write(scratch.path(), image)?;

        let mut conn = Connection::open_in_memory()?;
        conn.restore(DatabaseName::Main, scratch.path(), None::<fn(Progress)>)?;
        debug!(bytes = image.len(), "restored database image");
        Ok(Self { conn })
    }

    /// Serialize the whole main database into a SQLite file image
    pub fn image(&self) -> Result<Vec<u8>> {
        let scratch = tempfile::NamedTempFile::new()?;
        self.write_image_to(scratch.path())?;
        let image = std::fs::read(scratch.path())?;
        debug!(bytes = image.len(), "serialized database image");
        Ok(image)
    }

    fn write_image_to(&self, path: &Path) -> Result<()> {
        self.conn.backup(DatabaseName::Main, path, None)?;
        Ok(())
    }

    /// Create tables and indexes that are not there yet
    pub fn bootstrap(&self) -> Result<()> {
        for stmt in schema::all_schema_statements() {
            self.conn.execute(stmt, [])?;
        }
        Ok(())
    }

    /// Execute a statement that returns no rows
    pub fn execute<P: Params>(&self, sql: &str, params: P) -> Result<usize> {
        Ok(self.conn.execute(sql, params)?)
    }

    /// Run a query and return every row as a column → value mapping
    pub fn query<P: Params>(&self, sql: &str, params: P) -> Result<Vec<Row>> {
        let mut stmt = self.conn.prepare(sql)?;
        let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let rows = stmt
            .query_map(params, |row| {
                let mut columns = Vec::with_capacity(names.len());
                for (idx, name) in names.iter().enumerate() {
                    columns.push((name.clone(), row.get::<_, Value>(idx)?));
                }
                Ok(Row { columns })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
    }

    /// Run a query and convert each row with `f`
    pub fn query_map<T, P, F>(&self, sql: &str, params: P, f: F) -> Result<Vec<T>>
    where
        P: Params,
        F: FnMut(&rusqlite::Row<'_>) -> rusqlite::Result<T>,
    {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, f)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Run a query expected to return at most one row
    pub fn query_opt<T, P, F>(&self, sql: &str, params: P, f: F) -> Result<Option<T>>
    where
        P: Params,
        F: FnOnce(&rusqlite::Row<'_>) -> rusqlite::Result<T>,
    {
        Ok(self.conn.query_row(sql, params, f).optional()?)
    }

    /// Count rows of a table
    pub fn count(&self, table: &str) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Begin a transaction; dropping it without `commit` rolls back
    pub fn transaction(&mut self) -> Result<Transaction<'_>> {
        Ok(self.conn.transaction()?)
    }

    /// Tables and indexes defined in the database, as `(type, name)` pairs
    pub fn schema_objects(&self) -> Result<Vec<(String, String)>> {
        let rows = self.query(
            "SELECT type, name FROM sqlite_master WHERE type IN ('table', 'index') AND name NOT LIKE 'sqlite_%' ORDER BY type, name",
            [],
        )?;

        let objects = rows
            .iter()
            .filter_map(|row| match (row.get("type"), row.get("name")) {
                (Some(Value::Text(kind)), Some(Value::Text(name))) => {
                    Some((kind.clone(), name.clone()))
                }
                _ => None,
            })
            .collect();

        Ok(objects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_query_preserves_column_order() {
        let engine = Engine::open_in_memory().unwrap();
        let rows = engine.query("SELECT 2 AS b, 'x' AS a", []).unwrap();

        assert_eq!(rows.len(), 1);
        let columns: Vec<_> = rows[0].columns().collect();
        assert_eq!(columns, vec!["b", "a"]);
        assert_eq!(rows[0].get("b"), Some(&Value::Integer(2)));
        assert_eq!(rows[0].get("a"), Some(&Value::Text("x".to_string())));
        assert_eq!(rows[0].get("missing"), None);
    }

    #[test]
    fn test_malformed_sql_is_storage_error() {
        let engine = Engine::open_in_memory().unwrap();
        let err = engine.execute("CREATE TABLE (", []).unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
    }

    #[test]
    fn test_bootstrap_is_idempotent() {
        let engine = Engine::open_in_memory().unwrap();
        engine.bootstrap().unwrap();
        let first = engine.schema_objects().unwrap();
        engine.bootstrap().unwrap();
        let second = engine.schema_objects().unwrap();

        assert_eq!(first, second);
        assert!(first.contains(&("table".to_string(), "books".to_string())));
        assert!(first.contains(&("index".to_string(), "idx_exchanges_friend_id".to_string())));
    }

    #[test]
    fn test_image_roundtrip() {
        let engine = Engine::open_in_memory().unwrap();
        engine.bootstrap().unwrap();
        engine
            .execute("INSERT INTO friends (name) VALUES (?1)", ["Alice"])
            .unwrap();

        let image = engine.image().unwrap();
        assert!(image.starts_with(b"SQLite format 3\0"));

        let restored = Engine::from_image(&image).unwrap();
        let names = restored
            .query_map("SELECT name FROM friends", [], |row| row.get::<_, String>(0))
            .unwrap();
        assert_eq!(names, vec!["Alice".to_string()]);
    }

    #[test]
    fn test_from_image_rejects_garbage() {
        let mut bytes = b"SQLite format 3\0".to_vec();
        bytes.extend(std::iter::repeat(0xAB).take(4096));
        assert!(Engine::from_image(&bytes).is_err());
    }

    #[test]
    fn test_dropped_transaction_rolls_back() {
        let mut engine = Engine::open_in_memory().unwrap();
        engine.bootstrap().unwrap();
        {
            let tx = engine.transaction().unwrap();
            tx.execute("INSERT INTO friends (name) VALUES ('Bob')", []).unwrap();
        }
        assert_eq!(engine.count("friends").unwrap(), 0);
    }
}
