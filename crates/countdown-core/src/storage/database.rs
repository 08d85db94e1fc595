//! SQLite-backed key-value store.
//!
//! One `kv` table in `countdown.db` under the data directory.

use std::path::Path;

use rusqlite::{params, Connection};

use super::{data_dir, KeyValueStore};
use crate::error::{CoreError, StorageError};

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open the database at `<data_dir>/countdown.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the data directory cannot be created or the
    /// database cannot be opened or migrated.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("countdown.db");
        Ok(Self::open_at(&path)?)
    }

    pub fn open_at(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path).map_err(|source| StorageError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(())
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kv_store() {
        let mut db = SqliteStore::open_memory().unwrap();
        assert!(db.get("test").unwrap().is_none());
        db.set("test", "hello").unwrap();
        assert_eq!(db.get("test").unwrap().unwrap(), "hello");
        db.set("test", "again").unwrap();
        assert_eq!(db.get("test").unwrap().unwrap(), "again");
    }

    #[test]
    fn values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("countdown.db");
        {
            let mut db = SqliteStore::open_at(&path).unwrap();
            db.set("k", "v").unwrap();
        }
        let db = SqliteStore::open_at(&path).unwrap();
        assert_eq!(db.get("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn open_in_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join("countdown.db");
        assert!(matches!(
            SqliteStore::open_at(&path),
            Err(StorageError::OpenFailed { .. })
        ));
    }
}
