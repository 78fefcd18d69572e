use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension};

use crate::services::database::Database;

use super::LocalStorage;

/// Key-value storage in the `local_storage` table.
pub struct SqliteStorage {
    db: Database,
}

impl SqliteStorage {
    /// Opens the database at `path` and makes sure the table exists.
    pub fn open(path: &str) -> Result<Self> {
        let db = Database::new(path)?;
        Self::new(db)
    }

    pub fn new(db: Database) -> Result<Self> {
        db.initialize_schema()?;
        Ok(Self { db })
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

impl LocalStorage for SqliteStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.db
            .connection()
            .query_row(
                "SELECT value FROM local_storage WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()
            .with_context(|| format!("Failed to read local storage key '{}'", key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.db
            .connection()
            .execute(
                "INSERT INTO local_storage (key, value, updated_at)
                 VALUES (?1, ?2, CURRENT_TIMESTAMP)
                 ON CONFLICT(key) DO UPDATE SET
                     value = excluded.value,
                     updated_at = excluded.updated_at",
                params![key, value],
            )
            .with_context(|| format!("Failed to write local storage key '{}'", key))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_missing_key() {
        let storage = SqliteStorage::open(":memory:").unwrap();
        assert!(storage.get("personalWebsiteSchedule").unwrap().is_none());
    }

    #[test]
    fn test_set_then_overwrite() {
        let mut storage = SqliteStorage::open(":memory:").unwrap();

        storage.set("personalWebsiteSchedule", "{}").unwrap();
        storage.set("personalWebsiteSchedule", "{\"monday\":{}}").unwrap();

        assert_eq!(
            storage.get("personalWebsiteSchedule").unwrap().as_deref(),
            Some("{\"monday\":{}}")
        );

        let rows: i64 = storage
            .database()
            .connection()
            .query_row("SELECT COUNT(*) FROM local_storage", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schedule.db");
        let path = path.to_str().unwrap();

        {
            let mut storage = SqliteStorage::open(path).unwrap();
            storage.set("key", "persisted").unwrap();
        }

        let reopened = SqliteStorage::open(path).unwrap();
        assert_eq!(reopened.get("key").unwrap().as_deref(), Some("persisted"));
    }
}
