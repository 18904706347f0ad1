use chrono::Utc;
use rusqlite::{Connection, params};
use std::path::Path;

use crate::error::Result;
use crate::models::{Classification, DeveloperCategory};

/// Completed classifications, keyed by model and developer name, so an
/// interrupted run can resume without re-issuing finished requests.
pub struct Storage {
    conn: Connection,
}

impl Storage {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let storage = Self { conn };
        storage.init_db()?;
        Ok(storage)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let storage = Self { conn };
        storage.init_db()?;
        Ok(storage)
    }

    fn init_db(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS classifications (
                id INTEGER PRIMARY KEY,
                model TEXT NOT NULL,
                developer TEXT NOT NULL,
                reply TEXT NOT NULL,
                category TEXT,
                classified_at TEXT NOT NULL,
                UNIQUE(model, developer)
            );

            CREATE INDEX IF NOT EXISTS idx_classifications_model ON classifications(model);
            "#,
        )?;

        Ok(())
    }

    pub fn save_classification(
        &self,
        model: &str,
        developer: &str,
        classification: &Classification,
    ) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO classifications (model, developer, reply, category, classified_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(model, developer) DO UPDATE SET
                reply = excluded.reply,
                category = excluded.category,
                classified_at = excluded.classified_at
            "#,
            params![
                model,
                developer,
                classification.reply,
                classification.category.map(|c| c.label()),
                Utc::now().to_rfc3339(),
            ],
        )?;

        Ok(())
    }

    pub fn get_classification(&self, model: &str, developer: &str) -> Result<Option<Classification>> {
        let result = self.conn.query_row(
            "SELECT reply, category FROM classifications WHERE model = ?1 AND developer = ?2",
            params![model, developer],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?)),
        );

        match result {
            Ok((reply, category)) => Ok(Some(Classification {
                reply,
                category: category.as_deref().and_then(DeveloperCategory::from_label),
            })),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn count_classifications(&self, model: &str) -> Result<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM classifications WHERE model = ?1",
            params![model],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_get() {
        let storage = Storage::in_memory().unwrap();
        assert!(storage.get_classification("gpt-4o", "Nintendo").unwrap().is_none());

        storage
            .save_classification("gpt-4o", "Nintendo", &Classification::from_reply("Large Game Company"))
            .unwrap();

        let stored = storage.get_classification("gpt-4o", "Nintendo").unwrap().unwrap();
        assert_eq!(stored.category, Some(DeveloperCategory::LargeGameCompany));
        assert!(storage.get_classification("gpt-4o-mini", "Nintendo").unwrap().is_none());
    }

    #[test]
    fn test_category_column_is_read_back() {
        let storage = Storage::in_memory().unwrap();
        let classification = Classification {
            reply: "indie studio".to_string(),
            category: Some(DeveloperCategory::IndieDeveloper),
        };
        storage.save_classification("gpt-4o", "Team Cherry", &classification).unwrap();

        let stored = storage.get_classification("gpt-4o", "Team Cherry").unwrap().unwrap();
        assert_eq!(stored, classification);

        storage
            .save_classification("gpt-4o", "Valve", &Classification::from_reply("Publisher"))
            .unwrap();
        let stored = storage.get_classification("gpt-4o", "Valve").unwrap().unwrap();
        assert_eq!(stored.category, None);
    }

    #[test]
    fn test_upsert_replaces_reply() {
        let storage = Storage::in_memory().unwrap();
        storage
            .save_classification("gpt-4o", "Remedy", &Classification::from_reply("Regional Developer"))
            .unwrap();
        storage
            .save_classification("gpt-4o", "Remedy", &Classification::from_reply("Indie Developer"))
            .unwrap();

        assert_eq!(storage.count_classifications("gpt-4o").unwrap(), 1);
        let stored = storage.get_classification("gpt-4o", "Remedy").unwrap().unwrap();
        assert_eq!(stored.reply, "Indie Developer");
    }

    #[test]
    fn test_persists_across_connections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checkpoint.db");

        Storage::new(&path)
            .unwrap()
            .save_classification("gpt-4o", "Team Cherry", &Classification::from_reply("Indie Developer"))
            .unwrap();

        let reopened = Storage::new(&path).unwrap();
        assert_eq!(reopened.count_classifications("gpt-4o").unwrap(), 1);
    }
}
