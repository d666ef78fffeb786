// Content History Repository
// Handles all database operations for generated content records

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::params;

use crate::models::content::Language;
use crate::models::history::ContentRecord;
use crate::utils::database::Database;

const SELECT_COLUMNS: &str = r#"
    SELECT id, craft_type, keywords, language, image,
           product_story, social_caption, cultural_context, created_at
    FROM content_history
"#;

/// Repository for content history data access
#[derive(Clone)]
pub struct HistoryRepository {
    db: Database,
}

impl HistoryRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// List all records, newest first
    pub fn list(&self) -> Result<Vec<ContentRecord>, String> {
        self.db.with_connection(|conn| {
            let mut stmt = conn
                .prepare(&format!("{} ORDER BY created_at DESC", SELECT_COLUMNS))
                .map_err(|e| format!("Failed to prepare statement: {}", e))?;

            let rows = stmt
                .query_map([], HistoryRow::from_row)
                .map_err(|e| format!("Failed to query content history: {}", e))?;

            let mut records = Vec::new();
            for row in rows {
                let row = row.map_err(|e| format!("Failed to read row: {}", e))?;
                records.push(row.into_record()?);
            }

            Ok(records)
        })
    }

    /// Get a record by ID
    pub fn get(&self, id: &str) -> Result<Option<ContentRecord>, String> {
        self.db.with_connection(|conn| {
            let result = conn.query_row(
                &format!("{} WHERE id = ?1", SELECT_COLUMNS),
                params![id],
                HistoryRow::from_row,
            );

            match result {
                Ok(row) => row.into_record().map(Some),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(format!("Failed to get content record: {}", e)),
            }
        })
    }

    /// Save a record (insert or replace)
    pub fn save(&self, record: &ContentRecord) -> Result<(), String> {
        let keywords = serde_json::to_string(&record.keywords)
            .map_err(|e| format!("Failed to serialize keywords: {}", e))?;

        self.db.with_connection(|conn| {
            conn.execute(
                r#"
                INSERT OR REPLACE INTO content_history
                (id, craft_type, keywords, language, image,
                 product_story, social_caption, cultural_context, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
                params![
                    record.id,
                    record.craft_type,
                    keywords,
                    record.language.code(),
                    record.image,
                    record.product_story,
                    record.social_caption,
                    record.cultural_context,
                    record.created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
                ],
            )
            .map_err(|e| format!("Failed to save content record: {}", e))?;

            Ok(())
        })
    }

    /// Delete a record by ID
    pub fn delete(&self, id: &str) -> Result<bool, String> {
        self.db.with_connection(|conn| {
            let rows_affected = conn
                .execute("DELETE FROM content_history WHERE id = ?1", params![id])
                .map_err(|e| format!("Failed to delete content record: {}", e))?;

            Ok(rows_affected > 0)
        })
    }

    /// Delete several records in one transaction. Returns how many existed.
    pub fn delete_many(&self, ids: &[String]) -> Result<usize, String> {
        self.db.with_transaction(|conn| {
            let mut deleted = 0;
            for id in ids {
                deleted += conn
                    .execute("DELETE FROM content_history WHERE id = ?1", params![id])
                    .map_err(|e| format!("Failed to delete content record: {}", e))?;
            }
            Ok(deleted)
        })
    }

    pub fn count(&self) -> Result<usize, String> {
        self.db.with_connection_raw(|conn| {
            conn.query_row("SELECT COUNT(*) FROM content_history", [], |row| {
                row.get::<_, i64>(0)
            })
        })
        .map(|n| n.max(0) as usize)
    }
}

/// Internal row structure for mapping database rows
struct HistoryRow {
    id: String,
    craft_type: String,
    keywords: String,
    language: String,
    image: Option<String>,
    product_story: String,
    social_caption: String,
    cultural_context: String,
    created_at: String,
}

impl HistoryRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            craft_type: row.get(1)?,
            keywords: row.get(2)?,
            language: row.get(3)?,
            image: row.get(4)?,
            product_story: row.get(5)?,
            social_caption: row.get(6)?,
            cultural_context: row.get(7)?,
            created_at: row.get(8)?,
        })
    }

    fn into_record(self) -> Result<ContentRecord, String> {
        let keywords: Vec<String> = serde_json::from_str(&self.keywords)
            .map_err(|e| format!("Invalid keywords for record {}: {}", self.id, e))?;
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| format!("Invalid created_at for record {}: {}", self.id, e))?;

        Ok(ContentRecord {
            id: self.id,
            craft_type: self.craft_type,
            keywords,
            language: Language::from_code_or_default(&self.language),
            image: self.image,
            created_at,
            product_story: self.product_story,
            social_caption: self.social_caption,
            cultural_context: self.cultural_context,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::content::GenerationResult;
    use chrono::Duration;

    fn record(craft_type: &str, minutes_ago: i64) -> ContentRecord {
        let mut record = ContentRecord::new(
            craft_type.to_string(),
            vec!["handmade".to_string(), "clay".to_string()],
            Language::Hi,
            Some("pot.jpg".to_string()),
            &GenerationResult {
                story: "story".to_string(),
                social_caption: "caption".to_string(),
                heritage_context: "heritage".to_string(),
            },
        );
        record.created_at = Utc::now() - Duration::minutes(minutes_ago);
        record
    }

    fn repo() -> HistoryRepository {
        HistoryRepository::new(Database::in_memory().unwrap())
    }

    #[test]
    fn test_save_and_get() {
        let repo = repo();
        let saved = record("Pottery", 0);
        repo.save(&saved).unwrap();

        let loaded = repo.get(&saved.id).unwrap().unwrap();
        assert_eq!(loaded.craft_type, "Pottery");
        assert_eq!(loaded.keywords, vec!["handmade", "clay"]);
        assert_eq!(loaded.language, Language::Hi);
        assert_eq!(loaded.created_at.timestamp(), saved.created_at.timestamp());
        assert!(repo.get("missing").unwrap().is_none());
    }

    #[test]
    fn test_list_newest_first() {
        let repo = repo();
        repo.save(&record("Old", 60)).unwrap();
        repo.save(&record("New", 1)).unwrap();

        let listed: Vec<_> = repo.list().unwrap().into_iter().map(|r| r.craft_type).collect();
        assert_eq!(listed, vec!["New", "Old"]);
    }

    #[test]
    fn test_delete_and_delete_many() {
        let repo = repo();
        let a = record("A", 3);
        let b = record("B", 2);
        let c = record("C", 1);
        for r in [&a, &b, &c] {
            repo.save(r).unwrap();
        }

        assert!(repo.delete(&a.id).unwrap());
        assert!(!repo.delete(&a.id).unwrap());

        let deleted = repo
            .delete_many(&[b.id.clone(), c.id.clone(), "missing".to_string()])
            .unwrap();
        assert_eq!(deleted, 2);
        assert_eq!(repo.count().unwrap(), 0);
    }

    #[test]
    fn test_corrupt_keywords_are_reported() {
        let db = Database::in_memory().unwrap();
        let repo = HistoryRepository::new(db.clone());
        let saved = record("Weaving", 0);
        repo.save(&saved).unwrap();
        db.with_connection_raw(|conn| {
            conn.execute(
                "UPDATE content_history SET keywords = 'ikat, silk' WHERE id = ?1",
                [&saved.id],
            )
        })
        .unwrap();

        let err = repo.get(&saved.id).unwrap_err();
        assert!(err.contains("Invalid keywords"));
        assert!(err.contains(&saved.id));
        assert!(repo.list().is_err());
    }
}
