// Settings Repository
// Key-value preferences persisted in the settings table

use rusqlite::params;

use crate::services::preferences::PreferenceStore;
use crate::utils::database::Database;

/// Repository for the settings table
#[derive(Clone)]
pub struct SettingsRepository {
    db: Database,
}

impl SettingsRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// All stored keys and values, ordered by key
    pub fn list(&self) -> Result<Vec<(String, String)>, String> {
        self.db.with_connection(|conn| {
            let mut stmt = conn
                .prepare("SELECT key, value FROM settings ORDER BY key")
                .map_err(|e| format!("Failed to prepare statement: {}", e))?;

            let rows = stmt
                .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
                .map_err(|e| format!("Failed to query settings: {}", e))?;

            rows.collect::<Result<Vec<_>, _>>()
                .map_err(|e| format!("Failed to read row: {}", e))
        })
    }
}

impl PreferenceStore for SettingsRepository {
    fn get(&self, key: &str) -> Result<Option<String>, String> {
        self.db.with_connection(|conn| {
            let result = conn.query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![key],
                |row| row.get(0),
            );

            match result {
                Ok(value) => Ok(Some(value)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(format!("Failed to get setting: {}", e)),
            }
        })
    }

    fn set(&self, key: &str, value: &str) -> Result<(), String> {
        self.db.with_connection(|conn| {
            conn.execute(
                r#"
                INSERT INTO settings (key, value, updated_at)
                VALUES (?1, ?2, datetime('now'))
                ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
                "#,
                params![key, value],
            )
            .map_err(|e| format!("Failed to save setting: {}", e))?;

            Ok(())
        })
    }

    fn remove(&self, key: &str) -> Result<bool, String> {
        self.db.with_connection(|conn| {
            let rows_affected = conn
                .execute("DELETE FROM settings WHERE key = ?1", params![key])
                .map_err(|e| format!("Failed to delete setting: {}", e))?;

            Ok(rows_affected > 0)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::content::Language;
    use crate::services::preferences::SessionPreferences;
    use std::sync::Arc;

    #[test]
    fn test_get_set_remove() {
        let repo = SettingsRepository::new(Database::in_memory().unwrap());
        assert_eq!(repo.get("selectedLanguage").unwrap(), None);

        repo.set("selectedLanguage", "hi").unwrap();
        repo.set("selectedLanguage", "ta").unwrap();
        assert_eq!(repo.get("selectedLanguage").unwrap().as_deref(), Some("ta"));
        assert_eq!(repo.list().unwrap(), vec![("selectedLanguage".to_string(), "ta".to_string())]);

        assert!(repo.remove("selectedLanguage").unwrap());
        assert!(!repo.remove("selectedLanguage").unwrap());
    }

    #[test]
    fn test_backs_session_preferences() {
        let repo = SettingsRepository::new(Database::in_memory().unwrap());
        let prefs = SessionPreferences::new(Arc::new(repo.clone()));

        prefs.set_language(Language::Hi).unwrap();
        prefs.sign_in("weaver@example.com").unwrap();

        assert_eq!(repo.get("isAuthenticated").unwrap().as_deref(), Some("true"));
        assert_eq!(prefs.language().unwrap(), Language::Hi);
    }
}
