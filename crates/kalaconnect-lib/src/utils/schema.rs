// Versioned SQLite schema for KalaConnect storage
//
// The applied version is kept in `PRAGMA user_version`. Each step runs in its
// own transaction and bumps the version when it commits.

use rusqlite::Connection;

pub const CURRENT_VERSION: i32 = 2;

/// (version, label, statements), ascending
const STEPS: &[(i32, &str, &str)] = &[
    (
        1,
        "preferences",
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        "#,
    ),
    (
        2,
        "content history",
        r#"
        CREATE TABLE IF NOT EXISTS content_history (
            id TEXT PRIMARY KEY,
            craft_type TEXT NOT NULL,
            keywords TEXT NOT NULL DEFAULT '[]',
            language TEXT NOT NULL DEFAULT 'en' CHECK(language IN ('en', 'hi', 'ta')),
            image TEXT,
            product_story TEXT NOT NULL,
            social_caption TEXT NOT NULL,
            cultural_context TEXT NOT NULL,
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_content_history_created ON content_history(created_at DESC);
        CREATE INDEX IF NOT EXISTS idx_content_history_craft ON content_history(craft_type);
        "#,
    ),
];

/// Bring the schema up to CURRENT_VERSION
pub fn run_migrations(conn: &Connection) -> Result<(), String> {
    let applied = get_version(conn)?;

    for &(version, label, sql) in STEPS.iter().filter(|(v, _, _)| *v > applied) {
        log::info!("Applying schema step {} ({})", version, label);

        let tx = conn
            .unchecked_transaction()
            .map_err(|e| format!("Cannot begin schema step {}: {}", version, e))?;
        tx.execute_batch(sql)
            .map_err(|e| format!("Schema step {} ({}) failed: {}", version, label, e))?;
        tx.pragma_update(None, "user_version", version)
            .map_err(|e| format!("Cannot record schema step {}: {}", version, e))?;
        tx.commit()
            .map_err(|e| format!("Cannot commit schema step {}: {}", version, e))?;
    }

    Ok(())
}

pub fn get_version(conn: &Connection) -> Result<i32, String> {
    conn.pragma_query_value(None, "user_version", |row| row.get(0))
        .map_err(|e| format!("Cannot read schema version: {}", e))
}

pub fn table_exists(conn: &Connection, name: &str) -> Result<bool, String> {
    conn.prepare("SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1")
        .and_then(|mut stmt| stmt.exists([name]))
        .map_err(|e| format!("Cannot inspect table {}: {}", name, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn migrated() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    #[test]
    fn test_fresh_database_reaches_current_version() {
        let conn = migrated();

        assert_eq!(get_version(&conn).unwrap(), CURRENT_VERSION);
        assert!(table_exists(&conn, "settings").unwrap());
        assert!(table_exists(&conn, "content_history").unwrap());
        assert!(!table_exists(&conn, "projects").unwrap());
    }

    #[test]
    fn test_rerun_is_a_no_op() {
        let conn = migrated();
        conn.execute("INSERT INTO settings (key, value) VALUES ('selectedLanguage', 'hi')", [])
            .unwrap();

        run_migrations(&conn).unwrap();

        assert_eq!(get_version(&conn).unwrap(), CURRENT_VERSION);
        let kept: String = conn
            .query_row("SELECT value FROM settings WHERE key = 'selectedLanguage'", [], |row| row.get(0))
            .unwrap();
        assert_eq!(kept, "hi");
    }

    #[test]
    fn test_upgrade_from_first_step() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(STEPS[0].2).unwrap();
        conn.pragma_update(None, "user_version", 1).unwrap();
        assert!(!table_exists(&conn, "content_history").unwrap());

        run_migrations(&conn).unwrap();
        assert!(table_exists(&conn, "content_history").unwrap());
        assert_eq!(get_version(&conn).unwrap(), 2);
    }

    #[test]
    fn test_language_check_constraint() {
        let conn = migrated();
        let result = conn.execute(
            "INSERT INTO content_history (id, craft_type, language, product_story, social_caption, cultural_context, created_at)
             VALUES ('1', 'Pottery', 'fr', 'a', 'b', 'c', '2024-01-01T00:00:00Z')",
            [],
        );
        assert!(result.is_err());
    }
}
