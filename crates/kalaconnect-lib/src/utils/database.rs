// SQLite storage handle
//
// One connection behind a mutex, shared by the settings and history
// repositories. File databases run in WAL mode so the MCP server and other
// readers can open the same file.

use rusqlite::{Connection, Result as SqliteResult};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use super::schema;

#[cfg(debug_assertions)]
pub const DATABASE_FILE: &str = "kalaconnect-dev.db";

#[cfg(not(debug_assertions))]
pub const DATABASE_FILE: &str = "kalaconnect.db";

const CONNECTION_PRAGMAS: &str = "
    PRAGMA journal_mode = WAL;
    PRAGMA synchronous = NORMAL;
    PRAGMA busy_timeout = 5000;
    PRAGMA foreign_keys = ON;
";

#[derive(Clone)]
pub struct Database {
    handle: Arc<Mutex<Connection>>,
    location: PathBuf,
}

impl Database {
    /// Open or create the file at `location` and migrate it
    pub fn open_file(location: PathBuf) -> Result<Self, String> {
        if let Some(dir) = location.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .map_err(|e| format!("Cannot create data directory {}: {}", dir.display(), e))?;
        }

        let conn = Connection::open(&location)
            .map_err(|e| format!("Cannot open {}: {}", location.display(), e))?;
        conn.execute_batch(CONNECTION_PRAGMAS)
            .map_err(|e| format!("Cannot apply connection settings: {}", e))?;

        Self::migrated(conn, location)
    }

    /// Throwaway database for tests and key-less runs
    pub fn in_memory() -> Result<Self, String> {
        let conn = Connection::open_in_memory()
            .map_err(|e| format!("Cannot open in-memory database: {}", e))?;
        Self::migrated(conn, PathBuf::from(":memory:"))
    }

    fn migrated(conn: Connection, location: PathBuf) -> Result<Self, String> {
        schema::run_migrations(&conn)?;
        Ok(Self {
            handle: Arc::new(Mutex::new(conn)),
            location,
        })
    }

    pub fn path(&self) -> &Path {
        &self.location
    }

    pub fn lock(&self) -> Result<MutexGuard<'_, Connection>, String> {
        self.handle
            .lock()
            .map_err(|_| "Database connection is poisoned by an earlier panic".to_string())
    }

    /// Run `f` against the connection; `f` reports its own error text
    pub fn with_connection<T, F>(&self, f: F) -> Result<T, String>
    where
        F: FnOnce(&Connection) -> Result<T, String>,
    {
        f(&*self.lock()?)
    }

    /// Like `with_connection` for closures returning plain rusqlite results
    pub fn with_connection_raw<T, F>(&self, f: F) -> Result<T, String>
    where
        F: FnOnce(&Connection) -> SqliteResult<T>,
    {
        f(&*self.lock()?).map_err(|e| format!("SQLite: {}", e))
    }

    /// Run `f` inside a transaction. Any error rolls everything back.
    pub fn with_transaction<T, F>(&self, f: F) -> Result<T, String>
    where
        F: FnOnce(&Connection) -> Result<T, String>,
    {
        let guard = self.lock()?;
        let tx = guard
            .unchecked_transaction()
            .map_err(|e| format!("Cannot begin transaction: {}", e))?;
        let value = f(&tx)?;
        tx.commit()
            .map_err(|e| format!("Cannot commit transaction: {}", e))?;
        Ok(value)
    }

    pub fn schema_version(&self) -> Result<i32, String> {
        schema::get_version(&*self.lock()?)
    }
}

pub fn get_database_path(data_dir: &Path) -> PathBuf {
    data_dir.join(DATABASE_FILE)
}

pub fn open_database(data_dir: &Path) -> Result<Database, String> {
    Database::open_file(get_database_path(data_dir))
}
