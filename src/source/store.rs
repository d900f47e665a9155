use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use chrono::Utc;
use rusqlite::Connection;

use crate::models::Memento;
use crate::source::{schema, MementoBackend};

/// Persistent build-plan store over SQLite.
///
/// Plans are stored per family as JSON rows keyed by `(family, instance_key)`.
/// One store typically serves every family in a registry; a family-scoped
/// view implementing the backend contract is obtained with
/// [`backend`](Self::backend).
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Store path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_default() -> Result<Self> {
        let dirs = directories::ProjectDirs::from("", "", "plugboard")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        let db_path = dirs.data_dir().join("plugboard.db");
        Self::open(db_path)
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().expect("store lock poisoned");
        schema::run_migrations(&conn)
    }

    /// A backend view of this store scoped to one family.
    pub fn backend(&self, family: impl Into<String>) -> SqliteBackend {
        SqliteBackend {
            store: self.clone(),
            family: family.into(),
        }
    }

    // ============================================================
    // Memento operations
    // ============================================================

    /// Insert or replace the plan stored under its instance key.
    pub fn insert_memento(&self, family: &str, memento: &Memento) -> Result<()> {
        let key = memento
            .instance_key()
            .ok_or_else(|| anyhow::anyhow!("Cannot store a memento with no instance key"))?;
        let body = serde_json::to_string(memento)?;

        let conn = self.conn.lock().expect("store lock poisoned");
        let now = Utc::now();
        conn.execute(
            "INSERT INTO mementos (family, instance_key, body, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT (family, instance_key)
             DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at",
            (family, key, &body, now.to_rfc3339(), now.to_rfc3339()),
        )?;

        Ok(())
    }

    pub fn get_memento(&self, family: &str, instance_key: &str) -> Result<Option<Memento>> {
        let conn = self.conn.lock().expect("store lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT body FROM mementos WHERE family = ? AND instance_key = ?",
        )?;

        let mut rows = stmt.query((family, instance_key))?;
        if let Some(row) = rows.next()? {
            let body: String = row.get(0)?;
            Ok(Some(serde_json::from_str(&body)?))
        } else {
            Ok(None)
        }
    }

    pub fn contains_memento(&self, family: &str, instance_key: &str) -> Result<bool> {
        let conn = self.conn.lock().expect("store lock poisoned");
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM mementos WHERE family = ? AND instance_key = ?",
            (family, instance_key),
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn list_mementos(&self, family: &str) -> Result<Vec<Memento>> {
        let conn = self.conn.lock().expect("store lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT body FROM mementos WHERE family = ? ORDER BY instance_key",
        )?;

        let bodies = stmt
            .query_map([family], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        bodies
            .into_iter()
            .map(|body| serde_json::from_str(&body).map_err(anyhow::Error::from))
            .collect()
    }

    pub fn remove_memento(&self, family: &str, instance_key: &str) -> Result<bool> {
        let conn = self.conn.lock().expect("store lock poisoned");
        let rows = conn.execute(
            "DELETE FROM mementos WHERE family = ? AND instance_key = ?",
            (family, instance_key),
        )?;
        Ok(rows > 0)
    }
}

impl Clone for SqliteStore {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
        }
    }
}

/// Family-scoped backend view over a [`SqliteStore`].
pub struct SqliteBackend {
    store: SqliteStore,
    family: String,
}

impl MementoBackend for SqliteBackend {
    fn description(&self) -> String {
        format!("sqlite store (family {})", self.family)
    }

    fn contains_key(&self, instance_key: &str) -> bool {
        match self.store.contains_memento(&self.family, instance_key) {
            Ok(present) => present,
            Err(err) => {
                tracing::warn!(family = %self.family, key = instance_key, %err, "store lookup failed");
                false
            }
        }
    }

    fn retrieve(&self, instance_key: &str) -> Result<Memento> {
        self.store
            .get_memento(&self.family, instance_key)?
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "memento \"{instance_key}\" disappeared from family {}",
                    self.family
                )
            })
    }

    fn fetch_internal(&self) -> Result<Vec<Memento>> {
        self.store.list_mementos(&self.family)
    }
}
