// ── State Store ────────────────────────────────────────────────────────────
// Minimal key/value persistence: one SQLite table of JSON blobs under string
// keys. The engine state round-trips through `save_state`/`load_state`
// idempotently; a missing or corrupt row falls back to documented defaults
// (Gentle/Happy, neutral preferences) with a logged warning — never fatal.

use std::path::{Path, PathBuf};

use log::{info, warn};
use rusqlite::{params, Connection, OptionalExtension};

use crate::atoms::constants::{STATE_KEY, STATE_VERSION};
use crate::atoms::error::{EngineError, EngineResult};
use crate::atoms::types::PersistedState;

pub struct StateStore {
    conn: Connection,
}

impl StateStore {
    /// Open the default store under the platform data directory.
    pub fn open() -> EngineResult<Self> {
        let dir = default_data_dir()?;
        std::fs::create_dir_all(&dir)?;
        Self::open_at(&dir.join("sprout.db"))
    }

    pub fn open_at(path: &Path) -> EngineResult<Self> {
        let conn = Connection::open(path)?;
        Self::init(&conn)?;
        Ok(Self { conn })
    }

    /// In-memory store for tests and ephemeral sessions.
    pub fn open_in_memory() -> EngineResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(&conn)?;
        Ok(Self { conn })
    }

    fn init(conn: &Connection) -> rusqlite::Result<()> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> EngineResult<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    pub fn set(&self, key: &str, value: &str) -> EngineResult<()> {
        self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn delete(&self, key: &str) -> EngineResult<()> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    // ── Engine state blob ──────────────────────────────────────────

    pub fn save_state(&self, state: &PersistedState) -> EngineResult<()> {
        let json = serde_json::to_string(state)?;
        self.set(STATE_KEY, &json)
    }

    /// Drop the persisted engine state; the next load yields defaults.
    pub fn clear_state(&self) -> EngineResult<()> {
        self.delete(STATE_KEY)
    }

    /// Load the engine state, or defaults when absent or unreadable.
    /// Corruption is recoverable by design: log, fall back, carry on.
    pub fn load_state(&self) -> PersistedState {
        match self.get(STATE_KEY) {
            Ok(Some(json)) => match serde_json::from_str::<PersistedState>(&json) {
                Ok(state) if state.version == STATE_VERSION => state,
                Ok(state) => {
                    warn!(
                        "[store] State version {} != {}; using defaults",
                        state.version, STATE_VERSION
                    );
                    PersistedState::default()
                }
                Err(e) => {
                    warn!("[store] Corrupt state blob ({e}); using defaults");
                    PersistedState::default()
                }
            },
            Ok(None) => {
                info!("[store] No previous state; starting fresh");
                PersistedState::default()
            }
            Err(e) => {
                warn!("[store] Failed to read state ({e}); using defaults");
                PersistedState::default()
            }
        }
    }
}

fn default_data_dir() -> EngineResult<PathBuf> {
    dirs::data_dir()
        .map(|d| d.join("sprout"))
        .ok_or_else(|| EngineError::Config("no platform data directory".into()))
}
