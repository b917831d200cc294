// 💾 Snapshot Store - Persistence port and its adapters
//
// The engine never touches a storage technology directly: it loads and saves
// whole `EngineSnapshot`s through `SnapshotStore`.
//
// Revisions are optimistic: a save is accepted when
//   revision == stored + 1                   → written
//   revision == stored && same content hash  → idempotent no-op
// anything else is `EngineError::StaleRevision`.

use crate::config::EngineConfig;
use crate::entities::{CanonicalSpecialty, MappingGroup, SourceSpecialty};
use crate::error::EngineError;
use crate::history::{BoundedLog, OperationRecord, SynonymHistoryEntry};
use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::Mutex;
use tracing::debug;

/// Current snapshot layout. Version 1 had no `config` and no `operations`.
pub const SCHEMA_VERSION: u32 = 2;

// ============================================================================
// SNAPSHOT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    #[serde(default = "legacy_schema_version")]
    pub schema_version: u32,

    #[serde(default)]
    pub revision: u64,

    pub specialties: Vec<CanonicalSpecialty>,

    #[serde(default)]
    pub groups: Vec<MappingGroup>,

    #[serde(default)]
    pub unmapped: Vec<SourceSpecialty>,

    #[serde(default)]
    pub history: BoundedLog<SynonymHistoryEntry>,

    #[serde(default)]
    pub config: EngineConfig,

    #[serde(default)]
    pub operations: BoundedLog<OperationRecord>,
}

fn legacy_schema_version() -> u32 {
    1
}

impl EngineSnapshot {
    /// SHA-256 over the serialized snapshot
    pub fn content_hash(&self) -> Result<String> {
        let bytes = serde_json::to_vec(self).context("Failed to serialize snapshot")?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Ok(format!("{:x}", hasher.finalize()))
    }

    /// Parse a stored snapshot, upgrading older layouts to `SCHEMA_VERSION`
    pub fn from_json(json: &str) -> Result<Self> {
        let mut snapshot: EngineSnapshot = serde_json::from_str(json).context("Failed to parse snapshot JSON")?;
        snapshot.migrate()?;
        Ok(snapshot)
    }

    pub fn migrate(&mut self) -> Result<()> {
        match self.schema_version {
            SCHEMA_VERSION => Ok(()),
            1 => {
                // v1 → v2: config and operations were filled by serde defaults
                debug!(from = 1, to = SCHEMA_VERSION, "migrating snapshot");
                self.schema_version = SCHEMA_VERSION;
                Ok(())
            }
            other => bail!("Unsupported snapshot schema version {}", other),
        }
    }
}

// ============================================================================
// PORT
// ============================================================================

pub trait SnapshotStore: Send + Sync {
    /// Latest snapshot, or `None` for a fresh store
    fn load_all(&self) -> Result<Option<EngineSnapshot>>;

    /// Persist a snapshot, subject to the revision rule above
    fn save_all(&self, snapshot: &EngineSnapshot) -> Result<()>;
}

#[derive(Debug, PartialEq)]
enum SaveDecision {
    Write,
    Unchanged,
}

fn check_revision(stored: Option<(u64, &str)>, snapshot: &EngineSnapshot, hash: &str) -> Result<SaveDecision> {
    let (current, current_hash) = stored.unwrap_or((0, ""));

    if snapshot.revision == current + 1 {
        return Ok(SaveDecision::Write);
    }
    if snapshot.revision == current && current_hash == hash {
        return Ok(SaveDecision::Unchanged);
    }

    Err(anyhow!(EngineError::StaleRevision {
        expected: current + 1,
        found: snapshot.revision,
    }))
}

// ============================================================================
// IN-MEMORY ADAPTER
// ============================================================================

#[derive(Debug, Default)]
pub struct MemoryStore {
    slot: Mutex<Option<(EngineSnapshot, String)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for MemoryStore {
    fn load_all(&self) -> Result<Option<EngineSnapshot>> {
        let slot = self.slot.lock().map_err(|_| anyhow!("Memory store lock poisoned"))?;
        Ok(slot.as_ref().map(|(snapshot, _)| snapshot.clone()))
    }

    fn save_all(&self, snapshot: &EngineSnapshot) -> Result<()> {
        let hash = snapshot.content_hash()?;
        let mut slot = self.slot.lock().map_err(|_| anyhow!("Memory store lock poisoned"))?;

        let stored = slot.as_ref().map(|(s, h)| (s.revision, h.as_str()));
        if check_revision(stored, snapshot, &hash)? == SaveDecision::Write {
            *slot = Some((snapshot.clone(), hash));
        }
        Ok(())
    }
}

// ============================================================================
// SQLITE ADAPTER
// ============================================================================

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path.as_ref())
            .with_context(|| format!("Failed to open database {}", path.as_ref().display()))?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        setup_database(&conn)?;
        Ok(SqliteStore { conn: Mutex::new(conn) })
    }
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    // ==========================================================================
    // Snapshot Table (single row, whole-engine document)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS snapshots (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            schema_version INTEGER NOT NULL,
            revision INTEGER NOT NULL,
            content_hash TEXT NOT NULL,
            payload TEXT NOT NULL,
            saved_at TEXT NOT NULL
        )",
        [],
    )?;

    Ok(())
}

impl SnapshotStore for SqliteStore {
    fn load_all(&self) -> Result<Option<EngineSnapshot>> {
        let conn = self.conn.lock().map_err(|_| anyhow!("Database lock poisoned"))?;

        let payload: Option<String> = conn
            .query_row("SELECT payload FROM snapshots WHERE id = 1", [], |row| row.get(0))
            .optional()
            .context("Failed to read snapshot")?;

        payload.map(|json| EngineSnapshot::from_json(&json)).transpose()
    }

    fn save_all(&self, snapshot: &EngineSnapshot) -> Result<()> {
        let payload = serde_json::to_string(snapshot).context("Failed to serialize snapshot")?;
        let hash = snapshot.content_hash()?;

        let mut conn = self.conn.lock().map_err(|_| anyhow!("Database lock poisoned"))?;
        let tx = conn.transaction().context("Failed to begin snapshot transaction")?;

        let stored: Option<(i64, String)> = tx
            .query_row("SELECT revision, content_hash FROM snapshots WHERE id = 1", [], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .optional()
            .context("Failed to read stored revision")?;

        let stored_ref = stored.as_ref().map(|(r, h)| (*r as u64, h.as_str()));
        if check_revision(stored_ref, snapshot, &hash)? == SaveDecision::Unchanged {
            return Ok(());
        }

        tx.execute(
            "INSERT OR REPLACE INTO snapshots (id, schema_version, revision, content_hash, payload, saved_at)
             VALUES (1, ?1, ?2, ?3, ?4, ?5)",
            params![
                snapshot.schema_version,
                snapshot.revision as i64,
                hash,
                payload,
                Utc::now().to_rfc3339(),
            ],
        )
        .context("Failed to write snapshot")?;

        tx.commit().context("Failed to commit snapshot")?;
        debug!(revision = snapshot.revision, "snapshot saved");
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
