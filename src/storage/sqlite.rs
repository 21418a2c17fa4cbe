//! SQLite knowledge store
//!
//! Instincts are persisted as rows of the `patterns` table. The store file
//! is shared with other hooks, so connections run in WAL mode with a busy
//! timeout and leave write serialization to SQLite.

use crate::error::Result;
use crate::storage::KnowledgeStore;
use crate::types::Instinct;
use crate::utils::id::generate_id;
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// How long a writer waits on a locked database
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Schema of the `patterns` table
pub const PATTERNS_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS patterns (
    id TEXT PRIMARY KEY NOT NULL,
    project_id TEXT,
    scope TEXT NOT NULL DEFAULT 'global',
    category TEXT NOT NULL DEFAULT 'general',
    summary TEXT NOT NULL,
    detail TEXT,
    trigger_condition TEXT,
    recommended_action TEXT,
    context TEXT NOT NULL DEFAULT '{}',
    confidence REAL NOT NULL DEFAULT 0.6 CHECK(confidence BETWEEN 0.0 AND 1.0),
    evidence_count INTEGER NOT NULL DEFAULT 1,
    distilled INTEGER NOT NULL DEFAULT 0,
    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE INDEX IF NOT EXISTS idx_patterns_summary ON patterns(summary);
CREATE INDEX IF NOT EXISTS idx_patterns_category_trigger ON patterns(category, trigger_condition);
"#;

/// A row of the `patterns` table
#[derive(Debug, Clone, PartialEq)]
pub struct StoredPattern {
    pub id: String,
    pub scope: String,
    pub category: String,
    pub summary: String,
    pub trigger_condition: Option<String>,
    pub recommended_action: Option<String>,
    pub confidence: f64,
    pub evidence_count: i64,
    pub distilled: bool,
}

/// Knowledge store backed by a SQLite file
pub struct SqliteKnowledgeStore {
    conn: Connection,
    path: PathBuf,
}

impl SqliteKnowledgeStore {
    /// Open the store if its file exists.
    ///
    /// A missing file means the store has not been provisioned yet and is
    /// reported as `Ok(None)`, not as an error.
    pub fn open_existing<P: AsRef<Path>>(path: P) -> Result<Option<Self>> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("Knowledge store not provisioned at {}", path.display());
            return Ok(None);
        }

        Self::connect(path).map(Some)
    }

    /// Open the store, creating the file and schema when missing
    pub fn provision<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let store = Self::connect(path)?;
        store.conn.execute_batch(PATTERNS_SCHEMA)?;
        info!("Knowledge store ready at {}", path.display());
        Ok(store)
    }

    fn connect(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;

        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of stored patterns
    pub fn count_patterns(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM patterns", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// All stored patterns, oldest first
    pub fn list_patterns(&self) -> Result<Vec<StoredPattern>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, scope, category, summary, trigger_condition, recommended_action,
                   confidence, evidence_count, distilled
            FROM patterns
            ORDER BY created_at, rowid
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(StoredPattern {
                id: row.get(0)?,
                scope: row.get(1)?,
                category: row.get(2)?,
                summary: row.get(3)?,
                trigger_condition: row.get(4)?,
                recommended_action: row.get(5)?,
                confidence: row.get(6)?,
                evidence_count: row.get(7)?,
                distilled: row.get::<_, i64>(8)? != 0,
            })
        })?;

        let mut patterns = Vec::new();
        for row in rows {
            patterns.push(row?);
        }
        Ok(patterns)
    }
}

impl KnowledgeStore for SqliteKnowledgeStore {
    fn has_similar(&self, instinct: &Instinct) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            r#"
            SELECT COUNT(*) FROM patterns
            WHERE summary = ?1
               OR (category = ?2 AND trigger_condition = ?3)
            "#,
            params![instinct.summary, instinct.category, instinct.trigger],
            |row| row.get(0),
        )?;

        Ok(count > 0)
    }

    fn insert_instinct(&self, instinct: &Instinct) -> Result<String> {
        let id = generate_id("pat");
        let context = serde_json::to_string(&instinct.context)?;

        self.conn.execute(
            r#"
            INSERT INTO patterns (
                id, project_id, scope, category, summary, detail,
                trigger_condition, recommended_action, context,
                confidence, evidence_count, distilled
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 1, 0)
            "#,
            params![
                id,
                instinct.project_id,
                instinct.scope.as_str(),
                instinct.category,
                instinct.summary,
                instinct.detail,
                instinct.trigger,
                instinct.action,
                context,
                instinct.confidence(),
            ],
        )?;

        debug!("Stored pattern {}: {}", id, instinct.summary);
        Ok(id)
    }
}
