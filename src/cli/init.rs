//! Knowledge store initialization command

use anyhow::{Context, Result};
use lattice_core::{LatticeConfig, SqliteKnowledgeStore};
use tracing::debug;

/// Handle store initialization command
pub fn handle(config: &LatticeConfig) -> Result<()> {
    let db_path = &config.paths.knowledge_db;
    debug!("Initializing knowledge store at {}", db_path.display());

    // Creates the file and `patterns` table when missing, keeps existing rows
    let store = SqliteKnowledgeStore::provision(db_path)
        .with_context(|| format!("failed to provision {}", db_path.display()))?;
    let count = store.count_patterns()?;

    println!("Knowledge store initialized: {}", db_path.display());
    println!("Patterns stored: {}", count);
    Ok(())
}
