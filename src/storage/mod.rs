//! Storage layer for the correction detector
//!
//! Reads the observation log, appends to the corrections log, and talks to
//! the knowledge store that holds persisted instincts.

pub mod corrections;
pub mod observations;
pub mod sink;
pub mod sqlite;

use crate::error::Result;
use crate::types::Instinct;

pub use corrections::CorrectionLog;
pub use observations::ObservationLog;
pub use sink::{PersistOutcome, PersistenceSink};
pub use sqlite::{SqliteKnowledgeStore, StoredPattern};

/// Knowledge store operations the detector relies on
pub trait KnowledgeStore {
    /// Check for a pattern with the same summary, or the same
    /// (category, trigger) pair
    fn has_similar(&self, instinct: &Instinct) -> Result<bool>;

    /// Insert a new pattern and return its id
    fn insert_instinct(&self, instinct: &Instinct) -> Result<String>;
}
