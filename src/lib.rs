//! Lattice - Correction Detection for Coding-Assistant Sessions
//!
//! Reads the observation log written by the session hooks and infers where
//! the operator steered the assistant away from its first attempt:
//! - Edits of the same file retried in quick succession
//! - Tool errors followed by a successful call of the same tool
//! - Failed edits overridden by a whole-file write
//! - Shell commands run over and over
//!
//! Each detected correction becomes a scored instinct, deduplicated against
//! the knowledge store before it is persisted.
//!
//! # Architecture
//!
//! - **Types**: Observations, corrections, and instincts
//! - **Detection**: Pairwise pattern matchers and the repeated-command detector
//! - **Instincts**: Correction → instinct synthesis and dedup
//! - **Storage**: Observation log, corrections log, SQLite knowledge store
//! - **Engine**: One detection run, producing a [`DetectionReport`]
//!
//! # Example
//!
//! ```ignore
//! use lattice_core::{CorrectionEngine, LatticeConfig, RunOptions};
//!
//! let config = LatticeConfig::load(None)?;
//! let engine = CorrectionEngine::new(config);
//!
//! let report = engine.run(&RunOptions {
//!     dry_run: true,
//!     verbose: true,
//!     ..Default::default()
//! });
//! println!("{}", report.to_json_pretty()?);
//! ```

pub mod config;
pub mod detection;
pub mod engine;
pub mod error;
pub mod instincts;
pub mod report;
pub mod storage;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use config::{DetectionConfig, LatticeConfig, PathsConfig};
pub use detection::{detect_corrections, normalize_command, KindCounts};
pub use engine::{CorrectionEngine, RunOptions};
pub use error::{LatticeError, Result};
pub use report::{DetectionReport, RunStatus};
pub use storage::{KnowledgeStore, SqliteKnowledgeStore};
pub use types::{Correction, CorrectionKind, CorrectionSignal, Instinct, Observation};
