//! Persistence of detected corrections and their instincts
//!
//! Each correction is handled on its own: a failed write is logged and
//! reported in the outcome, and the next correction proceeds regardless.

use super::{CorrectionLog, KnowledgeStore};
use crate::instincts::DedupGateway;
use crate::types::{Correction, Instinct};
use crate::utils::string::truncate_at_char_boundary;
use tracing::{debug, warn};

/// Characters of an instinct summary quoted in logs and errors
const SUMMARY_PREVIEW: usize = 60;

/// Result of persisting one correction
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersistOutcome {
    /// Id in the corrections log, if written
    pub correction_id: Option<String>,

    /// Id of the inserted pattern, if created
    pub instinct_id: Option<String>,

    /// A similar instinct already existed
    pub duplicate: bool,

    /// Write failures encountered
    pub errors: Vec<String>,
}

/// Writes corrections to the log and accepted instincts to the store
pub struct PersistenceSink<'a> {
    corrections: Option<CorrectionLog>,
    store: Option<&'a dyn KnowledgeStore>,
}

impl<'a> PersistenceSink<'a> {
    /// `corrections` is `None` for dry runs; `store` is `None` when instinct
    /// creation is disabled or the store is not provisioned.
    pub fn new(corrections: Option<CorrectionLog>, store: Option<&'a dyn KnowledgeStore>) -> Self {
        Self { corrections, store }
    }

    pub fn persist(&self, correction: &Correction, instinct: &Instinct) -> PersistOutcome {
        let mut outcome = PersistOutcome::default();

        if let Some(log) = &self.corrections {
            match log.append(correction) {
                Ok(id) => outcome.correction_id = Some(id),
                Err(e) => {
                    warn!("Failed to log {} correction: {}", correction.kind(), e);
                    outcome
                        .errors
                        .push(format!("correction log ({}): {}", correction.kind(), e));
                }
            }
        }

        let Some(store) = self.store else {
            return outcome;
        };

        if DedupGateway::new(Some(store)).is_duplicate(instinct) {
            debug!(
                "Skipping duplicate instinct: {}",
                truncate_at_char_boundary(&instinct.summary, SUMMARY_PREVIEW)
            );
            outcome.duplicate = true;
            return outcome;
        }

        match store.insert_instinct(instinct) {
            Ok(id) => outcome.instinct_id = Some(id),
            Err(e) => {
                let summary = truncate_at_char_boundary(&instinct.summary, SUMMARY_PREVIEW);
                warn!("Failed to log instinct {}: {}", summary, e);
                outcome.errors.push(format!("instinct ({}): {}", summary, e));
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instincts::synthesize;
    use crate::storage::SqliteKnowledgeStore;
    use crate::types::CorrectionSignal;
    use chrono::Utc;
    use serde_json::json;
    use tempfile::TempDir;

    fn correction(label: &str) -> Correction {
        Correction {
            timestamp: Utc::now(),
            signal: CorrectionSignal::Custom {
                label: label.to_string(),
                context: json!({}),
            },
        }
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let sink = PersistenceSink::new(None, None);
        let c = correction("x");
        let outcome = sink.persist(&c, &synthesize(&c, Utc::now()));
        assert_eq!(outcome, PersistOutcome::default());
    }

    #[test]
    fn test_log_only_without_store() {
        let dir = TempDir::new().unwrap();
        let log = CorrectionLog::new(dir.path().join("corrections.jsonl"));
        let sink = PersistenceSink::new(Some(log), None);

        let c = correction("x");
        let outcome = sink.persist(&c, &synthesize(&c, Utc::now()));
        assert!(outcome.correction_id.is_some());
        assert!(outcome.instinct_id.is_none());
        assert!(outcome.errors.is_empty());
    }

    #[test]
    fn test_duplicate_suppressed() {
        let dir = TempDir::new().unwrap();
        let store = SqliteKnowledgeStore::provision(dir.path().join("lattice.db")).unwrap();
        let sink = PersistenceSink::new(None, Some(&store));

        let c = correction("same");
        let first = sink.persist(&c, &synthesize(&c, Utc::now()));
        let second = sink.persist(&c, &synthesize(&c, Utc::now()));

        assert!(first.instinct_id.is_some());
        assert!(second.instinct_id.is_none());
        assert!(second.duplicate);
        assert_eq!(store.count_patterns().unwrap(), 1);
    }

    #[test]
    fn test_insert_failure_reported_not_fatal() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lattice.db");
        std::fs::write(&path, b"").unwrap();
        let store = SqliteKnowledgeStore::open_existing(&path).unwrap().unwrap();
        let sink = PersistenceSink::new(None, Some(&store));

        let c = correction("x");
        let outcome = sink.persist(&c, &synthesize(&c, Utc::now()));
        assert!(outcome.instinct_id.is_none());
        assert!(!outcome.duplicate);
        assert_eq!(outcome.errors.len(), 1);
    }
}
