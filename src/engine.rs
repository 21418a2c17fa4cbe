//! Detection run driver
//!
//! One linear pass: load the observation window, detect corrections,
//! synthesize an instinct per correction, and persist what the run options
//! allow. Failures along the way are annotated on the report; a run always
//! produces one.

use crate::config::LatticeConfig;
use crate::detection::{detect_corrections, KindCounts};
use crate::instincts::synthesize;
use crate::report::{CorrectionResult, DetectionReport};
use crate::storage::{
    CorrectionLog, KnowledgeStore, ObservationLog, PersistenceSink, SqliteKnowledgeStore,
};
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

/// Options for a single detection run
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Start of the observation window; defaults to now minus the lookback
    pub since: Option<DateTime<Utc>>,

    /// Session identifier echoed in the report
    pub session_id: Option<String>,

    /// Detect and report without writing anything
    pub dry_run: bool,

    /// Keep per-correction results in the report
    pub verbose: bool,

    /// Insert instincts into the knowledge store
    pub create_instincts: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            since: None,
            session_id: None,
            dry_run: false,
            verbose: false,
            create_instincts: true,
        }
    }
}

impl RunOptions {
    /// Whether this run may touch the knowledge store
    pub fn writes_instincts(&self) -> bool {
        self.create_instincts && !self.dry_run
    }
}

/// Correction-detection engine
pub struct CorrectionEngine {
    config: LatticeConfig,
}

impl CorrectionEngine {
    pub fn new(config: LatticeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LatticeConfig {
        &self.config
    }

    /// Start of the window when no `since` is given.
    ///
    /// A lookback reaching past the representable range opens the window to
    /// the earliest instant instead of overflowing.
    pub fn default_since(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        Duration::from_std(self.config.detection.lookback)
            .ok()
            .and_then(|lookback| now.checked_sub_signed(lookback))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Run against the configured SQLite knowledge store.
    ///
    /// The store is only opened when the run may write instincts. An
    /// unprovisioned store disables instinct creation silently; a store that
    /// fails to open is reported.
    pub fn run(&self, options: &RunOptions) -> DetectionReport {
        let mut open_errors = Vec::new();

        let store = if options.writes_instincts() {
            match SqliteKnowledgeStore::open_existing(&self.config.paths.knowledge_db) {
                Ok(store) => store,
                Err(e) => {
                    warn!("Knowledge store unavailable: {}", e);
                    open_errors.push(format!("knowledge store: {}", e));
                    None
                }
            }
        } else {
            None
        };

        let mut report =
            self.run_with_store(options, store.as_ref().map(|s| s as &dyn KnowledgeStore));
        open_errors.append(&mut report.errors);
        report.errors = open_errors;
        report
    }

    /// Run against any knowledge store, or none
    pub fn run_with_store(
        &self,
        options: &RunOptions,
        store: Option<&dyn KnowledgeStore>,
    ) -> DetectionReport {
        let paths = &self.config.paths;
        let since = options
            .since
            .unwrap_or_else(|| self.default_since(Utc::now()));

        let observations = match ObservationLog::new(&paths.observations_file).load_since(since) {
            Ok(observations) => observations,
            Err(e) => {
                warn!("Failed to load observations: {}", e);
                let mut report =
                    DetectionReport::no_observations(options.dry_run, options.session_id.clone());
                report.errors.push(format!("observation log: {}", e));
                return report;
            }
        };

        if observations.is_empty() {
            info!("No observations since {}", since);
            return DetectionReport::no_observations(options.dry_run, options.session_id.clone());
        }

        let corrections = detect_corrections(&observations, &self.config.detection);
        let by_type = KindCounts::tally(&corrections);
        info!(
            "Detected {} corrections in {} observations",
            corrections.len(),
            observations.len()
        );

        let sink = PersistenceSink::new(
            (!options.dry_run).then(|| CorrectionLog::new(paths.corrections_file())),
            if options.writes_instincts() { store } else { None },
        );

        let mut results = Vec::with_capacity(corrections.len());
        let mut errors = Vec::new();

        for correction in &corrections {
            let instinct = synthesize(correction, Utc::now());
            let outcome = sink.persist(correction, &instinct);

            debug!(
                kind = %correction.kind(),
                created = outcome.instinct_id.is_some(),
                duplicate = outcome.duplicate,
                "processed correction"
            );

            errors.extend(outcome.errors);
            results.push(CorrectionResult {
                correction_id: outcome.correction_id,
                kind: correction.kind(),
                timestamp: correction.timestamp,
                instinct_created: outcome.instinct_id.is_some(),
                instinct_id: outcome.instinct_id,
                instinct_summary: instinct.summary,
            });
        }

        let mut report = DetectionReport::completed(
            observations.len(),
            by_type,
            results,
            options.dry_run,
            options.session_id.clone(),
            options.verbose,
        );
        report.errors = errors;

        info!("Created {} instincts", report.instincts_created);
        report
    }
}
