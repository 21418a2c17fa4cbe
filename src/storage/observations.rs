//! Observation log reader
//!
//! The log is append-only JSON lines written by the instrumentation hooks.
//! Lines that do not parse as an observation are skipped, never fatal.

use crate::error::Result;
use crate::types::Observation;
use chrono::{DateTime, Utc};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Read-only handle on the observation log
#[derive(Debug, Clone)]
pub struct ObservationLog {
    path: PathBuf,
}

impl ObservationLog {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load observations at or after `since`, in ascending time order.
    ///
    /// A missing log yields an empty window. Ties keep their log order.
    pub fn load_since(&self, since: DateTime<Utc>) -> Result<Vec<Observation>> {
        if !self.path.exists() {
            debug!("No observation log at {}", self.path.display());
            return Ok(Vec::new());
        }

        let file = std::fs::File::open(&self.path)?;
        let mut observations = Vec::new();
        let mut skipped = 0usize;

        for line in BufReader::new(file).lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                    skipped += 1;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str::<Observation>(&line) {
                Ok(obs) if obs.timestamp >= since => observations.push(obs),
                Ok(_) => {}
                Err(e) => {
                    skipped += 1;
                    debug!("Skipping malformed observation: {}", e);
                }
            }
        }

        observations.sort_by_key(|obs| obs.timestamp);

        debug!(
            "Loaded {} observations since {} ({} malformed lines skipped)",
            observations.len(),
            since,
            skipped
        );

        Ok(observations)
    }
}
