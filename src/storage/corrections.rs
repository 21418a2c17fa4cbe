//! Corrections log
//!
//! Every detected correction is appended verbatim, one JSON object per line,
//! with a generated `corr-` id and the detection time.

use crate::error::Result;
use crate::types::{Correction, CorrectionRecord};
use crate::utils::id::generate_id;
use chrono::Utc;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Append-only handle on `corrections.jsonl`
#[derive(Debug, Clone)]
pub struct CorrectionLog {
    path: PathBuf,
}

impl CorrectionLog {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a correction and return its generated id.
    ///
    /// The parent directory is created on first use.
    pub fn append(&self, correction: &Correction) -> Result<String> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let record = CorrectionRecord {
            id: generate_id("corr"),
            correction,
            detected_at: Utc::now(),
        };

        let mut line = serde_json::to_string(&record)?;
        line.push('\n');

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;

        Ok(record.id)
    }
}
