//! Run summary
//!
//! A [`DetectionReport`] is emitted once per detection run, either as a JSON
//! document on stdout or as a short human-readable banner.

use crate::detection::KindCounts;
use crate::error::Result;
use crate::types::CorrectionKind;
use crate::utils::string::take_chars;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Event name carried by every report
pub const REPORT_EVENT: &str = "detect_corrections";

/// Message attached to runs without observations
pub const NO_OBSERVATIONS_MESSAGE: &str = "No observations found in the specified time range";

/// Number of results listed in verbose human output
const DETAIL_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    NoObservations,
}

/// Outcome for a single detected correction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrectionResult {
    pub correction_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: CorrectionKind,
    pub timestamp: DateTime<Utc>,
    pub instinct_created: bool,
    pub instinct_id: Option<String>,
    pub instinct_summary: String,
}

/// Summary of one detection run
#[derive(Debug, Clone, Serialize)]
pub struct DetectionReport {
    pub event: &'static str,
    pub timestamp: DateTime<Utc>,
    pub status: RunStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    pub observations_analyzed: usize,
    pub corrections_detected: usize,
    pub by_type: KindCounts,
    pub instincts_created: usize,
    pub dry_run: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,

    /// Per-correction outcomes, only kept for verbose runs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<CorrectionResult>>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl DetectionReport {
    /// Report for an empty observation window
    pub fn no_observations(dry_run: bool, session: Option<String>) -> Self {
        Self {
            event: REPORT_EVENT,
            timestamp: Utc::now(),
            status: RunStatus::NoObservations,
            message: Some(NO_OBSERVATIONS_MESSAGE.to_string()),
            observations_analyzed: 0,
            corrections_detected: 0,
            by_type: KindCounts::default(),
            instincts_created: 0,
            dry_run,
            session,
            results: None,
            errors: Vec::new(),
        }
    }

    /// Report for a completed run over `observations_analyzed` records
    pub fn completed(
        observations_analyzed: usize,
        by_type: KindCounts,
        results: Vec<CorrectionResult>,
        dry_run: bool,
        session: Option<String>,
        verbose: bool,
    ) -> Self {
        Self {
            event: REPORT_EVENT,
            timestamp: Utc::now(),
            status: RunStatus::Completed,
            message: None,
            observations_analyzed,
            corrections_detected: results.len(),
            by_type,
            instincts_created: results.iter().filter(|r| r.instinct_created).count(),
            dry_run,
            session,
            results: verbose.then_some(results),
            errors: Vec::new(),
        }
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn fmt_errors(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.errors.is_empty() {
            return Ok(());
        }
        writeln!(f, "\nErrors:")?;
        for error in &self.errors {
            writeln!(f, "  ! {}", error)?;
        }
        Ok(())
    }
}

/// Human-readable summary
impl fmt::Display for DetectionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.status == RunStatus::NoObservations {
            writeln!(f, "No observations found to analyze.")?;
            return self.fmt_errors(f);
        }

        writeln!(f, "\n=== Lattice Correction Detection ===")?;
        writeln!(f, "Observations analyzed: {}", self.observations_analyzed)?;
        writeln!(f, "Corrections detected: {}", self.corrections_detected)?;
        writeln!(f, "\nBy type:")?;
        writeln!(f, "  Edit retries: {}", self.by_type.edit_retry)?;
        writeln!(f, "  Error recoveries: {}", self.by_type.error_recovery)?;
        writeln!(f, "  Write overrides: {}", self.by_type.write_override)?;
        writeln!(f, "  Repeated commands: {}", self.by_type.repeated_command)?;

        if self.dry_run {
            writeln!(f, "\n(Dry run - no instincts created)")?;
        } else {
            writeln!(f, "\nInstincts created: {}", self.instincts_created)?;
        }

        if let Some(results) = self.results.as_ref().filter(|r| !r.is_empty()) {
            writeln!(f, "\nDetails:")?;
            for result in results.iter().take(DETAIL_LIMIT) {
                writeln!(
                    f,
                    "  - [{}] {}",
                    result.kind,
                    take_chars(&result.instinct_summary, 60)
                )?;
            }
            if results.len() > DETAIL_LIMIT {
                writeln!(f, "  ... and {} more", results.len() - DETAIL_LIMIT)?;
            }
        }

        self.fmt_errors(f)?;
        writeln!(f, "====================================")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn result(n: usize) -> CorrectionResult {
        CorrectionResult {
            correction_id: Some(format!("corr-{}", n)),
            kind: CorrectionKind::EditRetry,
            timestamp: "2025-01-01T00:00:30Z".parse().unwrap(),
            instinct_created: n % 2 == 0,
            instinct_id: (n % 2 == 0).then(|| format!("pat-{}", n)),
            instinct_summary: format!("Edit pattern: Retry needed for file{}.py", n),
        }
    }

    #[test]
    fn test_no_observations_json() {
        let report = DetectionReport::no_observations(false, Some("sess-1".to_string()));
        let json: Value = serde_json::from_str(&report.to_json_pretty().unwrap()).unwrap();

        assert_eq!(json["event"], "detect_corrections");
        assert_eq!(json["status"], "no_observations");
        assert_eq!(json["message"], NO_OBSERVATIONS_MESSAGE);
        assert_eq!(json["session"], "sess-1");
        assert!(json.get("results").is_none());
        assert!(json.get("errors").is_none());
    }

    #[test]
    fn test_completed_counts_and_verbose_results() {
        let counts = KindCounts {
            edit_retry: 3,
            ..Default::default()
        };
        let results = vec![result(0), result(1), result(2)];

        let quiet = DetectionReport::completed(12, counts, results.clone(), false, None, false);
        assert_eq!(quiet.corrections_detected, 3);
        assert_eq!(quiet.instincts_created, 2);
        assert!(quiet.results.is_none());

        let verbose = DetectionReport::completed(12, counts, results, false, None, true);
        let json: Value = serde_json::to_value(&verbose).unwrap();
        assert_eq!(json["status"], "completed");
        assert_eq!(json["by_type"]["edit_retry"], 3);
        assert_eq!(json["by_type"]["repeated_command"], 0);
        assert_eq!(json["results"][0]["type"], "edit_retry");
        assert_eq!(json["results"][1]["instinct_id"], Value::Null);
        assert!(json.get("message").is_none());
    }

    #[test]
    fn test_errors_serialized_when_present() {
        let mut report = DetectionReport::no_observations(true, None);
        report.errors.push("invalid timestamp: yesterday".to_string());

        let json: Value = serde_json::to_value(&report).unwrap();
        assert_eq!(json["errors"][0], "invalid timestamp: yesterday");
        assert!(report.to_string().contains("! invalid timestamp: yesterday"));
    }

    #[test]
    fn test_human_dry_run_banner() {
        let report = DetectionReport::completed(5, KindCounts::default(), vec![], true, None, false);
        let text = report.to_string();
        assert!(text.contains("=== Lattice Correction Detection ==="));
        assert!(text.contains("Observations analyzed: 5"));
        assert!(text.contains("(Dry run - no instincts created)"));
        assert!(!text.contains("Instincts created"));
    }

    #[test]
    fn test_human_details_limited() {
        let results: Vec<_> = (0..13).map(result).collect();
        let report =
            DetectionReport::completed(40, KindCounts::tally(&[]), results, false, None, true);
        let text = report.to_string();

        assert!(text.contains("Instincts created: 7"));
        assert_eq!(text.matches("  - [edit_retry]").count(), 10);
        assert!(text.contains("... and 3 more"));
    }
}
