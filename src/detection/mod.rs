//! Correction detection over a window of observations
//!
//! The aggregator runs every pairwise pattern over each observation and its
//! next `pair_lookahead` neighbours, then the repeated-command detector once
//! over the whole window. Results are concatenated without cross-dedup.

pub mod normalize;
pub mod patterns;
pub mod repeated;

pub use normalize::normalize_command;
pub use patterns::PairPattern;
pub use repeated::detect_repeated_commands;

use crate::config::DetectionConfig;
use crate::types::{Correction, CorrectionKind, Observation};
use serde::Serialize;
use tracing::debug;

/// Run all pairwise patterns over a time-ordered window.
///
/// A correction separated from its origin by more than `pair_lookahead`
/// unrelated observations is not reported.
pub fn detect_pairwise(observations: &[Observation], config: &DetectionConfig) -> Vec<Correction> {
    let mut corrections = Vec::new();

    for (i, a) in observations.iter().enumerate() {
        let end = observations
            .len()
            .min(i.saturating_add(1).saturating_add(config.pair_lookahead));

        for b in &observations[i + 1..end] {
            for pattern in PairPattern::ALL {
                if !pattern.matches(a, b, config) {
                    continue;
                }
                if let Some(correction) = pattern.build(a, b) {
                    debug!(pattern = ?pattern, at = %correction.timestamp, "pairwise correction");
                    corrections.push(correction);
                }
            }
        }
    }

    corrections
}

/// Run every detector over the window: pairwise results first, then
/// repeated commands.
pub fn detect_corrections(observations: &[Observation], config: &DetectionConfig) -> Vec<Correction> {
    let mut corrections = detect_pairwise(observations, config);
    corrections.extend(detect_repeated_commands(observations, config));
    corrections
}

/// Correction counts per detector
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KindCounts {
    pub edit_retry: usize,
    pub error_recovery: usize,
    pub write_override: usize,
    pub repeated_command: usize,
}

impl KindCounts {
    pub fn tally(corrections: &[Correction]) -> Self {
        let mut counts = Self::default();
        for correction in corrections {
            match correction.kind() {
                CorrectionKind::EditRetry => counts.edit_retry += 1,
                CorrectionKind::ErrorRecovery => counts.error_recovery += 1,
                CorrectionKind::WriteOverride => counts.write_override += 1,
                CorrectionKind::RepeatedCommand => counts.repeated_command += 1,
                CorrectionKind::Other(_) => {}
            }
        }
        counts
    }
}
