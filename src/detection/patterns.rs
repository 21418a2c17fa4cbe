//! Pairwise correction patterns
//!
//! Each pattern is a predicate over two observations `(a, b)` where `a`
//! comes no later than `b` in window order. Tool and event checks run
//! before any timestamp arithmetic.

use crate::config::DetectionConfig;
use crate::types::{
    Correction, CorrectionSignal, EditRetryContext, ErrorRecoveryContext, Observation,
    ObservationEvent, WriteOverrideContext,
};
use crate::utils::string::take_chars;
use std::time::Duration;

/// Characters of `old_string` kept in correction context
const SNIPPET_CHARS: usize = 100;

/// Pairwise detectors, in the order they are evaluated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PairPattern {
    /// Same file edited twice within the edit-retry window
    EditRetry,
    /// Tool error followed by a successful call of the same tool
    ErrorRecovery,
    /// Failed edit followed by a write of the same file
    WriteOverride,
}

impl PairPattern {
    pub const ALL: [PairPattern; 3] = [
        PairPattern::EditRetry,
        PairPattern::ErrorRecovery,
        PairPattern::WriteOverride,
    ];

    /// Check whether the pair `(a, b)` exhibits this pattern
    pub fn matches(&self, a: &Observation, b: &Observation, config: &DetectionConfig) -> bool {
        match self {
            PairPattern::EditRetry => is_edit_retry(a, b, config),
            PairPattern::ErrorRecovery => is_error_recovery(a, b, config),
            PairPattern::WriteOverride => is_write_override(a, b, config),
        }
    }

    /// Build the correction for a matching pair
    ///
    /// Returns `None` when the pair lacks the data the pattern keys on, which
    /// cannot happen for pairs accepted by [`PairPattern::matches`].
    pub fn build(&self, a: &Observation, b: &Observation) -> Option<Correction> {
        let signal = match self {
            PairPattern::EditRetry => CorrectionSignal::EditRetry {
                file_path: a.args.file_path()?.to_string(),
                context: EditRetryContext {
                    original_old_string: a.args.old_string().map(|s| take_chars(s, SNIPPET_CHARS)),
                    correction_old_string: b
                        .args
                        .old_string()
                        .map(|s| take_chars(s, SNIPPET_CHARS)),
                },
                original: a.clone(),
                correction: b.clone(),
            },
            PairPattern::ErrorRecovery => CorrectionSignal::ErrorRecovery {
                tool: a.tool.clone()?,
                context: ErrorRecoveryContext {
                    error: a.error_payload().cloned(),
                    successful_args: b.args.clone(),
                },
                original: a.clone(),
                correction: b.clone(),
            },
            PairPattern::WriteOverride => CorrectionSignal::WriteOverride {
                file_path: a.args.file_path()?.to_string(),
                context: WriteOverrideContext {
                    failed_edit: a.args.old_string().map(|s| take_chars(s, SNIPPET_CHARS)),
                },
                original: a.clone(),
                correction: b.clone(),
            },
        };

        Some(Correction {
            timestamp: b.timestamp,
            signal,
        })
    }
}

fn window_millis(window: Duration) -> i64 {
    i64::try_from(window.as_millis()).unwrap_or(i64::MAX)
}

fn same_file(a: &Observation, b: &Observation) -> bool {
    match (a.args.file_path(), b.args.file_path()) {
        (Some(pa), Some(pb)) => pa == pb,
        _ => false,
    }
}

/// Two completed edits of the same file, less than the window apart
pub fn is_edit_retry(a: &Observation, b: &Observation, config: &DetectionConfig) -> bool {
    let edit = config.tools.edit.as_str();
    if !a.is_tool(edit) || !b.is_tool(edit) {
        return false;
    }
    if !a.is_completed() || !b.is_completed() {
        return false;
    }
    if !same_file(a, b) {
        return false;
    }

    a.millis_until(b).abs() < window_millis(config.edit_retry_window)
}

/// A tool error, then a successful call of the same tool strictly later
pub fn is_error_recovery(a: &Observation, b: &Observation, config: &DetectionConfig) -> bool {
    if a.event != ObservationEvent::ToolError {
        return false;
    }
    if !b.is_success() {
        return false;
    }
    if a.tool.is_none() || a.tool != b.tool {
        return false;
    }

    let gap = a.millis_until(b);
    gap > 0 && gap < window_millis(config.error_recovery_window)
}

/// A failed edit, then a write to the same file strictly later
pub fn is_write_override(a: &Observation, b: &Observation, config: &DetectionConfig) -> bool {
    if !a.is_tool(&config.tools.edit) || !b.is_tool(&config.tools.write) {
        return false;
    }
    if !a.is_failure() {
        return false;
    }
    if !same_file(a, b) {
        return false;
    }

    let gap = a.millis_until(b);
    gap > 0 && gap < window_millis(config.write_override_window)
}
