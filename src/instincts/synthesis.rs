//! Correction → instinct mapping
//!
//! Every correction yields exactly one instinct. Detectors without a template
//! of their own fall back to a generic `general` instinct.

use crate::types::{Correction, CorrectionSignal, Instinct, InstinctProvenance};
use crate::utils::string::take_chars;
use chrono::{DateTime, Utc};
use std::path::Path;

/// Provenance source recorded on every synthesized instinct
pub const INSTINCT_SOURCE: &str = "detect-corrections";

/// Confidence for edit retries and write overrides
pub const EDIT_CONFIDENCE: f64 = 0.6;

/// Confidence for error recoveries
pub const ERROR_RECOVERY_CONFIDENCE: f64 = 0.7;

/// Confidence for corrections without a dedicated template
pub const DEFAULT_CONFIDENCE: f64 = 0.6;

/// Confidence for a command repeated `count` times: 0.5 plus 0.05 per
/// repetition, capped at 0.8
pub fn repeated_command_confidence(count: usize) -> f64 {
    0.5 + (count as f64 * 0.05).min(0.3)
}

fn file_name(path: &str) -> &str {
    Path::new(path)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(path)
}

/// Build the instinct for one correction
pub fn synthesize(correction: &Correction, detected_at: DateTime<Utc>) -> Instinct {
    let provenance = InstinctProvenance {
        source: INSTINCT_SOURCE.to_string(),
        detection_type: correction.kind().to_string(),
        detected_at,
    };

    match &correction.signal {
        CorrectionSignal::EditRetry { file_path, .. } => {
            let mut instinct = Instinct::new(
                "code-editing",
                format!("Edit pattern: Retry needed for {}", file_name(file_path)),
                EDIT_CONFIDENCE,
                provenance,
            );
            instinct.trigger = Some(format!("Editing {} with similar pattern", file_path));
            instinct.action = Some("Consider the corrected approach used in the retry".to_string());
            instinct.detail = Some(
                "Original edit was retried, suggesting the first approach was incorrect. \
                 The correction may indicate a better pattern for similar edits."
                    .to_string(),
            );
            instinct
        }

        CorrectionSignal::ErrorRecovery { tool, context, .. } => {
            let error = context
                .error
                .as_ref()
                .map(|e| match e.as_str() {
                    Some(text) => take_chars(text, 200),
                    None => take_chars(&e.to_string(), 200),
                })
                .unwrap_or_else(|| "unknown".to_string());

            let mut instinct = Instinct::new(
                "error-handling",
                format!("Error recovery: {} usage pattern", tool),
                ERROR_RECOVERY_CONFIDENCE,
                provenance,
            );
            instinct.trigger = Some(format!("Using {} in similar context", tool));
            instinct.action = Some("Apply the successful approach that resolved the error".to_string());
            instinct.detail = Some(format!(
                "Tool {} failed initially but succeeded with modified approach. Error: {}",
                tool, error
            ));
            instinct
        }

        CorrectionSignal::WriteOverride { file_path, .. } => {
            let mut instinct = Instinct::new(
                "code-editing",
                "Override pattern: Manual write after Edit failure",
                EDIT_CONFIDENCE,
                provenance,
            );
            instinct.trigger = Some(format!("Edit failing on {}", file_path));
            instinct.action = Some(
                "Consider using Write tool directly when Edit encounters issues".to_string(),
            );
            instinct.detail = Some(
                "Edit operation failed and was overridden with Write. \
                 This may indicate the edit pattern was too complex or the file state unexpected."
                    .to_string(),
            );
            instinct
        }

        CorrectionSignal::RepeatedCommand {
            command,
            count,
            context,
            ..
        } => {
            let mut instinct = Instinct::new(
                "workflow",
                format!("Repeated command: {}", take_chars(command, 50)),
                repeated_command_confidence(*count),
                provenance,
            );
            instinct.trigger = Some("Similar workflow requiring this command".to_string());
            instinct.action = Some(
                "This command is frequently used - consider it standard practice".to_string(),
            );
            instinct.detail = Some(format!(
                "Command executed {} times with {}% success rate. \
                 May indicate a common workflow pattern worth automating or documenting.",
                count,
                (context.success_rate * 100.0).round()
            ));
            instinct
        }

        CorrectionSignal::Custom { label, .. } => Instinct::new(
            "general",
            format!("Detected correction pattern: {}", label),
            DEFAULT_CONFIDENCE,
            provenance,
        ),
    }
}
