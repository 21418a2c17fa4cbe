//! Core data types for the Lattice correction detector
//!
//! Observations are what the instrumentation layer logs for every tool call.
//! Corrections are the patterns detected across them, and instincts are the
//! reusable lessons synthesized from corrections for the knowledge store.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};
use std::fmt;

/// Lifecycle event recorded for a tool call
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ObservationEvent {
    /// Tool call about to run
    PreToolUse,

    /// Tool call completed; `success` is recorded alongside
    PostToolUse,

    /// Tool call failed
    ToolError,

    /// Any other event sharing the log (kept verbatim)
    Other(String),
}

impl Default for ObservationEvent {
    fn default() -> Self {
        ObservationEvent::Other(String::new())
    }
}

impl From<String> for ObservationEvent {
    fn from(value: String) -> Self {
        match value.as_str() {
            "PreToolUse" => ObservationEvent::PreToolUse,
            "PostToolUse" => ObservationEvent::PostToolUse,
            "ToolError" => ObservationEvent::ToolError,
            _ => ObservationEvent::Other(value),
        }
    }
}

impl From<ObservationEvent> for String {
    fn from(event: ObservationEvent) -> Self {
        match event {
            ObservationEvent::PreToolUse => "PreToolUse".to_string(),
            ObservationEvent::PostToolUse => "PostToolUse".to_string(),
            ObservationEvent::ToolError => "ToolError".to_string(),
            ObservationEvent::Other(name) => name,
        }
    }
}

/// Open-ended tool arguments
///
/// The shape depends on the tool. Accessors try every known alias of a field
/// in a fixed order and the first non-empty string wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ToolArgs(pub Map<String, Value>);

// `null` args are logged for tools without parameters
impl<'de> Deserialize<'de> for ToolArgs {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<Map<String, Value>>::deserialize(deserializer)
            .map(|args| ToolArgs(args.unwrap_or_default()))
    }
}

impl ToolArgs {
    const FILE_PATH_ALIASES: &'static [&'static str] = &["file_path", "filePath"];

    /// First non-empty string found under any of `keys`
    pub fn first_str(&self, keys: &[&str]) -> Option<&str> {
        keys.iter()
            .filter_map(|key| self.0.get(*key))
            .filter_map(Value::as_str)
            .find(|s| !s.is_empty())
    }

    /// Target file of an edit or write
    pub fn file_path(&self) -> Option<&str> {
        self.first_str(Self::FILE_PATH_ALIASES)
    }

    /// Shell command string
    pub fn command(&self) -> Option<&str> {
        self.first_str(&["command"])
    }

    /// Text an edit replaced
    pub fn old_string(&self) -> Option<&str> {
        self.first_str(&["old_string"])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Read an optional field, treating a value of the wrong type as absent.
///
/// Only `timestamp` decides whether a log line is usable; the loosely
/// typed payload fields must not discard an otherwise valid observation.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

/// One logged tool-use event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// When the event was logged
    pub timestamp: DateTime<Utc>,

    /// Lifecycle event
    #[serde(default)]
    pub event: ObservationEvent,

    /// Invoked tool name
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,

    /// Tool arguments
    #[serde(default, skip_serializing_if = "ToolArgs::is_empty")]
    pub args: ToolArgs,

    /// Outcome flag for completed calls
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,

    /// Outcome payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    /// Call duration in milliseconds, kept as logged (may be fractional)
    #[serde(
        default,
        alias = "duration",
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub duration_ms: Option<Number>,

    /// Fields this crate does not interpret, preserved for the corrections log
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Observation {
    /// Check whether this observation was produced by `tool`
    pub fn is_tool(&self, tool: &str) -> bool {
        self.tool.as_deref() == Some(tool)
    }

    /// Completed call (regardless of outcome)
    pub fn is_completed(&self) -> bool {
        self.event == ObservationEvent::PostToolUse
    }

    /// Completed call that reported success
    pub fn is_success(&self) -> bool {
        self.is_completed() && self.success == Some(true)
    }

    /// Failed call: an explicit tool error, or a completion without success
    pub fn is_failure(&self) -> bool {
        match self.event {
            ObservationEvent::ToolError => true,
            ObservationEvent::PostToolUse => self.success != Some(true),
            _ => false,
        }
    }

    /// Error payload: `result.error` when present, otherwise the whole result
    pub fn error_payload(&self) -> Option<&Value> {
        let result = self.result.as_ref()?;
        match result.get("error") {
            Some(error) if !error.is_null() => Some(error),
            _ => Some(result),
        }
    }

    /// Milliseconds from `self` to `later` (negative if `later` is earlier)
    pub fn millis_until(&self, later: &Observation) -> i64 {
        (later.timestamp - self.timestamp).num_milliseconds()
    }
}

/// Detector that produced a correction
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CorrectionKind {
    EditRetry,
    ErrorRecovery,
    WriteOverride,
    RepeatedCommand,
    /// Correction raised by a caller-supplied detector
    Other(String),
}

impl CorrectionKind {
    pub fn as_str(&self) -> &str {
        match self {
            CorrectionKind::EditRetry => "edit_retry",
            CorrectionKind::ErrorRecovery => "error_recovery",
            CorrectionKind::WriteOverride => "write_override",
            CorrectionKind::RepeatedCommand => "repeated_command",
            CorrectionKind::Other(label) => label,
        }
    }
}

impl fmt::Display for CorrectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for CorrectionKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Context captured for an edit retry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditRetryContext {
    pub original_old_string: Option<String>,
    pub correction_old_string: Option<String>,
}

/// Context captured for an error recovery
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorRecoveryContext {
    pub error: Option<Value>,
    pub successful_args: ToolArgs,
}

/// Context captured for a write override
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WriteOverrideContext {
    pub failed_edit: Option<String>,
}

/// Context captured for a repeated command group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepeatedCommandContext {
    pub first_execution: DateTime<Utc>,
    pub last_execution: DateTime<Utc>,
    pub success_rate: f64,
}

/// One execution belonging to a repeated command group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandExecution {
    pub timestamp: DateTime<Utc>,
    pub original_command: String,
    pub success: Option<bool>,
    pub duration_ms: Option<Number>,
}

/// Evidence and context of a detected correction, tagged by detector
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CorrectionSignal {
    /// Same file edited twice in quick succession
    EditRetry {
        original: Observation,
        correction: Observation,
        file_path: String,
        context: EditRetryContext,
    },

    /// Tool error followed by a successful call of the same tool
    ErrorRecovery {
        original: Observation,
        correction: Observation,
        tool: String,
        context: ErrorRecoveryContext,
    },

    /// Failed edit overridden by a whole-file write
    WriteOverride {
        original: Observation,
        correction: Observation,
        file_path: String,
        context: WriteOverrideContext,
    },

    /// Same normalized shell command run over and over
    RepeatedCommand {
        command: String,
        count: usize,
        executions: Vec<CommandExecution>,
        context: RepeatedCommandContext,
    },

    /// Correction from a detector without a dedicated instinct template
    Custom { label: String, context: Value },
}

/// A detected correction pattern
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Correction {
    /// Time of the triggering observation
    pub timestamp: DateTime<Utc>,

    #[serde(flatten)]
    pub signal: CorrectionSignal,
}

impl Correction {
    pub fn kind(&self) -> CorrectionKind {
        match &self.signal {
            CorrectionSignal::EditRetry { .. } => CorrectionKind::EditRetry,
            CorrectionSignal::ErrorRecovery { .. } => CorrectionKind::ErrorRecovery,
            CorrectionSignal::WriteOverride { .. } => CorrectionKind::WriteOverride,
            CorrectionSignal::RepeatedCommand { .. } => CorrectionKind::RepeatedCommand,
            CorrectionSignal::Custom { label, .. } => CorrectionKind::Other(label.clone()),
        }
    }
}

/// Correction as written to the corrections log
#[derive(Debug, Clone, Serialize)]
pub struct CorrectionRecord<'a> {
    pub id: String,
    #[serde(flatten)]
    pub correction: &'a Correction,
    pub detected_at: DateTime<Utc>,
}

/// Scope of a persisted instinct
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InstinctScope {
    Global,
}

impl InstinctScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstinctScope::Global => "global",
        }
    }
}

/// Where an instinct came from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstinctProvenance {
    pub source: String,
    pub detection_type: String,
    pub detected_at: DateTime<Utc>,
}

/// A reusable lesson derived from one correction
///
/// Only built through [`Instinct::new`], so the confidence is always clamped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Instinct {
    pub scope: InstinctScope,
    pub project_id: Option<String>,
    pub category: String,
    pub summary: String,
    pub trigger: Option<String>,
    pub action: Option<String>,
    pub detail: Option<String>,
    /// Always within [0, 1]; use [`Instinct::set_confidence`] to change it
    confidence: f64,
    pub tags: Vec<String>,
    pub context: InstinctProvenance,
}

impl Instinct {
    /// Create a global instinct with clamped confidence
    pub fn new(
        category: impl Into<String>,
        summary: impl Into<String>,
        confidence: f64,
        context: InstinctProvenance,
    ) -> Self {
        let mut instinct = Self {
            scope: InstinctScope::Global,
            project_id: None,
            category: category.into(),
            summary: summary.into(),
            trigger: None,
            action: None,
            detail: None,
            confidence: 0.0,
            tags: vec!["auto-detected".to_string(), "user-correction".to_string()],
            context,
        };
        instinct.set_confidence(confidence);
        instinct
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Set confidence, clamping into [0, 1] (NaN becomes 0)
    pub fn set_confidence(&mut self, confidence: f64) {
        self.confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> Observation {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_event_parsing() {
        let obs = parse(json!({"timestamp": "2025-01-01T00:00:00Z", "event": "ToolError"}));
        assert_eq!(obs.event, ObservationEvent::ToolError);

        let obs = parse(json!({"timestamp": "2025-01-01T00:00:00Z", "event": "task_completed_check"}));
        assert_eq!(
            obs.event,
            ObservationEvent::Other("task_completed_check".to_string())
        );
    }

    #[test]
    fn test_missing_event_defaults_to_other() {
        let obs = parse(json!({"timestamp": "2025-01-01T00:00:00Z", "tool": "Edit"}));
        assert_eq!(obs.event, ObservationEvent::Other(String::new()));
        assert!(!obs.is_failure());
    }

    #[test]
    fn test_file_path_alias_order() {
        let args: ToolArgs = serde_json::from_value(json!({
            "file_path": "a.py",
            "filePath": "b.py"
        }))
        .unwrap();
        assert_eq!(args.file_path(), Some("a.py"));

        let args: ToolArgs = serde_json::from_value(json!({"filePath": "b.py"})).unwrap();
        assert_eq!(args.file_path(), Some("b.py"));

        let args: ToolArgs = serde_json::from_value(json!({"file_path": "", "filePath": "b.py"})).unwrap();
        assert_eq!(args.file_path(), Some("b.py"));

        let args: ToolArgs = serde_json::from_value(json!({"file_path": 42})).unwrap();
        assert_eq!(args.file_path(), None);
    }

    #[test]
    fn test_extra_fields_preserved() {
        let obs = parse(json!({
            "timestamp": "2025-01-01T00:00:00Z",
            "event": "PostToolUse",
            "tool": "Bash",
            "session_id": "abc"
        }));
        assert_eq!(obs.extra.get("session_id"), Some(&json!("abc")));

        let back = serde_json::to_value(&obs).unwrap();
        assert_eq!(back["session_id"], json!("abc"));
        assert_eq!(back["event"], json!("PostToolUse"));
    }

    #[test]
    fn test_null_args() {
        let obs = parse(json!({"timestamp": "2025-01-01T00:00:00Z", "args": null}));
        assert!(obs.args.is_empty());
    }

    #[test]
    fn test_duration_alias() {
        let obs = parse(json!({"timestamp": "2025-01-01T00:00:00Z", "duration": 12}));
        assert_eq!(obs.duration_ms.as_ref().and_then(Number::as_u64), Some(12));
    }

    #[test]
    fn test_loose_payload_fields_kept() {
        let obs = parse(json!({
            "timestamp": "2025-01-01T00:00:00Z",
            "event": "PostToolUse",
            "tool": "Edit",
            "duration_ms": 12.5
        }));
        assert_eq!(obs.duration_ms.as_ref().and_then(Number::as_f64), Some(12.5));
        assert_eq!(serde_json::to_value(&obs).unwrap()["duration_ms"], json!(12.5));

        let obs = parse(json!({"timestamp": "2025-01-01T00:00:00Z", "duration_ms": -3}));
        assert_eq!(obs.duration_ms.as_ref().and_then(Number::as_i64), Some(-3));
    }

    #[test]
    fn test_mistyped_payload_fields_are_absent() {
        let obs = parse(json!({
            "timestamp": "2025-01-01T00:00:00Z",
            "event": "PostToolUse",
            "tool": 7,
            "success": "yes",
            "duration_ms": "fast"
        }));
        assert_eq!(obs.tool, None);
        assert_eq!(obs.success, None);
        assert_eq!(obs.duration_ms, None);
        assert!(obs.is_failure());
    }

    #[test]
    fn test_failure_classification() {
        let failed = parse(json!({"timestamp": "2025-01-01T00:00:00Z", "event": "PostToolUse", "success": false}));
        assert!(failed.is_failure());
        assert!(!failed.is_success());

        let ok = parse(json!({"timestamp": "2025-01-01T00:00:00Z", "event": "PostToolUse", "success": true}));
        assert!(ok.is_success());
        assert!(!ok.is_failure());

        let pre = parse(json!({"timestamp": "2025-01-01T00:00:00Z", "event": "PreToolUse"}));
        assert!(!pre.is_failure());
    }

    #[test]
    fn test_error_payload() {
        let obs = parse(json!({
            "timestamp": "2025-01-01T00:00:00Z",
            "event": "ToolError",
            "result": {"error": "old_string not found"}
        }));
        assert_eq!(obs.error_payload(), Some(&json!("old_string not found")));

        let obs = parse(json!({
            "timestamp": "2025-01-01T00:00:00Z",
            "event": "ToolError",
            "result": "boom"
        }));
        assert_eq!(obs.error_payload(), Some(&json!("boom")));
    }

    #[test]
    fn test_confidence_clamped() {
        let provenance = InstinctProvenance {
            source: "test".to_string(),
            detection_type: "edit_retry".to_string(),
            detected_at: Utc::now(),
        };
        let instinct = Instinct::new("general", "x", 1.7, provenance.clone());
        assert_eq!(instinct.confidence(), 1.0);

        let value = serde_json::to_value(&instinct).unwrap();
        assert_eq!(value["confidence"], json!(1.0));
        assert_eq!(value["scope"], json!("global"));

        let instinct = Instinct::new("general", "x", -0.2, provenance.clone());
        assert_eq!(instinct.confidence(), 0.0);

        let instinct = Instinct::new("general", "x", f64::NAN, provenance);
        assert_eq!(instinct.confidence(), 0.0);
    }

    #[test]
    fn test_correction_serializes_with_type_tag() {
        let correction = Correction {
            timestamp: "2025-01-01T00:00:30Z".parse().unwrap(),
            signal: CorrectionSignal::Custom {
                label: "manual_revert".to_string(),
                context: json!({"files": 2}),
            },
        };
        let value = serde_json::to_value(&correction).unwrap();
        assert_eq!(value["type"], json!("custom"));
        assert_eq!(value["label"], json!("manual_revert"));
        assert_eq!(value["timestamp"], json!("2025-01-01T00:00:30Z"));
        assert_eq!(correction.kind().as_str(), "manual_revert");
    }
}
