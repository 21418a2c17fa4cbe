//! Common test utilities and helpers

#![allow(dead_code)]

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use lattice_core::{LatticeConfig, PathsConfig, SqliteKnowledgeStore};
use serde_json::{json, Value};
use std::io::Write;
use tempfile::TempDir;

/// Start of every fixture session
pub const SESSION_START: &str = "2025-01-01T09:00:00Z";

pub fn session_start() -> DateTime<Utc> {
    SESSION_START.parse().expect("valid fixture timestamp")
}

/// Instant `secs` seconds after the fixture session start
pub fn at(secs: i64) -> String {
    (session_start() + Duration::seconds(secs)).to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// A temporary Claude home with its config
pub struct TestEnv {
    pub dir: TempDir,
    pub config: LatticeConfig,
}

impl TestEnv {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let config = LatticeConfig {
            paths: PathsConfig::under(dir.path()),
            ..Default::default()
        };
        Self { dir, config }
    }

    /// Provision the knowledge store
    pub fn provision_store(&self) -> SqliteKnowledgeStore {
        SqliteKnowledgeStore::provision(&self.config.paths.knowledge_db)
            .expect("Failed to provision store")
    }

    /// Append raw lines to the observation log
    pub fn append_lines(&self, lines: &[String]) {
        let path = &self.config.paths.observations_file;
        std::fs::create_dir_all(path.parent().unwrap()).expect("Failed to create log dir");

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .expect("Failed to open observation log");
        for line in lines {
            writeln!(file, "{}", line).expect("Failed to write observation");
        }
    }

    /// Append observations to the log
    pub fn append(&self, observations: &[Value]) {
        let lines: Vec<String> = observations.iter().map(Value::to_string).collect();
        self.append_lines(&lines);
    }

    /// Parsed lines of the corrections log
    pub fn corrections(&self) -> Vec<Value> {
        match std::fs::read_to_string(self.config.paths.corrections_file()) {
            Ok(content) => content
                .lines()
                .map(|l| serde_json::from_str(l).expect("corrections log line is JSON"))
                .collect(),
            Err(_) => Vec::new(),
        }
    }
}

/// Completed edit of `path`
pub fn edit(secs: i64, path: &str) -> Value {
    json!({
        "timestamp": at(secs),
        "event": "PostToolUse",
        "tool": "Edit",
        "args": {"file_path": path, "old_string": "fn old()", "new_string": "fn new()"},
        "success": true
    })
}

/// Failed edit of `path`
pub fn failed_edit(secs: i64, path: &str) -> Value {
    json!({
        "timestamp": at(secs),
        "event": "ToolError",
        "tool": "Edit",
        "args": {"file_path": path, "old_string": "no such text"},
        "result": {"error": "old_string not found in file"}
    })
}

/// Completed write of `path`
pub fn write(secs: i64, path: &str) -> Value {
    json!({
        "timestamp": at(secs),
        "event": "PostToolUse",
        "tool": "Write",
        "args": {"file_path": path, "content": "..."},
        "success": true
    })
}

/// Completed shell command
pub fn bash(secs: i64, command: &str, success: bool) -> Value {
    json!({
        "timestamp": at(secs),
        "event": "PostToolUse",
        "tool": "Bash",
        "args": {"command": command},
        "success": success,
        "duration_ms": 120
    })
}

/// Failed shell command
pub fn bash_error(secs: i64, command: &str) -> Value {
    json!({
        "timestamp": at(secs),
        "event": "ToolError",
        "tool": "Bash",
        "args": {"command": command},
        "result": {"error": "exit status 1"}
    })
}
