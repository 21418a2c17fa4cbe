// Detection Configuration
//
// Paths, time windows, and thresholds for a correction-detection run.
// Everything the engine needs is carried here and passed in explicitly.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Environment variable overriding the Claude home directory
pub const CLAUDE_DIR_ENV: &str = "CLAUDE_DIR";

/// Environment variable overriding the knowledge store location
pub const DB_PATH_ENV: &str = "LATTICE_DB_PATH";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Upper bound for any configured window (100 years)
pub const MAX_WINDOW: Duration = Duration::from_secs(100 * 365 * 24 * 3600);

/// Top-level configuration for the detector
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LatticeConfig {
    /// File locations
    #[serde(default)]
    pub paths: PathsConfig,

    /// Detector windows and thresholds
    #[serde(default)]
    pub detection: DetectionConfig,
}

/// Locations of the observation log, corrections log, and knowledge store
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Append-only observation log (JSON lines)
    pub observations_file: PathBuf,

    /// Directory holding `corrections.jsonl`
    pub corrections_dir: PathBuf,

    /// SQLite knowledge store
    pub knowledge_db: PathBuf,
}

impl PathsConfig {
    /// Lay out all paths under a Claude home directory
    pub fn under(claude_dir: &Path) -> Self {
        let homunculus = claude_dir.join("homunculus");
        Self {
            observations_file: homunculus.join("observations.jsonl"),
            corrections_dir: homunculus.join("corrections"),
            knowledge_db: claude_dir.join("knowledge").join("lattice.db"),
        }
    }

    /// Path of the corrections log inside `corrections_dir`
    pub fn corrections_file(&self) -> PathBuf {
        self.corrections_dir.join("corrections.jsonl")
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        let mut paths = Self::under(&claude_dir());
        if let Some(db) = std::env::var_os(DB_PATH_ENV).filter(|v| !v.is_empty()) {
            paths.knowledge_db = PathBuf::from(db);
        }
        paths
    }
}

/// Resolve the Claude home directory from `CLAUDE_DIR` or `~/.claude`
pub fn claude_dir() -> PathBuf {
    std::env::var_os(CLAUDE_DIR_ENV)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".claude")
        })
}

/// Tool names as they appear in the `tool` field of observations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolNames {
    pub edit: String,
    pub write: String,
    pub shell: String,
}

impl Default for ToolNames {
    fn default() -> Self {
        Self {
            edit: "Edit".to_string(),
            write: "Write".to_string(),
            shell: "Bash".to_string(),
        }
    }
}

/// Windows and thresholds used by the pattern matchers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Maximum gap between two edits of the same file (in seconds)
    #[serde(with = "serde_duration")]
    pub edit_retry_window: Duration,

    /// Maximum gap between a tool error and the successful retry (in seconds)
    #[serde(with = "serde_duration")]
    pub error_recovery_window: Duration,

    /// Maximum gap between a failed edit and the overriding write (in seconds)
    #[serde(with = "serde_duration")]
    pub write_override_window: Duration,

    /// Minimum executions of one normalized command to flag it
    pub repeated_command_threshold: usize,

    /// How many following observations each observation is paired with
    pub pair_lookahead: usize,

    /// Default look-back when no `since` instant is given (in seconds)
    #[serde(with = "serde_duration")]
    pub lookback: Duration,

    /// Tool names the matchers key on
    pub tools: ToolNames,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            edit_retry_window: Duration::from_secs(60),
            error_recovery_window: Duration::from_secs(120),
            write_override_window: Duration::from_secs(60),
            repeated_command_threshold: 3,
            pair_lookahead: 10,
            lookback: Duration::from_secs(3600), // 1 hour
            tools: ToolNames::default(),
        }
    }
}

// Custom serde module for Duration (serialize/deserialize as seconds)
mod serde_duration {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

impl LatticeConfig {
    /// Load configuration from TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    ///
    /// Missing sections and keys keep their defaults.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: LatticeConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults with paths resolved from `CLAUDE_DIR` and `LATTICE_DB_PATH`
    pub fn from_env() -> Self {
        Self {
            paths: PathsConfig::default(),
            detection: DetectionConfig::default(),
        }
    }

    /// Load from an optional file, falling back to the environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::from_env()),
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let detection = &self.detection;

        for (name, window) in [
            ("edit_retry_window", detection.edit_retry_window),
            ("error_recovery_window", detection.error_recovery_window),
            ("write_override_window", detection.write_override_window),
            ("lookback", detection.lookback),
        ] {
            if window.is_zero() {
                return Err(ConfigError::ValidationError(format!(
                    "{}: must be at least 1 second",
                    name
                )));
            }
            if window > MAX_WINDOW {
                return Err(ConfigError::ValidationError(format!(
                    "{}: must be at most {} seconds",
                    name,
                    MAX_WINDOW.as_secs()
                )));
            }
        }

        if detection.repeated_command_threshold == 0 {
            return Err(ConfigError::ValidationError(
                "repeated_command_threshold must be at least 1".to_string(),
            ));
        }

        if detection.pair_lookahead == 0 {
            return Err(ConfigError::ValidationError(
                "pair_lookahead must be at least 1".to_string(),
            ));
        }

        let tools = &detection.tools;
        if tools.edit.is_empty() || tools.write.is_empty() || tools.shell.is_empty() {
            return Err(ConfigError::ValidationError(
                "tool names must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}
