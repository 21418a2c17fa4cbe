//! Shell command normalization
//!
//! Erases the volatile parts of a command line so that repeated invocations
//! of the same operation compare equal.

use once_cell::sync::Lazy;
use regex::Regex;

static HEX_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)[0-9a-f]{8,}").unwrap());
static DECIMAL_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{10,}").unwrap());
static TEMP_PATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"/tmp/\S+").unwrap());
static PORT: Lazy<Regex> = Lazy::new(|| Regex::new(r":[0-9]+").unwrap());

/// Canonicalize a command string.
///
/// Replacements run in a fixed order: hex-like tokens of 8+ characters,
/// decimal runs of 10+ digits, `/tmp/` paths, then `:port` suffixes. The
/// result is trimmed.
pub fn normalize_command(command: &str) -> String {
    let normalized = HEX_RUN.replace_all(command, "<hash>");
    let normalized = DECIMAL_RUN.replace_all(&normalized, "<timestamp>");
    let normalized = TEMP_PATH.replace_all(&normalized, "<tmpfile>");
    let normalized = PORT.replace_all(&normalized, ":<port>");
    normalized.trim().to_string()
}
