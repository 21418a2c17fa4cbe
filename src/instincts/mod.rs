//! Instinct synthesis and duplicate suppression

pub mod dedup;
pub mod synthesis;

pub use dedup::DedupGateway;
pub use synthesis::{repeated_command_confidence, synthesize};
