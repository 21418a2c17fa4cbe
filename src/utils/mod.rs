//! Shared helpers

pub mod id;
pub mod string;
pub mod time;
