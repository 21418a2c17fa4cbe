//! CLI command handlers
//!
//! Each subcommand of the lattice binary is implemented in its own module.

pub mod detect;
pub mod init;
