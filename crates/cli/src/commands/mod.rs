//! CLI subcommands.

pub mod env;
pub mod orders;
