//! Subcommand implementations.

pub mod export;
pub mod history;
pub mod manage;
pub mod predict;
pub mod stats;
