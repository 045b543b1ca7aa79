//! CLI, configuration and commands
//!
//! This crate provides the `cadence` command-line interface over a JSON
//! event catalog.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;

pub use cli::Cli;
pub use error::{ClientError, ClientResult};
