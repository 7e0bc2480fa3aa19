//! Shift compliance checker CLI library.
//!
//! This crate provides the CLI interface for the shift checker.

mod cli;
pub mod commands;
mod config;

pub use cli::Cli;
pub use config::Config;
