//! Worklog CLI library.
//!
//! This crate provides the command-line interface for the worklog
//! time-entry engine.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands, IssueAction, ProjectAction};
pub use config::Config;
