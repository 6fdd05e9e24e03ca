//! CLI module
//!
//! Command-line interface for syncing campaign tags.
//!
//! # Commands
//!
//! - `sync` - Fetch campaign tags and replace the warehouse table
//! - `fetch` - Print campaign-tag rows as JSON lines
//! - `check` - Validate the API key

mod commands;
mod runner;

pub use commands::{Cli, Commands, DestinationArgs, FetchArgs, OutputFormat};
pub use runner::Runner;
