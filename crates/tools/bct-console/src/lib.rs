//! Command-line shell for the BCT admin console.
//!
//! Runs the same session, guard and admin API stack as the web console,
//! with the browser replaced by printed URLs and a session file.

pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;

pub use commands::{Console, PrintRedirector};
pub use config::ConsoleConfig;
