//! Access Pass command-line adapter layer
//!
//! Bootstrap (config, tracing, wiring), the terminal implementations of the
//! presentation ports and the clap command handlers.

pub mod adapters;
pub mod bootstrap;
pub mod cli;
pub mod commands;

pub use bootstrap::run;
pub use cli::Cli;
