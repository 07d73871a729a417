//! Frontend components
//!
//! Configuration and the command-line console that drives the bridge
//! outside a UI host.

pub mod cli;
pub mod config;

pub use cli::main as cli_main;
pub use config::{BridgeConfig, ErrorValue};
