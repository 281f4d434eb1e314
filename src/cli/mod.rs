//! Command-line interface components
//!
//! This module contains CLI-specific code for the OOI Requests application,
//! including argument parsing, command handlers and interactive prompts.

pub mod args;
pub mod commands;
pub mod prompt;

pub use args::{
    AuthAction, AuthArgs, Cli, Commands, CompareArgs, ConfigAction, ConfigArgs, GlobalArgs,
    RunArgs, SendArgs,
};
pub use commands::{handle_auth, handle_compare, handle_config, handle_run, handle_send};
