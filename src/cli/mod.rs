//! Command-line interface definitions and helpers.
//!
//! This module contains all CLI argument parsing, enums, and subcommand handlers.

mod args;
mod commands;
mod enums;

pub use args::{Args, Command, ConfigAction, Point, RenderArgs};
pub use commands::{
    default_output, handle_config_action, resolve_parameters, run_inspect, run_render,
    CommandError,
};
pub use enums::StyleArg;
