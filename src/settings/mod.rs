//! TOML settings (see `settings/dev.toml`) plus the command line.

mod cli;
pub use clap::{Parser, Subcommand};
pub use cli::*;

mod settings;
pub use settings::*;
