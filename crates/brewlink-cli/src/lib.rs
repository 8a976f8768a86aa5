//! # brewlink-cli
//!
//! Library half of the `brewlink` operator tool.  The binary in `main.rs`
//! only parses arguments and installs logging; everything it prints is
//! produced here so it can be tested without spawning a process.
//!
//! - **`config`** – The CLI configuration file: log level and the table of
//!   model names to device map paths.
//! - **`commands`** – One function per subcommand, each returning the text
//!   to print.

pub mod commands;
pub mod config;

pub use commands::CliError;
pub use config::{load_config, CliConfig, ConfigError};
