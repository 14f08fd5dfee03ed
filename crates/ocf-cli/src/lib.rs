//! Library half of the `ocf` command line tool.
//!
//! The binary is a thin wrapper: it parses [`CliConfig`], installs logging
//! and hands off to [`commands::run`]. Every command writes its report to a
//! caller-supplied writer so it can be exercised in tests.

#![warn(missing_docs)]

pub mod commands;
pub mod config;

pub use commands::run;
pub use config::{CliConfig, Command, ReadArgs, WriteArgs};
