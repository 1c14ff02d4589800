// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors returned by setup operations.
//!
//! Emitting a record never fails.  Only installing the registry and loading
//! configuration can.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A different `log::Log` implementation was installed first.
    #[error("another logger is already installed: {0}")]
    ForeignLogger(#[from] log::SetLoggerError),

    /// Configuration text could not be parsed.
    #[error("invalid logging configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// A configuration file could not be read.
    #[error("could not read logging configuration {}: {source}", .path.display())]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
