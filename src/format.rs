// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turning a [`LogRecord`](crate::LogRecord) into text.
//!
//! A [`Pipeline`] runs [`FormatStage`]s in order over a [`Rendering`].  Stages can
//! also be named in configuration; see [`crate::config::StageConfig`].
//!
//! ```
//! use contextlog::format::{ErrorChain, PartialFormatter, Pipeline};
//! use contextlog::{Level, LogRecord, fields};
//!
//! let pipeline = Pipeline::new()
//!     .push(PartialFormatter::new("[{levelname}] {message} {_extra}"))
//!     .push(ErrorChain);
//! let record = LogRecord::new(Level::Info, "app", "ready").with_fields(fields! { port = 8080 });
//! assert_eq!(pipeline.format(&record), "[INFO] ready port=8080");
//! ```

mod exception;
mod partial;
mod pipeline;

pub use exception::{DEFAULT_MAX_LINE_LEN, DEFAULT_MAX_VARS_LINES, ErrorChain, ExceptionLocals};
pub use partial::{DEFAULT_FORMAT, PartialFormatter};
pub use pipeline::{FormatStage, Pipeline, Rendering};
