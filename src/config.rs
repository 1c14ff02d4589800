// SPDX-License-Identifier: MIT OR Apache-2.0

//! Declarative setup.
//!
//! A [`LoggingConfig`] names the level, the formatting stages and which interception
//! patches to apply.  It is usually read from JSON:
//!
//! ```json
//! {
//!     "level": "debug",
//!     "formatters": [
//!         { "stage": "partial", "format": "{levelname} {name} [{request_id}] {message} {_extra}" },
//!         { "stage": "error_chain" },
//!         { "stage": "exception_locals", "max_vars_lines": 20 }
//!     ],
//!     "patch_threading": true
//! }
//! ```
//!
//! Every key is optional; see [`LoggingConfig::default`].

use crate::Level;
use crate::binding::Patch;
use crate::error::{Error, Result};
use crate::format::{
    DEFAULT_FORMAT, DEFAULT_MAX_LINE_LEN, DEFAULT_MAX_VARS_LINES, ErrorChain, ExceptionLocals,
    PartialFormatter, Pipeline,
};
use crate::global_handler::set_global_handlers;
use crate::stderror_handler::StdErrorHandler;
use crate::{registry, thread};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: Level,
    /// Stages of the stderr pipeline, in order.
    #[serde(default = "default_formatters")]
    pub formatters: Vec<StageConfig>,
    /// Attach enclosing context to records logged through the `log` macros.
    #[serde(default = "default_true")]
    pub patch_logging: bool,
    /// Carry context into threads started with [`crate::thread::spawn`].
    #[serde(default)]
    pub patch_threading: bool,
}

/// One formatting stage, selected by its `stage` name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum StageConfig {
    Partial {
        #[serde(default = "default_format")]
        format: String,
    },
    ErrorChain,
    ExceptionLocals {
        #[serde(default = "default_max_vars_lines")]
        max_vars_lines: usize,
        #[serde(default = "default_max_line_len")]
        max_line_len: usize,
    },
}

fn default_true() -> bool {
    true
}

fn default_format() -> String {
    DEFAULT_FORMAT.to_owned()
}

fn default_max_vars_lines() -> usize {
    DEFAULT_MAX_VARS_LINES
}

fn default_max_line_len() -> usize {
    DEFAULT_MAX_LINE_LEN
}

fn default_formatters() -> Vec<StageConfig> {
    vec![
        StageConfig::Partial {
            format: default_format(),
        },
        StageConfig::ErrorChain,
    ]
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::default(),
            formatters: default_formatters(),
            patch_logging: default_true(),
            patch_threading: false,
        }
    }
}

impl LoggingConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| Error::ConfigFile {
            path: path.to_owned(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Builds the configured stages, in order.
    pub fn pipeline(&self) -> Pipeline {
        self.formatters
            .iter()
            .fold(Pipeline::new(), |pipeline, stage| match stage {
                StageConfig::Partial { format } => {
                    pipeline.push(PartialFormatter::new(format.as_str()))
                }
                StageConfig::ErrorChain => pipeline.push(ErrorChain),
                StageConfig::ExceptionLocals {
                    max_vars_lines,
                    max_line_len,
                } => pipeline.push(ExceptionLocals {
                    max_vars_lines: *max_vars_lines,
                    max_line_len: *max_line_len,
                }),
            })
    }

    /// Replaces the global handlers with a stderr handler using [`pipeline`](Self::pipeline),
    /// installs the [`Registry`](crate::registry::Registry), and applies the requested patches.
    ///
    /// Returns whether the registry was newly installed.
    pub fn apply(&self) -> Result<Patch> {
        set_global_handlers(vec![Arc::new(StdErrorHandler::with_pipeline(
            self.pipeline(),
        ))]);
        let installed = registry::init(self.level)?;
        if self.patch_logging {
            registry::patch_logging();
        }
        if self.patch_threading {
            thread::patch_threading();
        }
        log::debug!(target: "contextlog", "configuration applied: {self:?}");
        Ok(installed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LogRecord, fields};

    #[test]
    fn empty_object_is_default() {
        let config = LoggingConfig::from_json("{}").unwrap();
        assert_eq!(config, LoggingConfig::default());
        assert_eq!(config.level, Level::Info);
        assert!(config.patch_logging);
        assert!(!config.patch_threading);
        assert_eq!(config.pipeline().len(), 2);
    }

    #[test]
    fn stages_by_name() {
        let config = LoggingConfig::from_json(
            r#"{
                "level": "warn",
                "formatters": [
                    { "stage": "partial", "format": "{levelname}|{message}|{_extra}" },
                    { "stage": "error_chain" },
                    { "stage": "exception_locals", "max_vars_lines": 5 }
                ],
                "patch_logging": false
            }"#,
        )
        .unwrap();
        assert_eq!(config.level, Level::Warning);
        assert!(!config.patch_logging);
        assert_eq!(
            config.formatters[2],
            StageConfig::ExceptionLocals {
                max_vars_lines: 5,
                max_line_len: DEFAULT_MAX_LINE_LEN
            }
        );

        let record = LogRecord::new(Level::Warning, "n", "m").with_fields(fields! { a = 1 });
        assert_eq!(config.pipeline().format(&record), "WARNING|m|a=1");
    }

    #[test]
    fn partial_without_format_uses_default() {
        let config = LoggingConfig::from_json(r#"{ "formatters": [{ "stage": "partial" }] }"#)
            .unwrap();
        let record = LogRecord::new(Level::Info, "app", "up");
        assert_eq!(config.pipeline().format(&record), "INFO app: up");
    }

    #[test]
    fn rejects_unknown_stage_and_keys() {
        assert!(matches!(
            LoggingConfig::from_json(r#"{ "formatters": [{ "stage": "colors" }] }"#),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            LoggingConfig::from_json(r#"{ "levle": "info" }"#),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn missing_file() {
        let err = LoggingConfig::from_path("/nonexistent/contextlog.json").unwrap_err();
        assert!(matches!(err, Error::ConfigFile { .. }));
        assert!(err.to_string().contains("/nonexistent/contextlog.json"));
    }
}
