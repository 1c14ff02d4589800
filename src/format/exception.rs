// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stages that render an attached error.

use super::pipeline::{FormatStage, Rendering};
use crate::log_record::LogRecord;

/// Renders the error as `Error: ...` followed by a `Caused by: ...` line per source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ErrorChain;

impl FormatStage for ErrorChain {
    fn render(&self, record: &LogRecord, rendering: &mut Rendering) {
        let Some(error) = record.error() else {
            return;
        };
        let mut text = String::new();
        for (i, link) in error.chain().iter().enumerate() {
            if i == 0 {
                text.push_str("Error: ");
            } else {
                text.push_str("\nCaused by: ");
            }
            text.push_str(link);
        }
        rendering.exception = Some(text);
    }
}

pub const DEFAULT_MAX_VARS_LINES: usize = 100;
pub const DEFAULT_MAX_LINE_LEN: usize = 100;

/// Appends the pretty `Debug` rendering of the innermost error source.
///
/// The innermost source is the closest thing a Rust error has to "the state at the
/// point of failure".  Output is capped at `max_vars_lines` lines (then a `...`
/// line), and each line at `max_line_len` characters, the last three of which
/// become `...` when a line is cut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExceptionLocals {
    pub max_vars_lines: usize,
    pub max_line_len: usize,
}

impl Default for ExceptionLocals {
    fn default() -> Self {
        ExceptionLocals {
            max_vars_lines: DEFAULT_MAX_VARS_LINES,
            max_line_len: DEFAULT_MAX_LINE_LEN,
        }
    }
}

impl ExceptionLocals {
    fn locals(&self, innermost: &str) -> Vec<String> {
        let mut lines: Vec<String> = innermost.split('\n').map(str::to_owned).collect();
        if lines.len() > self.max_vars_lines {
            lines.truncate(self.max_vars_lines);
            lines.push("...".to_owned());
        }
        for line in &mut lines {
            if line.chars().count() > self.max_line_len {
                let keep = self.max_line_len.saturating_sub(3);
                let mut cut: String = line.chars().take(keep).collect();
                cut.push_str("...");
                *line = cut;
            }
        }
        lines
    }
}

impl FormatStage for ExceptionLocals {
    fn render(&self, record: &LogRecord, rendering: &mut Rendering) {
        let Some(error) = record.error() else {
            return;
        };
        let mut parts = vec![
            rendering.exception.take().unwrap_or_default(),
            "\nLocals at innermost frame:\n".to_owned(),
        ];
        parts.extend(self.locals(error.innermost_debug()));
        rendering.exception = Some(parts.join("\n"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Level;
    use crate::format::Pipeline;
    use std::error::Error;
    use std::fmt::Display;

    #[derive(Debug)]
    struct Wrapper {
        source: Root,
    }
    #[derive(Debug)]
    struct Root {
        path: &'static str,
        #[allow(dead_code)]
        attempts: u32,
    }
    impl Display for Wrapper {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("could not load settings")
        }
    }
    impl Display for Root {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{} not found", self.path)
        }
    }
    impl Error for Wrapper {
        fn source(&self) -> Option<&(dyn Error + 'static)> {
            Some(&self.source)
        }
    }
    impl Error for Root {}

    fn record() -> LogRecord {
        let err = Wrapper {
            source: Root {
                path: "/etc/app.toml",
                attempts: 3,
            },
        };
        LogRecord::new(Level::Error, "app", "startup failed").with_error(&err)
    }

    #[test]
    fn chain_lists_sources() {
        let out = Pipeline::new().push(ErrorChain).format(&record());
        assert_eq!(
            out,
            "startup failed\nError: could not load settings\nCaused by: /etc/app.toml not found"
        );
    }

    #[test]
    fn no_error_leaves_rendering_alone() {
        let record = LogRecord::new(Level::Info, "app", "fine");
        let pipeline = Pipeline::new().push(ErrorChain).push(ExceptionLocals::default());
        assert_eq!(pipeline.format(&record), "fine");
    }

    #[test]
    fn locals_follow_the_chain() {
        let out = Pipeline::new()
            .push(ErrorChain)
            .push(ExceptionLocals::default())
            .format(&record());
        let expected = "startup failed\n\
            Error: could not load settings\n\
            Caused by: /etc/app.toml not found\n\
            \n\
            Locals at innermost frame:\n\
            \n\
            Root {\n    path: \"/etc/app.toml\",\n    attempts: 3,\n}";
        assert_eq!(out, expected);
    }

    #[test]
    fn locals_are_truncated() {
        let stage = ExceptionLocals {
            max_vars_lines: 2,
            max_line_len: 10,
        };
        let lines = stage.locals("short\nthis line is too long\nthird");
        assert_eq!(lines, ["short", "this li...", "..."]);
    }

    #[test]
    fn line_exactly_at_limit_is_kept() {
        let stage = ExceptionLocals {
            max_vars_lines: 5,
            max_line_len: 5,
        };
        assert_eq!(stage.locals("12345\n123456"), ["12345", "12..."]);
    }
}
