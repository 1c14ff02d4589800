// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fmt::Debug;

use super::exception::ErrorChain;
use super::partial::PartialFormatter;
use crate::log_record::LogRecord;

/// A record rendered part by part.
///
/// Stages fill in or rewrite the parts; [`Pipeline::format`] joins them with
/// newlines, skipping absent ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rendering {
    pub message: String,
    pub exception: Option<String>,
    pub stack: Option<String>,
}

impl Rendering {
    fn join(self) -> String {
        let mut out = self.message;
        for part in [self.exception, self.stack].into_iter().flatten() {
            out.push('\n');
            out.push_str(&part);
        }
        out
    }
}

/// One step of a [`Pipeline`].
pub trait FormatStage: Debug + Send + Sync {
    fn render(&self, record: &LogRecord, rendering: &mut Rendering);
}

/// An ordered list of [`FormatStage`]s.
///
/// The rendering starts as the bare message plus any captured stack text; each
/// stage then runs in order, so later stages see (and may extend) what earlier
/// ones produced.
#[derive(Debug)]
pub struct Pipeline {
    stages: Vec<Box<dyn FormatStage>>,
}

impl Pipeline {
    /// A pipeline with no stages, which renders only the message and stack.
    pub fn new() -> Self {
        Pipeline { stages: Vec::new() }
    }

    pub fn push(mut self, stage: impl FormatStage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn format(&self, record: &LogRecord) -> String {
        let mut rendering = Rendering {
            message: record.message().to_owned(),
            exception: None,
            stack: record.stack().map(|s| format!("Stack (most recent call last):\n{s}")),
        };
        for stage in &self.stages {
            stage.render(record, &mut rendering);
        }
        rendering.join()
    }
}

/// The default template followed by the error chain.
impl Default for Pipeline {
    fn default() -> Self {
        Pipeline::new()
            .push(PartialFormatter::default())
            .push(ErrorChain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Level, fields};

    #[derive(Debug)]
    struct Shout;

    impl FormatStage for Shout {
        fn render(&self, _record: &LogRecord, rendering: &mut Rendering) {
            rendering.message = rendering.message.to_uppercase();
        }
    }

    #[test]
    fn empty_pipeline_is_the_message() {
        let record = LogRecord::new(Level::Info, "n", "hello").with_fields(fields! { a = 1 });
        assert_eq!(Pipeline::new().format(&record), "hello");
    }

    #[test]
    fn stages_run_in_order() {
        let record = LogRecord::new(Level::Info, "n", "hello");
        let pipeline = Pipeline::new()
            .push(PartialFormatter::new("{levelname}: {message}"))
            .push(Shout);
        assert_eq!(pipeline.len(), 2);
        assert_eq!(pipeline.format(&record), "INFO: HELLO");
    }

    #[test]
    fn default_pipeline() {
        let record = LogRecord::new(Level::Error, "app", "boom").with_fields(fields! { k = "v" });
        assert_eq!(Pipeline::default().format(&record), r#"ERROR app: boom k="v""#);
    }
}
