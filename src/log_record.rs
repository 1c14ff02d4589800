// SPDX-License-Identifier: MIT OR Apache-2.0

//! Log record type for the contextlog formatting layer.
//!
//! A [`LogRecord`] is an owned snapshot of one record dispatched through the `log`
//! facade.  Records arriving through the facade only live for the duration of the
//! `log::Log::log` call and may borrow an error, so everything a formatter might
//! need is captured up front: the message, location, context fields, and an
//! [`ErrorReport`] of any attached error.
//!
//! # Reserved keys
//!
//! Besides context fields, a record's key-values may carry:
//!
//! - [`EXTRA_KEY`]: the rendered `key=repr(value)` view of the merged context.  Its
//!   presence also marks a record that already went through a context-bound
//!   [`Logger`](crate::Logger).
//! - [`EXC_INFO_KEY`]: an error (`&dyn std::error::Error`).
//! - [`STACK_INFO_KEY`]: captured stack text.
//!
//! These keys never show up in [`LogRecord::fields`].

use crate::Level;
use crate::context::{Fields, Value};
use log::kv::{self, VisitSource, VisitValue};
use std::error::Error;
use std::fmt::Display;
use std::sync::OnceLock;

/// Key carrying the rendered context; marks records emitted by a context-bound logger.
pub const EXTRA_KEY: &str = "_extra";
/// Key carrying an attached error.
pub const EXC_INFO_KEY: &str = "exc_info";
/// Key carrying captured stack text.
pub const STACK_INFO_KEY: &str = "stack_info";

static INITIAL_TIMESTAMP: OnceLock<std::time::Instant> = OnceLock::new();

fn initial_timestamp() -> std::time::Instant {
    *INITIAL_TIMESTAMP.get_or_init(std::time::Instant::now)
}

/// What a formatter needs to know about an attached error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    chain: Vec<String>,
    innermost: String,
}

impl ErrorReport {
    /// Walks `error` and its sources.
    pub fn capture(error: &(dyn Error + 'static)) -> ErrorReport {
        let mut chain = vec![error.to_string()];
        let mut innermost = error;
        while let Some(source) = innermost.source() {
            chain.push(source.to_string());
            innermost = source;
        }
        ErrorReport {
            chain,
            innermost: format!("{innermost:#?}"),
        }
    }

    /// `Display` of the error followed by each of its sources, outermost first.
    pub fn chain(&self) -> &[String] {
        &self.chain
    }

    /// Pretty `Debug` rendering of the innermost source.
    pub fn innermost_debug(&self) -> &str {
        &self.innermost
    }
}

/// An owned record, ready for formatting.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    level: Level,
    name: String,
    message: String,
    pub(crate) fields: Fields,
    module_path: Option<String>,
    file: Option<String>,
    line: Option<u32>,
    thread: Option<String>,
    relative: std::time::Duration,
    error: Option<ErrorReport>,
    stack: Option<String>,
    context_bound: bool,
}

impl LogRecord {
    /// Builds a record directly, without going through the `log` facade.
    pub fn new(level: Level, name: impl Into<String>, message: impl Into<String>) -> Self {
        LogRecord {
            level,
            name: name.into(),
            message: message.into(),
            fields: Fields::new(),
            module_path: None,
            file: None,
            line: None,
            thread: std::thread::current().name().map(str::to_owned),
            relative: initial_timestamp().elapsed(),
            error: None,
            stack: None,
            context_bound: false,
        }
    }

    /// Snapshots a record from the `log` facade.
    ///
    /// Key-values become [`fields`](Self::fields), except the reserved keys which are
    /// decoded into their own slots.  No enclosing context is consulted here; see
    /// [`LoggerClass`](crate::registry::LoggerClass) for that.
    pub fn capture(record: &log::Record<'_>) -> Self {
        let mut captured = LogRecord::new(
            record.level().into(),
            record.target(),
            record.args().to_string(),
        );
        captured.module_path = record.module_path().map(str::to_owned);
        captured.file = record.file().map(str::to_owned);
        captured.line = record.line();

        let mut collector = Collector {
            record: &mut captured,
            fields: Vec::new(),
        };
        //a failing source only loses its remaining fields
        let _ = record.key_values().visit(&mut collector);
        let fields = std::mem::take(&mut collector.fields);
        captured.fields = fields.into_iter().collect();
        captured
    }

    pub fn with_fields(mut self, fields: Fields) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_error(mut self, error: &(dyn Error + 'static)) -> Self {
        self.error = Some(ErrorReport::capture(error));
        self
    }

    pub fn with_location(mut self, file: impl Into<String>, line: u32) -> Self {
        self.file = Some(file.into());
        self.line = Some(line);
        self
    }

    pub fn level(&self) -> Level {
        self.level
    }

    /// The logger name (the `log` target).
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The resolved context of the record, reserved keys excluded.
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn module_path(&self) -> Option<&str> {
        self.module_path.as_deref()
    }

    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    pub fn line(&self) -> Option<u32> {
        self.line
    }

    pub fn thread(&self) -> Option<&str> {
        self.thread.as_deref()
    }

    /// Time since the first record of the process.
    pub fn relative(&self) -> std::time::Duration {
        self.relative
    }

    pub fn error(&self) -> Option<&ErrorReport> {
        self.error.as_ref()
    }

    pub fn stack(&self) -> Option<&str> {
        self.stack.as_deref()
    }

    /// Whether the record was emitted by a context-bound [`Logger`](crate::Logger).
    pub fn is_context_bound(&self) -> bool {
        self.context_bound
    }

    /// Record attributes that templates may refer to by name.
    pub fn attribute(&self, name: &str) -> Option<String> {
        match name {
            "name" => Some(self.name.clone()),
            "levelname" => Some(self.level.name().to_owned()),
            "message" => Some(self.message.clone()),
            "module" => self.module_path.clone(),
            "pathname" => self.file.clone(),
            "lineno" => self.line.map(|l| l.to_string()),
            "thread" => self.thread.clone(),
            "relative" => Some(format!("{:?}", self.relative)),
            _ => None,
        }
    }
}

impl Display for LogRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.level, self.name, self.message)?;
        if !self.fields.is_empty() {
            write!(f, " {}", self.fields)?;
        }
        Ok(())
    }
}

struct Collector<'r> {
    record: &'r mut LogRecord,
    fields: Vec<(String, Value)>,
}

impl<'kvs> VisitSource<'kvs> for Collector<'_> {
    fn visit_pair(&mut self, key: kv::Key<'kvs>, value: kv::Value<'kvs>) -> Result<(), kv::Error> {
        match key.as_str() {
            EXTRA_KEY => self.record.context_bound = true,
            EXC_INFO_KEY => match value.to_borrowed_error() {
                Some(error) => self.record.error = Some(ErrorReport::capture(error)),
                None => self.fields.push((key.as_str().to_owned(), decode(&value))),
            },
            STACK_INFO_KEY => self.record.stack = Some(value.to_string()),
            other => self.fields.push((other.to_owned(), decode(&value))),
        }
        Ok(())
    }
}

/// Recovers a typed [`Value`] from a `log` key-value.
pub(crate) fn decode(value: &kv::Value<'_>) -> Value {
    let mut decoder = Decoder(None);
    match value.visit(&mut decoder) {
        Ok(()) => decoder.0.unwrap_or_else(|| Value::Debug(value.to_string().into())),
        Err(_) => Value::Debug(value.to_string().into()),
    }
}

struct Decoder(Option<Value>);

impl<'v> VisitValue<'v> for Decoder {
    fn visit_any(&mut self, value: kv::Value<'_>) -> Result<(), kv::Error> {
        self.0 = Some(Value::Debug(value.to_string().into()));
        Ok(())
    }

    fn visit_bool(&mut self, value: bool) -> Result<(), kv::Error> {
        self.0 = Some(Value::Bool(value));
        Ok(())
    }

    fn visit_i64(&mut self, value: i64) -> Result<(), kv::Error> {
        self.0 = Some(Value::I64(value));
        Ok(())
    }

    fn visit_u64(&mut self, value: u64) -> Result<(), kv::Error> {
        self.0 = Some(Value::U64(value));
        Ok(())
    }

    fn visit_f64(&mut self, value: f64) -> Result<(), kv::Error> {
        self.0 = Some(Value::F64(value));
        Ok(())
    }

    fn visit_str(&mut self, value: &str) -> Result<(), kv::Error> {
        self.0 = Some(Value::Str(value.into()));
        Ok(())
    }
}

/*
Boilerplate notes for LogRecord:

IMPLEMENTED:
- Debug, Clone: derived
- PartialEq: derived; Eq is impossible since fields may hold f64
- Display: a compact one-line rendering, mostly for debugging; real output goes
  through crate::format::Pipeline

NOT IMPLEMENTED:
- Default: a record without a level and name is meaningless
- Hash, Ord: no meaningful semantics
*/
