// SPDX-License-Identifier: MIT OR Apache-2.0
/*!
Context-bound loggers.

A [`Logger`] is a name plus a captured [`Fields`].  Every record it emits carries
that context, merged with any per-call fields, through the `log` facade.

[`get_logger`] (or the [`get_logger!`](crate::get_logger!) macro) creates one *and*
binds its context to the current scope, so that loggers created further down the
call stack inherit it:

```
use contextlog::{Fields, fields, get_logger};

fn handle() -> Fields {
    let log = get_logger!(ctx_internal = "method");
    log.info("working");
    log.context().clone()
}

let log = get_logger!(ctx = "test");
assert_eq!(handle(), fields! { ctx = "test", ctx_internal = "method" });
assert_eq!(log.context(), &fields! { ctx = "test" });
```

The binding lasts as long as the returned [`LoggerScope`].  A plain [`Logger`] can be
cloned and sent anywhere; it keeps its context but binds nothing until
[`Logger::enter`] is called.

Emission methods are `#[track_caller]`: the record's file and line are those of the
code that called `info`, `error` and so on, never this crate's.
*/

use crate::Level;
use crate::context::{Context, ContextGuard, Fields};
use crate::log_record::{EXC_INFO_KEY, EXTRA_KEY, STACK_INFO_KEY};
use log::kv::{self, Key, Source, VisitSource};
use std::backtrace::Backtrace;
use std::error::Error;
use std::fmt::Display;
use std::ops::Deref;
use std::panic::Location;
use std::sync::Arc;

/// A named logger with an immutable context.
///
/// Two loggers never share mutable state: deriving a child with
/// [`get_logger`](Logger::get_logger) produces a new value and leaves `self` as it was.
#[derive(Debug, Clone, PartialEq)]
pub struct Logger {
    name: Arc<str>,
    module_path: Option<&'static str>,
    fields: Fields,
}

impl Logger {
    /// A logger with exactly `fields` as its context.
    ///
    /// Neither reads nor binds the enclosing context; see [`get_logger`] for that.
    pub fn new(name: impl Into<Arc<str>>, fields: Fields) -> Logger {
        Logger {
            name: name.into(),
            module_path: None,
            fields,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn module_path(&self) -> Option<&'static str> {
        self.module_path
    }

    /// The logger's merged context.
    pub fn context(&self) -> &Fields {
        &self.fields
    }

    /// A child logger whose context is this one's overridden by `fields`.
    ///
    /// This is a pure derivation: the current scope is not touched, so loggers created
    /// later in the call stack do not see `fields`.  Use [`enter`](Self::enter) on the
    /// child to bind it.
    pub fn get_logger(&self, fields: Fields) -> Logger {
        Logger {
            name: self.name.clone(),
            module_path: self.module_path,
            fields: self.fields.merge(&fields),
        }
    }

    /// Binds this logger's context to the current scope until the guard drops.
    pub fn enter(&self) -> ContextGuard {
        Context::bind(self.fields.clone())
    }

    #[track_caller]
    pub fn log(&self, level: Level, message: impl Display) {
        self.entry(level).emit(message)
    }

    /// Logs with extra fields for this record only.
    #[track_caller]
    pub fn log_fields(&self, level: Level, message: impl Display, fields: Fields) {
        self.entry(level).fields(fields).emit(message)
    }

    #[track_caller]
    pub fn debug(&self, message: impl Display) {
        self.entry(Level::Debug).emit(message)
    }

    #[track_caller]
    pub fn info(&self, message: impl Display) {
        self.entry(Level::Info).emit(message)
    }

    #[track_caller]
    pub fn warning(&self, message: impl Display) {
        self.entry(Level::Warning).emit(message)
    }

    #[track_caller]
    pub fn error(&self, message: impl Display) {
        self.entry(Level::Error).emit(message)
    }

    /// Logs at [`Level::Error`] with `error` attached.
    #[track_caller]
    pub fn exception(&self, message: impl Display, error: &(dyn Error + 'static)) {
        self.entry(Level::Error).error(error).emit(message)
    }

    /// Starts a record that needs more than a message.
    ///
    /// ```
    /// # let log = contextlog::Logger::new("app", contextlog::Fields::new());
    /// let err = std::io::Error::other("disk full");
    /// log.entry(contextlog::Level::Warning)
    ///     .fields(contextlog::fields! { attempt = 3 })
    ///     .error(&err)
    ///     .stack_info(true)
    ///     .emit("retrying");
    /// ```
    #[track_caller]
    pub fn entry(&self, level: Level) -> Entry<'_> {
        Entry {
            logger: self,
            level,
            fields: None,
            error: None,
            stack_info: false,
            location: Location::caller(),
        }
    }
}

/// A record being built by [`Logger::entry`].
#[must_use = "nothing is logged until `emit` is called"]
#[derive(Debug)]
pub struct Entry<'a> {
    logger: &'a Logger,
    level: Level,
    fields: Option<Fields>,
    error: Option<&'a (dyn Error + 'static)>,
    stack_info: bool,
    location: &'static Location<'static>,
}

impl<'a> Entry<'a> {
    /// Fields for this record only, overriding the logger's context.
    pub fn fields(mut self, fields: Fields) -> Self {
        self.fields = Some(match self.fields.take() {
            Some(existing) => existing.merge(&fields),
            None => fields,
        });
        self
    }

    pub fn error(mut self, error: &'a (dyn Error + 'static)) -> Self {
        self.error = Some(error);
        self
    }

    /// Captures a backtrace at emission time and attaches it to the record.
    pub fn stack_info(mut self, enabled: bool) -> Self {
        self.stack_info = enabled;
        self
    }

    /// Sends the record to the `log` facade's logger.
    pub fn emit(self, message: impl Display) {
        if log::Level::from(self.level) > log::max_level() {
            return;
        }
        self.emit_to(log::logger(), message)
    }

    /// Sends the record to `sink`, bypassing the facade's global logger and level.
    pub fn emit_to(self, sink: &dyn log::Log, message: impl Display) {
        let metadata = log::Metadata::builder()
            .level(self.level.into())
            .target(&self.logger.name)
            .build();
        if !sink.enabled(&metadata) {
            return;
        }
        let fields = match &self.fields {
            Some(fields) => self.logger.fields.merge(fields),
            None => self.logger.fields.clone(),
        };
        let stack = self
            .stack_info
            .then(|| Backtrace::force_capture().to_string());
        let emission = Emission {
            fields: &fields,
            error: self.error,
            stack: stack.as_deref(),
        };
        sink.log(
            &log::Record::builder()
                .metadata(metadata)
                .args(format_args!("{message}"))
                .module_path_static(self.logger.module_path)
                .file_static(Some(self.location.file()))
                .line(Some(self.location.line()))
                .key_values(&emission)
                .build(),
        );
    }
}

/// Key-values of one emitted record: the merged context, its rendered view, and
/// the optional error and stack.
struct Emission<'a> {
    fields: &'a Fields,
    error: Option<&'a (dyn Error + 'static)>,
    stack: Option<&'a str>,
}

impl Source for Emission<'_> {
    fn visit<'kvs>(&'kvs self, visitor: &mut dyn VisitSource<'kvs>) -> Result<(), kv::Error> {
        for (key, value) in self.fields.iter() {
            visitor.visit_pair(Key::from_str(key), value.to_kv())?;
        }
        visitor.visit_pair(Key::from_str(EXTRA_KEY), kv::Value::from_display(self.fields))?;
        if let Some(error) = self.error {
            visitor.visit_pair(Key::from_str(EXC_INFO_KEY), kv::Value::from_dyn_error(error))?;
        }
        if let Some(stack) = self.stack {
            visitor.visit_pair(Key::from_str(STACK_INFO_KEY), kv::Value::from(stack))?;
        }
        Ok(())
    }
}

/// A [`Logger`] whose context is bound to the current scope.
///
/// Returned by [`get_logger`].  Derefs to the logger; dropping it unbinds the
/// context.  Scopes must be dropped innermost first, which ordinary `let` bindings
/// do by themselves.
#[must_use = "the logger's context is unbound as soon as the scope is dropped"]
#[derive(Debug)]
pub struct LoggerScope {
    logger: Logger,
    _guard: ContextGuard,
}

impl LoggerScope {
    pub fn logger(&self) -> &Logger {
        &self.logger
    }
}

impl Deref for LoggerScope {
    type Target = Logger;

    fn deref(&self) -> &Logger {
        &self.logger
    }
}

/// Creates a logger whose context is the enclosing context overridden by `fields`,
/// and binds that context to the current scope.
///
/// An absent or empty `name` falls back to the program's name.
///
/// ```
/// use contextlog::{fields, get_logger};
///
/// let outer = get_logger(Some("app"), fields! { ctx = "test" });
/// let inner = get_logger(None, fields! { step = 2 });
/// assert_eq!(inner.context(), &fields! { ctx = "test", step = 2 });
/// assert!(!inner.name().is_empty());
/// # drop(inner);
/// # drop(outer);
/// ```
pub fn get_logger(name: Option<&str>, fields: Fields) -> LoggerScope {
    let name = match name {
        Some(name) if !name.is_empty() => Arc::from(name),
        _ => program_name(),
    };
    scoped(name, None, fields)
}

#[doc(hidden)]
pub fn __get_logger_in(name: &str, module_path: &'static str, fields: Fields) -> LoggerScope {
    let name = if name.is_empty() {
        program_name()
    } else {
        Arc::from(name)
    };
    scoped(name, Some(module_path), fields)
}

fn scoped(name: Arc<str>, module_path: Option<&'static str>, fields: Fields) -> LoggerScope {
    let guard = Context::bind(fields);
    LoggerScope {
        logger: Logger {
            name,
            module_path,
            fields: guard.fields().clone(),
        },
        _guard: guard,
    }
}

/// The executable's file stem, or `"main"` if it cannot be determined.
fn program_name() -> Arc<str> {
    std::env::current_exe()
        .ok()
        .and_then(|path| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .filter(|s| !s.is_empty())
        .map(Arc::from)
        .unwrap_or_else(|| Arc::from("main"))
}

/**
Creates a [`LoggerScope`] named after the calling module.

```
use contextlog::get_logger;

let log = get_logger!(user = "ann", attempt = 1);
assert_eq!(log.name(), module_path!());

let named = get_logger!(target: "audit", action = "login");
assert_eq!(named.name(), "audit");
assert_eq!(named.context().len(), 3);
```

The scope must be bound to a name (`let log = ...`); `let _ = get_logger!(..)`
unbinds the context immediately.
*/
#[macro_export]
macro_rules! get_logger {
    (target: $name:expr $(, $($field:tt)*)?) => {
        $crate::logger::__get_logger_in($name, ::std::module_path!(), $crate::fields!($($($field)*)?))
    };
    ($($field:tt)*) => {
        $crate::logger::__get_logger_in(
            ::std::module_path!(),
            ::std::module_path!(),
            $crate::fields!($($field)*),
        )
    };
}
