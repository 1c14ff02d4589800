// SPDX-License-Identifier: MIT OR Apache-2.0
/*!
Interception of the ambient `log` facade.

Code that logs through `log::info!` and friends never sees a [`Logger`](crate::Logger).
This module makes such records pick up the enclosing context anyway, in two ways:

- [`Registry`], this crate's own `log::Log`, installed with [`init`].  How it turns a
  facade record into a [`LogRecord`] depends on the process-wide [`LoggerClass`]:
  [`PLAIN`] takes the record as is, [`CONTEXTUAL`] merges in the caller's enclosing
  context.  [`patch_logging`] switches to [`CONTEXTUAL`].
- [`ContextualLog`], an adapter that does the same enrichment in front of any other
  `log::Log` implementation, for programs that keep their own sink.

In both cases a record emitted by a context-bound [`Logger`](crate::Logger) is left
alone: it already carries its logger's context, marked by the
[`EXTRA_KEY`] key.

```
use contextlog::{fields, registry};
use contextlog::context::Context;

registry::init(contextlog::Level::Info).unwrap();
registry::patch_logging();

let _scope = Context::bind(fields! { request = 7 });
// handlers see `request=7` on this record
log::info!("handled");
```
*/

use crate::Level;
use crate::binding::{Binding, Patch};
use crate::context::{Context, Fields};
use crate::error::Result;
use crate::global_handler::global_handlers;
use crate::log_record::{EXTRA_KEY, LogRecord};
use log::Log;
use log::kv::{self, Key, Source, VisitSource};
use std::sync::{Mutex, PoisonError};

/// How facade records become [`LogRecord`]s.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct LoggerClass {
    name: &'static str,
    contextual: bool,
}

/// Records are taken as they are.
pub static PLAIN: LoggerClass = LoggerClass {
    name: "plain",
    contextual: false,
};

/// Records not emitted by a context-bound logger get the enclosing context.
pub static CONTEXTUAL: LoggerClass = LoggerClass {
    name: "contextual",
    contextual: true,
};

static LOGGER_CLASS: Binding<LoggerClass> = Binding::new(&PLAIN);

impl LoggerClass {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_contextual(&self) -> bool {
        self.contextual
    }

    /// Snapshots `record`, merging in the enclosing context if this class asks for it.
    ///
    /// The call site's own key-values override same-named context fields.
    pub fn make_record(&self, record: &log::Record<'_>) -> LogRecord {
        let mut captured = LogRecord::capture(record);
        if self.contextual && !captured.is_context_bound() {
            captured.fields = Context::lookup_enclosing().merge(&captured.fields);
        }
        captured
    }
}

/// The class currently in effect.
pub fn logger_class() -> &'static LoggerClass {
    LOGGER_CLASS.get()
}

/// Sets the class, returning the previous one.  Mostly useful to undo a patch in tests.
pub fn set_logger_class(class: &'static LoggerClass) -> &'static LoggerClass {
    LOGGER_CLASS.set(class)
}

/// Makes [`Registry`] attach the enclosing context to ambient records.
///
/// Calling it again changes nothing and reports [`Patch::AlreadyApplied`].
pub fn patch_logging() -> Patch {
    let patch = LOGGER_CLASS.install(&CONTEXTUAL);
    log::debug!(target: "contextlog", "logger class patch: {patch:?}");
    patch
}

/// This crate's `log::Log` implementation.
///
/// Dispatches every enabled record to the [global handlers](crate::global_handler).
#[derive(Debug)]
pub struct Registry {
    _private: (),
}

static REGISTRY: Registry = Registry { _private: () };

impl Registry {
    pub fn get() -> &'static Registry {
        &REGISTRY
    }
}

impl Log for Registry {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let record = logger_class().make_record(record);
        for handler in global_handlers() {
            handler.finish_log_record(&record);
        }
    }

    fn flush(&self) {
        for handler in global_handlers() {
            handler.prepare_to_die();
        }
    }
}

static INIT: Mutex<bool> = Mutex::new(false);

/// Installs [`Registry`] as the `log` facade's logger and sets the maximum level.
///
/// Installing again only updates the level and returns [`Patch::AlreadyApplied`].
/// If some other logger was installed first, returns
/// [`Error::ForeignLogger`](crate::Error::ForeignLogger).
pub fn init(level: Level) -> Result<Patch> {
    let mut installed = INIT.lock().unwrap_or_else(PoisonError::into_inner);
    if *installed {
        log::set_max_level(level.to_level_filter());
        return Ok(Patch::AlreadyApplied);
    }
    log::set_logger(&REGISTRY)?;
    *installed = true;
    log::set_max_level(level.to_level_filter());
    log::debug!(target: "contextlog", "registry installed at level {level}");
    Ok(Patch::Applied)
}

/// Adds the enclosing context to records before handing them to another `log::Log`.
///
/// The call site's key-values win over same-named context fields.  Records carrying
/// [`EXTRA_KEY`] pass through untouched.
///
/// ```
/// use contextlog::registry::ContextualLog;
///
/// use log::kv::Source;
///
/// #[derive(Debug)]
/// struct Sink;
/// impl log::Log for Sink {
///     fn enabled(&self, _: &log::Metadata) -> bool { true }
///     fn log(&self, record: &log::Record) {
///         println!("{} {:?}", record.args(), record.key_values().get("user".into()));
///     }
///     fn flush(&self) {}
/// }
///
/// let wrapped = ContextualLog::new(Sink);
/// log::set_boxed_logger(Box::new(wrapped)).unwrap();
/// log::set_max_level(log::LevelFilter::Info);
/// ```
#[derive(Debug)]
pub struct ContextualLog<L> {
    inner: L,
}

impl<L: Log> ContextualLog<L> {
    pub fn new(inner: L) -> Self {
        ContextualLog { inner }
    }

    pub fn inner(&self) -> &L {
        &self.inner
    }

    pub fn into_inner(self) -> L {
        self.inner
    }
}

impl<L: Log> Log for ContextualLog<L> {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        self.inner.enabled(metadata)
    }

    fn log(&self, record: &log::Record<'_>) {
        if !self.inner.enabled(record.metadata()) {
            return;
        }
        let original = record.key_values();
        if original.get(Key::from_str(EXTRA_KEY)).is_some() {
            self.inner.log(record);
            return;
        }
        let context = Context::lookup_enclosing();
        if context.is_empty() {
            self.inner.log(record);
            return;
        }
        let enriched = Enriched {
            context: &context,
            original,
        };
        self.inner.log(&record.to_builder().key_values(&enriched).build());
    }

    fn flush(&self) {
        self.inner.flush()
    }
}

/// Context fields the call site did not set, then the call site's own key-values.
struct Enriched<'a> {
    context: &'a Fields,
    original: &'a dyn Source,
}

impl Source for Enriched<'_> {
    fn visit<'kvs>(
        &'kvs self,
        visitor: &mut dyn VisitSource<'kvs>,
    ) -> std::result::Result<(), kv::Error> {
        for (key, value) in self.context.iter() {
            if self.original.get(Key::from_str(key)).is_none() {
                visitor.visit_pair(Key::from_str(key), value.to_kv())?;
            }
        }
        self.original.visit(visitor)
    }
}
