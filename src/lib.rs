//SPDX-License-Identifier: MIT OR Apache-2.0
/*!
# contextlog

contextlog is a context-propagating structured logger built on the [log](https://crates.io/crates/log) facade.

# The problem

A request handler knows the request id.  The database layer three calls down does not, and
neither does the library it calls into.  Yet when that library logs a warning, the request id is
exactly what I want next to it.

The usual answers are to thread a context object through every function signature, or to give
up and grep by timestamp.  contextlog takes a third route: context is attached to a *scope*, and
every logger created further down the same call stack inherits it.

# The API

```rust
use contextlog::get_logger;

fn load_user() {
    // inherits `request_id` from the caller
    let log = get_logger!(table = "users");
    log.warning("slow query");
}

let log = get_logger!(request_id = 42);
log.info("handling request");
load_user();
```

[`get_logger!`] creates a [`Logger`] named after the calling module, with the enclosing context
merged with the given fields (inner fields win), and binds the result to the current scope until
the returned [`LoggerScope`] drops.  Sibling calls never see each other's fields.

A [`Logger`] is an ordinary value: [`Logger::get_logger`] derives a child with more fields without
touching the scope, and [`Logger::entry`] attaches errors, per-record fields and backtraces.

# Code that doesn't use contextlog

Records logged through `log::info!` and friends by code that never heard of contextlog can still
carry the context:

* [`registry::init`] installs this crate's `log::Log` implementation, and
  [`registry::patch_logging`] makes it merge the enclosing context into every ambient record.
* [`registry::ContextualLog`] does the same in front of any other `log::Log` implementation.

# Multithreading

Context is thread-local.  A new thread starts empty unless it is started through
[`thread::spawn`] or [`thread::Builder`] after [`thread::patch_threading`], or runs a closure
wrapped by a [`thread::Carrier`].  For async code, [`context::ApplyContext`] keeps a context
current around every poll of a future.

# Output

Records go to the [global handlers](global_handler), by default a single stderr handler.  What
a handler prints is decided by its [`format::Pipeline`]: a template where missing fields render
empty and `{_extra}` lists fields the template does not name, the error chain, and optionally
a dump of the innermost error.  [`LoggingConfig`] sets all of this up from JSON.
*/

mod binding;
pub mod config;
pub mod context;
mod error;
pub mod format;
pub mod global_handler;
pub mod handler;
pub mod inmemory_handler;
mod level;
mod log_record;
pub mod logger;
pub mod registry;
pub mod stderror_handler;
pub mod thread;

#[cfg(test)]
mod test_support;

pub use binding::Patch;
pub use config::LoggingConfig;
pub use context::{Fields, Value, merge};
pub use error::{Error, Result};
pub use global_handler::{add_global_handler, global_handlers, set_global_handlers};
pub use handler::Handler;
pub use inmemory_handler::InMemoryHandler;
pub use level::Level;
pub use log_record::{EXC_INFO_KEY, EXTRA_KEY, ErrorReport, LogRecord, STACK_INFO_KEY};
pub use logger::{Entry, Logger, LoggerScope, get_logger};
pub use stderror_handler::StdErrorHandler;
