// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process-wide handler list.
//!
//! Every record the [`Registry`](crate::registry::Registry) accepts goes to each
//! handler in this list, in order.  Until changed, the list holds a single
//! [`StdErrorHandler`] with the default pipeline.
//!
//! Readers take a snapshot of the list, so a handler added while a record is being
//! dispatched sees only later records.

use crate::handler::Handler;
use crate::stderror_handler::StdErrorHandler;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

static GLOBAL_HANDLERS: OnceLock<RwLock<Vec<Arc<dyn Handler>>>> = OnceLock::new();

fn handlers() -> &'static RwLock<Vec<Arc<dyn Handler>>> {
    GLOBAL_HANDLERS.get_or_init(|| RwLock::new(vec![Arc::new(StdErrorHandler::new())]))
}

/// A snapshot of the current handlers.
pub fn global_handlers() -> Vec<Arc<dyn Handler>> {
    handlers()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Appends a handler to the list.
pub fn add_global_handler(handler: Arc<dyn Handler>) {
    handlers()
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .push(handler);
}

/// Replaces the whole list.  An empty list discards every record.
pub fn set_global_handlers(new_handlers: Vec<Arc<dyn Handler>>) {
    *handlers().write().unwrap_or_else(PoisonError::into_inner) = new_handlers;
}
