// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared helpers for unit tests.

use crate::log_record::LogRecord;
use std::sync::{Mutex, PoisonError};

/// Serializes tests that touch process-wide state (handlers, bindings, log's max level).
pub(crate) static GLOBAL_GUARD: Mutex<()> = Mutex::new(());

/// A `log::Log` sink that keeps every record it is given.
#[derive(Debug, Default)]
pub(crate) struct Capture {
    records: Mutex<Vec<LogRecord>>,
}

impl Capture {
    pub(crate) fn take(&self) -> Vec<LogRecord> {
        std::mem::take(&mut *self.records.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl log::Log for Capture {
    fn enabled(&self, _metadata: &log::Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &log::Record<'_>) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(LogRecord::capture(record));
    }

    fn flush(&self) {}
}
