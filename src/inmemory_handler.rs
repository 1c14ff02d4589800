// SPDX-License-Identifier: MIT OR Apache-2.0

//! # In-Memory Handler
//!
//! A [`Handler`] that keeps records in memory instead of writing them anywhere,
//! mostly for tests that want to inspect what was logged:
//!
//! ```
//! use contextlog::format::{PartialFormatter, Pipeline};
//! use contextlog::handler::Handler;
//! use contextlog::inmemory_handler::InMemoryHandler;
//! use contextlog::{Level, LogRecord};
//!
//! let handler = InMemoryHandler::with_pipeline(
//!     Pipeline::new().push(PartialFormatter::new("{levelname} {message}")),
//! );
//! handler.finish_log_record(&LogRecord::new(Level::Info, "app", "one"));
//! handler.finish_log_record(&LogRecord::new(Level::Error, "app", "two"));
//! assert_eq!(handler.drain_logs(), "INFO one\nERROR two");
//! assert_eq!(handler.drain_logs(), "");
//! ```
//!
//! Both the formatted text and the [`LogRecord`]s are kept; each drain method
//! clears only its own buffer.

use crate::format::Pipeline;
use crate::handler::Handler;
use crate::log_record::LogRecord;
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Default)]
pub struct InMemoryHandler {
    pipeline: Pipeline,
    logs: Mutex<Vec<String>>,
    records: Mutex<Vec<LogRecord>>,
}

// ============================================================================
// BOILERPLATE TRAIT IMPLEMENTATIONS
// ============================================================================
//
// - Debug: derived, required by Handler
// - Default: empty buffers and the default pipeline
// - Clone: NOT implemented, a handler's buffer is a unique resource
// - PartialEq/Eq/Hash: NOT implemented, comparing mutex state is problematic
// - Send/Sync: automatic through Mutex

impl InMemoryHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pipeline(pipeline: Pipeline) -> Self {
        InMemoryHandler {
            pipeline,
            logs: Mutex::default(),
            records: Mutex::default(),
        }
    }

    /// Returns the formatted records, one per line, and clears them.
    pub fn drain_logs(&self) -> String {
        let mut logs = self.logs.lock().unwrap_or_else(PoisonError::into_inner);
        let result = logs.join("\n");
        logs.clear();
        result
    }

    /// Returns the captured records and clears them.
    pub fn drain_records(&self) -> Vec<LogRecord> {
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *records)
    }

    /// Writes the formatted records to stderr and clears them.
    pub fn drain_to_console(&self) {
        let mut logs = self.logs.lock().unwrap_or_else(PoisonError::into_inner);
        for log in logs.iter() {
            eprintln!("{log}");
        }
        logs.clear();
    }
}

impl Handler for InMemoryHandler {
    fn finish_log_record(&self, record: &LogRecord) {
        let text = self.pipeline.format(record);
        self.logs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(text);
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
    }

    fn prepare_to_die(&self) {
        // No-op since we're storing in memory, no flushing needed
    }
}
