// SPDX-License-Identifier: MIT OR Apache-2.0
use crate::format::Pipeline;
use crate::handler::Handler;
use crate::log_record::LogRecord;
use std::io::Write;

/**
A reference handler that writes formatted records to stderr.
 */
#[derive(Debug, Default)]
pub struct StdErrorHandler {
    pipeline: Pipeline,
}

// ============================================================================
// BOILERPLATE TRAIT IMPLEMENTATIONS
// ============================================================================
//
// - Debug: derived
// - Default: the default pipeline
// - Clone: NOT implemented, pipelines hold boxed stages
// - PartialEq/Eq/Hash: NOT implemented, stages are opaque
// - Send/Sync: automatic, required by Handler

impl StdErrorHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pipeline(pipeline: Pipeline) -> Self {
        StdErrorHandler { pipeline }
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }
}

impl Handler for StdErrorHandler {
    fn finish_log_record(&self, record: &LogRecord) {
        let text = self.pipeline.format(record);
        let mut lock = std::io::stderr().lock();
        //nowhere left to report a failed write to stderr
        let _ = writeln!(lock, "{text}");
    }

    fn prepare_to_die(&self) {
        let _ = std::io::stderr().flush();
    }
}
