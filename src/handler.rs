// SPDX-License-Identifier: MIT OR Apache-2.0
use crate::log_record::LogRecord;
use std::fmt::Debug;

/// A destination for records dispatched through the [`Registry`](crate::registry::Registry).
pub trait Handler: Debug + Send + Sync {
    /**
        Formats and writes one record.

        Must not fail; a handler that cannot write drops the record.
    */
    fn finish_log_record(&self, record: &LogRecord);

    /**
    The application may imminently exit.  Ensure all buffers are flushed and up to date.
    */
    fn prepare_to_die(&self);
}

/*
Boilerplate notes.

# Handler

Clone on a handler doesn't make sense; handlers are shared through Arc.
PartialEq and Eq are ambiguous between data equality and identity, so not implemented.
Ord makes no sense.
Default depends on the destination (a path, a buffer, a pipeline) so it's per-type.
Send/Sync are required: records arrive from any thread.
*/
