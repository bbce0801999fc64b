// SPDX-License-Identifier: MPL-2.0

//! Fatal error taxonomy.
//!
//! These are the only conditions that abort an in-flight `add_frame`
//! call. Everything else is either a logged warning (stale-task eviction,
//! dead-item eviction) or silently recovered by leaving a task pending
//! (a missing required key). A fatal error leaves the `Scheduler`
//! instance usable for the next call — only the offending frame is
//! observably partial.

use crate::task::TaskError;

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("task for frame {frame_id} failed to execute: {source}")]
    TaskExecutionFailed {
        frame_id: u64,
        #[source]
        source: TaskError,
    },

    /// A registered factory panicked while manufacturing a task. The
    /// source's equivalent is a factory raising an exception; Rust has no
    /// exceptions, so a panic is caught at the call site and converted
    /// here rather than unwinding through the scheduler.
    #[error("task factory for frame {frame_id} panicked")]
    FactoryPanicked { frame_id: u64 },
}
