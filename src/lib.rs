// SPDX-License-Identifier: MPL-2.0

//! A dataflow scheduler for frame-sequential video analysis.
//!
//! A producer feeds frames in order; independent [`Task`]s compute
//! derived data from a frame (and possibly from other tasks' products).
//! [`Scheduler`] dispatches each task exactly when its declared inputs
//! are available, buffers intermediate data across a bounded window of
//! recent frames, and releases each frame downstream only once every
//! task owing output for it has either fired or been evicted as stale.
//!
//! The frame payload representation, on-screen display, concrete task
//! bodies, and raw video ingestion are all external to this crate —
//! it consumes them only through [`Displayable`], [`Task`], and the
//! diagnostic sink callable passed to [`Scheduler::add_frame`].

mod data_cache;
mod diagnostics;
mod error;
mod factory;
mod frame;
mod scheduler;
mod task;

#[cfg(test)]
mod scheduler_scenarios;

pub use data_cache::{payload, DataCache, DataItem, DataKey, Payload};
pub use error::SchedulerError;
pub use factory::TaskFactorySet;
pub use frame::Displayable;
pub use scheduler::{DiagnosticSink, Scheduler};
pub use task::{DataType, Produced, RequestKey, Task, TaskError};

pub use vtm_config::{DebugLevel, SchedulerConfig};
