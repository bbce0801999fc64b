// SPDX-License-Identifier: MPL-2.0

//! Orchestrates ingestion, task-readiness evaluation, eviction, and
//! frame release. This is the bulk of the crate, as it is of the source
//! it was distilled from.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use vtm_config::SchedulerConfig;

use crate::data_cache::{DataCache, DataItem, Payload};
use crate::diagnostics;
use crate::error::SchedulerError;
use crate::factory::TaskFactorySet;
use crate::frame::Displayable;
use crate::task::{DataType, RequestKey, Task};

/// A callable invoked once per released frame with the frame's payload
/// and a format tag (e.g. `"jpg"`), matching the source's `ilog`
/// callback.
pub type DiagnosticSink<'a, F> = &'a mut dyn FnMut(&F, &str);

struct PendingFrame<F> {
    frame_id: u64,
    payload: Arc<F>,
}

/// Whether a task should remain in the pending list after one try-fire
/// attempt.
enum TryFireOutcome {
    Keep,
    Discard,
}

/// Dispatches tasks exactly when their declared inputs are available,
/// buffers intermediate data across a bounded window of recent frames,
/// and releases each frame downstream only when every task owing output
/// for it has completed.
///
/// `F` is the concrete type of a frame's own payload — the one type that
/// must support [`Displayable`], since it's the only thing the release
/// gate and `show` ever hand back to the caller by concrete type. Every
/// other data item (task products, including ones keyed `"FRAME"` by
/// convention-breaking tasks) flows through the type-erased
/// [`Payload`][crate::data_cache::Payload] instead.
pub struct Scheduler<F>
where
    F: Displayable + std::any::Any + Send + Sync + 'static,
{
    next_frame_id: u64,
    config: SchedulerConfig,
    factories: TaskFactorySet,
    pending_tasks: Vec<Box<dyn Task>>,
    data_cache: DataCache,
    frame_queue: VecDeque<PendingFrame<F>>,
}

impl<F> Scheduler<F>
where
    F: Displayable + std::any::Any + Send + Sync + 'static,
{
    #[must_use]
    pub fn new(config: SchedulerConfig) -> Self {
        diagnostics::info(config.debug_level, "scheduler initialized");

        Self {
            next_frame_id: 0,
            config,
            factories: TaskFactorySet::new(),
            pending_tasks: Vec::new(),
            data_cache: DataCache::new(),
            frame_queue: VecDeque::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    #[must_use]
    pub fn next_frame_id(&self) -> u64 {
        self.next_frame_id
    }

    #[must_use]
    pub fn pending_task_count(&self) -> usize {
        self.pending_tasks.len()
    }

    #[must_use]
    pub fn data_cache(&self) -> &DataCache {
        &self.data_cache
    }

    /// Register a task factory. Valid before or between frames.
    pub fn register_factory(&mut self, factory: impl Fn(u64) -> Box<dyn Task> + 'static) {
        self.factories.register(factory);
    }

    /// Ingest one frame and process it to completion: construct its
    /// `FRAME` data item, run every registered factory, evaluate the
    /// pending-task list to a fixed point, evict stale state, and release
    /// any frames at the head of the queue whose tasks have all
    /// completed.
    ///
    /// # Errors
    ///
    /// Returns `Err` if a task's `execute` fails or a factory panics.
    /// Either aborts this call but leaves the scheduler usable for the
    /// next one.
    pub fn add_frame(
        &mut self,
        payload: F,
        mut diagnostic_sink: Option<DiagnosticSink<'_, F>>,
    ) -> Result<(), SchedulerError> {
        let frame_id = self.next_frame_id;
        let span = tracing::debug_span!("add_frame", frame_id);
        let _entered = span.enter();

        let payload = Arc::new(payload);
        let erased: Payload = payload.clone();
        self.data_cache
            .put(DataItem::new(DataType::from(DataType::FRAME), frame_id, erased));
        self.frame_queue.push_back(PendingFrame { frame_id, payload });

        self.create_tasks_for_frame(frame_id)?;
        self.run_to_fixed_point()?;
        self.evict();
        self.release_frames(&mut diagnostic_sink);

        self.next_frame_id += 1;
        Ok(())
    }

    fn create_tasks_for_frame(&mut self, frame_id: u64) -> Result<(), SchedulerError> {
        for factory in self.factories.iter() {
            let task = panic::catch_unwind(AssertUnwindSafe(|| factory(frame_id)))
                .map_err(|_| SchedulerError::FactoryPanicked { frame_id })?;
            self.pending_tasks.push(task);
        }

        diagnostics::info(
            self.config.debug_level,
            &format!(
                "created {} new tasks for frame {frame_id}, total pending={}",
                self.factories.len(),
                self.pending_tasks.len()
            ),
        );

        Ok(())
    }

    /// Repeatedly scan the pending list, firing every task whose inputs
    /// resolve, until a full scan makes no progress. Each successful
    /// firing (or staleness eviction) strictly reduces the task count, so
    /// this terminates.
    fn run_to_fixed_point(&mut self) -> Result<(), SchedulerError> {
        loop {
            let before = self.pending_tasks.len();
            self.evaluation_pass()?;
            if self.pending_tasks.len() == before {
                return Ok(());
            }
        }
    }

    /// A fatal error from one task must not cost the others their place
    /// in the pending list: on `Err`, the task that failed and every task
    /// not yet visited this pass are merged back in alongside whatever
    /// had already been kept, before the error propagates.
    fn evaluation_pass(&mut self) -> Result<(), SchedulerError> {
        let mut tasks = std::mem::take(&mut self.pending_tasks).into_iter();
        let mut kept = Vec::new();

        while let Some(task) = tasks.next() {
            match self.try_fire(task.as_ref()) {
                Ok(TryFireOutcome::Keep) => kept.push(task),
                Ok(TryFireOutcome::Discard) => {}
                Err(err) => {
                    kept.push(task);
                    kept.extend(tasks);
                    self.pending_tasks = kept;
                    return Err(err);
                }
            }
        }

        self.pending_tasks = kept;
        Ok(())
    }

    /// Attempt to fire one task: staleness check, input resolution
    /// (required keys must hit the cache; optional keys fall back to
    /// their default, but a cache hit still wins), execution, and product
    /// installation.
    fn try_fire(&mut self, task: &dyn Task) -> Result<TryFireOutcome, SchedulerError> {
        let buffer_size = u64::from(self.config.buffer_size);
        if self.next_frame_id.saturating_sub(task.frame_id()) > buffer_size {
            diagnostics::warn(
                self.config.debug_level,
                &format!(
                    "task for frame {} was not executed (stale, now at frame {})",
                    task.frame_id(),
                    self.next_frame_id
                ),
            );
            return Ok(TryFireOutcome::Discard);
        }

        let mut payloads = Vec::new();
        let mut resolved_keys = Vec::new();

        for request in task.required() {
            let key = request.key();
            if let Some(item) = self.data_cache.get(&key) {
                payloads.push(item.payload().clone());
                resolved_keys.push(key);
            } else if let RequestKey::Optional { default, .. } = &request {
                payloads.push(default.clone());
            } else {
                // Required key missing: recovered locally, task stays
                // pending. Anything resolved so far for this attempt is
                // discarded untouched — only a fully-resolved attempt
                // marks its inputs as used.
                return Ok(TryFireOutcome::Keep);
            }
        }

        for key in &resolved_keys {
            self.data_cache.touch(key);
        }

        let produced = task
            .execute(payloads)
            .map_err(|source| SchedulerError::TaskExecutionFailed {
                frame_id: task.frame_id(),
                source,
            })?;

        for (type_tag, frame_id, payload) in produced {
            self.data_cache.put(DataItem::new(type_tag, frame_id, payload));
        }

        Ok(TryFireOutcome::Discard)
    }

    fn evict(&mut self) {
        let threshold = self
            .next_frame_id
            .saturating_sub(u64::from(self.config.buffer_size));

        for item in self.data_cache.evict_older_than(threshold) {
            if item.touched() == 0 {
                diagnostics::warn(
                    self.config.debug_level,
                    &format!(
                        "data item {} for frame {} was created but never used",
                        item.type_tag(),
                        item.frame_id()
                    ),
                );
            }
        }
    }

    fn remaining_tasks_for_frame(&self, frame_id: u64) -> usize {
        self.pending_tasks
            .iter()
            .filter(|task| task.frame_id() == frame_id)
            .count()
    }

    /// Release every frame at the head of the queue that no longer has a
    /// pending task targeting it, in ingestion order, stopping at the
    /// first one that still does.
    fn release_frames(&mut self, diagnostic_sink: &mut Option<DiagnosticSink<'_, F>>) {
        while let Some(front) = self.frame_queue.front() {
            if self.remaining_tasks_for_frame(front.frame_id) > 0 {
                break;
            }

            let frame = self.frame_queue.pop_front().expect("checked above");

            if self.config.show {
                frame.payload.display(30);
            }

            if let Some(sink) = diagnostic_sink.as_mut() {
                sink(&frame.payload, "jpg");
            }
        }
    }
}
