// SPDX-License-Identifier: MPL-2.0

//! Drives a [`vtm::Scheduler`] from a synthetic frame source on a
//! `calloop` timer, the same event-loop shape the library's host daemon
//! uses for its real Wayland source. Two toy tasks are registered: one
//! computes a per-frame "luma" reading straight from the frame, the
//! other computes frame-to-frame "motion" from consecutive luma values,
//! exercising both the no-dependency and cross-frame-dependency paths.

use std::time::Duration;

use calloop::timer::{TimeoutAction, Timer};
use calloop::EventLoop;
use eyre::Context;
use rand::Rng;
use tracing_subscriber::prelude::*;

use vtm::{payload, DataType, Displayable, Payload, Produced, RequestKey, Scheduler, Task, TaskError};
use vtm_config::{DebugLevel, SchedulerConfig};

/// The demo's frame payload: just an id and a synthetic luma sample.
struct Frame {
    id: u64,
    luma: u8,
}

impl Displayable for Frame {
    fn display(&self, delay_ms: u64) {
        tracing::info!(frame = self.id, luma = self.luma, delay_ms, "display");
    }
}

struct LumaTask(u64);

impl Task for LumaTask {
    fn frame_id(&self) -> u64 {
        self.0
    }

    fn required(&self) -> Vec<RequestKey> {
        vec![RequestKey::required(DataType::FRAME, self.0)]
    }

    fn execute(&self, payloads: Vec<Payload>) -> Result<Vec<Produced>, TaskError> {
        let frame = payloads[0]
            .downcast_ref::<Frame>()
            .ok_or_else(|| TaskError::new("FRAME payload was not a demo Frame"))?;
        Ok(vec![("LUMA".into(), self.0, payload(frame.luma))])
    }
}

struct MotionTask(u64);

impl Task for MotionTask {
    fn frame_id(&self) -> u64 {
        self.0
    }

    fn required(&self) -> Vec<RequestKey> {
        vec![
            RequestKey::required("LUMA", self.0),
            RequestKey::optional("LUMA", self.0.saturating_sub(1), payload(0_u8)),
        ]
    }

    fn execute(&self, payloads: Vec<Payload>) -> Result<Vec<Produced>, TaskError> {
        let current = *payloads[0]
            .downcast_ref::<u8>()
            .ok_or_else(|| TaskError::new("LUMA payload was not a u8"))?;
        let previous = *payloads[1]
            .downcast_ref::<u8>()
            .ok_or_else(|| TaskError::new("LUMA payload was not a u8"))?;

        let motion = i32::from(current) - i32::from(previous);
        Ok(vec![("MOTION".into(), self.0, payload(motion))])
    }
}

struct DemoState {
    scheduler: Scheduler<Frame>,
    next_frame_id: u64,
    frame_count: u64,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    init_logger();

    let config = SchedulerConfig::default()
        .buffer_size(8)
        .debug_level(DebugLevel::Info);
    config
        .validate()
        .map_err(|reason| eyre::eyre!(reason))
        .wrap_err("invalid scheduler configuration")?;

    let mut scheduler: Scheduler<Frame> = Scheduler::new(config);
    scheduler.register_factory(|frame_id| Box::new(LumaTask(frame_id)) as Box<dyn Task>);
    scheduler.register_factory(|frame_id| Box::new(MotionTask(frame_id)) as Box<dyn Task>);

    let mut state = DemoState {
        scheduler,
        next_frame_id: 0,
        frame_count: 30,
    };

    let mut event_loop: EventLoop<'static, DemoState> =
        EventLoop::try_new().wrap_err("failed to create event loop")?;

    let timer = Timer::from_duration(Duration::from_millis(100));
    event_loop
        .handle()
        .insert_source(timer, |_deadline, (), state: &mut DemoState| {
            if state.next_frame_id >= state.frame_count {
                return TimeoutAction::Drop;
            }

            let luma = rand::rng().random::<u8>();
            let frame_id = state.next_frame_id;
            let frame = Frame { id: frame_id, luma };

            let mut sink = |frame: &Frame, tag: &str| {
                tracing::info!(frame = frame.id, tag, "released");
            };

            if let Err(err) = state.scheduler.add_frame(frame, Some(&mut sink)) {
                tracing::error!(frame_id, %err, "add_frame failed");
            }

            state.next_frame_id += 1;
            TimeoutAction::ToDuration(Duration::from_millis(100))
        })
        .map_err(|err| eyre::eyre!(err.to_string()))
        .wrap_err("failed to insert timer source")?;

    event_loop
        .run(None, &mut state, |_state| {})
        .wrap_err("event loop exited with an error")?;

    Ok(())
}

fn init_logger() {
    let log_level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|level| level.parse::<tracing::Level>().ok())
        .unwrap_or(tracing::Level::INFO);

    let log_format = tracing_subscriber::fmt::format()
        .pretty()
        .without_time()
        .with_line_number(true)
        .with_file(true)
        .with_target(false)
        .with_thread_names(true);

    let log_filter = tracing_subscriber::fmt::Layer::default()
        .with_writer(std::io::stderr)
        .event_format(log_format)
        .with_filter(tracing_subscriber::filter::filter_fn(move |metadata| {
            metadata.level() == &tracing::Level::ERROR
                || (metadata.target().starts_with("vtm") && metadata.level() <= &log_level)
        }));

    tracing_subscriber::registry().with(log_filter).init();
}
