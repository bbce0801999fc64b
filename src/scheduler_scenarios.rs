// SPDX-License-Identifier: MPL-2.0

//! The six end-to-end scenarios from the scheduler's testable-properties
//! description, each exercised against the public API with `W = 3`
//! unless noted.

use crate::data_cache::payload;
use crate::{
    DataCache, DataType, Displayable, Payload, Produced, RequestKey, Scheduler, SchedulerConfig,
    Task, TaskError,
};

#[derive(Clone, Debug, PartialEq)]
struct Frame(char);

impl Displayable for Frame {
    fn display(&self, _delay_ms: u64) {}
}

fn scheduler(buffer_size: u32) -> Scheduler<Frame> {
    Scheduler::new(SchedulerConfig::default().buffer_size(buffer_size))
}

fn released_order(scheduler: &mut Scheduler<Frame>, frames: &[(u64, char)]) -> Vec<char> {
    let mut released = Vec::new();
    for &(_, label) in frames {
        let mut sink = |frame: &Frame, _tag: &str| released.push(frame.0);
        scheduler
            .add_frame(Frame(label), Some(&mut sink))
            .expect("add_frame should not fail in this scenario");
    }
    released
}

/// Scenario 1: single identity task, three frames, three firings in
/// ingestion order, all three FRAME items still cached.
#[test]
fn scenario_1_single_identity_task() {
    struct Identity(u64);
    impl Task for Identity {
        fn frame_id(&self) -> u64 {
            self.0
        }
        fn required(&self) -> Vec<RequestKey> {
            vec![RequestKey::required(DataType::FRAME, self.0)]
        }
        fn execute(&self, _payloads: Vec<Payload>) -> Result<Vec<Produced>, TaskError> {
            Ok(Vec::new())
        }
    }

    let mut scheduler = scheduler(3);
    scheduler.register_factory(|frame_id| Box::new(Identity(frame_id)));

    let released = released_order(&mut scheduler, &[(0, 'A'), (1, 'B'), (2, 'C')]);

    assert_eq!(released, vec!['A', 'B', 'C']);
    assert_eq!(scheduler.pending_task_count(), 0);
    for frame_id in 0..3 {
        assert!(scheduler
            .data_cache()
            .get(&(DataType::FRAME.into(), frame_id))
            .is_some());
    }
}

/// Scenario 2: cross-frame dependency chained through a bootstrap task,
/// with the earliest product evicted by the time the window has slid
/// past it.
#[test]
fn scenario_2_cross_frame_dependency() {
    struct Bootstrap;
    impl Task for Bootstrap {
        fn frame_id(&self) -> u64 {
            0
        }
        fn required(&self) -> Vec<RequestKey> {
            vec![RequestKey::required(DataType::FRAME, 0)]
        }
        fn execute(&self, _payloads: Vec<Payload>) -> Result<Vec<Produced>, TaskError> {
            Ok(vec![(DataType::from("X"), 0, payload(0_i32))])
        }
    }

    struct Chained(u64);
    impl Task for Chained {
        fn frame_id(&self) -> u64 {
            self.0
        }
        fn required(&self) -> Vec<RequestKey> {
            vec![
                RequestKey::required(DataType::FRAME, self.0),
                RequestKey::required("X", self.0 - 1),
            ]
        }
        fn execute(&self, payloads: Vec<Payload>) -> Result<Vec<Produced>, TaskError> {
            let previous = *payloads[1].downcast_ref::<i32>().unwrap();
            Ok(vec![(DataType::from("X"), self.0, payload(previous + 1))])
        }
    }

    let mut scheduler = scheduler(3);
    scheduler.register_factory(|frame_id| {
        if frame_id == 0 {
            Box::new(Bootstrap) as Box<dyn Task>
        } else {
            Box::new(Chained(frame_id)) as Box<dyn Task>
        }
    });

    let released = released_order(
        &mut scheduler,
        &[(0, '0'), (1, '1'), (2, '2'), (3, '3'), (4, '4')],
    );

    assert_eq!(released, vec!['0', '1', '2', '3', '4']);
    assert_eq!(scheduler.pending_task_count(), 0);

    let x_at_4 = scheduler.data_cache().get(&("X".into(), 4)).unwrap();
    assert_eq!(*x_at_4.payload().downcast_ref::<i32>().unwrap(), 4);

    assert!(scheduler.data_cache().get(&("X".into(), 0)).is_none());
}

/// Scenario 3: a task whose required key never arrives is evicted once
/// stale; its frame still releases, and later frames are unaffected.
#[test]
fn scenario_3_stale_task_eviction() {
    struct NeverReady;
    impl Task for NeverReady {
        fn frame_id(&self) -> u64 {
            0
        }
        fn required(&self) -> Vec<RequestKey> {
            vec![RequestKey::required("NEVER_PRODUCED", 0)]
        }
        fn execute(&self, _payloads: Vec<Payload>) -> Result<Vec<Produced>, TaskError> {
            Ok(Vec::new())
        }
    }

    struct Noop(u64);
    impl Task for Noop {
        fn frame_id(&self) -> u64 {
            self.0
        }
        fn required(&self) -> Vec<RequestKey> {
            Vec::new()
        }
        fn execute(&self, _payloads: Vec<Payload>) -> Result<Vec<Produced>, TaskError> {
            Ok(Vec::new())
        }
    }

    let mut scheduler = scheduler(3);
    scheduler.register_factory(|frame_id| {
        if frame_id == 0 {
            Box::new(NeverReady) as Box<dyn Task>
        } else {
            Box::new(Noop(frame_id)) as Box<dyn Task>
        }
    });

    let released = released_order(
        &mut scheduler,
        &[(0, '0'), (1, '1'), (2, '2'), (3, '3'), (4, '4'), (5, '5')],
    );

    // Frame 0 releases in order even though its task was never ready —
    // it's dropped as stale, not fired, but that still clears the gate.
    assert_eq!(released, vec!['0', '1', '2', '3', '4', '5']);
    assert_eq!(scheduler.pending_task_count(), 0);
}

/// Scenario 4: an optional key with no producer falls back to its
/// default on the first evaluation; the synthetic never enters the
/// cache.
#[test]
fn scenario_4_optional_default() {
    struct WithDefault(u64);
    impl Task for WithDefault {
        fn frame_id(&self) -> u64 {
            self.0
        }
        fn required(&self) -> Vec<RequestKey> {
            vec![RequestKey::optional("AUX", self.0, payload(0_i32))]
        }
        fn execute(&self, payloads: Vec<Payload>) -> Result<Vec<Produced>, TaskError> {
            assert_eq!(*payloads[0].downcast_ref::<i32>().unwrap(), 0);
            Ok(Vec::new())
        }
    }

    let mut scheduler = scheduler(3);
    scheduler.register_factory(|frame_id| Box::new(WithDefault(frame_id)));

    released_order(&mut scheduler, &[(0, 'A')]);

    assert_eq!(scheduler.pending_task_count(), 0);
    assert!(scheduler.data_cache().get(&("AUX".into(), 0)).is_none());
}

/// Scenario 5: a three-deep producer chain registered across three
/// factories all resolves within a single `add_frame` call.
#[test]
fn scenario_5_chained_tasks_within_one_ingestion() {
    struct ProducerA(u64);
    impl Task for ProducerA {
        fn frame_id(&self) -> u64 {
            self.0
        }
        fn required(&self) -> Vec<RequestKey> {
            vec![RequestKey::required(DataType::FRAME, self.0)]
        }
        fn execute(&self, _payloads: Vec<Payload>) -> Result<Vec<Produced>, TaskError> {
            Ok(vec![(DataType::from("A"), self.0, payload(1_i32))])
        }
    }

    struct ProducerB(u64);
    impl Task for ProducerB {
        fn frame_id(&self) -> u64 {
            self.0
        }
        fn required(&self) -> Vec<RequestKey> {
            vec![RequestKey::required("A", self.0)]
        }
        fn execute(&self, payloads: Vec<Payload>) -> Result<Vec<Produced>, TaskError> {
            let a = *payloads[0].downcast_ref::<i32>().unwrap();
            Ok(vec![(DataType::from("B"), self.0, payload(a + 1))])
        }
    }

    struct ProducerC(u64);
    impl Task for ProducerC {
        fn frame_id(&self) -> u64 {
            self.0
        }
        fn required(&self) -> Vec<RequestKey> {
            vec![RequestKey::required("B", self.0)]
        }
        fn execute(&self, payloads: Vec<Payload>) -> Result<Vec<Produced>, TaskError> {
            let b = *payloads[0].downcast_ref::<i32>().unwrap();
            Ok(vec![(DataType::from("C"), self.0, payload(b + 1))])
        }
    }

    let mut scheduler = scheduler(3);
    scheduler.register_factory(|frame_id| Box::new(ProducerA(frame_id)) as Box<dyn Task>);
    scheduler.register_factory(|frame_id| Box::new(ProducerB(frame_id)) as Box<dyn Task>);
    scheduler.register_factory(|frame_id| Box::new(ProducerC(frame_id)) as Box<dyn Task>);

    let released = released_order(&mut scheduler, &[(0, 'A')]);

    assert_eq!(released, vec!['A']);
    assert_eq!(scheduler.pending_task_count(), 0);
    let c = scheduler.data_cache().get(&("C".into(), 0)).unwrap();
    assert_eq!(*c.payload().downcast_ref::<i32>().unwrap(), 3);
}

/// Scenario 6: a producer with no consumer leaves dead items behind;
/// they're evicted once the window slides past them (the per-item
/// `touched() == 0` condition that gates the warning is covered directly
/// against `DataCache` in `data_cache::tests`).
#[test]
fn scenario_6_dead_product_is_eventually_evicted() {
    struct Producer(u64);
    impl Task for Producer {
        fn frame_id(&self) -> u64 {
            self.0
        }
        fn required(&self) -> Vec<RequestKey> {
            vec![RequestKey::required(DataType::FRAME, self.0)]
        }
        fn execute(&self, _payloads: Vec<Payload>) -> Result<Vec<Produced>, TaskError> {
            Ok(vec![(DataType::from("Y"), self.0, payload(self.0))])
        }
    }

    let mut scheduler = scheduler(3);
    scheduler.register_factory(|frame_id| Box::new(Producer(frame_id)));

    for i in 0..5u64 {
        scheduler.add_frame(Frame((b'0' + i as u8) as char), None).unwrap();
    }

    assert!(scheduler.data_cache().get(&("Y".into(), 0)).is_none());
    assert!(scheduler.data_cache().get(&("Y".into(), 4)).is_some());
}

#[allow(dead_code)]
fn _ensure_data_cache_type_is_reachable(_: &DataCache) {}
