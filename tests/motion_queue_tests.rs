//! Motion Queue Tests
//!
//! Tests for:
//! - Fade-in envelope (monotonic, reaches 1.0 at the fade time)
//! - Cross-fade when a new motion replaces a playing one
//! - Finished callbacks and event callbacks
//! - MotionManager priority reservation

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use cubism::animation::{
    Motion, MotionBehavior, MotionManager, MotionQueueManager, MotionState, priority,
};
use cubism::model::Model;
use cubism::utils::interner::IdManager;

const EPSILON: f32 = 1e-4;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn constant_motion(ids: &IdManager, value: f32, duration: f32, fade: f32) -> Arc<dyn MotionBehavior> {
    let json = format!(
        r#"{{
            "Version": 3,
            "Meta": {{ "Duration": {duration}, "Fps": 30.0, "FadeInTime": {fade}, "FadeOutTime": {fade} }},
            "Curves": [
                {{ "Target": "Parameter", "Id": "ParamA", "Segments": [0, {value}, 0, {duration}, {value}] }}
            ],
            "UserData": [
                {{ "Time": 0.5, "Value": "half" }},
                {{ "Time": 1.0, "Value": "one" }}
            ]
        }}"#
    );
    Arc::new(Motion::parse(json.as_bytes(), ids).unwrap())
}

fn model(ids: &IdManager) -> Model {
    let mut model = Model::new(ids.clone());
    model.add_parameter(ids.id("ParamA"), -100.0, 100.0, 0.0).unwrap();
    model.save_parameters();
    model
}

// ============================================================================
// Fade envelope
// ============================================================================

#[test]
fn fade_in_is_monotonic_and_completes() {
    let ids = IdManager::new();
    let mut model = model(&ids);
    let mut queue = MotionQueueManager::new();
    let handle = queue.start_motion(constant_motion(&ids, 10.0, 4.0, 1.0), 0.0);

    let mut previous = -1.0;
    let mut t = 0.0;
    while t <= 1.0 {
        model.load_parameters();
        queue.do_update_motion(&mut model, t);
        let weight = queue.entry(handle).unwrap().fade_weight();
        assert!(weight >= previous, "fade weight dropped from {previous} to {weight} at {t}");
        previous = weight;
        t += 0.0625;
    }

    assert!(approx(previous, 1.0), "weight at fade end {previous}");
    let value = model.parameter_value_by_id(ids.id("ParamA"));
    assert!(approx(value, 10.0), "value {value}");
}

#[test]
fn zero_fade_applies_full_weight_immediately() {
    let ids = IdManager::new();
    let mut model = model(&ids);
    let mut queue = MotionQueueManager::new();
    queue.start_motion(constant_motion(&ids, 7.0, 2.0, 0.0), 0.0);
    queue.do_update_motion(&mut model, 0.0);
    assert!(approx(model.parameter_value_by_id(ids.id("ParamA")), 7.0));
}

// ============================================================================
// Cross-fade
// ============================================================================

#[test]
fn replacing_motion_fades_out_the_old_one() {
    let ids = IdManager::new();
    let mut model = model(&ids);
    let mut queue = MotionQueueManager::new();

    let first = queue.start_motion(constant_motion(&ids, 10.0, 10.0, 0.5), 0.0);
    for t in [0.25, 0.5, 0.75, 1.0] {
        model.load_parameters();
        queue.do_update_motion(&mut model, t);
    }
    assert_eq!(queue.entry(first).unwrap().end_time(), 10.25);

    let second = queue.start_motion(constant_motion(&ids, -10.0, 10.0, 0.5), 1.0);
    assert!(approx(queue.entry(first).unwrap().end_time(), 1.5));
    assert_eq!(queue.len(), 2);

    model.load_parameters();
    queue.do_update_motion(&mut model, 1.25);
    assert!(approx(queue.entry(first).unwrap().fade_weight(), 0.5));
    assert!(approx(queue.entry(second).unwrap().fade_weight(), 0.0));

    model.load_parameters();
    queue.do_update_motion(&mut model, 1.5);
    // The end time is not pushed back by later updates.
    assert!(approx(queue.entry(first).unwrap().end_time(), 1.5));

    model.load_parameters();
    queue.do_update_motion(&mut model, 1.75);
    assert_eq!(queue.len(), 1);
    assert!(queue.entry(first).is_none());
    assert_eq!(queue.motion_state(second), Some(MotionState::Started));
}

#[test]
fn motion_finishes_at_its_duration() {
    let ids = IdManager::new();
    let mut model = model(&ids);
    let mut queue = MotionQueueManager::new();
    let handle = queue.start_motion(constant_motion(&ids, 1.0, 1.0, 0.0), 0.0);

    assert_eq!(queue.motion_state(handle), Some(MotionState::Pending));
    queue.do_update_motion(&mut model, 0.0);
    assert_eq!(queue.motion_state(handle), Some(MotionState::Started));
    assert!(!queue.is_finished());

    queue.do_update_motion(&mut model, 1.0);
    assert!(queue.is_finished());
    assert!(queue.is_finished_handle(handle));
    assert!(queue.is_empty());
}

// ============================================================================
// Callbacks
// ============================================================================

#[test]
fn finished_callback_runs_once() {
    let ids = IdManager::new();
    let mut model = model(&ids);
    let mut queue = MotionQueueManager::new();
    let calls = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&calls);
    queue.start_motion_with_callback(
        constant_motion(&ids, 1.0, 0.5, 0.0),
        0.0,
        Box::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }),
    );

    for t in [0.0, 0.25, 0.5, 0.75, 1.0] {
        queue.do_update_motion(&mut model, t);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn events_fire_once_each() {
    let ids = IdManager::new();
    let mut model = model(&ids);
    let mut queue = MotionQueueManager::new();
    let fired = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&fired);
    queue.set_event_callback(Box::new(move |_, value: &str| {
        sink.lock().unwrap().push(value.to_owned());
    }));
    queue.start_motion(constant_motion(&ids, 1.0, 2.0, 0.0), 0.0);

    let mut t = 0.0;
    while t < 1.75 {
        queue.do_update_motion(&mut model, t);
        t += 0.125;
    }
    assert_eq!(*fired.lock().unwrap(), ["half", "one"]);
}

#[test]
fn stop_all_clears_queue() {
    let ids = IdManager::new();
    let mut model = model(&ids);
    let mut queue = MotionQueueManager::new();
    queue.start_motion(constant_motion(&ids, 1.0, 2.0, 0.0), 0.0);
    queue.start_motion(constant_motion(&ids, 2.0, 2.0, 0.0), 0.0);
    queue.do_update_motion(&mut model, 0.1);
    queue.stop_all_motions();
    assert!(queue.is_empty());
    assert!(queue.is_finished());
}

// ============================================================================
// Priority
// ============================================================================

#[test]
fn reservation_blocks_equal_or_lower_priority() {
    let ids = IdManager::new();
    let mut manager = MotionManager::new();

    assert!(manager.reserve_motion(priority::NORMAL));
    assert!(!manager.reserve_motion(priority::IDLE));
    assert!(!manager.reserve_motion(priority::NORMAL));
    assert!(manager.reserve_motion(priority::FORCE));

    manager.start_motion_priority(constant_motion(&ids, 1.0, 1.0, 0.0), priority::FORCE);
    assert_eq!(manager.reserve_priority(), priority::NONE);
    assert_eq!(manager.current_priority(), priority::FORCE);
}

#[test]
fn playing_priority_blocks_until_finished() {
    let ids = IdManager::new();
    let mut model = model(&ids);
    let mut manager = MotionManager::new();

    assert!(manager.reserve_motion(priority::NORMAL));
    manager.start_motion_priority(constant_motion(&ids, 1.0, 0.5, 0.0), priority::NORMAL);
    assert!(!manager.reserve_motion(priority::IDLE));
    assert!(!manager.reserve_motion(priority::NORMAL));

    manager.update_motion(&mut model, 0.25);
    manager.update_motion(&mut model, 0.25);
    manager.update_motion(&mut model, 0.25);
    assert!(manager.is_finished());
    assert_eq!(manager.current_priority(), priority::NONE);
    assert!(manager.reserve_motion(priority::IDLE));
}

#[test]
fn lower_start_keeps_higher_reservation() {
    let ids = IdManager::new();
    let mut manager = MotionManager::new();
    manager.set_reserve_priority(priority::FORCE);
    manager.start_motion_priority(constant_motion(&ids, 1.0, 1.0, 0.0), priority::IDLE);
    assert_eq!(manager.reserve_priority(), priority::FORCE);
    assert_eq!(manager.current_priority(), priority::IDLE);
}

#[test]
fn custom_priority_levels() {
    let ids = IdManager::new();
    let mut manager = MotionManager::new();

    assert!(manager.reserve_motion(3));
    // A higher request overrides a lower reservation.
    assert!(manager.reserve_motion(5));
    assert!(!manager.reserve_motion(5));

    manager.start_motion_priority(constant_motion(&ids, 1.0, 1.0, 0.0), 5);
    assert!(!manager.reserve_motion(5));
    assert!(manager.reserve_motion(6));
}
