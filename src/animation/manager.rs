use std::sync::Arc;

use crate::animation::entry::{FinishedMotionCallback, MotionQueueEntryHandle, MotionState};
use crate::animation::motion::MotionBehavior;
use crate::animation::queue::{MotionEventCallback, MotionQueueManager};
use crate::model::Model;

/// Motion priorities. Higher values win.
pub mod priority {
    pub const NONE: i32 = 0;
    pub const IDLE: i32 = 1;
    pub const NORMAL: i32 = 2;
    pub const FORCE: i32 = 3;
}

/// A [`MotionQueueManager`] with its own clock and a priority gate.
///
/// Callers reserve a priority before loading a motion asynchronously so a
/// lower-priority request cannot claim the slot in the meantime.
#[derive(Debug, Default)]
pub struct MotionManager {
    queue: MotionQueueManager,
    user_time: f32,
    current_priority: i32,
    reserve_priority: i32,
}

impl MotionManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn current_priority(&self) -> i32 {
        self.current_priority
    }

    #[inline]
    #[must_use]
    pub fn reserve_priority(&self) -> i32 {
        self.reserve_priority
    }

    pub fn set_reserve_priority(&mut self, priority: i32) {
        self.reserve_priority = priority;
    }

    /// Claims the reservation when `priority` beats both the reserved and the
    /// playing priority.
    pub fn reserve_motion(&mut self, priority: i32) -> bool {
        if priority <= self.reserve_priority || priority <= self.current_priority {
            return false;
        }
        self.reserve_priority = priority;
        true
    }

    /// Starts `motion` at `priority`, clearing a reservation it satisfies.
    pub fn start_motion_priority(&mut self, motion: Arc<dyn MotionBehavior>, priority: i32) -> MotionQueueEntryHandle {
        self.claim(priority);
        self.queue.start_motion(motion, self.user_time)
    }

    pub fn start_motion_priority_with_callback(
        &mut self,
        motion: Arc<dyn MotionBehavior>,
        priority: i32,
        on_finished: FinishedMotionCallback,
    ) -> MotionQueueEntryHandle {
        self.claim(priority);
        self.queue.start_motion_with_callback(motion, self.user_time, on_finished)
    }

    fn claim(&mut self, priority: i32) {
        if priority >= self.reserve_priority {
            self.reserve_priority = priority::NONE;
        }
        self.current_priority = priority;
    }

    /// Advances the clock by `delta_seconds` and ticks the queue.
    ///
    /// Once the queue drains the playing priority drops back to none.
    pub fn update_motion(&mut self, model: &mut Model, delta_seconds: f32) -> bool {
        self.user_time += delta_seconds;
        let updated = self.queue.do_update_motion(model, self.user_time);
        if self.queue.is_finished() {
            self.current_priority = priority::NONE;
        }
        updated
    }

    #[inline]
    #[must_use]
    pub fn user_time(&self) -> f32 {
        self.user_time
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.queue.is_finished()
    }

    #[must_use]
    pub fn is_finished_handle(&self, handle: MotionQueueEntryHandle) -> bool {
        self.queue.is_finished_handle(handle)
    }

    #[must_use]
    pub fn motion_state(&self, handle: MotionQueueEntryHandle) -> Option<MotionState> {
        self.queue.motion_state(handle)
    }

    pub fn stop_all_motions(&mut self) {
        self.queue.stop_all_motions();
        self.current_priority = priority::NONE;
    }

    pub fn set_event_callback(&mut self, callback: MotionEventCallback) {
        self.queue.set_event_callback(callback);
    }

    #[must_use]
    pub fn queue(&self) -> &MotionQueueManager {
        &self.queue
    }

    pub fn queue_mut(&mut self) -> &mut MotionQueueManager {
        &mut self.queue
    }
}
