use std::fmt;
use std::sync::Arc;

use slotmap::new_key_type;

use crate::animation::motion::MotionBehavior;

new_key_type! {
    /// Stable handle of a playing motion inside a queue.
    pub struct MotionQueueEntryHandle;
}

/// Invoked once when a non-looping motion plays to its end.
pub type FinishedMotionCallback = Box<dyn FnMut(MotionQueueEntryHandle) + Send>;

/// Lifecycle of a queue entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionState {
    /// Queued; timing is set up on the first update.
    Pending,
    Started,
    /// Wrapped around at least once.
    Looping,
    Finished,
}

/// Playback state of one motion inside a queue.
///
/// All times are absolute seconds on the owning queue's clock. An `end_time`
/// below zero means the entry plays until it is faded out explicitly.
pub struct MotionQueueEntry {
    motion: Option<Arc<dyn MotionBehavior>>,
    pub(crate) available: bool,
    pub(crate) finished: bool,
    pub(crate) started: bool,
    pub(crate) start_time: f32,
    pub(crate) fade_in_start_time: f32,
    pub(crate) end_time: f32,
    pub(crate) last_event_check_time: f32,
    pub(crate) fade_weight: f32,
    fade_out_seconds: f32,
    triggered_fade_out: bool,
    loop_count: u32,
    pub(crate) finished_callback: Option<FinishedMotionCallback>,
}

impl fmt::Debug for MotionQueueEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MotionQueueEntry")
            .field("state", &self.state())
            .field("start_time", &self.start_time)
            .field("fade_in_start_time", &self.fade_in_start_time)
            .field("end_time", &self.end_time)
            .field("fade_weight", &self.fade_weight)
            .finish_non_exhaustive()
    }
}

impl MotionQueueEntry {
    #[must_use]
    pub fn new(motion: Arc<dyn MotionBehavior>) -> Self {
        Self {
            motion: Some(motion),
            available: true,
            finished: false,
            started: false,
            start_time: 0.0,
            fade_in_start_time: 0.0,
            end_time: -1.0,
            last_event_check_time: 0.0,
            fade_weight: 0.0,
            fade_out_seconds: 0.0,
            triggered_fade_out: false,
            loop_count: 0,
            finished_callback: None,
        }
    }

    #[must_use]
    pub fn motion(&self) -> Option<&Arc<dyn MotionBehavior>> {
        self.motion.as_ref()
    }

    /// Drops the backing motion; the queue discards the entry on its next update.
    pub fn detach_motion(&mut self) -> Option<Arc<dyn MotionBehavior>> {
        self.motion.take()
    }

    #[must_use]
    pub fn state(&self) -> MotionState {
        if self.finished {
            MotionState::Finished
        } else if !self.started {
            MotionState::Pending
        } else if self.loop_count > 0 {
            MotionState::Looping
        } else {
            MotionState::Started
        }
    }

    #[inline]
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn set_finished(&mut self, finished: bool) {
        self.finished = finished;
    }

    #[inline]
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.started
    }

    #[inline]
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.available
    }

    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    #[inline]
    #[must_use]
    pub fn start_time(&self) -> f32 {
        self.start_time
    }

    pub fn set_start_time(&mut self, time: f32) {
        self.start_time = time;
    }

    #[inline]
    #[must_use]
    pub fn fade_in_start_time(&self) -> f32 {
        self.fade_in_start_time
    }

    pub fn set_fade_in_start_time(&mut self, time: f32) {
        self.fade_in_start_time = time;
    }

    #[inline]
    #[must_use]
    pub fn end_time(&self) -> f32 {
        self.end_time
    }

    pub fn set_end_time(&mut self, time: f32) {
        self.end_time = time;
    }

    /// Fade weight computed on the most recent update.
    #[inline]
    #[must_use]
    pub fn fade_weight(&self) -> f32 {
        self.fade_weight
    }

    #[inline]
    #[must_use]
    pub fn loop_count(&self) -> u32 {
        self.loop_count
    }

    pub(crate) fn mark_looped(&mut self) {
        self.loop_count += 1;
    }

    #[inline]
    #[must_use]
    pub fn fade_out_seconds(&self) -> f32 {
        self.fade_out_seconds
    }

    #[inline]
    #[must_use]
    pub fn is_triggered_fade_out(&self) -> bool {
        self.triggered_fade_out
    }

    /// Requests a fade-out that is scheduled on the next queue update.
    pub fn set_fade_out(&mut self, fade_out_seconds: f32) {
        self.fade_out_seconds = fade_out_seconds;
        self.triggered_fade_out = true;
    }

    /// Schedules the end of playback `fade_out_seconds` from `user_time`.
    ///
    /// Never extends an end time that is already earlier.
    pub fn start_fade_out(&mut self, fade_out_seconds: f32, user_time: f32) {
        let new_end_time = user_time + fade_out_seconds;
        self.fade_out_seconds = fade_out_seconds;
        self.triggered_fade_out = true;
        if self.end_time < 0.0 || new_end_time < self.end_time {
            self.end_time = new_end_time;
        }
    }

    pub fn set_finished_callback(&mut self, callback: FinishedMotionCallback) {
        self.finished_callback = Some(callback);
    }
}
