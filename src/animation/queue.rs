use std::sync::Arc;

use slotmap::SlotMap;

use crate::animation::entry::{FinishedMotionCallback, MotionQueueEntry, MotionQueueEntryHandle, MotionState};
use crate::animation::motion::MotionBehavior;
use crate::model::Model;

/// Receives user-data events as `(entry, value)`.
pub type MotionEventCallback = Box<dyn FnMut(MotionQueueEntryHandle, &str) + Send>;

/// Plays any number of motions at once, in start order.
///
/// Starting a motion fades out every entry already in the queue, so a new
/// motion cross-fades over whatever was playing.
#[derive(Default)]
pub struct MotionQueueManager {
    user_time: f32,
    entries: SlotMap<MotionQueueEntryHandle, MotionQueueEntry>,
    order: Vec<MotionQueueEntryHandle>,
    event_callback: Option<MotionEventCallback>,
}

impl std::fmt::Debug for MotionQueueManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MotionQueueManager")
            .field("user_time", &self.user_time)
            .field("entries", &self.order.len())
            .finish_non_exhaustive()
    }
}

impl MotionQueueManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue clock of the last update.
    #[inline]
    #[must_use]
    pub fn user_time(&self) -> f32 {
        self.user_time
    }

    pub fn start_motion(&mut self, motion: Arc<dyn MotionBehavior>, user_time: f32) -> MotionQueueEntryHandle {
        self.insert(MotionQueueEntry::new(motion), user_time)
    }

    pub fn start_motion_with_callback(
        &mut self,
        motion: Arc<dyn MotionBehavior>,
        user_time: f32,
        on_finished: FinishedMotionCallback,
    ) -> MotionQueueEntryHandle {
        let mut entry = MotionQueueEntry::new(motion);
        entry.set_finished_callback(on_finished);
        self.insert(entry, user_time)
    }

    fn insert(&mut self, entry: MotionQueueEntry, user_time: f32) -> MotionQueueEntryHandle {
        for handle in &self.order {
            if let Some(existing) = self.entries.get_mut(*handle)
                && let Some(motion) = existing.motion()
            {
                let fade_out = motion.fade_out_seconds();
                existing.start_fade_out(fade_out, user_time);
            }
        }

        let handle = self.entries.insert(entry);
        self.order.push(handle);
        log::debug!("Motion queued ({} playing)", self.order.len());
        handle
    }

    /// Ticks every entry, fires events and discards finished entries.
    ///
    /// Returns `true` if at least one motion wrote to the model.
    pub fn do_update_motion(&mut self, model: &mut Model, user_time: f32) -> bool {
        self.user_time = user_time;
        let mut updated = false;

        let entries = &mut self.entries;
        let event_callback = &mut self.event_callback;

        self.order.retain(|&handle| {
            let Some(entry) = entries.get_mut(handle) else {
                return false;
            };
            let Some(motion) = entry.motion().cloned() else {
                entries.remove(handle);
                return false;
            };

            motion.update_parameters(model, entry, user_time);
            updated = true;

            let fired = motion.fired_events(
                entry.last_event_check_time - entry.start_time,
                user_time - entry.start_time,
            );
            if let Some(callback) = event_callback.as_mut() {
                for value in fired {
                    callback(handle, value);
                }
            }
            entry.last_event_check_time = user_time;

            if entry.is_finished() {
                if let Some(mut on_finished) = entry.finished_callback.take() {
                    on_finished(handle);
                }
                entries.remove(handle);
                return false;
            }

            if entry.is_triggered_fade_out() {
                let fade_out = entry.fade_out_seconds();
                entry.start_fade_out(fade_out, user_time);
            }
            true
        });

        updated
    }

    /// True when no entry is still playing.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.order
            .iter()
            .filter_map(|h| self.entries.get(*h))
            .all(|e| e.motion().is_none() || e.is_finished())
    }

    /// True when `handle` has finished or is no longer queued.
    #[must_use]
    pub fn is_finished_handle(&self, handle: MotionQueueEntryHandle) -> bool {
        self.entries.get(handle).is_none_or(MotionQueueEntry::is_finished)
    }

    /// Lifecycle state of `handle`; `None` once the entry has been removed.
    #[must_use]
    pub fn motion_state(&self, handle: MotionQueueEntryHandle) -> Option<MotionState> {
        self.entries.get(handle).map(MotionQueueEntry::state)
    }

    pub fn stop_all_motions(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    #[must_use]
    pub fn entry(&self, handle: MotionQueueEntryHandle) -> Option<&MotionQueueEntry> {
        self.entries.get(handle)
    }

    pub fn entry_mut(&mut self, handle: MotionQueueEntryHandle) -> Option<&mut MotionQueueEntry> {
        self.entries.get_mut(handle)
    }

    /// Entries in start order.
    pub fn entries(&self) -> impl Iterator<Item = (MotionQueueEntryHandle, &MotionQueueEntry)> {
        self.order.iter().filter_map(|h| self.entries.get(*h).map(|e| (*h, e)))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn set_event_callback(&mut self, callback: MotionEventCallback) {
        self.event_callback = Some(callback);
    }
}
