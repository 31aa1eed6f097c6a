use std::sync::Arc;

use smallvec::SmallVec;

use crate::animation::clip::MotionData;
use crate::animation::curve::CurveTarget;
use crate::animation::entry::MotionQueueEntry;
use crate::errors::Result;
use crate::math::easing_sine;
use crate::model::Model;
use crate::runtime::ids as standard_ids;
use crate::utils::interner::{CubismId, IdManager, ParameterId};

/// Effect ids beyond this count are ignored by the per-curve bookkeeping.
/// Eye-blink and lip-sync ids past this count are ignored by motions.
pub const MAX_EFFECT_TARGETS: usize = 64;

/// Something a [`MotionQueueManager`](crate::animation::MotionQueueManager)
/// can play.
///
/// Implementors provide timing and the raw parameter writes; the provided
/// methods turn a queue entry's clock into a fade weight and drive one tick.
pub trait MotionBehavior: Send + Sync {
    fn fade_in_seconds(&self) -> f32;
    fn fade_out_seconds(&self) -> f32;

    fn weight(&self) -> f32 {
        1.0
    }

    fn offset_seconds(&self) -> f32 {
        0.0
    }

    /// Playback length in seconds; `-1.0` when the motion never ends by itself.
    fn duration(&self) -> f32 {
        -1.0
    }

    /// Length of one pass regardless of looping.
    fn loop_duration(&self) -> f32 {
        -1.0
    }

    /// Events whose fire time lies in `(before, current]`, in seconds from the
    /// entry's start.
    fn fired_events(&self, _before: f32, _current: f32) -> SmallVec<[&str; 4]> {
        SmallVec::new()
    }

    /// Writes this motion's values for `user_time`, blended by `fade_weight`.
    fn do_update_parameters(
        &self,
        model: &mut Model,
        user_time: f32,
        fade_weight: f32,
        entry: &mut MotionQueueEntry,
    );

    /// Starts the entry's clock on its first tick.
    fn setup_entry(&self, entry: &mut MotionQueueEntry, user_time: f32) {
        if !entry.available || entry.started {
            return;
        }
        entry.started = true;
        entry.start_time = user_time - self.offset_seconds();
        entry.fade_in_start_time = user_time;

        if entry.end_time < 0.0 {
            let duration = self.duration();
            entry.end_time = if duration <= 0.0 { -1.0 } else { entry.start_time + duration };
        }
    }

    /// `weight * fade_in * fade_out`, with both envelopes eased.
    fn update_fade_weight(&self, entry: &mut MotionQueueEntry, user_time: f32) -> f32 {
        let fade_in = self.fade_in_seconds();
        let fade_out = self.fade_out_seconds();

        let fade_in_weight = if fade_in <= 0.0 {
            1.0
        } else {
            easing_sine((user_time - entry.fade_in_start_time) / fade_in)
        };
        let fade_out_weight = if fade_out <= 0.0 || entry.end_time < 0.0 {
            1.0
        } else {
            easing_sine((entry.end_time - user_time) / fade_out)
        };

        let weight = self.weight() * fade_in_weight * fade_out_weight;
        entry.fade_weight = weight;
        weight
    }

    /// Advances one tick and marks the entry finished once its end time passes.
    fn update_parameters(&self, model: &mut Model, entry: &mut MotionQueueEntry, user_time: f32) {
        if !entry.available || entry.finished {
            return;
        }

        self.setup_entry(entry, user_time);
        let fade_weight = self.update_fade_weight(entry, user_time);
        self.do_update_parameters(model, user_time, fade_weight, entry);

        if entry.end_time > 0.0 && entry.end_time < user_time {
            entry.finished = true;
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ModelCurveIds {
    eye_blink: CubismId,
    lip_sync: CubismId,
    opacity: CubismId,
}

/// Keyframe motion decoded from motion3.json.
#[derive(Debug, Clone)]
pub struct Motion {
    data: Arc<MotionData>,
    fade_in_seconds: f32,
    fade_out_seconds: f32,
    weight: f32,
    offset_seconds: f32,
    is_loop: bool,
    is_loop_fade_in: bool,
    eye_blink_parameter_ids: Vec<ParameterId>,
    lip_sync_parameter_ids: Vec<ParameterId>,
    model_curve_ids: ModelCurveIds,
}

impl Motion {
    #[must_use]
    pub fn new(data: Arc<MotionData>, ids: &IdManager) -> Self {
        let fade = |v: Option<f32>| v.filter(|s| *s >= 0.0).unwrap_or(1.0);
        Self {
            fade_in_seconds: fade(data.fade_in_time),
            fade_out_seconds: fade(data.fade_out_time),
            weight: 1.0,
            offset_seconds: 0.0,
            is_loop: data.looped,
            is_loop_fade_in: true,
            eye_blink_parameter_ids: Vec::new(),
            lip_sync_parameter_ids: Vec::new(),
            model_curve_ids: ModelCurveIds {
                eye_blink: ids.id(standard_ids::EYE_BLINK),
                lip_sync: ids.id(standard_ids::LIP_SYNC),
                opacity: ids.id(standard_ids::OPACITY),
            },
            data,
        }
    }

    pub fn parse(bytes: &[u8], ids: &IdManager) -> Result<Self> {
        let data = MotionData::parse(bytes, ids)?;
        Ok(Self::new(Arc::new(data), ids))
    }

    #[must_use]
    pub fn data(&self) -> &Arc<MotionData> {
        &self.data
    }

    pub fn set_fade_in_seconds(&mut self, seconds: f32) {
        self.fade_in_seconds = seconds;
    }

    pub fn set_fade_out_seconds(&mut self, seconds: f32) {
        self.fade_out_seconds = seconds;
    }

    pub fn set_weight(&mut self, weight: f32) {
        self.weight = weight;
    }

    pub fn set_offset_seconds(&mut self, seconds: f32) {
        self.offset_seconds = seconds;
    }

    #[must_use]
    pub fn is_loop(&self) -> bool {
        self.is_loop
    }

    pub fn set_loop(&mut self, looped: bool) {
        self.is_loop = looped;
    }

    #[must_use]
    pub fn is_loop_fade_in(&self) -> bool {
        self.is_loop_fade_in
    }

    /// Whether each wrap of a looping motion fades in again.
    pub fn set_loop_fade_in(&mut self, fade_in: bool) {
        self.is_loop_fade_in = fade_in;
    }

    /// Parameters that receive the `EyeBlink` and `LipSync` model curves.
    pub fn set_effect_ids(&mut self, eye_blink: Vec<ParameterId>, lip_sync: Vec<ParameterId>) {
        if eye_blink.len() > MAX_EFFECT_TARGETS || lip_sync.len() > MAX_EFFECT_TARGETS {
            log::warn!("Motion effect ids beyond the first {MAX_EFFECT_TARGETS} are ignored");
        }
        self.eye_blink_parameter_ids = eye_blink;
        self.lip_sync_parameter_ids = lip_sync;
    }
}

fn curve_fade_in(entry: &MotionQueueEntry, user_time: f32, seconds: f32, fallback: f32) -> f32 {
    if seconds < 0.0 {
        fallback
    } else if seconds == 0.0 {
        1.0
    } else {
        easing_sine((user_time - entry.fade_in_start_time) / seconds)
    }
}

fn curve_fade_out(entry: &MotionQueueEntry, user_time: f32, seconds: f32, fallback: f32) -> f32 {
    if seconds < 0.0 {
        fallback
    } else if seconds == 0.0 || entry.end_time < 0.0 {
        1.0
    } else {
        easing_sine((entry.end_time - user_time) / seconds)
    }
}

fn effect_bit(ids: &[ParameterId], id: ParameterId) -> Option<u64> {
    ids.iter()
        .take(MAX_EFFECT_TARGETS)
        .position(|&p| p == id)
        .map(|bit| 1u64 << bit)
}

impl MotionBehavior for Motion {
    fn fade_in_seconds(&self) -> f32 {
        self.fade_in_seconds
    }

    fn fade_out_seconds(&self) -> f32 {
        self.fade_out_seconds
    }

    fn weight(&self) -> f32 {
        self.weight
    }

    fn offset_seconds(&self) -> f32 {
        self.offset_seconds
    }

    fn duration(&self) -> f32 {
        if self.is_loop { -1.0 } else { self.data.duration }
    }

    fn loop_duration(&self) -> f32 {
        self.data.duration
    }

    fn fired_events(&self, before: f32, current: f32) -> SmallVec<[&str; 4]> {
        self.data.events_between(before, current).collect()
    }

    fn do_update_parameters(
        &self,
        model: &mut Model,
        user_time: f32,
        fade_weight: f32,
        entry: &mut MotionQueueEntry,
    ) {
        let data = &*self.data;
        let time_offset = user_time - entry.start_time;
        let mut time = time_offset.max(0.0);
        let mut duration = data.duration;

        if self.is_loop {
            if data.fps > 0.0 {
                duration += 1.0 / data.fps;
            }
            if duration > 0.0 {
                while time > duration {
                    time -= duration;
                }
            }
        }
        let loop_end = self.is_loop.then_some(duration);

        let mut eye_blink_value = None;
        let mut lip_sync_value = None;

        let mut index = 0;
        let curves = &data.curves;

        while index < curves.len() && curves[index].target == CurveTarget::Model {
            let curve = &curves[index];
            let value = data.evaluate_curve(index, time, loop_end);
            if curve.id == self.model_curve_ids.eye_blink {
                eye_blink_value = Some(value);
            } else if curve.id == self.model_curve_ids.lip_sync {
                lip_sync_value = Some(value);
            } else if curve.id == self.model_curve_ids.opacity {
                model.set_model_opacity(value);
            }
            index += 1;
        }

        let motion_fade_in = curve_fade_in(entry, user_time, self.fade_in_seconds, 1.0);
        let motion_fade_out = curve_fade_out(entry, user_time, self.fade_out_seconds, 1.0);

        let mut eye_blink_flags = 0u64;
        let mut lip_sync_flags = 0u64;

        while index < curves.len() && curves[index].target == CurveTarget::Parameter {
            let curve = &curves[index];
            let parameter_index = model.parameter_index(curve.id);
            let source = model.parameter_value(parameter_index);
            let mut value = data.evaluate_curve(index, time, loop_end);

            if let Some(eye_blink) = eye_blink_value
                && let Some(bit) = effect_bit(&self.eye_blink_parameter_ids, curve.id)
            {
                value *= eye_blink;
                eye_blink_flags |= bit;
            }
            if let Some(lip_sync) = lip_sync_value
                && let Some(bit) = effect_bit(&self.lip_sync_parameter_ids, curve.id)
            {
                value += lip_sync;
                lip_sync_flags |= bit;
            }

            let blended = if curve.has_own_fade() {
                let fade_in = curve_fade_in(entry, user_time, curve.fade_in_time, motion_fade_in);
                let fade_out = curve_fade_out(entry, user_time, curve.fade_out_time, motion_fade_out);
                let curve_weight = self.weight * fade_in * fade_out;
                source + (value - source) * curve_weight
            } else {
                source + (value - source) * fade_weight
            };
            model.set_parameter_value(parameter_index, blended, 1.0);
            index += 1;
        }

        // Effect parameters without a curve of their own still follow the
        // model curve.
        if let Some(eye_blink) = eye_blink_value {
            apply_unflagged(model, &self.eye_blink_parameter_ids, eye_blink_flags, eye_blink, fade_weight);
        }
        if let Some(lip_sync) = lip_sync_value {
            apply_unflagged(model, &self.lip_sync_parameter_ids, lip_sync_flags, lip_sync, fade_weight);
        }

        while index < curves.len() && curves[index].target == CurveTarget::PartOpacity {
            let curve = &curves[index];
            let parameter_index = model.parameter_index(curve.id);
            let value = data.evaluate_curve(index, time, loop_end);
            model.set_parameter_value(parameter_index, value, 1.0);
            index += 1;
        }

        if time_offset >= duration {
            if self.is_loop {
                entry.start_time = user_time - time;
                if self.is_loop_fade_in {
                    entry.fade_in_start_time = user_time - time;
                }
                entry.mark_looped();
            } else {
                entry.finished = true;
            }
        }
    }
}

fn apply_unflagged(model: &mut Model, ids: &[ParameterId], flags: u64, value: f32, fade_weight: f32) {
    for (bit, &id) in ids.iter().take(MAX_EFFECT_TARGETS).enumerate() {
        if flags & (1u64 << bit) != 0 {
            continue;
        }
        let index = model.parameter_index(id);
        let source = model.parameter_value(index);
        model.set_parameter_value(index, source + (value - source) * fade_weight, 1.0);
    }
}
