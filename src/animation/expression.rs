//! Facial expressions (exp3.json).
//!
//! An expression is a set of parameter offsets that is layered on top of the
//! motion output. Several expressions may be queued while one cross-fades into
//! the next; their contributions are blended per parameter before a single
//! write, so the result does not depend on how many are still fading.

use std::sync::Arc;

use crate::animation::entry::MotionQueueEntry;
use crate::animation::motion::MotionBehavior;
use crate::assets::json::{self, JsonView};
use crate::errors::Result;
use crate::model::Model;
use crate::utils::interner::{IdManager, ParameterId};

const ASSET: &str = "exp3.json";
const DEFAULT_FADE_SECONDS: f32 = 1.0;
const DEFAULT_ADDITIVE: f32 = 0.0;
const DEFAULT_MULTIPLY: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpressionBlend {
    Add,
    Multiply,
    Overwrite,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpressionParameter {
    pub id: ParameterId,
    pub blend: ExpressionBlend,
    pub value: f32,
}

#[derive(Debug, Clone)]
pub struct ExpressionMotion {
    fade_in_seconds: f32,
    fade_out_seconds: f32,
    parameters: Vec<ExpressionParameter>,
}

impl ExpressionMotion {
    pub fn parse(bytes: &[u8], ids: &IdManager) -> Result<Self> {
        let value = json::parse(bytes)?;
        let root = JsonView::new(&value);

        let fade = |key: &str| {
            root.get(key)
                .as_f32()
                .filter(|s| *s >= 0.0)
                .unwrap_or(DEFAULT_FADE_SECONDS)
        };

        let mut parameters = Vec::new();
        for item in root.get("Parameters").items() {
            let id = ids.id(item.require_str("Id", ASSET)?);
            let value = item.require_f32("Value", ASSET)?;
            let blend = match item.get("Blend").as_str() {
                None | Some("Add") => ExpressionBlend::Add,
                Some("Multiply") => ExpressionBlend::Multiply,
                Some("Overwrite") => ExpressionBlend::Overwrite,
                Some(other) => {
                    log::warn!("Unknown expression blend '{other}', using Add");
                    ExpressionBlend::Add
                }
            };
            parameters.push(ExpressionParameter { id, blend, value });
        }

        Ok(Self {
            fade_in_seconds: fade("FadeInTime"),
            fade_out_seconds: fade("FadeOutTime"),
            parameters,
        })
    }

    #[must_use]
    pub fn new(parameters: Vec<ExpressionParameter>, fade_in_seconds: f32, fade_out_seconds: f32) -> Self {
        Self {
            fade_in_seconds,
            fade_out_seconds,
            parameters,
        }
    }

    #[must_use]
    pub fn parameters(&self) -> &[ExpressionParameter] {
        &self.parameters
    }

    fn find(&self, id: ParameterId) -> Option<&ExpressionParameter> {
        self.parameters.iter().find(|p| p.id == id)
    }
}

impl MotionBehavior for ExpressionMotion {
    fn fade_in_seconds(&self) -> f32 {
        self.fade_in_seconds
    }

    fn fade_out_seconds(&self) -> f32 {
        self.fade_out_seconds
    }

    /// Applies the expression on its own, without cross-expression blending.
    fn do_update_parameters(
        &self,
        model: &mut Model,
        _user_time: f32,
        fade_weight: f32,
        _entry: &mut MotionQueueEntry,
    ) {
        for p in &self.parameters {
            match p.blend {
                ExpressionBlend::Add => model.add_parameter_value_by_id(p.id, p.value, fade_weight),
                ExpressionBlend::Multiply => model.multiply_parameter_value_by_id(p.id, p.value, fade_weight),
                ExpressionBlend::Overwrite => model.set_parameter_value_by_id(p.id, p.value, fade_weight),
            }
        }
    }
}

/// Accumulated contribution of all queued expressions to one parameter.
#[derive(Debug, Clone, Copy)]
struct ExpressionParameterValue {
    id: ParameterId,
    additive: f32,
    multiply: f32,
    overwrite: f32,
}

struct ExpressionSlot {
    motion: Arc<ExpressionMotion>,
    entry: MotionQueueEntry,
}

/// Plays expressions with cross-fading between them.
#[derive(Default)]
pub struct ExpressionMotionManager {
    user_time: f32,
    slots: Vec<ExpressionSlot>,
    values: Vec<ExpressionParameterValue>,
}

impl std::fmt::Debug for ExpressionMotionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpressionMotionManager")
            .field("user_time", &self.user_time)
            .field("playing", &self.slots.len())
            .finish_non_exhaustive()
    }
}

impl ExpressionMotionManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `motion` and starts fading out every expression already playing.
    pub fn start_expression(&mut self, motion: Arc<ExpressionMotion>) {
        for slot in &mut self.slots {
            slot.entry.start_fade_out(slot.motion.fade_out_seconds, self.user_time);
        }

        for p in &motion.parameters {
            if !self.values.iter().any(|v| v.id == p.id) {
                self.values.push(ExpressionParameterValue {
                    id: p.id,
                    additive: DEFAULT_ADDITIVE,
                    multiply: DEFAULT_MULTIPLY,
                    overwrite: 0.0,
                });
            }
        }

        let entry = MotionQueueEntry::new(motion.clone());
        self.slots.push(ExpressionSlot { motion, entry });
    }

    /// Number of expressions still contributing.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Fade weight of the `index`-th queued expression on the last update.
    #[must_use]
    pub fn fade_weight(&self, index: usize) -> Option<f32> {
        self.slots.get(index).map(|s| s.entry.fade_weight())
    }

    pub fn stop_all_expressions(&mut self) {
        self.slots.clear();
    }

    /// Advances the clock and writes the blended expression result.
    ///
    /// Returns `true` when at least one expression was applied.
    pub fn update_motion(&mut self, model: &mut Model, delta_seconds: f32) -> bool {
        self.user_time += delta_seconds;
        let user_time = self.user_time;

        if self.slots.is_empty() {
            return false;
        }

        let mut expression_weight = 0.0;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            let motion = &slot.motion;
            motion.setup_entry(&mut slot.entry, user_time);
            let fade_weight = motion.update_fade_weight(&mut slot.entry, user_time);
            expression_weight += fade_weight;

            for value in &mut self.values {
                let current = model.parameter_value_by_id(value.id);
                let (additive, multiply, overwrite) = match motion.find(value.id) {
                    Some(p) => match p.blend {
                        ExpressionBlend::Add => (p.value, DEFAULT_MULTIPLY, current),
                        ExpressionBlend::Multiply => (DEFAULT_ADDITIVE, p.value, current),
                        ExpressionBlend::Overwrite => (DEFAULT_ADDITIVE, DEFAULT_MULTIPLY, p.value),
                    },
                    None => (DEFAULT_ADDITIVE, DEFAULT_MULTIPLY, current),
                };

                if index == 0 {
                    value.additive = additive;
                    value.multiply = multiply;
                    value.overwrite = overwrite;
                } else {
                    value.additive = value.additive * (1.0 - fade_weight) + additive * fade_weight;
                    value.multiply = value.multiply * (1.0 - fade_weight) + multiply * fade_weight;
                    value.overwrite = value.overwrite * (1.0 - fade_weight) + overwrite * fade_weight;
                }
            }
        }
        let expression_weight = expression_weight.min(1.0);

        for value in &self.values {
            let target = (value.overwrite + value.additive) * value.multiply;
            model.set_parameter_value_by_id(value.id, target, expression_weight);
        }

        // The newest expression fully covers older ones once faded in.
        if self.slots.len() > 1
            && self.slots.last().is_some_and(|s| s.entry.fade_weight() >= 1.0)
        {
            let keep_from = self.slots.len() - 1;
            self.slots.drain(..keep_from);
        }
        self.slots
            .retain(|s| s.entry.end_time() < 0.0 || s.entry.end_time() > user_time);

        true
    }
}
