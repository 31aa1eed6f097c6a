use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::math::{degrees_to_radian, direction_to_radian, normalize_in_place, radian_to_direction};
use crate::model::Model;
use crate::physics::rig::{
    PhysicsInput, PhysicsNormalization, PhysicsOutput, PhysicsParticle, PhysicsRig, PhysicsSource,
    PhysicsSubRig,
};
use crate::utils::interner::IdManager;

/// Divides the swing of a particle between two steps.
pub const AIR_RESISTANCE: f32 = 5.0;
/// Input and output weights are percentages of this.
pub const MAXIMUM_WEIGHT: f32 = 100.0;
/// Fraction of the position range below which a particle's X snaps to zero.
pub const MOVEMENT_THRESHOLD: f32 = 0.001;
/// Accumulated time beyond this is discarded.
pub const MAX_DELTA_TIME: f32 = 5.0;

/// External forces applied to every pendulum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsOptions {
    pub gravity: Vec2,
    pub wind: Vec2,
}

impl Default for PhysicsOptions {
    fn default() -> Self {
        Self {
            gravity: Vec2::new(0.0, -1.0),
            wind: Vec2::ZERO,
        }
    }
}

/// Pendulum simulation driven by parameters and writing parameters.
///
/// Simulation runs in fixed steps of `1 / fps`. The two most recent step
/// results are kept and the parameters receive their blend at the fractional
/// remainder, so the output is continuous at any frame rate.
#[derive(Debug, Clone)]
pub struct Physics {
    rig: PhysicsRig,
    options: PhysicsOptions,
    current_rig_outputs: Vec<f32>,
    previous_rig_outputs: Vec<f32>,
    current_remain_time: f32,
    parameter_caches: Vec<f32>,
    parameter_input_caches: Vec<f32>,
}

impl Physics {
    #[must_use]
    pub fn new(rig: PhysicsRig) -> Self {
        let output_count = rig.outputs.len();
        let mut physics = Self {
            rig,
            options: PhysicsOptions::default(),
            current_rig_outputs: vec![0.0; output_count],
            previous_rig_outputs: vec![0.0; output_count],
            current_remain_time: 0.0,
            parameter_caches: Vec::new(),
            parameter_input_caches: Vec::new(),
        };
        physics.initialize();
        physics
    }

    pub fn parse(bytes: &[u8], ids: &IdManager) -> Result<Self> {
        Ok(Self::new(PhysicsRig::parse(bytes, ids)?))
    }

    #[must_use]
    pub fn rig(&self) -> &PhysicsRig {
        &self.rig
    }

    #[must_use]
    pub fn options(&self) -> PhysicsOptions {
        self.options
    }

    pub fn set_options(&mut self, options: PhysicsOptions) {
        self.options = options;
    }

    /// Restores default forces and puts every particle back at rest.
    pub fn reset(&mut self) {
        self.options = PhysicsOptions::default();
        self.rig.gravity = Vec2::ZERO;
        self.rig.wind = Vec2::ZERO;
        self.current_remain_time = 0.0;
        self.current_rig_outputs.fill(0.0);
        self.previous_rig_outputs.fill(0.0);
        self.parameter_caches.clear();
        self.parameter_input_caches.clear();
        self.initialize();
    }

    fn initialize(&mut self) {
        for setting in &self.rig.settings {
            let strand = &mut self.rig.particles[setting.particles()];
            let Some((first, rest)) = strand.split_first_mut() else {
                continue;
            };

            first.initial_position = Vec2::ZERO;
            first.last_position = first.initial_position;
            first.last_gravity = Vec2::new(0.0, 1.0);
            first.velocity = Vec2::ZERO;
            first.force = Vec2::ZERO;

            let mut previous = first.initial_position;
            for particle in rest {
                particle.initial_position = previous + Vec2::new(0.0, particle.radius);
                particle.position = particle.initial_position;
                particle.last_position = particle.initial_position;
                particle.last_gravity = Vec2::new(0.0, 1.0);
                particle.velocity = Vec2::ZERO;
                particle.force = Vec2::ZERO;
                previous = particle.initial_position;
            }
        }
    }

    fn resolve_parameter_indices(&mut self, model: &mut Model) {
        for input in &mut self.rig.inputs {
            if input.source_parameter_index.is_none() {
                input.source_parameter_index = Some(model.parameter_index(input.source));
            }
        }
        for output in &mut self.rig.outputs {
            if output.destination_parameter_index.is_none() {
                output.destination_parameter_index = Some(model.parameter_index(output.destination));
            }
        }

        let count = model.total_parameter_count();
        for caches in [&mut self.parameter_caches, &mut self.parameter_input_caches] {
            let known = caches.len();
            if known < count {
                caches.extend((known..count).map(|i| model.parameter_value(i)));
            }
        }
    }

    /// Advances the simulation by `delta_seconds` and writes the outputs.
    pub fn evaluate(&mut self, model: &mut Model, delta_seconds: f32) {
        if delta_seconds <= 0.0 {
            return;
        }

        self.resolve_parameter_indices(model);

        self.current_remain_time += delta_seconds;
        if self.current_remain_time > MAX_DELTA_TIME {
            self.current_remain_time = 0.0;
        }

        let step = if self.rig.fps > 0.0 { 1.0 / self.rig.fps } else { delta_seconds };

        while self.current_remain_time >= step {
            self.previous_rig_outputs.copy_from_slice(&self.current_rig_outputs);

            // Sample inputs as if they moved linearly since the last step.
            let input_weight = step / self.current_remain_time;
            for (index, (cache, input_cache)) in self
                .parameter_caches
                .iter_mut()
                .zip(self.parameter_input_caches.iter_mut())
                .enumerate()
            {
                *cache = *input_cache * (1.0 - input_weight) + model.parameter_value(index) * input_weight;
                *input_cache = *cache;
            }

            for s in 0..self.rig.settings.len() {
                let setting = self.rig.settings[s];
                let (translation, angle) =
                    accumulate_inputs(&self.rig.inputs[setting.inputs()], model, &self.parameter_caches, &setting);

                let strand = &mut self.rig.particles[setting.particles()];
                update_particles(
                    strand,
                    translation,
                    angle,
                    self.options.wind,
                    MOVEMENT_THRESHOLD * setting.normalization_position.maximum,
                    step,
                    AIR_RESISTANCE,
                );

                for o in setting.outputs() {
                    let output = &mut self.rig.outputs[o];
                    let Some(value) = output_value(output, strand, self.options.gravity) else {
                        continue;
                    };
                    self.current_rig_outputs[o] = value;

                    if let Some(dest) = output.destination_parameter_index {
                        let cached = self.parameter_caches[dest];
                        self.parameter_caches[dest] = blend_output(
                            output,
                            cached,
                            model.parameter_minimum(dest),
                            model.parameter_maximum(dest),
                            value,
                        );
                    }
                }
            }

            self.current_remain_time -= step;
        }

        let alpha = self.current_remain_time / step;
        self.interpolate(model, alpha);
    }

    /// Writes `previous * (1 - weight) + current * weight` for every output.
    fn interpolate(&mut self, model: &mut Model, weight: f32) {
        for (o, output) in self.rig.outputs.iter_mut().enumerate() {
            let Some(dest) = output.destination_parameter_index else {
                continue;
            };
            let value = self.previous_rig_outputs[o] * (1.0 - weight) + self.current_rig_outputs[o] * weight;
            let current = model.parameter_value(dest);
            let blended = blend_output(
                output,
                current,
                model.parameter_minimum(dest),
                model.parameter_maximum(dest),
                value,
            );
            model.set_parameter_value(dest, blended, 1.0);
        }
    }

    /// Moves every pendulum straight to its rest pose for the current inputs.
    pub fn stabilization(&mut self, model: &mut Model) {
        self.resolve_parameter_indices(model);

        for index in 0..self.parameter_caches.len() {
            let value = model.parameter_value(index);
            self.parameter_caches[index] = value;
            self.parameter_input_caches[index] = value;
        }

        for s in 0..self.rig.settings.len() {
            let setting = self.rig.settings[s];
            let (translation, angle) =
                accumulate_inputs(&self.rig.inputs[setting.inputs()], model, &self.parameter_caches, &setting);

            let strand = &mut self.rig.particles[setting.particles()];
            update_particles_for_stabilization(
                strand,
                translation,
                angle,
                self.options.wind,
                MOVEMENT_THRESHOLD * setting.normalization_position.maximum,
            );

            for o in setting.outputs() {
                let output = &mut self.rig.outputs[o];
                let Some(value) = output_value(output, strand, self.options.gravity) else {
                    continue;
                };
                self.current_rig_outputs[o] = value;
                self.previous_rig_outputs[o] = value;

                if let Some(dest) = output.destination_parameter_index {
                    let current = model.parameter_value(dest);
                    let blended = blend_output(
                        output,
                        current,
                        model.parameter_minimum(dest),
                        model.parameter_maximum(dest),
                        value,
                    );
                    model.set_parameter_value(dest, blended, 1.0);
                    self.parameter_caches[dest] = blended;
                }
            }
        }
    }
}

/// Sums the weighted, normalized inputs of one sub-rig into a translation and
/// an angle (degrees), then rotates the translation by the negative angle.
fn accumulate_inputs(
    inputs: &[PhysicsInput],
    model: &Model,
    values: &[f32],
    setting: &PhysicsSubRig,
) -> (Vec2, f32) {
    let mut translation = Vec2::ZERO;
    let mut angle = 0.0;

    for input in inputs {
        let Some(index) = input.source_parameter_index else {
            continue;
        };
        let weight = input.weight / MAXIMUM_WEIGHT;
        let value = values.get(index).copied().unwrap_or_else(|| model.parameter_value(index));
        let min = model.parameter_minimum(index);
        let max = model.parameter_maximum(index);

        match input.kind {
            PhysicsSource::X => {
                translation.x +=
                    normalize_parameter_value(value, min, max, &setting.normalization_position, input.reflect) * weight;
            }
            PhysicsSource::Y => {
                translation.y +=
                    normalize_parameter_value(value, min, max, &setting.normalization_position, input.reflect) * weight;
            }
            PhysicsSource::Angle => {
                angle += normalize_parameter_value(value, min, max, &setting.normalization_angle, input.reflect) * weight;
            }
        }
    }

    let radian = degrees_to_radian(-angle);
    let (sin, cos) = radian.sin_cos();
    translation.x = translation.x * cos - translation.y * sin;
    // Uses the rotated x on purpose; rigs are tuned against this.
    translation.y = translation.x * sin + translation.y * cos;

    (translation, angle)
}

/// Maps a parameter value onto the normalization range around its midpoint.
///
/// The sign is flipped unless `inverted` is set.
#[must_use]
pub fn normalize_parameter_value(
    value: f32,
    parameter_minimum: f32,
    parameter_maximum: f32,
    normalization: &PhysicsNormalization,
    inverted: bool,
) -> f32 {
    let max_value = parameter_maximum.max(parameter_minimum);
    let min_value = parameter_maximum.min(parameter_minimum);
    let value = value.clamp(min_value, max_value);

    let min_norm = normalization.minimum.min(normalization.maximum);
    let max_norm = normalization.minimum.max(normalization.maximum);
    let middle_norm = normalization.default;
    let middle_value = min_value + (max_value - min_value).abs() / 2.0;
    let offset = value - middle_value;

    let result = if offset > 0.0 {
        let n_length = max_norm - middle_norm;
        let p_length = max_value - middle_value;
        if p_length == 0.0 { 0.0 } else { offset * (n_length / p_length) + middle_norm }
    } else if offset < 0.0 {
        let n_length = min_norm - middle_norm;
        let p_length = min_value - middle_value;
        if p_length == 0.0 { 0.0 } else { offset * (n_length / p_length) + middle_norm }
    } else {
        middle_norm
    };

    if inverted { result } else { -result }
}

/// One integration step of a pendulum chain. `strand[0]` is pinned to
/// `translation`; every other particle swings from its parent.
pub fn update_particles(
    strand: &mut [PhysicsParticle],
    translation: Vec2,
    angle: f32,
    wind: Vec2,
    threshold: f32,
    delta_seconds: f32,
    air_resistance: f32,
) {
    let Some(first) = strand.first_mut() else {
        return;
    };
    first.position = translation;

    let mut current_gravity = radian_to_direction(degrees_to_radian(angle));
    normalize_in_place(&mut current_gravity);

    for i in 1..strand.len() {
        let parent = strand[i - 1].position;
        let particle = &mut strand[i];

        particle.force = current_gravity * particle.acceleration + wind;
        particle.last_position = particle.position;

        let delay = particle.delay * delta_seconds * 30.0;

        let mut direction = particle.position - parent;
        let radian = direction_to_radian(particle.last_gravity, current_gravity) / air_resistance;
        let (sin, cos) = radian.sin_cos();
        direction.x = cos * direction.x - direction.y * sin;
        direction.y = sin * direction.x + direction.y * cos;

        particle.position = parent + direction;

        let velocity = particle.velocity * delay;
        let force = particle.force * delay * delay;
        particle.position += velocity + force;

        let mut new_direction = particle.position - parent;
        normalize_in_place(&mut new_direction);
        particle.position = parent + new_direction * particle.radius;

        if particle.position.x.abs() < threshold {
            particle.position.x = 0.0;
        }

        if delay != 0.0 {
            particle.velocity = (particle.position - particle.last_position) / delay * particle.mobility;
        }

        particle.force = Vec2::ZERO;
        particle.last_gravity = current_gravity;
    }
}

/// Places each particle at rest along the combined gravity and wind force.
pub fn update_particles_for_stabilization(
    strand: &mut [PhysicsParticle],
    translation: Vec2,
    angle: f32,
    wind: Vec2,
    threshold: f32,
) {
    let Some(first) = strand.first_mut() else {
        return;
    };
    first.position = translation;

    let mut current_gravity = radian_to_direction(degrees_to_radian(angle));
    normalize_in_place(&mut current_gravity);

    for i in 1..strand.len() {
        let parent = strand[i - 1].position;
        let particle = &mut strand[i];

        particle.force = current_gravity * particle.acceleration + wind;
        particle.last_position = particle.position;
        particle.velocity = Vec2::ZERO;

        let mut force = particle.force;
        normalize_in_place(&mut force);
        particle.position = parent + force * particle.radius;

        if particle.position.x.abs() < threshold {
            particle.position.x = 0.0;
        }

        particle.force = Vec2::ZERO;
        particle.last_gravity = current_gravity;
    }
}

/// Reads an output from a strand; `None` when the vertex index has no parent.
fn output_value(output: &PhysicsOutput, strand: &[PhysicsParticle], gravity: Vec2) -> Option<f32> {
    let index = output.vertex_index;
    if index < 1 || index >= strand.len() {
        return None;
    }
    let translation = strand[index].position - strand[index - 1].position;

    let value = match output.kind {
        PhysicsSource::X => translation.x,
        PhysicsSource::Y => translation.y,
        PhysicsSource::Angle => {
            let parent_gravity = if index >= 2 {
                strand[index - 1].position - strand[index - 2].position
            } else {
                -gravity
            };
            direction_to_radian(parent_gravity, translation)
        }
    };

    Some(if output.reflect { -value } else { value })
}

/// Scales and clamps `value` into the destination range, records the excess,
/// then blends it over `current` by the output weight.
fn blend_output(output: &mut PhysicsOutput, current: f32, minimum: f32, maximum: f32, value: f32) -> f32 {
    let mut value = value * output.scale();

    if value < minimum {
        output.value_below_minimum = output.value_below_minimum.min(value);
        value = minimum;
    } else if value > maximum {
        output.value_exceeded_maximum = output.value_exceeded_maximum.max(value);
        value = maximum;
    }

    let weight = output.weight / MAXIMUM_WEIGHT;
    if weight >= 1.0 {
        value
    } else {
        current * (1.0 - weight) + value * weight
    }
}
