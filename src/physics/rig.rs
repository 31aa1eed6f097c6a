use glam::Vec2;

use crate::assets::json::{self, JsonView};
use crate::errors::{CubismError, Result};
use crate::utils::interner::{IdManager, ParameterId};

const ASSET: &str = "physics3.json";

/// Which component of a pendulum an input drives or an output reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhysicsSource {
    X,
    Y,
    Angle,
}

impl PhysicsSource {
    fn parse(name: &str) -> Result<Self> {
        match name {
            "X" => Ok(PhysicsSource::X),
            "Y" => Ok(PhysicsSource::Y),
            "Angle" => Ok(PhysicsSource::Angle),
            other => Err(CubismError::malformed(ASSET, format!("unknown physics type '{other}'"))),
        }
    }
}

/// Range a parameter is mapped onto before it drives a pendulum.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PhysicsNormalization {
    pub minimum: f32,
    pub maximum: f32,
    pub default: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PhysicsParticle {
    pub initial_position: Vec2,
    pub mobility: f32,
    pub delay: f32,
    pub acceleration: f32,
    pub radius: f32,
    pub position: Vec2,
    pub last_position: Vec2,
    pub last_gravity: Vec2,
    pub force: Vec2,
    pub velocity: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsInput {
    pub source: ParameterId,
    pub source_parameter_index: Option<usize>,
    /// Percent, `0..=100`.
    pub weight: f32,
    pub kind: PhysicsSource,
    pub reflect: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsOutput {
    pub destination: ParameterId,
    pub destination_parameter_index: Option<usize>,
    pub vertex_index: usize,
    pub translation_scale: Vec2,
    pub angle_scale: f32,
    /// Percent, `0..=100`.
    pub weight: f32,
    pub kind: PhysicsSource,
    pub reflect: bool,
    /// Lowest unclamped value seen below the destination's minimum.
    pub value_below_minimum: f32,
    /// Highest unclamped value seen above the destination's maximum.
    pub value_exceeded_maximum: f32,
}

impl PhysicsOutput {
    #[inline]
    #[must_use]
    pub fn scale(&self) -> f32 {
        match self.kind {
            PhysicsSource::X => self.translation_scale.x,
            PhysicsSource::Y => self.translation_scale.y,
            PhysicsSource::Angle => self.angle_scale,
        }
    }
}

/// One pendulum chain with its inputs and outputs.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PhysicsSubRig {
    pub input_count: usize,
    pub output_count: usize,
    pub particle_count: usize,
    pub base_input_index: usize,
    pub base_output_index: usize,
    pub base_particle_index: usize,
    pub normalization_position: PhysicsNormalization,
    pub normalization_angle: PhysicsNormalization,
}

impl PhysicsSubRig {
    #[inline]
    #[must_use]
    pub fn inputs(&self) -> std::ops::Range<usize> {
        self.base_input_index..self.base_input_index + self.input_count
    }

    #[inline]
    #[must_use]
    pub fn outputs(&self) -> std::ops::Range<usize> {
        self.base_output_index..self.base_output_index + self.output_count
    }

    #[inline]
    #[must_use]
    pub fn particles(&self) -> std::ops::Range<usize> {
        self.base_particle_index..self.base_particle_index + self.particle_count
    }
}

/// Every pendulum of a model, stored as flat arrays indexed by sub-rig ranges.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PhysicsRig {
    pub settings: Vec<PhysicsSubRig>,
    pub inputs: Vec<PhysicsInput>,
    pub outputs: Vec<PhysicsOutput>,
    pub particles: Vec<PhysicsParticle>,
    /// `Meta.EffectiveForces.Gravity`.
    pub gravity: Vec2,
    /// `Meta.EffectiveForces.Wind`.
    pub wind: Vec2,
    /// Fixed simulation rate; zero steps with the frame delta.
    pub fps: f32,
}

fn vec2(view: JsonView<'_>) -> Vec2 {
    Vec2::new(view.get("X").as_f32_or(0.0), view.get("Y").as_f32_or(0.0))
}

fn normalization(view: JsonView<'_>) -> PhysicsNormalization {
    PhysicsNormalization {
        minimum: view.get("Minimum").as_f32_or(0.0),
        maximum: view.get("Maximum").as_f32_or(0.0),
        default: view.get("Default").as_f32_or(0.0),
    }
}

fn require_parameter_target(view: JsonView<'_>) -> Result<()> {
    match view.get("Target").as_str() {
        None | Some("Parameter") => Ok(()),
        Some(other) => Err(CubismError::malformed(ASSET, format!("unsupported target '{other}'"))),
    }
}

impl PhysicsRig {
    pub fn parse(bytes: &[u8], ids: &IdManager) -> Result<Self> {
        let value = json::parse(bytes)?;
        let root = JsonView::new(&value);
        let meta = root.get("Meta");
        let forces = meta.get("EffectiveForces");

        let mut rig = PhysicsRig {
            gravity: vec2(forces.get("Gravity")),
            wind: vec2(forces.get("Wind")),
            fps: meta.get("Fps").as_f32_or(0.0),
            ..Default::default()
        };

        let settings = root.require_array("PhysicsSettings", ASSET)?;

        for setting in settings.items() {
            let norm = setting.get("Normalization");
            let mut sub_rig = PhysicsSubRig {
                base_input_index: rig.inputs.len(),
                base_output_index: rig.outputs.len(),
                base_particle_index: rig.particles.len(),
                normalization_position: normalization(norm.get("Position")),
                normalization_angle: normalization(norm.get("Angle")),
                ..Default::default()
            };

            for input in setting.get("Input").items() {
                let source = input.get("Source");
                require_parameter_target(source)?;
                rig.inputs.push(PhysicsInput {
                    source: ids.id(source.require_str("Id", ASSET)?),
                    source_parameter_index: None,
                    weight: input.get("Weight").as_f32_or(0.0),
                    kind: PhysicsSource::parse(input.require_str("Type", ASSET)?)?,
                    reflect: input.get("Reflect").as_bool_or(false),
                });
                sub_rig.input_count += 1;
            }

            for output in setting.get("Output").items() {
                let destination = output.get("Destination");
                require_parameter_target(destination)?;
                let scale = output.get("Scale").as_f32_or(1.0);
                let vertex_index = output
                    .get("VertexIndex")
                    .as_i64()
                    .and_then(|i| usize::try_from(i).ok())
                    .ok_or_else(|| CubismError::malformed(ASSET, "bad VertexIndex"))?;
                rig.outputs.push(PhysicsOutput {
                    destination: ids.id(destination.require_str("Id", ASSET)?),
                    destination_parameter_index: None,
                    vertex_index,
                    translation_scale: Vec2::splat(scale),
                    angle_scale: scale,
                    weight: output.get("Weight").as_f32_or(0.0),
                    kind: PhysicsSource::parse(output.require_str("Type", ASSET)?)?,
                    reflect: output.get("Reflect").as_bool_or(false),
                    value_below_minimum: 0.0,
                    value_exceeded_maximum: 0.0,
                });
                sub_rig.output_count += 1;
            }

            for vertex in setting.get("Vertices").items() {
                rig.particles.push(PhysicsParticle {
                    initial_position: vec2(vertex.get("Position")),
                    mobility: vertex.get("Mobility").as_f32_or(0.0),
                    delay: vertex.get("Delay").as_f32_or(0.0),
                    acceleration: vertex.get("Acceleration").as_f32_or(0.0),
                    radius: vertex.get("Radius").as_f32_or(0.0),
                    ..Default::default()
                });
                sub_rig.particle_count += 1;
            }

            rig.settings.push(sub_rig);
        }

        Ok(rig)
    }
}
