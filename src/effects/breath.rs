use std::f32::consts::TAU;

use crate::model::Model;
use crate::runtime::ids;
use crate::utils::interner::{IdManager, ParameterId};

/// One sine-driven parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BreathParameter {
    pub id: ParameterId,
    pub offset: f32,
    pub peak: f32,
    /// Seconds per full period.
    pub cycle: f32,
    pub weight: f32,
}

/// Idle breathing: adds `offset + peak * sin(2π·t / cycle)` to each parameter.
#[derive(Debug, Clone, Default)]
pub struct Breath {
    parameters: Vec<BreathParameter>,
    current_time: f32,
}

impl Breath {
    #[must_use]
    pub fn new(parameters: Vec<BreathParameter>) -> Self {
        Self {
            parameters,
            current_time: 0.0,
        }
    }

    /// Head sway and chest motion on the standard parameters.
    #[must_use]
    pub fn with_default_parameters(id_manager: &IdManager) -> Self {
        let p = |name: &str, offset, peak, cycle, weight| BreathParameter {
            id: id_manager.id(name),
            offset,
            peak,
            cycle,
            weight,
        };
        Self::new(vec![
            p(ids::PARAM_ANGLE_X, 0.0, 15.0, 6.5345, 0.5),
            p(ids::PARAM_ANGLE_Y, 0.0, 8.0, 3.5345, 0.5),
            p(ids::PARAM_ANGLE_Z, 0.0, 10.0, 5.5345, 0.5),
            p(ids::PARAM_BODY_ANGLE_X, 0.0, 4.0, 15.5345, 0.5),
            p(ids::PARAM_BREATH, 0.5, 0.5, 3.2345, 1.0),
        ])
    }

    #[must_use]
    pub fn parameters(&self) -> &[BreathParameter] {
        &self.parameters
    }

    pub fn set_parameters(&mut self, parameters: Vec<BreathParameter>) {
        self.parameters = parameters;
    }

    pub fn update_parameters(&mut self, model: &mut Model, delta_seconds: f32) {
        self.current_time += delta_seconds;
        let t = self.current_time * TAU;

        for p in &self.parameters {
            if p.cycle == 0.0 {
                continue;
            }
            let value = p.offset + p.peak * (t / p.cycle).sin();
            model.add_parameter_value_by_id(p.id, value, p.weight);
        }
    }
}
