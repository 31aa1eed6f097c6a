//! Physics Tests
//!
//! Tests for:
//! - physics3.json decoding and error paths
//! - Deterministic evaluation
//! - Fixed-step evaluation independent of how the frame time is split
//! - Stabilization, reset and external force options

use cubism::errors::CubismError;
use cubism::model::Model;
use cubism::physics::{Physics, PhysicsOptions, PhysicsSource};
use cubism::utils::interner::IdManager;
use glam::Vec2;

const EPSILON: f32 = 1e-5;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

/// One pendulum: head angle X drives the root, the tip swing drives the hair.
fn rig_json(fps: f32) -> String {
    format!(
        r#"{{
            "Version": 3,
            "Meta": {{
                "PhysicsSettingCount": 1,
                "Fps": {fps},
                "EffectiveForces": {{ "Gravity": {{ "X": 0, "Y": -1 }}, "Wind": {{ "X": 0, "Y": 0 }} }}
            }},
            "PhysicsSettings": [
                {{
                    "Id": "PhysicsSetting1",
                    "Input": [
                        {{ "Source": {{ "Target": "Parameter", "Id": "ParamAngleX" }}, "Weight": 60, "Type": "X", "Reflect": false }},
                        {{ "Source": {{ "Target": "Parameter", "Id": "ParamAngleX" }}, "Weight": 40, "Type": "Angle", "Reflect": false }}
                    ],
                    "Output": [
                        {{
                            "Destination": {{ "Target": "Parameter", "Id": "ParamHairFront" }},
                            "VertexIndex": 1, "Scale": 1.5, "Weight": 100, "Type": "Angle", "Reflect": false
                        }}
                    ],
                    "Vertices": [
                        {{ "Position": {{ "X": 0, "Y": 0 }}, "Mobility": 1, "Delay": 1, "Acceleration": 1, "Radius": 0 }},
                        {{ "Position": {{ "X": 0, "Y": 3 }}, "Mobility": 0.95, "Delay": 0.9, "Acceleration": 1.5, "Radius": 3 }}
                    ],
                    "Normalization": {{
                        "Position": {{ "Minimum": -10, "Default": 0, "Maximum": 10 }},
                        "Angle": {{ "Minimum": -10, "Default": 0, "Maximum": 10 }}
                    }}
                }}
            ]
        }}"#
    )
}

fn setup(fps: f32) -> (IdManager, Model, Physics) {
    let ids = IdManager::new();
    let mut model = Model::new(ids.clone());
    model.add_parameter(ids.id("ParamAngleX"), -30.0, 30.0, 0.0).unwrap();
    model.add_parameter(ids.id("ParamHairFront"), -1.0, 1.0, 0.0).unwrap();
    model.save_parameters();
    let physics = Physics::parse(rig_json(fps).as_bytes(), &ids).unwrap();
    (ids, model, physics)
}

fn hair(ids: &IdManager, model: &Model) -> f32 {
    model.parameter_value_by_id(ids.id("ParamHairFront"))
}

// ============================================================================
// Decoding
// ============================================================================

#[test]
fn parses_rig_layout() {
    let (ids, _, physics) = setup(32.0);
    let rig = physics.rig();

    assert_eq!(rig.settings.len(), 1);
    assert_eq!(rig.inputs.len(), 2);
    assert_eq!(rig.outputs.len(), 1);
    assert_eq!(rig.particles.len(), 2);
    assert!(approx(rig.fps, 32.0));
    assert_eq!(rig.gravity, Vec2::new(0.0, -1.0));

    assert_eq!(rig.inputs[1].kind, PhysicsSource::Angle);
    let output = &rig.outputs[0];
    assert_eq!(output.destination, ids.id("ParamHairFront"));
    assert!(approx(output.angle_scale, 1.5));
    assert!(approx(output.scale(), 1.5));

    let setting = rig.settings[0];
    assert_eq!(setting.particles(), 0..2);
    assert!(approx(setting.normalization_position.maximum, 10.0));
}

#[test]
fn unknown_input_type_is_malformed() {
    let ids = IdManager::new();
    let json = rig_json(30.0).replace(r#""Type": "X""#, r#""Type": "Z""#);
    let result = Physics::parse(json.as_bytes(), &ids);
    assert!(matches!(result, Err(CubismError::MalformedAsset { .. })));
}

#[test]
fn missing_settings_is_malformed() {
    let ids = IdManager::new();
    let result = Physics::parse(br#"{ "Meta": { "Fps": 30 } }"#, &ids);
    assert!(matches!(result, Err(CubismError::MalformedAsset { .. })));
}

// ============================================================================
// Evaluation
// ============================================================================

#[test]
fn head_motion_swings_the_hair() {
    let (ids, mut model, mut physics) = setup(32.0);
    let angle = ids.id("ParamAngleX");

    let mut moved = false;
    for frame in 0..64 {
        let t = frame as f32 / 32.0;
        model.set_parameter_value_by_id(angle, 30.0 * (t * 4.0).sin(), 1.0);
        physics.evaluate(&mut model, 1.0 / 32.0);
        let value = hair(&ids, &model);
        assert!((-1.0..=1.0).contains(&value), "output {value} escaped its range");
        moved |= value.abs() > 1e-3;
    }
    assert!(moved, "hair never moved");
}

#[test]
fn evaluation_is_deterministic() {
    let (ids_a, mut model_a, mut physics_a) = setup(30.0);
    let (ids_b, mut model_b, mut physics_b) = setup(30.0);

    for frame in 0..90 {
        let input = 25.0 * ((frame as f32) * 0.3).cos();
        model_a.set_parameter_value_by_id(ids_a.id("ParamAngleX"), input, 1.0);
        model_b.set_parameter_value_by_id(ids_b.id("ParamAngleX"), input, 1.0);

        // Irregular frame times exercise the interpolation path.
        let dt = if frame % 3 == 0 { 0.021 } else { 0.013 };
        physics_a.evaluate(&mut model_a, dt);
        physics_b.evaluate(&mut model_b, dt);

        assert_eq!(hair(&ids_a, &model_a).to_bits(), hair(&ids_b, &model_b).to_bits());
    }
}

#[test]
fn split_frames_match_whole_frames() {
    let (ids_a, mut model_a, mut physics_a) = setup(32.0);
    let (ids_b, mut model_b, mut physics_b) = setup(32.0);
    model_a.set_parameter_value_by_id(ids_a.id("ParamAngleX"), 20.0, 1.0);
    model_b.set_parameter_value_by_id(ids_b.id("ParamAngleX"), 20.0, 1.0);

    for _ in 0..12 {
        physics_a.evaluate(&mut model_a, 1.0 / 16.0);

        physics_b.evaluate(&mut model_b, 1.0 / 32.0);
        physics_b.evaluate(&mut model_b, 1.0 / 32.0);

        let whole = hair(&ids_a, &model_a);
        let split = hair(&ids_b, &model_b);
        assert!(approx(whole, split), "whole {whole} vs split {split}");
    }
}

#[test]
fn non_positive_delta_is_ignored() {
    let (ids, mut model, mut physics) = setup(30.0);
    model.set_parameter_value_by_id(ids.id("ParamAngleX"), 30.0, 1.0);
    physics.evaluate(&mut model, 0.0);
    physics.evaluate(&mut model, -1.0);
    assert_eq!(hair(&ids, &model), 0.0);
}

// ============================================================================
// Stabilization / reset / options
// ============================================================================

#[test]
fn stabilized_pendulum_stays_at_rest() {
    let (ids, mut model, mut physics) = setup(30.0);
    model.set_parameter_value_by_id(ids.id("ParamAngleX"), 12.0, 1.0);
    physics.stabilization(&mut model);
    let rest = hair(&ids, &model);

    for _ in 0..30 {
        physics.evaluate(&mut model, 1.0 / 30.0);
        let value = hair(&ids, &model);
        assert!((value - rest).abs() < 1e-3, "drifted from {rest} to {value}");
    }
}

#[test]
fn reset_restores_default_options() {
    let (_, _, mut physics) = setup(30.0);
    physics.set_options(PhysicsOptions {
        gravity: Vec2::new(0.0, -2.0),
        wind: Vec2::new(0.5, 0.0),
    });
    assert!(approx(physics.options().wind.x, 0.5));

    physics.reset();
    assert_eq!(physics.options(), PhysicsOptions::default());
    assert_eq!(physics.rig().particles[1].velocity, Vec2::ZERO);
    assert_eq!(physics.rig().particles[1].initial_position, Vec2::new(0.0, 3.0));
}

#[test]
fn wind_pushes_the_pendulum() {
    let (ids, mut model, mut physics) = setup(30.0);
    physics.set_options(PhysicsOptions {
        gravity: Vec2::new(0.0, -1.0),
        wind: Vec2::new(2.0, 0.0),
    });
    for _ in 0..60 {
        physics.evaluate(&mut model, 1.0 / 30.0);
    }
    assert!(hair(&ids, &model).abs() > 1e-3);
}

#[test]
fn options_deserialize_from_arrays() {
    let options: PhysicsOptions = serde_json::from_str(r#"{ "wind": [1.0, 0.5] }"#).unwrap();
    assert_eq!(options.wind, Vec2::new(1.0, 0.5));
    assert_eq!(options.gravity, Vec2::new(0.0, -1.0));
}
