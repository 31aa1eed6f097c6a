//! Expression Tests
//!
//! Tests for:
//! - exp3.json decoding (blend modes, fade defaults)
//! - Add / Multiply / Overwrite application
//! - Cross-fading from one expression to the next

use std::sync::Arc;

use cubism::animation::{
    ExpressionBlend, ExpressionMotion, ExpressionMotionManager, ExpressionParameter, MotionBehavior,
};
use cubism::errors::CubismError;
use cubism::model::Model;
use cubism::utils::interner::IdManager;

const EPSILON: f32 = 1e-4;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn model(ids: &IdManager) -> Model {
    let mut model = Model::new(ids.clone());
    model.add_parameter(ids.id("ParamA"), -10.0, 10.0, 0.0).unwrap();
    model.add_parameter(ids.id("ParamB"), -10.0, 10.0, 2.0).unwrap();
    model.save_parameters();
    model
}

fn expression(ids: &IdManager, blend: ExpressionBlend, value: f32, fade: f32) -> Arc<ExpressionMotion> {
    Arc::new(ExpressionMotion::new(
        vec![ExpressionParameter {
            id: ids.id("ParamA"),
            blend,
            value,
        }],
        fade,
        fade,
    ))
}

// ============================================================================
// Decoding
// ============================================================================

#[test]
fn parses_blends_and_default_fades() {
    let ids = IdManager::new();
    let json = br#"{
        "Type": "Live2D Expression",
        "Parameters": [
            { "Id": "ParamA", "Value": 1.5, "Blend": "Multiply" },
            { "Id": "ParamB", "Value": 2 },
            { "Id": "ParamC", "Value": -1, "Blend": "Overwrite" },
            { "Id": "ParamD", "Value": 3, "Blend": "Screen" }
        ]
    }"#;
    let exp = ExpressionMotion::parse(json, &ids).unwrap();

    assert!(approx(exp.fade_in_seconds(), 1.0));
    assert!(approx(exp.fade_out_seconds(), 1.0));

    let blends: Vec<_> = exp.parameters().iter().map(|p| p.blend).collect();
    assert_eq!(
        blends,
        [
            ExpressionBlend::Multiply,
            ExpressionBlend::Add,
            ExpressionBlend::Overwrite,
            ExpressionBlend::Add,
        ]
    );
    assert_eq!(exp.parameters()[2].id, ids.id("ParamC"));
}

#[test]
fn explicit_fades_are_kept() {
    let ids = IdManager::new();
    let json = br#"{ "FadeInTime": 0.25, "FadeOutTime": 0.0, "Parameters": [] }"#;
    let exp = ExpressionMotion::parse(json, &ids).unwrap();
    assert!(approx(exp.fade_in_seconds(), 0.25));
    assert!(approx(exp.fade_out_seconds(), 0.0));
}

#[test]
fn parameter_without_value_is_malformed() {
    let ids = IdManager::new();
    let result = ExpressionMotion::parse(br#"{ "Parameters": [{ "Id": "ParamA" }] }"#, &ids);
    assert!(matches!(result, Err(CubismError::MalformedAsset { .. })));
}

// ============================================================================
// Blending
// ============================================================================

#[test]
fn overwrite_without_fade_sets_value() {
    let ids = IdManager::new();
    let mut model = model(&ids);
    let mut manager = ExpressionMotionManager::new();
    manager.start_expression(expression(&ids, ExpressionBlend::Overwrite, 2.0, 0.0));

    assert!(manager.update_motion(&mut model, 0.1));
    assert!(approx(model.parameter_value_by_id(ids.id("ParamA")), 2.0));
}

#[test]
fn add_is_relative_to_the_frame_base() {
    let ids = IdManager::new();
    let mut model = model(&ids);
    let mut manager = ExpressionMotionManager::new();
    manager.start_expression(expression(&ids, ExpressionBlend::Add, 5.0, 0.0));

    for _ in 0..10 {
        model.load_parameters();
        manager.update_motion(&mut model, 1.0 / 30.0);
    }
    assert!(approx(model.parameter_value_by_id(ids.id("ParamA")), 5.0));
}

#[test]
fn multiply_scales_current_value() {
    let ids = IdManager::new();
    let mut model = model(&ids);
    let mut manager = ExpressionMotionManager::new();
    manager.start_expression(Arc::new(ExpressionMotion::new(
        vec![ExpressionParameter {
            id: ids.id("ParamB"),
            blend: ExpressionBlend::Multiply,
            value: 1.5,
        }],
        0.0,
        0.0,
    )));

    manager.update_motion(&mut model, 0.1);
    assert!(approx(model.parameter_value_by_id(ids.id("ParamB")), 3.0));
}

#[test]
fn empty_manager_applies_nothing() {
    let ids = IdManager::new();
    let mut model = model(&ids);
    let mut manager = ExpressionMotionManager::new();
    assert!(!manager.update_motion(&mut model, 0.1));
    assert!(approx(model.parameter_value_by_id(ids.id("ParamB")), 2.0));
}

// ============================================================================
// Cross-fade
// ============================================================================

#[test]
fn newer_expression_replaces_older() {
    let ids = IdManager::new();
    let mut model = model(&ids);
    let mut manager = ExpressionMotionManager::new();

    manager.start_expression(expression(&ids, ExpressionBlend::Overwrite, 2.0, 0.5));
    for _ in 0..6 {
        model.load_parameters();
        manager.update_motion(&mut model, 0.125);
    }
    assert!(approx(model.parameter_value_by_id(ids.id("ParamA")), 2.0));

    manager.start_expression(expression(&ids, ExpressionBlend::Overwrite, 8.0, 0.5));
    assert_eq!(manager.len(), 2);

    let mut previous = 0.0;
    for _ in 0..12 {
        model.load_parameters();
        manager.update_motion(&mut model, 0.125);
        let newest = manager.fade_weight(manager.len() - 1).unwrap();
        assert!(newest >= previous, "newest weight dropped from {previous} to {newest}");
        previous = newest;
    }

    assert_eq!(manager.len(), 1);
    assert!(approx(previous, 1.0));
    assert!(approx(model.parameter_value_by_id(ids.id("ParamA")), 8.0));
}

#[test]
fn stop_all_clears_expressions() {
    let ids = IdManager::new();
    let mut model = model(&ids);
    let mut manager = ExpressionMotionManager::new();
    manager.start_expression(expression(&ids, ExpressionBlend::Add, 1.0, 0.0));
    manager.update_motion(&mut model, 0.1);
    manager.stop_all_expressions();
    assert!(manager.is_empty());
}
