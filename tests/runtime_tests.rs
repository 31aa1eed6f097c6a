//! Runtime Tests
//!
//! Tests for:
//! - ModelLoader step order and optional-asset tolerance
//! - Idle motion auto-start and priority gating through ModelRuntime
//! - Lip sync, expressions and drag in the per-frame update
//! - Per-frame stage order on shared parameters
//! - Hit testing through the model matrix

use cubism::animation::priority;
use cubism::assets::{LoadStep, MemoryAssetReader, ModelLoader};
use cubism::errors::CubismError;
use cubism::model::DescriptorMocLoader;
use cubism::runtime::{Framework, ModelRuntime, RuntimeConfig};

const EPSILON: f32 = 1e-4;
const DT: f32 = 1.0 / 32.0;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

const SETTINGS: &str = r#"{
    "Version": 3,
    "FileReferences": {
        "Moc": "test.moc3.json",
        "Textures": ["tex/00.png"],
        "Physics": "test.physics3.json",
        "Expressions": [{ "Name": "smile", "File": "exp/smile.exp3.json" }],
        "Motions": {
            "Idle": [{ "File": "motion/idle.motion3.json" }],
            "TapBody": [
                { "File": "motion/tap.motion3.json", "FadeInTime": 0.0 },
                { "File": "motion/missing.motion3.json" }
            ]
        }
    },
    "Groups": [
        { "Target": "Parameter", "Name": "EyeBlink", "Ids": ["ParamEyeLOpen"] },
        { "Target": "Parameter", "Name": "LipSync", "Ids": ["ParamMouthOpenY"] }
    ],
    "HitAreas": [{ "Id": "HitAreaBody", "Name": "Body" }]
}"#;

const MOC: &str = r#"{
    "Parameters": [
        { "Id": "ParamAngleX", "Min": -30, "Max": 30, "Default": 0 },
        { "Id": "ParamAngleY", "Min": -30, "Max": 30, "Default": 0 },
        { "Id": "ParamAngleZ", "Min": -30, "Max": 30, "Default": 0 },
        { "Id": "ParamBodyAngleX", "Min": -10, "Max": 10, "Default": 0 },
        { "Id": "ParamEyeBallX", "Min": -1, "Max": 1, "Default": 0 },
        { "Id": "ParamEyeBallY", "Min": -1, "Max": 1, "Default": 0 },
        { "Id": "ParamEyeLOpen", "Min": 0, "Max": 1, "Default": 1 },
        { "Id": "ParamMouthOpenY", "Min": 0, "Max": 1, "Default": 0 },
        { "Id": "ParamCheek", "Min": 0, "Max": 1, "Default": 0 },
        { "Id": "ParamSmile", "Min": 0, "Max": 1, "Default": 0 },
        { "Id": "ParamHairFront", "Min": -1, "Max": 1, "Default": 0 }
    ],
    "Parts": [{ "Id": "PartBody" }, { "Id": "PartArmA" }, { "Id": "PartArmB" }, { "Id": "PartHandA" }],
    "Drawables": [
        {
            "Id": "HitAreaBody",
            "Vertices": [[-0.25, -0.25], [0.25, -0.25], [0.25, 0.25], [-0.25, 0.25]],
            "ParentPart": "PartBody"
        }
    ]
}"#;

fn constant_motion(id: &str, value: f32, duration: f32) -> String {
    format!(
        r#"{{
            "Version": 3,
            "Meta": {{ "Duration": {duration}, "Fps": 30.0, "FadeInTime": 0.0, "FadeOutTime": 0.0 }},
            "Curves": [{{ "Target": "Parameter", "Id": "{id}", "Segments": [0, {value}, 0, {duration}, {value}] }}]
        }}"#
    )
}

fn reader() -> MemoryAssetReader {
    MemoryAssetReader::new()
        .with("model/test.model3.json", SETTINGS)
        .with("model/test.moc3.json", MOC)
        .with(
            "model/exp/smile.exp3.json",
            r#"{ "FadeInTime": 0, "FadeOutTime": 0, "Parameters": [{ "Id": "ParamSmile", "Value": 1, "Blend": "Overwrite" }] }"#,
        )
        .with("model/motion/idle.motion3.json", constant_motion("ParamCheek", 0.5, 1.0))
        .with("model/motion/tap.motion3.json", constant_motion("ParamCheek", 1.0, 0.5))
}

fn quiet_config() -> RuntimeConfig {
    RuntimeConfig {
        use_breath: false,
        random_seed: 11,
        ..Default::default()
    }
}

fn load_runtime(config: RuntimeConfig) -> anyhow::Result<ModelRuntime> {
    init_logger();
    let framework = Framework::new(config);
    let reader = reader();
    let mut loader = ModelLoader::new(&framework, &reader, &DescriptorMocLoader);
    let assets = pollster::block_on(loader.load("model/test.model3.json"))?;
    Ok(ModelRuntime::new(&framework, assets))
}

fn value(runtime: &ModelRuntime, name: &str) -> f32 {
    let id = runtime.model().ids().id(name);
    runtime.model().parameter_value_by_id(id)
}

// ============================================================================
// Loading
// ============================================================================

#[test]
fn loader_visits_every_step() -> anyhow::Result<()> {
    init_logger();
    let framework = Framework::new(quiet_config());
    let reader = reader();
    let mut loader = ModelLoader::new(&framework, &reader, &DescriptorMocLoader);
    let assets = pollster::block_on(loader.load("model/test.model3.json"))?;

    assert_eq!(loader.history(), LoadStep::SEQUENCE);
    assert_eq!(loader.step(), LoadStep::Completed);

    // The physics file is referenced but absent.
    assert!(assets.physics.is_none());
    assert!(assets.pose.is_none());
    assert!(assets.breath.is_none());
    assert!(assets.eye_blink.is_some());
    assert_eq!(assets.expressions.len(), 1);
    assert_eq!(assets.texture_uris, ["model/tex/00.png"]);
    assert_eq!(assets.lip_sync_ids.len(), 1);

    let tap = &assets.motion_groups[1];
    assert_eq!(tap.name, "TapBody");
    assert!(tap.motions[0].is_some());
    assert!(tap.motions[1].is_none());
    Ok(())
}

#[test]
fn missing_moc_is_an_invalid_model() {
    init_logger();
    let framework = Framework::new(quiet_config());
    let reader = MemoryAssetReader::new().with("model/test.model3.json", SETTINGS);
    let mut loader = ModelLoader::new(&framework, &reader, &DescriptorMocLoader);
    let result = pollster::block_on(loader.load("model/test.model3.json"));

    assert!(matches!(result, Err(CubismError::InvalidModel(_))));
    assert_eq!(loader.step(), LoadStep::LoadModel);
}

#[test]
fn missing_settings_is_not_found() {
    init_logger();
    let framework = Framework::new(quiet_config());
    let reader = MemoryAssetReader::new();
    let mut loader = ModelLoader::new(&framework, &reader, &DescriptorMocLoader);
    let result = pollster::block_on(loader.load("nowhere.model3.json"));
    assert!(matches!(result, Err(CubismError::AssetNotFound(_))));
}

#[test]
fn broken_moc_is_an_invalid_model() {
    init_logger();
    let framework = Framework::new(quiet_config());
    let reader = reader().with("model/test.moc3.json", "not a moc");
    let mut loader = ModelLoader::new(&framework, &reader, &DescriptorMocLoader);
    let result = pollster::block_on(loader.load("model/test.model3.json"));
    assert!(matches!(result, Err(CubismError::InvalidModel(_))));
}

// ============================================================================
// Motions
// ============================================================================

#[test]
fn idle_motion_starts_when_queue_is_empty() -> anyhow::Result<()> {
    let mut runtime = load_runtime(quiet_config())?;
    assert!(runtime.motion_manager().is_finished());

    runtime.update(DT, 0.0);
    assert!(!runtime.motion_manager().is_finished());
    assert_eq!(runtime.motion_manager().current_priority(), priority::IDLE);

    runtime.update(DT, 0.0);
    assert!(approx(value(&runtime, "ParamCheek"), 0.5));
    Ok(())
}

#[test]
fn higher_priority_motion_preempts_idle() -> anyhow::Result<()> {
    let mut runtime = load_runtime(quiet_config())?;
    runtime.update(DT, 0.0);

    assert!(runtime.start_motion("TapBody", 0, priority::NORMAL).is_some());
    assert!(runtime.start_motion("TapBody", 0, priority::NORMAL).is_none());
    assert!(runtime.start_motion("TapBody", 0, priority::FORCE).is_some());

    runtime.update(DT, 0.0);
    runtime.update(DT, 0.0);
    assert!(approx(value(&runtime, "ParamCheek"), 1.0));
    Ok(())
}

#[test]
fn unavailable_motion_releases_reservation() -> anyhow::Result<()> {
    let mut runtime = load_runtime(quiet_config())?;
    assert!(runtime.start_motion("TapBody", 1, priority::NORMAL).is_none());
    assert!(runtime.start_motion("Nope", 0, priority::NORMAL).is_none());
    assert_eq!(runtime.motion_manager().reserve_priority(), priority::NONE);
    Ok(())
}

// ============================================================================
// Frame layers
// ============================================================================

#[test]
fn lip_sync_adds_weighted_rms_each_frame() -> anyhow::Result<()> {
    let mut runtime = load_runtime(quiet_config())?;
    for _ in 0..3 {
        runtime.update(DT, 0.5);
        // Restored from the snapshot every frame, so it does not accumulate.
        assert!(approx(value(&runtime, "ParamMouthOpenY"), 0.4));
    }
    Ok(())
}

#[test]
fn expressions_are_selected_by_name() -> anyhow::Result<()> {
    let mut runtime = load_runtime(quiet_config())?;
    assert!(!runtime.set_expression("angry"));
    assert!(runtime.set_expression("smile"));

    runtime.update(DT, 0.0);
    assert!(approx(value(&runtime, "ParamSmile"), 1.0));
    assert_eq!(runtime.expression_manager().len(), 1);
    Ok(())
}

#[test]
fn drag_turns_the_head() -> anyhow::Result<()> {
    let mut runtime = load_runtime(quiet_config())?;
    runtime.set_dragging(1.0, 0.0);
    for _ in 0..200 {
        runtime.update(DT, 0.0);
    }

    let drag_x = runtime.drag().x();
    assert!(drag_x > 0.95, "drag follower at {drag_x}");
    assert!(approx(value(&runtime, "ParamAngleX"), drag_x * 30.0));
    assert!(approx(value(&runtime, "ParamBodyAngleX"), drag_x * 10.0));
    assert!(approx(value(&runtime, "ParamEyeBallX"), drag_x));
    Ok(())
}

#[test]
fn breath_moves_standard_parameters() -> anyhow::Result<()> {
    let mut runtime = load_runtime(RuntimeConfig {
        use_breath: true,
        ..quiet_config()
    })?;
    for _ in 0..16 {
        runtime.update(DT, 0.0);
    }
    assert!(value(&runtime, "ParamAngleX").abs() > 1e-3);
    Ok(())
}

// ============================================================================
// Stage order
// ============================================================================

const STAGED_SETTINGS: &str = r#"{
    "Version": 3,
    "FileReferences": {
        "Moc": "test.moc3.json",
        "Physics": "staged.physics3.json",
        "Pose": "staged.pose3.json",
        "Expressions": [{ "Name": "mouth", "File": "exp/mouth.exp3.json" }],
        "Motions": { "Idle": [{ "File": "motion/staged.motion3.json" }] }
    },
    "Groups": [
        { "Target": "Parameter", "Name": "EyeBlink", "Ids": ["ParamEyeLOpen"] },
        { "Target": "Parameter", "Name": "LipSync", "Ids": ["ParamMouthOpenY"] }
    ]
}"#;

const STAGED_PHYSICS: &str = r#"{
    "Version": 3,
    "Meta": { "Fps": 30, "EffectiveForces": { "Gravity": { "X": 0, "Y": -1 }, "Wind": { "X": 0, "Y": 0 } } },
    "PhysicsSettings": [{
        "Id": "PhysicsSetting1",
        "Input": [{ "Source": { "Target": "Parameter", "Id": "ParamAngleX" }, "Weight": 100, "Type": "X", "Reflect": false }],
        "Output": [{
            "Destination": { "Target": "Parameter", "Id": "ParamHairFront" },
            "VertexIndex": 1, "Scale": 1, "Weight": 100, "Type": "Angle", "Reflect": false
        }],
        "Vertices": [
            { "Position": { "X": 0, "Y": 0 }, "Mobility": 1, "Delay": 1, "Acceleration": 1, "Radius": 0 },
            { "Position": { "X": 0, "Y": 3 }, "Mobility": 0.95, "Delay": 0.9, "Acceleration": 1.5, "Radius": 3 }
        ],
        "Normalization": {
            "Position": { "Minimum": -10, "Default": 0, "Maximum": 10 },
            "Angle": { "Minimum": -10, "Default": 0, "Maximum": 10 }
        }
    }]
}"#;

const STAGED_POSE: &str = r#"{
    "Type": "Live2D Pose",
    "FadeInTime": 0.5,
    "Groups": [[
        { "Id": "PartArmA", "Link": ["PartHandA"] },
        { "Id": "PartArmB", "Link": [] }
    ]]
}"#;

const POSE_FADE_SECONDS: f32 = 0.5;

/// Idle motion holding the eye at 0.3, the hair at `hair` and switching the
/// arm pose from A to B.
fn staged_motion(hair: f32) -> String {
    format!(
        r#"{{
            "Version": 3,
            "Meta": {{ "Duration": 4.0, "Fps": 30.0, "FadeInTime": 0.0, "FadeOutTime": 0.0 }},
            "Curves": [
                {{ "Target": "Parameter", "Id": "ParamEyeLOpen", "Segments": [0, 0.3, 0, 4, 0.3] }},
                {{ "Target": "Parameter", "Id": "ParamHairFront", "Segments": [0, {hair}, 0, 4, {hair}] }},
                {{ "Target": "PartOpacity", "Id": "PartArmA", "Segments": [0, 0, 0, 4, 0] }},
                {{ "Target": "PartOpacity", "Id": "PartArmB", "Segments": [0, 1, 0, 4, 1] }}
            ]
        }}"#
    )
}

fn load_staged_runtime(hair: f32) -> anyhow::Result<ModelRuntime> {
    init_logger();
    let framework = Framework::new(quiet_config());
    let reader = reader()
        .with("model/test.model3.json", STAGED_SETTINGS)
        .with("model/staged.physics3.json", STAGED_PHYSICS)
        .with("model/staged.pose3.json", STAGED_POSE)
        .with(
            "model/exp/mouth.exp3.json",
            r#"{ "FadeInTime": 0, "FadeOutTime": 0, "Parameters": [{ "Id": "ParamMouthOpenY", "Value": 0.2, "Blend": "Overwrite" }] }"#,
        )
        .with("model/motion/staged.motion3.json", staged_motion(hair));
    let mut loader = ModelLoader::new(&framework, &reader, &DescriptorMocLoader);
    let assets = pollster::block_on(loader.load("model/test.model3.json"))?;
    assert!(assets.physics.is_some() && assets.pose.is_some());
    Ok(ModelRuntime::new(&framework, assets))
}

fn part_opacity(runtime: &ModelRuntime, name: &str) -> f32 {
    let id = runtime.model().ids().id(name);
    runtime.model().part_opacity_by_id(id)
}

#[test]
fn eye_blink_yields_to_an_updating_motion() -> anyhow::Result<()> {
    let mut runtime = load_staged_runtime(0.0)?;

    // First frame only starts the idle motion, so the blink owns the eye.
    runtime.update(DT, 0.0);
    assert!(approx(value(&runtime, "ParamEyeLOpen"), 1.0));

    for _ in 0..4 {
        runtime.update(DT, 0.0);
        assert!(approx(value(&runtime, "ParamEyeLOpen"), 0.3));
    }
    Ok(())
}

#[test]
fn physics_output_replaces_motion_value() -> anyhow::Result<()> {
    let mut up = load_staged_runtime(0.9)?;
    let mut down = load_staged_runtime(-0.9)?;

    for _ in 0..12 {
        up.update(DT, 0.0);
        down.update(DT, 0.0);
        let (a, b) = (value(&up, "ParamHairFront"), value(&down, "ParamHairFront"));
        assert!(approx(a, b), "motion leaked through physics: {a} vs {b}");
        assert!((a - 0.9).abs() > 1e-3);
    }
    Ok(())
}

#[test]
fn lip_sync_adds_on_top_of_expressions() -> anyhow::Result<()> {
    let mut runtime = load_staged_runtime(0.0)?;
    assert!(runtime.set_expression("mouth"));

    runtime.update(DT, 0.0);
    assert!(approx(value(&runtime, "ParamMouthOpenY"), 0.2));

    // Overwrite by the expression, then 0.5 * 0.8 from the voice.
    runtime.update(DT, 0.5);
    assert!(approx(value(&runtime, "ParamMouthOpenY"), 0.6));
    Ok(())
}

#[test]
fn pose_follows_part_curves_of_the_same_frame() -> anyhow::Result<()> {
    let mut runtime = load_staged_runtime(0.0)?;

    runtime.update(DT, 0.0);
    assert!(approx(part_opacity(&runtime, "PartArmA"), 1.0));
    assert!(approx(part_opacity(&runtime, "PartArmB"), 0.0));

    // The curves switch to B on this frame and the pose starts fading it in.
    runtime.update(DT, 0.0);
    assert!(approx(part_opacity(&runtime, "PartArmB"), DT / POSE_FADE_SECONDS));
    assert!(part_opacity(&runtime, "PartArmA") < 1.0);

    for _ in 0..24 {
        runtime.update(DT, 0.0);
    }
    assert!(approx(part_opacity(&runtime, "PartArmB"), 1.0));
    assert!(approx(part_opacity(&runtime, "PartArmA"), 0.0));
    assert!(approx(part_opacity(&runtime, "PartHandA"), 0.0));
    Ok(())
}

// ============================================================================
// Hit testing
// ============================================================================

#[test]
fn hit_test_uses_drawable_bounds() -> anyhow::Result<()> {
    let runtime = load_runtime(quiet_config())?;

    // The 1x1 canvas is scaled to a view height of 2.
    assert!(runtime.is_hit("Body", 0.2, 0.2));
    assert!(!runtime.is_hit("Body", 0.8, 0.8));
    assert!(!runtime.is_hit("Head", 0.0, 0.0));
    Ok(())
}
