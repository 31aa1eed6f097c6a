//! Model loading pipeline.
//!
//! [`ModelLoader`] walks the assets referenced by a model3.json in a fixed
//! order, one [`LoadStep`] at a time. Every step after the moc is optional: a
//! missing or undecodable file is logged and the model is set up without it.
//!
//! ```rust,ignore
//! let framework = Framework::default();
//! let reader = FileAssetReader::new("assets/hiyori");
//! let mut loader = ModelLoader::new(&framework, &reader, &DescriptorMocLoader);
//! let assets = pollster::block_on(loader.load("hiyori.model3.json"))?;
//! let runtime = ModelRuntime::new(&framework, assets);
//! ```

use std::sync::Arc;

use crate::animation::{ExpressionMotion, Motion};
use crate::assets::io::{AssetReader, resolve_uri};
use crate::assets::settings::ModelSettings;
use crate::assets::user_data::UserData;
use crate::effects::{Breath, EyeBlink, Pose};
use crate::errors::{CubismError, Result};
use crate::math::ModelMatrix;
use crate::model::{MocLoader, Model};
use crate::physics::Physics;
use crate::runtime::Framework;
use crate::utils::interner::ParameterId;

// ============================================================================
// Load steps
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadStep {
    LoadSettings,
    LoadModel,
    LoadExpressions,
    LoadPhysics,
    LoadPose,
    SetupEyeBlink,
    SetupBreath,
    LoadUserData,
    SetupLipSync,
    SetupLayout,
    LoadMotions,
    LoadTextures,
    Completed,
}

impl LoadStep {
    /// Every step in execution order.
    pub const SEQUENCE: [LoadStep; 13] = [
        LoadStep::LoadSettings,
        LoadStep::LoadModel,
        LoadStep::LoadExpressions,
        LoadStep::LoadPhysics,
        LoadStep::LoadPose,
        LoadStep::SetupEyeBlink,
        LoadStep::SetupBreath,
        LoadStep::LoadUserData,
        LoadStep::SetupLipSync,
        LoadStep::SetupLayout,
        LoadStep::LoadMotions,
        LoadStep::LoadTextures,
        LoadStep::Completed,
    ];

    #[must_use]
    pub fn next(self) -> Option<LoadStep> {
        let pos = Self::SEQUENCE.iter().position(|s| *s == self)?;
        Self::SEQUENCE.get(pos + 1).copied()
    }
}

// ============================================================================
// Loader output
// ============================================================================

/// Motions of one settings group. Entries that failed to load stay `None` so
/// indices keep matching the settings file.
#[derive(Debug, Clone)]
pub struct LoadedMotionGroup {
    pub name: String,
    pub motions: Vec<Option<Arc<Motion>>>,
}

/// Everything a [`ModelRuntime`](crate::runtime::ModelRuntime) is built from.
#[derive(Debug)]
pub struct ModelAssets {
    pub settings: ModelSettings,
    pub model: Model,
    pub expressions: Vec<(String, Arc<ExpressionMotion>)>,
    pub physics: Option<Physics>,
    pub pose: Option<Pose>,
    pub eye_blink: Option<EyeBlink>,
    pub breath: Option<Breath>,
    pub user_data: Option<UserData>,
    pub lip_sync_ids: Vec<ParameterId>,
    pub model_matrix: ModelMatrix,
    pub motion_groups: Vec<LoadedMotionGroup>,
    /// Resolved texture uris; decoding them is up to the renderer.
    pub texture_uris: Vec<String>,
}

// ============================================================================
// ModelLoader
// ============================================================================

pub struct ModelLoader<'a, R: AssetReader, M: MocLoader> {
    framework: &'a Framework,
    reader: &'a R,
    moc_loader: &'a M,
    step: LoadStep,
    history: Vec<LoadStep>,
}

impl<'a, R: AssetReader, M: MocLoader> ModelLoader<'a, R, M> {
    pub fn new(framework: &'a Framework, reader: &'a R, moc_loader: &'a M) -> Self {
        Self {
            framework,
            reader,
            moc_loader,
            step: LoadStep::LoadSettings,
            history: Vec::new(),
        }
    }

    /// The step currently running, or the last one reached.
    #[must_use]
    pub fn step(&self) -> LoadStep {
        self.step
    }

    /// Steps entered so far, in order.
    #[must_use]
    pub fn history(&self) -> &[LoadStep] {
        &self.history
    }

    fn enter(&mut self, step: LoadStep) {
        log::debug!("Model load step: {step:?}");
        self.step = step;
        self.history.push(step);
    }

    /// Reads `bytes` for an optional asset, logging instead of failing.
    async fn read_optional(&self, kind: &str, uri: &str) -> Option<Vec<u8>> {
        match self.reader.read_bytes(uri).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                log::warn!("Skipping {kind} '{uri}': {e}");
                None
            }
        }
    }

    fn decoded<T>(kind: &str, uri: &str, result: Result<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("Skipping {kind} '{uri}': {e}");
                None
            }
        }
    }

    /// Loads the model described by the settings file at `settings_uri`.
    ///
    /// Fails only when the settings file or the moc cannot be read or decoded.
    pub async fn load(&mut self, settings_uri: &str) -> Result<ModelAssets> {
        let ids = self.framework.ids().clone();
        let config = self.framework.config().clone();
        self.history.clear();

        self.enter(LoadStep::LoadSettings);
        let settings = ModelSettings::parse(&self.reader.read_bytes(settings_uri).await?)?;
        let uri = |relative: &str| resolve_uri(settings_uri, relative);

        self.enter(LoadStep::LoadModel);
        if settings.moc.is_empty() {
            return Err(CubismError::InvalidModel("FileReferences.Moc is empty".to_owned()));
        }
        let moc_uri = uri(&settings.moc);
        let moc = match self.reader.read_bytes(&moc_uri).await {
            Ok(bytes) => bytes,
            Err(CubismError::AssetNotFound(path)) => {
                return Err(CubismError::InvalidModel(format!("moc not found: {path}")));
            }
            Err(e) => return Err(e),
        };
        let mut model = self.moc_loader.load_model(&moc, &ids)?;

        self.enter(LoadStep::LoadExpressions);
        let mut expressions = Vec::with_capacity(settings.expressions.len());
        for expression in &settings.expressions {
            let path = uri(&expression.file);
            let Some(bytes) = self.read_optional("expression", &path).await else {
                continue;
            };
            if let Some(motion) = Self::decoded("expression", &path, ExpressionMotion::parse(&bytes, &ids)) {
                expressions.push((expression.name.clone(), Arc::new(motion)));
            }
        }

        self.enter(LoadStep::LoadPhysics);
        let mut physics = None;
        if let Some(file) = &settings.physics {
            let path = uri(file);
            if let Some(bytes) = self.read_optional("physics", &path).await {
                physics = Self::decoded("physics", &path, Physics::parse(&bytes, &ids));
            }
        }
        if let Some(physics) = &mut physics {
            physics.set_options(config.physics);
        }

        self.enter(LoadStep::LoadPose);
        let mut pose = None;
        if let Some(file) = &settings.pose {
            let path = uri(file);
            if let Some(bytes) = self.read_optional("pose", &path).await {
                pose = Self::decoded("pose", &path, Pose::parse(&bytes, &ids));
            }
        }
        if let Some(pose) = &mut pose {
            pose.reset(&mut model);
        }

        self.enter(LoadStep::SetupEyeBlink);
        let eye_blink_ids: Vec<ParameterId> = settings.eye_blink_parameter_ids().iter().map(|id| ids.id(id)).collect();
        let eye_blink = (!eye_blink_ids.is_empty()).then(|| {
            let c = config.eye_blink;
            let mut blink = EyeBlink::new(eye_blink_ids.clone(), config.random_seed);
            blink.set_blinking_interval(c.interval_seconds);
            blink.set_blinking_settings(c.closing_seconds, c.closed_seconds, c.opening_seconds);
            blink.set_close_if_zero(c.close_if_zero);
            blink
        });

        self.enter(LoadStep::SetupBreath);
        let breath = config.use_breath.then(|| Breath::with_default_parameters(&ids));

        self.enter(LoadStep::LoadUserData);
        let mut user_data = None;
        if let Some(file) = &settings.user_data {
            let path = uri(file);
            if let Some(bytes) = self.read_optional("user data", &path).await {
                user_data = Self::decoded("user data", &path, UserData::parse(&bytes, &ids));
            }
        }

        self.enter(LoadStep::SetupLipSync);
        let lip_sync_ids: Vec<ParameterId> = settings.lip_sync_parameter_ids().iter().map(|id| ids.id(id)).collect();

        self.enter(LoadStep::SetupLayout);
        let mut model_matrix = ModelMatrix::new(model.canvas_width(), model.canvas_height());
        model_matrix.setup_from_layout(settings.layout_entries());

        self.enter(LoadStep::LoadMotions);
        let mut motion_groups = Vec::with_capacity(settings.motion_groups.len());
        for group in &settings.motion_groups {
            let mut motions = Vec::with_capacity(group.motions.len());
            for motion_ref in &group.motions {
                let path = uri(&motion_ref.file);
                let mut motion = match self.read_optional("motion", &path).await {
                    Some(bytes) => Self::decoded("motion", &path, Motion::parse(&bytes, &ids)),
                    None => None,
                };
                if let Some(motion) = &mut motion {
                    if let Some(seconds) = motion_ref.fade_in_time.filter(|s| *s >= 0.0) {
                        motion.set_fade_in_seconds(seconds);
                    }
                    if let Some(seconds) = motion_ref.fade_out_time.filter(|s| *s >= 0.0) {
                        motion.set_fade_out_seconds(seconds);
                    }
                    motion.set_effect_ids(eye_blink_ids.clone(), lip_sync_ids.clone());
                }
                motions.push(motion.map(Arc::new));
            }
            log::debug!(
                "Motion group '{}': {}/{} loaded",
                group.name,
                motions.iter().filter(|m| m.is_some()).count(),
                motions.len()
            );
            motion_groups.push(LoadedMotionGroup {
                name: group.name.clone(),
                motions,
            });
        }

        self.enter(LoadStep::LoadTextures);
        let texture_uris = settings.textures.iter().map(|t| uri(t)).collect();

        self.enter(LoadStep::Completed);
        model.save_parameters();

        Ok(ModelAssets {
            settings,
            model,
            expressions,
            physics,
            pose,
            eye_blink,
            breath,
            user_data,
            lip_sync_ids,
            model_matrix,
            motion_groups,
            texture_uris,
        })
    }
}
