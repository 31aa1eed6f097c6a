//! Per-frame Orchestrator
//!
//! [`ModelRuntime`] owns a loaded model together with every animator that
//! drives it and applies them in a fixed order each frame:
//!
//! 1. drag follower advances
//! 2. parameters restored from the last snapshot
//! 3. motion queue (or a random idle motion when the queue is empty)
//! 4. parameters snapshotted
//! 5. eye blink, only when no motion wrote this frame
//! 6. expressions
//! 7. drag offsets on head, body and eyeballs
//! 8. breath
//! 9. physics
//! 10. lip sync from the RMS input
//! 11. pose
//! 12. `Model::update`
//!
//! Restoring the snapshot first means motion output never accumulates across
//! frames, while everything after step 4 is layered on top of it fresh.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};

use crate::animation::{
    ExpressionMotion, ExpressionMotionManager, FinishedMotionCallback, MotionBehavior, MotionEventCallback,
    MotionManager, MotionQueueEntryHandle, priority,
};
use crate::assets::loader::{LoadedMotionGroup, ModelAssets};
use crate::assets::settings::ModelSettings;
use crate::assets::user_data::UserData;
use crate::effects::{Breath, EyeBlink, Pose, TargetPoint};
use crate::math::ModelMatrix;
use crate::model::Model;
use crate::physics::Physics;
use crate::runtime::config::RuntimeConfig;
use crate::runtime::framework::Framework;
use crate::runtime::ids;
use crate::utils::interner::{IdManager, ParameterId};

#[derive(Debug, Clone, Copy)]
struct DragParameters {
    angle_x: ParameterId,
    angle_y: ParameterId,
    angle_z: ParameterId,
    body_angle_x: ParameterId,
    eye_ball_x: ParameterId,
    eye_ball_y: ParameterId,
}

impl DragParameters {
    fn new(id_manager: &IdManager) -> Self {
        Self {
            angle_x: id_manager.id(ids::PARAM_ANGLE_X),
            angle_y: id_manager.id(ids::PARAM_ANGLE_Y),
            angle_z: id_manager.id(ids::PARAM_ANGLE_Z),
            body_angle_x: id_manager.id(ids::PARAM_BODY_ANGLE_X),
            eye_ball_x: id_manager.id(ids::PARAM_EYE_BALL_X),
            eye_ball_y: id_manager.id(ids::PARAM_EYE_BALL_Y),
        }
    }
}

/// A model with its animators, updated once per frame.
pub struct ModelRuntime {
    ids: IdManager,
    config: RuntimeConfig,
    settings: ModelSettings,
    model: Model,
    model_matrix: ModelMatrix,

    motion_manager: MotionManager,
    motion_groups: Vec<LoadedMotionGroup>,
    expression_manager: ExpressionMotionManager,
    expressions: Vec<(String, Arc<ExpressionMotion>)>,

    physics: Option<Physics>,
    pose: Option<Pose>,
    eye_blink: Option<EyeBlink>,
    breath: Option<Breath>,
    user_data: Option<UserData>,
    lip_sync_ids: Vec<ParameterId>,

    drag: TargetPoint,
    drag_parameters: DragParameters,
    texture_uris: Vec<String>,
    rng: StdRng,
}

impl std::fmt::Debug for ModelRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelRuntime")
            .field("model", &self.model)
            .field("motion_groups", &self.motion_groups.len())
            .field("expressions", &self.expressions.len())
            .field("physics", &self.physics.is_some())
            .field("pose", &self.pose.is_some())
            .finish_non_exhaustive()
    }
}

impl ModelRuntime {
    #[must_use]
    pub fn new(framework: &Framework, assets: ModelAssets) -> Self {
        let ids = framework.ids().clone();
        let config = framework.config().clone();
        let drag_parameters = DragParameters::new(&ids);
        // Offset from the blink stream so idle choice and blinking differ.
        let rng = StdRng::seed_from_u64(config.random_seed.wrapping_add(1));

        Self {
            ids,
            config,
            settings: assets.settings,
            model: assets.model,
            model_matrix: assets.model_matrix,
            motion_manager: MotionManager::new(),
            motion_groups: assets.motion_groups,
            expression_manager: ExpressionMotionManager::new(),
            expressions: assets.expressions,
            physics: assets.physics,
            pose: assets.pose,
            eye_blink: assets.eye_blink,
            breath: assets.breath,
            user_data: assets.user_data,
            lip_sync_ids: assets.lip_sync_ids,
            drag: TargetPoint::new(),
            drag_parameters,
            texture_uris: assets.texture_uris,
            rng,
        }
    }

    // ========================================================================
    // Frame update
    // ========================================================================

    /// Advances every animator by `delta_seconds`; `rms` is the current voice
    /// level driving lip sync (0 when silent).
    pub fn update(&mut self, delta_seconds: f32, rms: f32) {
        self.drag.update(delta_seconds);

        self.model.load_parameters();
        let mut motion_updated = false;
        if self.motion_manager.is_finished() {
            let group = self.config.idle_motion_group.clone();
            self.start_random_motion(&group, priority::IDLE);
        } else {
            motion_updated = self.motion_manager.update_motion(&mut self.model, delta_seconds);
        }
        self.model.save_parameters();

        if !motion_updated && let Some(eye_blink) = &mut self.eye_blink {
            eye_blink.update_parameters(&mut self.model, delta_seconds);
        }

        self.expression_manager.update_motion(&mut self.model, delta_seconds);

        self.apply_drag();

        if let Some(breath) = &mut self.breath {
            breath.update_parameters(&mut self.model, delta_seconds);
        }

        if let Some(physics) = &mut self.physics {
            physics.evaluate(&mut self.model, delta_seconds);
        }

        for &id in &self.lip_sync_ids {
            self.model.add_parameter_value_by_id(id, rms, self.config.lip_sync_weight);
        }

        if let Some(pose) = &mut self.pose {
            pose.update_parameters(&mut self.model, delta_seconds);
        }

        self.model.update();
    }

    fn apply_drag(&mut self) {
        let (x, y) = (self.drag.x(), self.drag.y());
        let p = self.drag_parameters;
        let angle = self.config.drag.angle_scale;
        let model = &mut self.model;

        model.add_parameter_value_by_id(p.angle_x, x * angle, 1.0);
        model.add_parameter_value_by_id(p.angle_y, y * angle, 1.0);
        model.add_parameter_value_by_id(p.angle_z, x * y * -angle, 1.0);
        model.add_parameter_value_by_id(p.body_angle_x, x * self.config.drag.body_angle_scale, 1.0);
        model.add_parameter_value_by_id(p.eye_ball_x, x, 1.0);
        model.add_parameter_value_by_id(p.eye_ball_y, y, 1.0);
    }

    // ========================================================================
    // Motions
    // ========================================================================

    /// Starts motion `index` of `group`.
    ///
    /// Returns `None` when a motion of equal or higher priority is playing or
    /// reserved, or when the motion does not exist or failed to load.
    /// [`priority::FORCE`] always wins.
    pub fn start_motion(&mut self, group: &str, index: usize, priority: i32) -> Option<MotionQueueEntryHandle> {
        self.start_motion_inner(group, index, priority, None)
    }

    pub fn start_motion_with_callback(
        &mut self,
        group: &str,
        index: usize,
        priority: i32,
        on_finished: FinishedMotionCallback,
    ) -> Option<MotionQueueEntryHandle> {
        self.start_motion_inner(group, index, priority, Some(on_finished))
    }

    fn start_motion_inner(
        &mut self,
        group: &str,
        index: usize,
        priority: i32,
        on_finished: Option<FinishedMotionCallback>,
    ) -> Option<MotionQueueEntryHandle> {
        if priority == priority::FORCE {
            self.motion_manager.set_reserve_priority(priority);
        } else if !self.motion_manager.reserve_motion(priority) {
            log::debug!("Motion {group}[{index}] not started: priority {priority} is not high enough");
            return None;
        }

        let motion = self
            .motion_groups
            .iter()
            .find(|g| g.name == group)
            .and_then(|g| g.motions.get(index))
            .and_then(Option::as_ref);
        let Some(motion) = motion else {
            log::warn!("Motion {group}[{index}] is not available");
            self.motion_manager.set_reserve_priority(priority::NONE);
            return None;
        };

        let motion: Arc<dyn MotionBehavior> = motion.clone();
        log::debug!("Starting motion {group}[{index}] at priority {priority}");
        let handle = match on_finished {
            Some(callback) => self
                .motion_manager
                .start_motion_priority_with_callback(motion, priority, callback),
            None => self.motion_manager.start_motion_priority(motion, priority),
        };
        Some(handle)
    }

    /// Starts a uniformly chosen motion of `group`.
    pub fn start_random_motion(&mut self, group: &str, priority: i32) -> Option<MotionQueueEntryHandle> {
        let count = self.settings.motion_count(group);
        if count == 0 {
            return None;
        }
        let index = self.rng.random_range(0..count);
        self.start_motion(group, index, priority)
    }

    pub fn set_event_callback(&mut self, callback: MotionEventCallback) {
        self.motion_manager.set_event_callback(callback);
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    /// Fades in the expression named `name`. Returns `false` if it is unknown.
    pub fn set_expression(&mut self, name: &str) -> bool {
        match self.expressions.iter().find(|(n, _)| n == name) {
            Some((_, expression)) => {
                log::debug!("Expression '{name}'");
                self.expression_manager.start_expression(Arc::clone(expression));
                true
            }
            None => {
                log::warn!("Expression '{name}' is not loaded");
                false
            }
        }
    }

    pub fn set_random_expression(&mut self) -> bool {
        if self.expressions.is_empty() {
            return false;
        }
        let index = self.rng.random_range(0..self.expressions.len());
        let name = self.expressions[index].0.clone();
        self.set_expression(&name)
    }

    // ========================================================================
    // Interaction
    // ========================================================================

    /// Sets the drag target in `[-1, 1]²` view coordinates.
    pub fn set_dragging(&mut self, x: f32, y: f32) {
        self.drag.set(x, y);
    }

    /// Tests whether the view-space point lies inside the bounding box of the
    /// drawable bound to `hit_area_name`.
    #[must_use]
    pub fn is_hit(&self, hit_area_name: &str, x: f32, y: f32) -> bool {
        let Some(area) = self.settings.hit_area(hit_area_name) else {
            return false;
        };
        let Some(drawable) = self
            .ids
            .get(&area.id)
            .and_then(|id| self.model.find_drawable_index(id))
            .and_then(|index| self.model.drawable(index))
        else {
            return false;
        };

        let vertices = drawable.vertex_positions();
        let Some(&first) = vertices.first() else {
            return false;
        };
        let (min, max) = vertices
            .iter()
            .fold((first, first), |(min, max), &v| (min.min(v), max.max(v)));

        let matrix = self.model_matrix.matrix();
        let tx = matrix.invert_transform_x(x);
        let ty = matrix.invert_transform_y(y);
        min.x <= tx && tx <= max.x && min.y <= ty && ty <= max.y
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[must_use]
    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut Model {
        &mut self.model
    }

    #[must_use]
    pub fn model_matrix(&self) -> &ModelMatrix {
        &self.model_matrix
    }

    pub fn model_matrix_mut(&mut self) -> &mut ModelMatrix {
        &mut self.model_matrix
    }

    #[must_use]
    pub fn settings(&self) -> &ModelSettings {
        &self.settings
    }

    #[must_use]
    pub fn motion_manager(&self) -> &MotionManager {
        &self.motion_manager
    }

    pub fn motion_manager_mut(&mut self) -> &mut MotionManager {
        &mut self.motion_manager
    }

    #[must_use]
    pub fn expression_manager(&self) -> &ExpressionMotionManager {
        &self.expression_manager
    }

    #[must_use]
    pub fn physics(&self) -> Option<&Physics> {
        self.physics.as_ref()
    }

    pub fn physics_mut(&mut self) -> Option<&mut Physics> {
        self.physics.as_mut()
    }

    #[must_use]
    pub fn pose(&self) -> Option<&Pose> {
        self.pose.as_ref()
    }

    #[must_use]
    pub fn eye_blink(&self) -> Option<&EyeBlink> {
        self.eye_blink.as_ref()
    }

    #[must_use]
    pub fn user_data(&self) -> Option<&UserData> {
        self.user_data.as_ref()
    }

    #[must_use]
    pub fn texture_uris(&self) -> &[String] {
        &self.texture_uris
    }

    #[must_use]
    pub fn drag(&self) -> &TargetPoint {
        &self.drag
    }
}
