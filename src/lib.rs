#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod animation;
pub mod assets;
pub mod effects;
pub mod errors;
pub mod math;
pub mod model;
pub mod physics;
pub mod runtime;
pub mod utils;

pub use animation::{
    ExpressionMotion, ExpressionMotionManager, Motion, MotionBehavior, MotionData, MotionManager,
    MotionQueueEntryHandle, MotionQueueManager, priority,
};
pub use assets::{AssetReader, FileAssetReader, MemoryAssetReader, ModelAssets, ModelLoader, ModelSettings};
pub use effects::{Breath, EyeBlink, Pose, TargetPoint};
pub use errors::{CubismError, Result};
pub use math::{Matrix44, ModelMatrix};
pub use model::{DescriptorMocLoader, MocLoader, Model, ModelDescriptor};
pub use physics::{Physics, PhysicsOptions};
pub use runtime::{Framework, ModelRuntime, RuntimeConfig};
pub use utils::interner::{CubismId, IdManager};
