//! Secondary animators layered over motion output: breathing, blinking,
//! pose switching and drag follow.

pub mod breath;
pub mod eye_blink;
pub mod pose;
pub mod target_point;

pub use breath::{Breath, BreathParameter};
pub use eye_blink::{EyeBlink, EyeState};
pub use pose::{Pose, PosePart};
pub use target_point::TargetPoint;
