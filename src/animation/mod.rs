pub mod clip;
pub mod curve;
pub mod entry;
pub mod expression;
pub mod manager;
pub mod motion;
pub mod queue;

pub use clip::{MotionData, MotionEvent};
pub use curve::{CurveTarget, MotionCurve, MotionPoint, MotionSegment, SegmentType};
pub use entry::{FinishedMotionCallback, MotionQueueEntry, MotionQueueEntryHandle, MotionState};
pub use expression::{ExpressionBlend, ExpressionMotion, ExpressionMotionManager, ExpressionParameter};
pub use manager::{MotionManager, priority};
pub use motion::{Motion, MotionBehavior};
pub use queue::{MotionEventCallback, MotionQueueManager};
