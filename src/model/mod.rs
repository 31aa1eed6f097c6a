//! Parameter Model
//!
//! The in-memory state of a loaded model: parameter values with their ranges,
//! part opacities and drawables. Every animation subsystem reads and writes
//! this state through indexed accessors; the renderer consumes it after
//! [`Model::update`].

pub mod descriptor;
pub mod drawable;
#[allow(clippy::module_inception)]
pub mod model;

pub use descriptor::{DescriptorMocLoader, DrawableDescriptor, MocLoader, ModelDescriptor, ParameterDescriptor, PartDescriptor};
pub use drawable::{Drawable, DynamicFlags};
pub use model::{CanvasInfo, DrawableDeformer, Model};
