//! Runtime
//!
//! The explicit [`Framework`] context, its [`RuntimeConfig`], standard
//! parameter names and the per-frame [`ModelRuntime`].

pub mod config;
pub mod framework;
pub mod ids;
pub mod model_runtime;

pub use config::{DragConfig, EyeBlinkConfig, RuntimeConfig};
pub use framework::Framework;
pub use model_runtime::ModelRuntime;
