//! Asset decoding and loading.
//!
//! - [`json`]: panic-free navigation over decoded JSON
//! - [`io`]: where asset bytes come from
//! - [`settings`] / [`user_data`]: model3.json and userdata3.json
//! - [`loader`]: the ordered load pipeline producing [`ModelAssets`]

pub mod io;
pub mod json;
pub mod loader;
pub mod settings;
pub mod user_data;

pub use io::{AssetReader, FileAssetReader, MemoryAssetReader, resolve_uri};
pub use json::JsonView;
pub use loader::{LoadStep, LoadedMotionGroup, ModelAssets, ModelLoader};
pub use settings::{ExpressionRef, HitArea, ModelSettings, MotionGroup, MotionRef, ParameterGroup};
pub use user_data::{UserData, UserDataNode};
