//! Utility Module
//!
//! - [`interner`]: interned parameter, part and drawable identifiers
//!
//! # Identifier Interning
//!
//! Ids handed out by one [`IdManager`](interner::IdManager) compare in O(1):
//!
//! ```rust,ignore
//! use cubism::utils::interner::IdManager;
//!
//! let ids = IdManager::new();
//! assert_eq!(ids.id("ParamAngleX"), ids.id("ParamAngleX"));
//! ```

pub mod interner;

pub use interner::{CubismId, IdManager};
