//! Error Types
//!
//! This module defines the error types used throughout the runtime.
//!
//! # Overview
//!
//! The main error type [`CubismError`] covers every failure mode of the
//! animation pipeline:
//! - Asset decoding errors (JSON, malformed keyframe data)
//! - Asset lookup and I/O errors raised by the loader
//! - Model construction failures
//!
//! Parse failures of optional assets (physics, pose, expressions, motions) are
//! never fatal at runtime: the loader logs them and continues without the
//! asset. Only a missing or invalid primary model surfaces to the caller.
//!
//! # Usage
//!
//! ```rust,ignore
//! use cubism::errors::{CubismError, Result};
//!
//! fn load_motion(bytes: &[u8]) -> Result<()> {
//!     // Operations that may fail return Result
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// The main error type for the runtime.
#[derive(Error, Debug)]
pub enum CubismError {
    // ========================================================================
    // Decoding Errors
    // ========================================================================
    /// The asset bytes are not valid JSON.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// A required key is missing or has the wrong shape.
    #[error("Malformed {asset}: {reason}")]
    MalformedAsset {
        /// Asset kind, e.g. `motion3.json`
        asset: &'static str,
        /// What was wrong
        reason: String,
    },

    /// A motion curve uses a segment code outside the known set.
    #[error("Unknown motion segment type: {0}")]
    UnknownSegmentType(i64),

    // ========================================================================
    // Loading Errors
    // ========================================================================
    /// The requested asset was not found.
    #[error("Asset not found: {0}")]
    AssetNotFound(String),

    /// File I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The primary model could not be created.
    #[error("Invalid model: {0}")]
    InvalidModel(String),
}

impl CubismError {
    pub(crate) fn malformed(asset: &'static str, reason: impl Into<String>) -> Self {
        CubismError::MalformedAsset {
            asset,
            reason: reason.into(),
        }
    }
}

/// Alias for `Result<T, CubismError>`.
pub type Result<T> = std::result::Result<T, CubismError>;
