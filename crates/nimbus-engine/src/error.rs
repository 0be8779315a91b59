//! Error types for scene construction.

use nimbus_fonts::FontError;
use thiserror::Error;

/// Errors raised while building a scene.
///
/// Stepping a built scene never fails; every fallible check happens once,
/// before the first frame.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Text cannot be drawn with the block font.
    #[error("font error: {0}")]
    Font(#[from] FontError),

    /// A parameter range is empty, inverted or not finite.
    #[error("invalid range for {name}: [{min}, {max}]")]
    InvalidRange {
        name: &'static str,
        min: f32,
        max: f32,
    },

    /// Cloud jitter distribution could not be built.
    #[error("invalid cloud distribution: {0}")]
    Distribution(#[from] rand_distr::NormalError),

    /// A scene setting is outside its accepted range.
    #[error("invalid scene configuration: {0}")]
    Config(&'static str),
}

pub type Result<T> = std::result::Result<T, EngineError>;
