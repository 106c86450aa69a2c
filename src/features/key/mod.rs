//! Key detection modules
//!
//! Detect the dominant pitch class using:
//! - Mean chroma over all frames
//! - Key clarity scoring

pub mod detector;
pub mod key_clarity;

pub use detector::detect_key;
pub use key_clarity::compute_key_clarity;

use crate::analysis::result::PitchClass;
use crate::features::chroma::N_CHROMA;

/// Key detection result
#[derive(Debug, Clone)]
pub struct KeyDetectionResult {
    /// Dominant pitch class
    pub key: PitchClass,

    /// Mean chroma energy per pitch class
    pub mean_chroma: [f32; N_CHROMA],

    /// Key clarity (0.0-1.0), how far the winner stands above the runner-up
    pub clarity: f32,
}
