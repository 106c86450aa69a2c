//! Key clarity scoring
//!
//! Estimates how clearly one pitch class dominates the mean chroma.

use crate::features::chroma::N_CHROMA;

/// Compute key clarity from the mean chroma vector
///
/// # Returns
///
/// `(best - second_best) / best` in [0.0, 1.0]; 0.0 for an all-zero vector.
/// Higher means a single pitch class stands out.
pub fn compute_key_clarity(mean_chroma: &[f32; N_CHROMA]) -> f32 {
    let mut best = 0.0f32;
    let mut second = 0.0f32;
    for &value in mean_chroma {
        if value > best {
            second = best;
            best = value;
        } else if value > second {
            second = value;
        }
    }
    if best <= 0.0 {
        return 0.0;
    }
    ((best - second) / best).clamp(0.0, 1.0)
}
