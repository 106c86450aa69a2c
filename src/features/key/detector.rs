//! Key detection algorithm
//!
//! Averages chroma vectors across all frames and picks the pitch class with
//! the most energy. Major and minor are not distinguished.

use super::{compute_key_clarity, KeyDetectionResult};
use crate::analysis::result::PitchClass;
use crate::features::chroma::N_CHROMA;

/// Detect the dominant pitch class from chroma vectors
///
/// Ties resolve to the lowest pitch-class index.
///
/// # Returns
///
/// `None` if there are no frames or the mean chroma is all zero
///
/// # Example
///
/// ```
/// use harmonybot::analysis::result::PitchClass;
/// use harmonybot::features::key::detect_key;
///
/// let mut frame = [0.0f32; 12];
/// frame[7] = 1.0;
/// frame[2] = 0.4;
/// let result = detect_key(&[frame, frame]).unwrap();
/// assert_eq!(result.key, PitchClass::G);
/// ```
pub fn detect_key(chroma_vectors: &[[f32; N_CHROMA]]) -> Option<KeyDetectionResult> {
    log::debug!("Detecting key from {} chroma vectors", chroma_vectors.len());

    if chroma_vectors.is_empty() {
        return None;
    }

    let mut mean_chroma = [0.0f32; N_CHROMA];
    for frame in chroma_vectors {
        for (sum, &value) in mean_chroma.iter_mut().zip(frame.iter()) {
            *sum += value;
        }
    }
    let n = chroma_vectors.len() as f32;
    for value in mean_chroma.iter_mut() {
        *value /= n;
    }

    let mut best = 0;
    for c in 1..N_CHROMA {
        if mean_chroma[c] > mean_chroma[best] {
            best = c;
        }
    }
    if !(mean_chroma[best] > 0.0) {
        log::debug!("Mean chroma is zero, key undetermined");
        return None;
    }

    let key = PitchClass::from_index(best)?;
    let clarity = compute_key_clarity(&mean_chroma);
    log::debug!("Detected key {} (clarity {:.3})", key.name(), clarity);

    Some(KeyDetectionResult {
        key,
        mean_chroma,
        clarity,
    })
}
