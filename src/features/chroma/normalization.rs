//! Chroma normalization

/// Scale a chroma vector so its largest entry is 1.0
///
/// All-zero (or non-positive) vectors are left unchanged.
pub fn normalize_max(chroma: &mut [f32]) {
    let max = chroma.iter().copied().fold(0.0f32, f32::max);
    if max > 0.0 {
        for value in chroma.iter_mut() {
            *value /= max;
        }
    }
}
