//! Sample conversion, non-finite scrubbing and peak normalization
//!
//! # Example
//!
//! ```
//! use harmonybot::preprocessing::normalization::{normalize_peak, scrub_non_finite};
//!
//! let mut samples = vec![0.25f32, f32::NAN, -0.5, f32::INFINITY];
//! scrub_non_finite(&mut samples);
//! assert_eq!(samples, vec![0.25, 0.0, -0.5, 1.0]);
//!
//! let peak = normalize_peak(&mut samples);
//! assert_eq!(peak, 1.0);
//! ```

use crate::io::sample_buffer::Samples;

/// Replace NaN with 0, +Inf with 1 and -Inf with -1
pub fn scrub_non_finite(samples: &mut [f32]) {
    for sample in samples.iter_mut() {
        *sample = scrub(*sample);
    }
}

#[inline]
fn scrub(x: f32) -> f32 {
    if x.is_nan() {
        0.0
    } else if x == f32::INFINITY {
        1.0
    } else if x == f32::NEG_INFINITY {
        -1.0
    } else {
        x
    }
}

#[inline]
fn scrub_f64(x: f64) -> f64 {
    if x.is_nan() {
        0.0
    } else if x == f64::INFINITY {
        1.0
    } else if x == f64::NEG_INFINITY {
        -1.0
    } else {
        x
    }
}

/// Convert raw samples of any dtype to f32
///
/// f32 input is taken as already normalized and copied as-is. Every other
/// dtype is divided by its own peak absolute value; an all-zero input stays
/// all zero.
pub fn to_f32(samples: &Samples) -> Vec<f32> {
    match samples {
        Samples::F32(v) => v.clone(),
        Samples::F64(v) => {
            let cleaned: Vec<f64> = v.iter().map(|&x| scrub_f64(x)).collect();
            let peak = cleaned.iter().map(|x| x.abs()).fold(0.0f64, f64::max);
            rescale(&cleaned, peak, |x| x)
        }
        Samples::I16(v) => {
            let peak = v.iter().map(|&x| (x as f64).abs()).fold(0.0f64, f64::max);
            rescale(v, peak, |x| x as f64)
        }
        Samples::I32(v) => {
            let peak = v.iter().map(|&x| (x as f64).abs()).fold(0.0f64, f64::max);
            rescale(v, peak, |x| x as f64)
        }
    }
}

fn rescale<T: Copy>(values: &[T], peak: f64, widen: impl Fn(T) -> f64) -> Vec<f32> {
    if peak == 0.0 {
        return vec![0.0; values.len()];
    }
    values.iter().map(|&x| (widen(x) / peak) as f32).collect()
}

/// Scale samples so the peak absolute amplitude is exactly 1.0
///
/// Returns the peak measured before scaling. A silent buffer (peak 0) is left
/// untouched and 0.0 is returned, so callers can detect silence without
/// dividing by zero.
pub fn normalize_peak(samples: &mut [f32]) -> f32 {
    let peak = samples.iter().map(|&x| x.abs()).fold(0.0f32, f32::max);

    if peak == 0.0 {
        log::warn!("Audio is silent, normalization skipped");
        return 0.0;
    }

    for sample in samples.iter_mut() {
        *sample /= peak;
    }

    log::debug!("Peak normalization: peak={:.6}, gain={:.6}", peak, 1.0 / peak);
    peak
}
