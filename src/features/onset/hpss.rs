//! Harmonic-percussive source separation (HPSS)
//!
//! Sustained tones are smooth along time, attacks are smooth along frequency.
//! Median filtering the magnitude spectrogram in each direction gives a
//! harmonic and a percussive estimate; soft masks built from the two are
//! applied to the complex STFT and inverted back to signals.
//!
//! # Reference
//!
//! Fitzgerald, D. (2010). Harmonic/Percussive Separation using Median Filtering.
//! *Proceedings of the 13th International Conference on Digital Audio Effects (DAFx-10)*.

use crate::config::AnalysisConfig;
use crate::error::HarmonyError;
use crate::features::stft::{istft, stft};

/// Separated signal components
#[derive(Debug, Clone)]
pub struct HpssResult {
    /// Harmonic component (same length as the input)
    pub harmonic: Vec<f32>,
    /// Percussive component (same length as the input)
    pub percussive: Vec<f32>,
    /// False when the input was too short and both components are the input
    pub separated: bool,
}

/// Split `samples` into harmonic and percussive signals
///
/// Inputs shorter than `config.min_hpss_samples` are returned unseparated
/// (both components equal the input). This is a degraded result, not an error.
pub fn separate(samples: &[f32], config: &AnalysisConfig) -> Result<HpssResult, HarmonyError> {
    if samples.len() < config.min_hpss_samples {
        log::warn!(
            "Audio is too short for HPSS ({} < {} samples), skipping separation",
            samples.len(),
            config.min_hpss_samples
        );
        return Ok(unseparated(samples));
    }

    let spec = stft(samples, config.hpss_fft_size, config.hpss_hop_size)?;
    let magnitude = spec.magnitude();
    let (harmonic_mask, percussive_mask) =
        hpss_decompose(&magnitude, config.hpss_kernel_size, config.hpss_margin)?;

    let mut harmonic_spec = spec.clone();
    let mut percussive_spec = spec;
    for (t, (h_frame, p_frame)) in harmonic_spec
        .frames
        .iter_mut()
        .zip(percussive_spec.frames.iter_mut())
        .enumerate()
    {
        for k in 0..h_frame.len() {
            h_frame[k] *= harmonic_mask[t][k];
            p_frame[k] *= percussive_mask[t][k];
        }
    }

    Ok(HpssResult {
        harmonic: istft(&harmonic_spec, samples.len()),
        percussive: istft(&percussive_spec, samples.len()),
        separated: true,
    })
}

fn unseparated(samples: &[f32]) -> HpssResult {
    HpssResult {
        harmonic: samples.to_vec(),
        percussive: samples.to_vec(),
        separated: false,
    }
}

/// Compute harmonic and percussive soft masks from a magnitude spectrogram
///
/// # Arguments
///
/// * `magnitude_spec` - Magnitude spectrogram (n_frames × n_bins)
/// * `kernel_size` - Median filter length, applied along time (harmonic) and
///   along frequency (percussive)
/// * `margin` - Soft-mask margin; 1.0 gives complementary masks
///
/// # Returns
///
/// Tuple of (harmonic mask, percussive mask), each n_frames × n_bins in [0, 1]
pub fn hpss_decompose(
    magnitude_spec: &[Vec<f32>],
    kernel_size: usize,
    margin: f32,
) -> Result<(Vec<Vec<f32>>, Vec<Vec<f32>>), HarmonyError> {
    if kernel_size == 0 {
        return Err(HarmonyError::InvalidInput(
            "HPSS kernel size must be > 0".to_string(),
        ));
    }
    if margin < 1.0 {
        return Err(HarmonyError::InvalidInput(format!(
            "HPSS margin must be >= 1.0, got {}",
            margin
        )));
    }
    if magnitude_spec.is_empty() {
        return Ok((Vec::new(), Vec::new()));
    }

    let n_frames = magnitude_spec.len();
    let n_bins = magnitude_spec[0].len();
    if magnitude_spec.iter().any(|frame| frame.len() != n_bins) {
        return Err(HarmonyError::InvalidInput(
            "Inconsistent frame lengths in magnitude spectrogram".to_string(),
        ));
    }

    log::debug!(
        "Decomposing spectrogram with HPSS: {} frames x {} bins, kernel={}",
        n_frames,
        n_bins,
        kernel_size
    );

    let mut scratch = Vec::with_capacity(kernel_size);

    // Harmonic: median along time for each bin
    let mut harmonic = vec![vec![0.0f32; n_bins]; n_frames];
    let mut column = vec![0.0f32; n_frames];
    let mut filtered = vec![0.0f32; n_frames];
    for k in 0..n_bins {
        for t in 0..n_frames {
            column[t] = magnitude_spec[t][k];
        }
        median_filter(&column, kernel_size, &mut filtered, &mut scratch);
        for t in 0..n_frames {
            harmonic[t][k] = filtered[t];
        }
    }

    // Percussive: median along frequency for each frame
    let mut percussive = vec![vec![0.0f32; n_bins]; n_frames];
    for (frame, out) in magnitude_spec.iter().zip(percussive.iter_mut()) {
        median_filter(frame, kernel_size, out, &mut scratch);
    }

    // Soft masks (Wiener-style, power 2)
    for t in 0..n_frames {
        for k in 0..n_bins {
            let h = harmonic[t][k];
            let p = percussive[t][k];
            harmonic[t][k] = soft_mask(h, p * margin);
            percussive[t][k] = soft_mask(p, h * margin);
        }
    }

    Ok((harmonic, percussive))
}

#[inline]
fn soft_mask(x: f32, reference: f32) -> f32 {
    let x2 = x * x;
    let denom = x2 + reference * reference;
    if denom > 0.0 {
        x2 / denom
    } else {
        0.0
    }
}

/// Centered running median; the window shrinks at the edges
fn median_filter(input: &[f32], kernel_size: usize, output: &mut [f32], scratch: &mut Vec<f32>) {
    let half = kernel_size / 2;
    let n = input.len();
    for i in 0..n {
        let lo = i.saturating_sub(half);
        let hi = (i + half + 1).min(n);
        scratch.clear();
        scratch.extend_from_slice(&input[lo..hi]);
        let mid = scratch.len() / 2;
        scratch.select_nth_unstable_by(mid, |a, b| {
            a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal)
        });
        output[i] = scratch[mid];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median_filter_removes_spike() {
        let input = vec![1.0, 1.0, 9.0, 1.0, 1.0];
        let mut output = vec![0.0; 5];
        let mut scratch = Vec::new();
        median_filter(&input, 3, &mut output, &mut scratch);
        assert_eq!(output, vec![1.0, 1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_masks_separate_line_from_column() {
        // A horizontal line (sustained tone in bin 5) and a vertical line
        // (broadband click at frame 10)
        let mut magnitude = vec![vec![0.01f32; 32]; 21];
        for frame in magnitude.iter_mut() {
            frame[5] = 1.0;
        }
        for bin in magnitude[10].iter_mut() {
            *bin = 1.0;
        }
        magnitude[10][5] = 1.0;

        let (harmonic, percussive) = hpss_decompose(&magnitude, 7, 1.0).unwrap();

        assert!(harmonic[3][5] > 0.9, "tone should be harmonic");
        assert!(percussive[10][20] > 0.9, "click should be percussive");
        for t in 0..21 {
            for k in 0..32 {
                let total = harmonic[t][k] + percussive[t][k];
                assert!((total - 1.0).abs() < 1e-5 || total == 0.0);
            }
        }
    }

    #[test]
    fn test_short_input_skips_separation() {
        let config = AnalysisConfig::default();
        let samples = vec![0.5f32; 1000];
        let result = separate(&samples, &config).unwrap();
        assert!(!result.separated);
        assert_eq!(result.harmonic, samples);
        assert_eq!(result.percussive, samples);
    }

    #[test]
    fn test_separated_lengths_match_input() {
        let config = AnalysisConfig::default();
        let samples: Vec<f32> = (0..8192)
            .map(|i| (2.0 * std::f32::consts::PI * 220.0 * i as f32 / 22050.0).sin())
            .collect();
        let result = separate(&samples, &config).unwrap();
        assert!(result.separated);
        assert_eq!(result.harmonic.len(), samples.len());
        assert_eq!(result.percussive.len(), samples.len());
        // A steady sine is almost entirely harmonic
        let h_energy: f32 = result.harmonic.iter().map(|x| x * x).sum();
        let p_energy: f32 = result.percussive.iter().map(|x| x * x).sum();
        assert!(h_energy > p_energy * 4.0);
    }

    #[test]
    fn test_invalid_margin() {
        assert!(hpss_decompose(&[vec![1.0; 4]], 3, 0.5).is_err());
    }
}
