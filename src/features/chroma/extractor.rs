//! Chroma vector extraction
//!
//! Converts an STFT power spectrogram to 12-element chroma vectors.
//!
//! Each FFT bin is mapped softly onto the pitch classes near its fractional
//! MIDI pitch, with a Gaussian in semitones, and weighted by a broad Gaussian
//! over octaves so very low and very high bins contribute less.

use super::normalization::normalize_max;
use crate::config::AnalysisConfig;
use crate::error::HarmonyError;
use crate::features::stft::stft;

/// Number of pitch classes
pub const N_CHROMA: usize = 12;

/// Octave (relative to A0) at the center of the octave weighting
const OCTAVE_CENTER: f32 = 5.0;

/// Width of the octave weighting in octaves
const OCTAVE_WIDTH: f32 = 2.0;

/// A0, the reference for octave numbering
const A0_HZ: f32 = 27.5;

/// Weights beyond this many standard deviations are dropped
const SIGMA_CUTOFF: f32 = 3.0;

/// Extract chroma vectors from audio samples
///
/// # Arguments
///
/// * `samples` - Normalized mono audio (the full signal, not an HPSS component)
/// * `sample_rate` - Sample rate in Hz
/// * `config` - Uses `frame_size`, `hop_size`, `center_frequency`,
///   `soft_mapping_sigma`, `min_chroma_frequency`
///
/// # Returns
///
/// One chroma vector per STFT frame, each scaled so its largest entry is 1.0
/// (all-zero frames stay zero)
///
/// # Errors
///
/// Returns `HarmonyError::InvalidInput` for a zero sample rate or invalid
/// STFT parameters
pub fn extract_chroma(
    samples: &[f32],
    sample_rate: u32,
    config: &AnalysisConfig,
) -> Result<Vec<[f32; N_CHROMA]>, HarmonyError> {
    if sample_rate == 0 {
        return Err(HarmonyError::InvalidInput("Invalid sample rate: 0".to_string()));
    }

    log::debug!(
        "Extracting chroma: {} samples at {} Hz",
        samples.len(),
        sample_rate
    );

    let spec = stft(samples, config.frame_size, config.hop_size)?;
    let filterbank = chroma_filterbank(sample_rate, config.frame_size, config);
    let power = spec.power();

    let chroma = power
        .iter()
        .map(|frame| {
            let mut vector = [0.0f32; N_CHROMA];
            for (bin_power, weights) in frame.iter().zip(filterbank.iter()) {
                if *bin_power == 0.0 {
                    continue;
                }
                for (c, w) in weights.iter().enumerate() {
                    vector[c] += bin_power * w;
                }
            }
            normalize_max(&mut vector);
            vector
        })
        .collect::<Vec<_>>();

    log::debug!("Extracted {} chroma frames", chroma.len());
    Ok(chroma)
}

/// Per-bin pitch-class weights for an `n_fft`-point STFT
///
/// Bins below `min_chroma_frequency` (including DC) get all-zero weights.
pub fn chroma_filterbank(
    sample_rate: u32,
    n_fft: usize,
    config: &AnalysisConfig,
) -> Vec<[f32; N_CHROMA]> {
    let n_bins = n_fft / 2 + 1;
    let sigma = config.soft_mapping_sigma.max(1e-3);
    let bin_hz = sample_rate as f32 / n_fft.max(1) as f32;

    (0..n_bins)
        .map(|k| {
            let mut weights = [0.0f32; N_CHROMA];
            let freq = k as f32 * bin_hz;
            if freq < config.min_chroma_frequency || freq <= 0.0 {
                return weights;
            }

            let midi = 12.0 * (freq / config.center_frequency).log2() + 69.0;
            for (c, weight) in weights.iter_mut().enumerate() {
                let distance = circular_distance(midi, c as f32);
                if distance <= SIGMA_CUTOFF * sigma {
                    *weight = (-0.5 * (distance / sigma).powi(2)).exp();
                }
            }

            let total: f32 = weights.iter().sum();
            if total > 0.0 {
                let octave = (freq / A0_HZ).log2();
                let octave_weight =
                    (-0.5 * ((octave - OCTAVE_CENTER) / OCTAVE_WIDTH).powi(2)).exp();
                for weight in weights.iter_mut() {
                    *weight = *weight / total * octave_weight;
                }
            }
            weights
        })
        .collect()
}

/// Distance in semitones between a fractional pitch and a pitch class, wrapping at the octave
fn circular_distance(midi: f32, pitch_class: f32) -> f32 {
    let diff = (midi - pitch_class).rem_euclid(12.0);
    diff.min(12.0 - diff)
}
