//! Onset detection modules
//!
//! - Harmonic-percussive source separation (HPSS)
//! - Onset strength envelope (log-power spectral flux)

pub mod hpss;

use crate::config::AnalysisConfig;
use crate::error::HarmonyError;
use crate::features::stft::stft;

/// Power floor before converting to dB
const POWER_FLOOR: f32 = 1e-10;

/// Compute the onset strength envelope of `samples`
///
/// Algorithm:
/// 1. Power spectrogram (`frame_size`, `hop_size`, centered)
/// 2. Convert to dB relative to the loudest bin, clipped `top_db` below it
/// 3. Half-wave rectified first difference along time
/// 4. Mean across frequency bins
///
/// # Returns
///
/// One value per STFT frame; the first frame is always 0. An all-zero
/// envelope means no rhythmic onsets were found.
pub fn onset_strength(samples: &[f32], config: &AnalysisConfig) -> Result<Vec<f32>, HarmonyError> {
    let spec = stft(samples, config.frame_size, config.hop_size)?;
    let power = spec.power();

    let mut log_power: Vec<Vec<f32>> = power
        .iter()
        .map(|frame| {
            frame
                .iter()
                .map(|&p| 10.0 * p.max(POWER_FLOOR).log10())
                .collect()
        })
        .collect();

    let reference = log_power
        .iter()
        .flat_map(|frame| frame.iter().copied())
        .fold(f32::NEG_INFINITY, f32::max);
    let floor = reference - config.top_db;
    for frame in log_power.iter_mut() {
        for value in frame.iter_mut() {
            *value = value.max(floor);
        }
    }

    let mut envelope = Vec::with_capacity(log_power.len());
    envelope.push(0.0f32);
    for t in 1..log_power.len() {
        let prev = &log_power[t - 1];
        let curr = &log_power[t];
        let flux: f32 = curr
            .iter()
            .zip(prev.iter())
            .map(|(&c, &p)| (c - p).max(0.0))
            .sum();
        envelope.push(flux / curr.len().max(1) as f32);
    }

    log::debug!(
        "Onset strength: {} frames, max={:.4}",
        envelope.len(),
        envelope.iter().copied().fold(0.0f32, f32::max)
    );

    Ok(envelope)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silence_gives_zero_envelope() {
        let config = AnalysisConfig::default();
        let envelope = onset_strength(&vec![0.0f32; 22050], &config).unwrap();
        assert!(!envelope.is_empty());
        assert!(envelope.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_clicks_produce_peaks() {
        let config = AnalysisConfig::default();
        let mut samples = vec![0.0f32; 44100];
        // Clicks every 11025 samples (4 per second)
        for start in (0..44100).step_by(11025) {
            for i in 0..64 {
                if start + i < samples.len() {
                    samples[start + i] = if i % 2 == 0 { 0.9 } else { -0.9 };
                }
            }
        }

        let envelope = onset_strength(&samples, &config).unwrap();
        let max = envelope.iter().copied().fold(0.0f32, f32::max);
        assert!(max > 0.0);

        // Frame holding the second click should be near a peak
        let click_frame = 11025 / config.hop_size;
        let local_max = envelope[click_frame.saturating_sub(2)..=click_frame + 2]
            .iter()
            .copied()
            .fold(0.0f32, f32::max);
        assert!(local_max > 0.5 * max);
    }
}
