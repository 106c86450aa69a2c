//! Autocorrelation-based tempo estimation
//!
//! Finds the dominant periodicity of the onset strength envelope.
//!
//! # Algorithm
//!
//! 1. Compute the autocorrelation of the envelope using FFT acceleration:
//!    `ACF = IFFT(|FFT(signal)|²)`
//! 2. Restrict lags to the configured BPM range:
//!    `BPM = (60 * sample_rate) / (lag * hop_size)`
//! 3. Weight each lag by a log-normal tempo prior centered on `start_bpm`
//!    with a width of `std_bpm` octaves
//! 4. Pick the strongest weighted lag and refine it by parabolic interpolation
//!
//! # Reference
//!
//! Ellis, D. P. W. (2007). Beat Tracking by Dynamic Programming.
//! *Journal of New Music Research*, 36(1), 51-60.

use super::TempoEstimate;
use crate::config::AnalysisConfig;
use crate::error::HarmonyError;
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

const EPSILON: f32 = 1e-10;

/// Estimate the global tempo from an onset strength envelope
///
/// # Arguments
///
/// * `envelope` - Onset strength envelope (one value per hop)
/// * `sample_rate` - Sample rate in Hz
/// * `config` - Uses `hop_size`, `min_bpm`, `max_bpm`, `start_bpm`, `std_bpm`
///
/// # Returns
///
/// `Ok(None)` if the envelope has no usable periodicity (too short, flat zero)
///
/// # Errors
///
/// Returns `HarmonyError::InvalidInput` for a zero sample rate / hop size or
/// an empty BPM range
pub fn estimate_tempo(
    envelope: &[f32],
    sample_rate: u32,
    config: &AnalysisConfig,
) -> Result<Option<TempoEstimate>, HarmonyError> {
    if sample_rate == 0 {
        return Err(HarmonyError::InvalidInput("Invalid sample rate: 0".to_string()));
    }
    if config.hop_size == 0 {
        return Err(HarmonyError::InvalidInput("Invalid hop size: 0".to_string()));
    }
    if config.min_bpm <= 0.0 || config.min_bpm >= config.max_bpm {
        return Err(HarmonyError::InvalidInput(format!(
            "Invalid BPM range: [{:.1}, {:.1}]",
            config.min_bpm, config.max_bpm
        )));
    }

    let frame_rate = sample_rate as f32 / config.hop_size as f32;
    let lag_min = ((60.0 * frame_rate / config.max_bpm).floor() as usize).max(1);
    let lag_max = ((60.0 * frame_rate / config.min_bpm).ceil() as usize)
        .min(envelope.len().saturating_sub(1));

    log::debug!(
        "Estimating tempo: {} frames at {:.2} frames/s, lag range [{}, {}]",
        envelope.len(),
        frame_rate,
        lag_min,
        lag_max
    );

    if lag_max <= lag_min {
        log::warn!(
            "Envelope too short for tempo estimation: {} frames",
            envelope.len()
        );
        return Ok(None);
    }

    let acf = compute_autocorrelation_fft(envelope);

    let bpm_of = |lag: f32| 60.0 * frame_rate / lag;
    let weighted: Vec<f32> = (0..=lag_max)
        .map(|lag| {
            if lag < lag_min {
                0.0
            } else {
                acf[lag] * tempo_prior(bpm_of(lag as f32), config.start_bpm, config.std_bpm)
            }
        })
        .collect();

    let (best_lag, best_value) = weighted
        .iter()
        .enumerate()
        .skip(lag_min)
        .fold((lag_min, f32::NEG_INFINITY), |best, (lag, &value)| {
            if value > best.1 {
                (lag, value)
            } else {
                best
            }
        });

    if best_value <= EPSILON {
        return Ok(None);
    }

    let offset = if best_lag > lag_min && best_lag < lag_max {
        parabolic_offset(
            weighted[best_lag - 1],
            weighted[best_lag],
            weighted[best_lag + 1],
        )
    } else {
        0.0
    };
    let period_frames = best_lag as f32 + offset;
    let bpm = bpm_of(period_frames);

    let total_weight: f32 = weighted.iter().sum();
    let strength = if total_weight > EPSILON {
        (best_value / total_weight).clamp(0.0, 1.0)
    } else {
        0.0
    };

    log::debug!(
        "Tempo estimate: {:.2} BPM (lag {:.2} frames, strength {:.3})",
        bpm,
        period_frames,
        strength
    );

    Ok(Some(TempoEstimate {
        bpm,
        period_frames,
        strength,
    }))
}

/// Log-normal tempo prior: 1.0 at `start_bpm`, falling off per octave
fn tempo_prior(bpm: f32, start_bpm: f32, std_bpm: f32) -> f32 {
    let octaves = (bpm.log2() - start_bpm.log2()) / std_bpm.max(EPSILON);
    (-0.5 * octaves * octaves).exp()
}

/// Sub-sample peak offset in [-0.5, 0.5] from three neighboring values
fn parabolic_offset(left: f32, center: f32, right: f32) -> f32 {
    let denom = left - 2.0 * center + right;
    if denom.abs() <= EPSILON {
        return 0.0;
    }
    (0.5 * (left - right) / denom).clamp(-0.5, 0.5)
}

/// Compute autocorrelation using FFT acceleration
///
/// Uses the identity: ACF = IFFT(|FFT(signal)|²)
///
/// # Returns
///
/// Autocorrelation function (same length as input)
pub fn compute_autocorrelation_fft(signal: &[f32]) -> Vec<f32> {
    let n = signal.len();
    if n == 0 {
        return Vec::new();
    }

    // FFT size: next power of 2 >= 2*n (zero-padding avoids circular wrap)
    let fft_size = (2 * n).next_power_of_two();

    let mut fft_input: Vec<Complex<f32>> = signal.iter().map(|&x| Complex::new(x, 0.0)).collect();
    fft_input.resize(fft_size, Complex::new(0.0, 0.0));

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(fft_size);
    fft.process(&mut fft_input);

    for x in &mut fft_input {
        *x = *x * x.conj();
    }

    let ifft = planner.plan_fft_inverse(fft_size);
    ifft.process(&mut fft_input);

    let scale = 1.0 / (fft_size as f32);
    fft_input[..n]
        .iter()
        .map(|x| (x.re * scale).max(0.0))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Impulse envelope with one pulse every `period` frames
    fn pulse_envelope(len: usize, period: f32) -> Vec<f32> {
        let mut envelope = vec![0.0f32; len];
        let mut position = 0.0f32;
        while (position as usize) < len {
            envelope[position.round() as usize % len] = 1.0;
            position += period;
        }
        envelope
    }

    #[test]
    fn test_autocorrelation_of_impulse_train() {
        let signal = pulse_envelope(100, 10.0);
        let acf = compute_autocorrelation_fft(&signal);
        assert_eq!(acf.len(), 100);
        assert!(acf[10] > acf[5]);
        assert!(acf[20] > acf[15]);
        assert!((acf[0] - 10.0).abs() < 1e-3);
    }

    #[test]
    fn test_estimate_120_bpm() {
        let config = AnalysisConfig::default();
        let frame_rate = 44100.0 / 512.0;
        let period = frame_rate * 60.0 / 120.0;
        let envelope = pulse_envelope(860, period);

        let estimate = estimate_tempo(&envelope, 44100, &config).unwrap().unwrap();
        assert!(
            (estimate.bpm - 120.0).abs() < 3.0,
            "Expected ~120 BPM, got {:.2}",
            estimate.bpm
        );
    }

    #[test]
    fn test_estimate_95_bpm() {
        let config = AnalysisConfig::default();
        let frame_rate = 44100.0 / 512.0;
        let period = frame_rate * 60.0 / 95.0;
        let envelope = pulse_envelope(1200, period);

        let estimate = estimate_tempo(&envelope, 44100, &config).unwrap().unwrap();
        assert!(
            (estimate.bpm - 95.0).abs() < 3.0,
            "Expected ~95 BPM, got {:.2}",
            estimate.bpm
        );
    }

    #[test]
    fn test_flat_zero_envelope() {
        let config = AnalysisConfig::default();
        let envelope = vec![0.0f32; 500];
        assert!(estimate_tempo(&envelope, 44100, &config).unwrap().is_none());
    }

    #[test]
    fn test_too_short_envelope() {
        let config = AnalysisConfig::default();
        assert!(estimate_tempo(&[1.0, 0.0, 1.0], 44100, &config).unwrap().is_none());
    }

    #[test]
    fn test_invalid_params() {
        let config = AnalysisConfig::default();
        assert!(estimate_tempo(&[0.5; 100], 0, &config).is_err());

        let bad_range = AnalysisConfig {
            min_bpm: 200.0,
            max_bpm: 100.0,
            ..AnalysisConfig::default()
        };
        assert!(estimate_tempo(&[0.5; 100], 44100, &bad_range).is_err());
    }

    #[test]
    fn test_prior_peaks_at_start_bpm() {
        assert!((tempo_prior(120.0, 120.0, 1.0) - 1.0).abs() < 1e-6);
        assert!(tempo_prior(60.0, 120.0, 1.0) < tempo_prior(100.0, 120.0, 1.0));
        assert!((tempo_prior(240.0, 120.0, 1.0) - tempo_prior(60.0, 120.0, 1.0)).abs() < 1e-6);
    }
}
