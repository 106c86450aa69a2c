//! Feature extraction modules
//!
//! This module contains all feature extraction algorithms:
//! - STFT / inverse STFT
//! - Onset detection (HPSS + onset strength)
//! - Period estimation (BPM detection)
//! - Beat tracking (dynamic programming)
//! - Chroma extraction
//! - Key detection

pub mod beat_tracking;
pub mod chroma;
pub mod key;
pub mod onset;
pub mod period;
pub mod stft;

use crate::analysis::metadata::AnalysisMetadata;
use crate::analysis::result::{FeatureOutcome, Features, Undetermined};
use crate::config::AnalysisConfig;
use crate::error::HarmonyError;
use crate::io::sample_buffer::PreparedAudio;
use std::time::Instant;

/// Extract tempo, key and beat grid from preprocessed audio
///
/// Never fails: silent input and any error raised while analyzing are
/// reported as [`FeatureOutcome::Undetermined`].
pub fn extract_features(audio: &PreparedAudio, config: &AnalysisConfig) -> FeatureOutcome {
    let energy = audio.energy();
    if !(energy >= config.energy_threshold) {
        log::warn!(
            "Signal energy {:.3e} below threshold {:.3e}, treating as silence",
            energy,
            config.energy_threshold
        );
        return FeatureOutcome::Undetermined(Undetermined::Silence { energy });
    }

    match analyze(audio.samples(), audio.sample_rate(), config) {
        Ok(features) => FeatureOutcome::Detected(features),
        Err(e) => {
            log::warn!("Feature extraction failed: {}", e);
            FeatureOutcome::Undetermined(Undetermined::Failed(e.to_string()))
        }
    }
}

fn analyze(
    samples: &[f32],
    sample_rate: u32,
    config: &AnalysisConfig,
) -> Result<Features, HarmonyError> {
    let start_time = Instant::now();

    if sample_rate == 0 {
        return Err(HarmonyError::InvalidInput("Invalid sample rate: 0".to_string()));
    }

    log::debug!(
        "Starting feature extraction: {} samples at {} Hz",
        samples.len(),
        sample_rate
    );

    let mut warnings = Vec::new();

    let separation = onset::hpss::separate(samples, config)?;
    if !separation.separated {
        warnings.push("Audio too short for HPSS, used unseparated signal".to_string());
    }

    let envelope = onset::onset_strength(&separation.percussive, config)?;

    let mut tempo = 0.0f32;
    let mut tempo_strength = 0.0f32;
    let mut beat_times = Vec::new();

    if envelope.iter().any(|&v| v > 0.0) {
        match period::estimate_tempo(&envelope, sample_rate, config)? {
            Some(estimate) => {
                tempo = estimate.bpm;
                tempo_strength = estimate.strength;

                let tracker =
                    beat_tracking::DynamicBeatTracker::new(estimate.period_frames, config.tightness);
                let beats = tracker.track(&envelope)?;
                beat_times =
                    beat_tracking::frames_to_seconds(&beats, sample_rate, config.hop_size);
            }
            None => warnings.push("No periodicity found in onset envelope".to_string()),
        }
    } else {
        log::debug!("Onset envelope is all zero, tempo undetermined");
        warnings.push("No onsets detected".to_string());
    }

    let chroma = chroma::extract_chroma(samples, sample_rate, config)?;
    let key_result = key::detect_key(&chroma);
    if key_result.is_none() {
        warnings.push("Chromagram is empty, key undetermined".to_string());
    }

    let processing_time_ms = start_time.elapsed().as_secs_f32() * 1000.0;

    log::info!(
        "Features: tempo={:.2} BPM, key={}, {} beats ({:.1} ms)",
        tempo,
        key_result
            .as_ref()
            .map_or("none", |result| result.key.name()),
        beat_times.len(),
        processing_time_ms
    );

    Ok(Features {
        tempo,
        key: key_result.as_ref().map(|result| result.key),
        beat_times,
        metadata: AnalysisMetadata {
            duration_seconds: samples.len() as f32 / sample_rate as f32,
            sample_rate,
            processing_time_ms,
            hpss_applied: separation.separated,
            tempo_strength,
            key_clarity: key_result.as_ref().map_or(0.0, |result| result.clarity),
            warnings,
            ..AnalysisMetadata::default()
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::result::PitchClass;

    fn prepared(samples: Vec<f32>, sample_rate: u32) -> PreparedAudio {
        PreparedAudio {
            samples,
            sample_rate,
        }
    }

    #[test]
    fn test_silence_is_undetermined() {
        let outcome = extract_features(&prepared(vec![0.0; 44100], 44100), &AnalysisConfig::default());
        assert!(matches!(
            outcome,
            FeatureOutcome::Undetermined(Undetermined::Silence { .. })
        ));
        assert_eq!(outcome.tempo(), 0.0);
        assert_eq!(outcome.key_index(), None);
    }

    #[test]
    fn test_zero_sample_rate_is_failure() {
        let outcome = extract_features(&prepared(vec![0.5; 4096], 0), &AnalysisConfig::default());
        assert!(matches!(
            outcome,
            FeatureOutcome::Undetermined(Undetermined::Failed(_))
        ));
    }

    #[test]
    fn test_steady_tone_detects_key() {
        let sample_rate = 22050;
        let samples: Vec<f32> = (0..sample_rate * 2)
            .map(|i| 0.8 * (2.0 * std::f32::consts::PI * 392.0 * i as f32 / sample_rate as f32).sin())
            .collect();
        let outcome = extract_features(&prepared(samples, sample_rate as u32), &AnalysisConfig::default());
        let features = outcome.features().unwrap();
        assert_eq!(features.key, Some(PitchClass::G));
        assert!(features.metadata.hpss_applied);
    }

    #[test]
    fn test_short_buffer_skips_hpss() {
        let samples: Vec<f32> = (0..1500)
            .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 44100.0).sin())
            .collect();
        let outcome = extract_features(&prepared(samples, 44100), &AnalysisConfig::default());
        let features = outcome.features().unwrap();
        assert!(!features.metadata.hpss_applied);
        assert!(!features.metadata.warnings.is_empty());
    }
}
