//! Configuration parameters for capture, analysis and playback
//!
//! Every struct implements `Default` with the values the pipeline was tuned
//! for, and deserializes with `#[serde(default)]` so a config file only needs
//! to name the fields it overrides.

use crate::error::HarmonyError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Analysis configuration parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    // Preconditions
    /// Total-energy threshold (sum of squared samples) below which the buffer
    /// is treated as silence (default: 1e-4)
    pub energy_threshold: f32,

    // Harmonic/percussive separation
    /// Buffers shorter than this skip HPSS and use the raw signal for both
    /// components (default: 2048)
    pub min_hpss_samples: usize,

    /// FFT size for the HPSS STFT (default: 1024)
    pub hpss_fft_size: usize,

    /// Hop size for the HPSS STFT (default: 256)
    pub hpss_hop_size: usize,

    /// Median filter length in frames/bins (default: 31)
    pub hpss_kernel_size: usize,

    /// Soft-mask margin (default: 1.0)
    pub hpss_margin: f32,

    // STFT parameters for onset strength and chroma
    /// Frame size for STFT (default: 2048)
    pub frame_size: usize,

    /// Hop size for STFT (default: 512)
    pub hop_size: usize,

    /// Dynamic range of the log-power spectrogram in dB (default: 80.0)
    pub top_db: f32,

    // Tempo estimation
    /// Center of the log-normal tempo prior (default: 120.0)
    pub start_bpm: f32,

    /// Width of the tempo prior in octaves (default: 1.0)
    pub std_bpm: f32,

    /// Minimum BPM to consider (default: 30.0)
    pub min_bpm: f32,

    /// Maximum BPM to consider (default: 320.0)
    pub max_bpm: f32,

    // Beat tracking
    /// How strictly the tracked beats follow the estimated tempo (default: 100.0)
    pub tightness: f32,

    // Key detection
    /// Reference tuning for chroma mapping (default: 440.0 Hz, A4)
    pub center_frequency: f32,

    /// Soft mapping standard deviation in semitones (default: 0.5)
    /// Lower values = sharper mapping, higher values = more spread
    pub soft_mapping_sigma: f32,

    /// Lowest frequency that contributes to the chromagram (default: 55.0 Hz)
    pub min_chroma_frequency: f32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            energy_threshold: 1e-4,
            min_hpss_samples: 2048,
            hpss_fft_size: 1024,
            hpss_hop_size: 256,
            hpss_kernel_size: 31,
            hpss_margin: 1.0,
            frame_size: 2048,
            hop_size: 512,
            top_db: 80.0,
            start_bpm: 120.0,
            std_bpm: 1.0,
            min_bpm: 30.0,
            max_bpm: 320.0,
            tightness: 100.0,
            center_frequency: 440.0,
            soft_mapping_sigma: 0.5,
            min_chroma_frequency: 55.0,
        }
    }
}

/// Capture configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Recording length in seconds (default: 10.0)
    pub duration_seconds: f32,

    /// Requested sample rate in Hz (default: 44100)
    pub sample_rate: u32,
}

impl CaptureConfig {
    /// Recording length as a `Duration`
    ///
    /// Negative lengths count as zero.
    ///
    /// # Errors
    ///
    /// Returns `HarmonyError::InvalidInput` if the length is infinite or too
    /// large for a `Duration`
    pub fn duration(&self) -> Result<Duration, HarmonyError> {
        Duration::try_from_secs_f32(self.duration_seconds.max(0.0)).map_err(|e| {
            HarmonyError::InvalidInput(format!(
                "Invalid capture duration {}: {}",
                self.duration_seconds, e
            ))
        })
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            duration_seconds: 10.0,
            sample_rate: 44100,
        }
    }
}

/// How a playback loop paces its iterations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum LoopMode {
    /// Wait for the synthesis process to exit, then start the next cycle
    WaitForExit,
    /// Start the process, then wait a fixed delay before the next cycle
    FixedDelay {
        /// Delay between iterations in milliseconds
        delay_ms: u64,
    },
}

/// Playback configuration for the external synthesis engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Synthesizer executable (default: `fluidsynth`, resolved through PATH)
    pub synth_program: PathBuf,

    /// SoundFont passed to the synthesizer
    pub soundfont: PathBuf,

    /// Audio driver override (`-a <driver>`), if any
    pub audio_driver: Option<String>,

    /// Extra arguments inserted before the soundfont
    pub extra_args: Vec<String>,

    /// Loop pacing (default: wait for exit)
    pub loop_mode: LoopMode,

    /// Time a process gets to exit after graceful termination before it is
    /// killed (default: 1000 ms)
    pub grace_period_ms: u64,

    /// How often a waiting loop polls its process (default: 20 ms)
    pub poll_interval_ms: u64,
}

impl PlaybackConfig {
    /// Grace period as a `Duration`
    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }

    /// Poll interval as a `Duration` (never zero)
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            synth_program: PathBuf::from("fluidsynth"),
            soundfont: PathBuf::from("FluidR3_GM.sf2"),
            audio_driver: None,
            extra_args: Vec::new(),
            loop_mode: LoopMode::WaitForExit,
            grace_period_ms: 1000,
            poll_interval_ms: 20,
        }
    }
}

/// Top-level session configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Capture settings
    pub capture: CaptureConfig,

    /// Analysis settings
    pub analysis: AnalysisConfig,

    /// Playback settings
    pub playback: PlaybackConfig,

    /// Where exchange artifacts are written
    pub artifacts: ArtifactConfig,
}

/// Locations of the exchange files written between stages
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactConfig {
    /// Directory for all artifacts (default: current directory)
    pub work_dir: PathBuf,

    /// Normalized capture (default: `temp_audio.wav`)
    pub audio_file: String,

    /// Rendered drum beat (default: `beat.mid`)
    pub beat_file: String,

    /// Rendered chord progression (default: `piano_progression.mid`)
    pub progression_file: String,
}

impl ArtifactConfig {
    /// Full path of the normalized capture
    pub fn audio_path(&self) -> PathBuf {
        self.work_dir.join(&self.audio_file)
    }

    /// Full path of the rendered beat
    pub fn beat_path(&self) -> PathBuf {
        self.work_dir.join(&self.beat_file)
    }

    /// Full path of the rendered progression
    pub fn progression_path(&self) -> PathBuf {
        self.work_dir.join(&self.progression_file)
    }
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("."),
            audio_file: "temp_audio.wav".to_string(),
            beat_file: "beat.mid".to_string(),
            progression_file: "piano_progression.mid".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let json = r#"{ "capture": { "duration_seconds": 5.0 }, "playback": { "loop_mode": { "mode": "fixed_delay", "delay_ms": 10000 } } }"#;
        let config: SessionConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.capture.duration_seconds, 5.0);
        assert_eq!(config.capture.sample_rate, 44100);
        assert_eq!(config.playback.loop_mode, LoopMode::FixedDelay { delay_ms: 10000 });
        assert_eq!(config.playback.grace_period_ms, 1000);
        assert_eq!(config.analysis.hpss_kernel_size, 31);
        assert_eq!(config.artifacts.beat_path(), PathBuf::from("./beat.mid"));
    }

    #[test]
    fn test_poll_interval_never_zero() {
        let config = PlaybackConfig {
            poll_interval_ms: 0,
            ..PlaybackConfig::default()
        };
        assert_eq!(config.poll_interval(), Duration::from_millis(1));
    }

    #[test]
    fn test_capture_duration_bounds() {
        let mut capture = CaptureConfig::default();
        assert_eq!(capture.duration().unwrap(), Duration::from_secs(10));

        capture.duration_seconds = -2.0;
        assert_eq!(capture.duration().unwrap(), Duration::ZERO);

        for bad in [f32::INFINITY, 1e30] {
            capture.duration_seconds = bad;
            assert!(matches!(capture.duration(), Err(HarmonyError::InvalidInput(_))));
        }
    }
}
