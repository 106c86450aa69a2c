//! # harmonybot
//!
//! Listens to a short audio sample, estimates its tempo and dominant key,
//! and answers with a generated drum beat and chord progression that loop
//! through an external synthesizer until stopped.
//!
//! ## Features
//!
//! - **Tempo**: HPSS, onset strength, prior-weighted autocorrelation and
//!   dynamic-programming beat tracking
//! - **Key**: chroma-based dominant pitch class (major/minor not distinguished)
//! - **Generation**: deterministic drum pattern and I-IV-V-I progression as
//!   Standard MIDI Files
//! - **Playback**: one looping synthesizer process per file, stopped together
//!
//! ## Quick Start
//!
//! ```no_run
//! use harmonybot::{analyze_audio, AnalysisConfig};
//!
//! // Load audio samples (mono, f32)
//! let samples: Vec<f32> = vec![]; // Your audio data
//! let sample_rate = 44100;
//!
//! let outcome = analyze_audio(&samples, sample_rate, &AnalysisConfig::default());
//!
//! println!("Tempo: {:.2} BPM", outcome.tempo());
//! println!("Key: {:?}", outcome.key());
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Capture → Preprocessing → Feature Extraction → Generation → Playback
//! ```
//!
//! [`session::Session`] wires the stages together.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod config;
pub mod error;
pub mod features;
pub mod generation;
pub mod io;
pub mod playback;
pub mod preprocessing;
pub mod session;

// Re-export main types
pub use analysis::result::{FeatureOutcome, Features, PitchClass, Undetermined};
pub use analysis::AnalysisMetadata;
pub use config::{AnalysisConfig, CaptureConfig, PlaybackConfig, SessionConfig};
pub use error::HarmonyError;
pub use session::{Response, Session};

/// Main analysis function
///
/// Preprocesses mono samples and extracts tempo, key and beat grid.
///
/// # Arguments
///
/// * `samples` - Mono audio samples
/// * `sample_rate` - Sample rate in Hz (typically 44100 or 48000)
/// * `config` - Analysis configuration parameters
///
/// # Returns
///
/// [`FeatureOutcome::Detected`] with the features, or
/// [`FeatureOutcome::Undetermined`] for silence and failed analysis
///
/// # Example
///
/// ```
/// use harmonybot::{analyze_audio, AnalysisConfig};
///
/// let samples = vec![0.0f32; 44100]; // 1 second of silence
/// let outcome = analyze_audio(&samples, 44100, &AnalysisConfig::default());
/// assert_eq!(outcome.tempo(), 0.0);
/// assert_eq!(outcome.key(), None);
/// ```
pub fn analyze_audio(samples: &[f32], sample_rate: u32, config: &AnalysisConfig) -> FeatureOutcome {
    log::debug!(
        "Starting audio analysis: {} samples at {} Hz",
        samples.len(),
        sample_rate
    );
    let prepared = preprocessing::preprocess(io::AudioBuffer::mono(samples.to_vec(), sample_rate));
    features::extract_features(&prepared, config)
}
