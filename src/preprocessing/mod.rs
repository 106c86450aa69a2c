//! Audio preprocessing modules
//!
//! This module prepares raw captured or decoded audio for analysis:
//! - Conversion to f32 (integer/f64 input rescaled by its own peak)
//! - Channel mixing (interleaved to mono)
//! - NaN/Inf scrubbing
//! - Peak normalization

pub mod channel_mixer;
pub mod normalization;

use crate::io::sample_buffer::{AudioBuffer, PreparedAudio};

/// Preprocess a raw buffer into mono, finite, peak-normalized audio
///
/// Pure function of its input. A silent buffer comes back silent; the feature
/// extractor checks energy before doing anything that could divide by zero.
///
/// # Example
///
/// ```
/// use harmonybot::io::{AudioBuffer, Samples};
/// use harmonybot::preprocessing::preprocess;
///
/// let raw = AudioBuffer::new(Samples::I16(vec![100, 300, -300, -100]), 44100, 2);
/// let prepared = preprocess(raw);
/// assert_eq!(prepared.samples(), &[1.0, -1.0]);
/// ```
pub fn preprocess(buffer: AudioBuffer) -> PreparedAudio {
    log::debug!(
        "Preprocessing {} samples, {} channel(s) at {} Hz",
        buffer.samples.len(),
        buffer.channels,
        buffer.sample_rate
    );

    let converted = normalization::to_f32(&buffer.samples);
    let mut mono = channel_mixer::downmix(&converted, buffer.channels);
    normalization::scrub_non_finite(&mut mono);
    normalization::normalize_peak(&mut mono);

    PreparedAudio {
        samples: mono,
        sample_rate: buffer.sample_rate,
    }
}
