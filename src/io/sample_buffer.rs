//! Raw and preprocessed audio buffers

/// Raw sample storage in the dtype the source produced
#[derive(Debug, Clone, PartialEq)]
pub enum Samples {
    /// Normalized 32-bit float
    F32(Vec<f32>),
    /// 64-bit float (not assumed normalized)
    F64(Vec<f64>),
    /// 16-bit signed PCM
    I16(Vec<i16>),
    /// 32-bit signed PCM
    I32(Vec<i32>),
}

impl Samples {
    /// Number of stored values (frames × channels)
    pub fn len(&self) -> usize {
        match self {
            Samples::F32(v) => v.len(),
            Samples::F64(v) => v.len(),
            Samples::I16(v) => v.len(),
            Samples::I32(v) => v.len(),
        }
    }

    /// True if no values are stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Audio exactly as captured or decoded: interleaved, any dtype
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    /// Interleaved samples
    pub samples: Samples,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Channel count (interleaving stride)
    pub channels: u16,
}

impl AudioBuffer {
    /// Create a buffer
    pub fn new(samples: Samples, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples,
            sample_rate,
            channels,
        }
    }

    /// Mono f32 buffer convenience constructor
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self::new(Samples::F32(samples), sample_rate, 1)
    }

    /// Number of frames (samples per channel)
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels.max(1) as usize
    }

    /// Duration in seconds
    pub fn duration_seconds(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f32 / self.sample_rate as f32
    }
}

/// Mono, finite, peak-normalized audio ready for analysis
///
/// Only [`crate::preprocessing::preprocess`] constructs this type, so holding
/// one means the samples are in [-1, 1] with no NaN/Inf.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedAudio {
    pub(crate) samples: Vec<f32>,
    pub(crate) sample_rate: u32,
}

impl PreparedAudio {
    /// Samples
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Peak absolute amplitude
    pub fn peak(&self) -> f32 {
        self.samples.iter().map(|&x| x.abs()).fold(0.0f32, f32::max)
    }

    /// Total energy (sum of squared samples)
    pub fn energy(&self) -> f32 {
        self.samples.iter().map(|&x| x * x).sum()
    }

    /// True if every sample is zero
    pub fn is_silent(&self) -> bool {
        self.samples.iter().all(|&x| x == 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames_and_duration() {
        let buffer = AudioBuffer::new(Samples::I16(vec![0; 88200]), 44100, 2);
        assert_eq!(buffer.frames(), 44100);
        assert!((buffer.duration_seconds() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_channels_treated_as_mono() {
        let buffer = AudioBuffer::new(Samples::F32(vec![0.0; 100]), 100, 0);
        assert_eq!(buffer.frames(), 100);
    }

    #[test]
    fn test_zero_sample_rate_duration() {
        let buffer = AudioBuffer::mono(vec![0.0; 100], 0);
        assert_eq!(buffer.duration_seconds(), 0.0);
    }
}
