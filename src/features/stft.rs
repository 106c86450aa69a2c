//! Short-time Fourier transform and its inverse
//!
//! Frames are centered: the signal is zero-padded by `n_fft / 2` on both
//! sides so frame `t` is centered on sample `t * hop_size`. A periodic Hann
//! window is used for analysis and synthesis; the inverse divides by the
//! summed squared window so any hop that covers the signal reconstructs it.

use crate::error::HarmonyError;
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

/// Window-sum floor below which overlap-add output is left unnormalized
const WINDOW_SUM_FLOOR: f32 = 1e-8;

/// Complex spectrogram (n_frames × (n_fft / 2 + 1))
#[derive(Debug, Clone)]
pub struct Spectrogram {
    /// One half-spectrum per frame
    pub frames: Vec<Vec<Complex<f32>>>,
    /// FFT size used
    pub n_fft: usize,
    /// Hop size used
    pub hop_size: usize,
}

impl Spectrogram {
    /// Number of frequency bins per frame
    pub fn n_bins(&self) -> usize {
        self.n_fft / 2 + 1
    }

    /// Magnitude spectrogram
    pub fn magnitude(&self) -> Vec<Vec<f32>> {
        self.frames
            .iter()
            .map(|frame| frame.iter().map(|c| c.norm()).collect())
            .collect()
    }

    /// Power spectrogram (magnitude squared)
    pub fn power(&self) -> Vec<Vec<f32>> {
        self.frames
            .iter()
            .map(|frame| frame.iter().map(|c| c.norm_sqr()).collect())
            .collect()
    }
}

/// Periodic Hann window of length `n`
pub fn hann_window(n: usize) -> Vec<f32> {
    (0..n)
        .map(|i| {
            let t = 2.0 * std::f32::consts::PI * i as f32 / n as f32;
            0.5 * (1.0 - t.cos())
        })
        .collect()
}

/// Compute the centered STFT of `samples`
///
/// # Errors
///
/// Returns `HarmonyError::InvalidInput` if `n_fft` or `hop_size` is zero
pub fn stft(samples: &[f32], n_fft: usize, hop_size: usize) -> Result<Spectrogram, HarmonyError> {
    if n_fft == 0 {
        return Err(HarmonyError::InvalidInput("FFT size must be > 0".to_string()));
    }
    if hop_size == 0 {
        return Err(HarmonyError::InvalidInput("Hop size must be > 0".to_string()));
    }

    let pad = n_fft / 2;
    let mut padded = vec![0.0f32; pad];
    padded.extend_from_slice(samples);
    padded.resize((padded.len() + pad).max(n_fft), 0.0);

    let n_frames = 1 + (padded.len() - n_fft) / hop_size;
    let n_bins = n_fft / 2 + 1;
    let window = hann_window(n_fft);

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(n_fft);

    let mut frames = Vec::with_capacity(n_frames);
    let mut buffer = vec![Complex::new(0.0f32, 0.0); n_fft];

    for t in 0..n_frames {
        let start = t * hop_size;
        for (i, slot) in buffer.iter_mut().enumerate() {
            *slot = Complex::new(padded[start + i] * window[i], 0.0);
        }
        fft.process(&mut buffer);
        frames.push(buffer[..n_bins].to_vec());
    }

    log::debug!(
        "STFT: {} samples -> {} frames x {} bins (n_fft={}, hop={})",
        samples.len(),
        n_frames,
        n_bins,
        n_fft,
        hop_size
    );

    Ok(Spectrogram {
        frames,
        n_fft,
        hop_size,
    })
}

/// Invert a centered STFT back to `length` samples
pub fn istft(spec: &Spectrogram, length: usize) -> Vec<f32> {
    let n_fft = spec.n_fft;
    let hop = spec.hop_size;
    if spec.frames.is_empty() || n_fft == 0 || hop == 0 {
        return vec![0.0; length];
    }

    let n_bins = spec.n_bins();
    let window = hann_window(n_fft);
    let total = n_fft + hop * (spec.frames.len() - 1);
    let mut output = vec![0.0f32; total];
    let mut window_sum = vec![0.0f32; total];

    let mut planner = FftPlanner::new();
    let ifft = planner.plan_fft_inverse(n_fft);
    let mut buffer = vec![Complex::new(0.0f32, 0.0); n_fft];
    let scale = 1.0 / n_fft as f32;

    for (t, frame) in spec.frames.iter().enumerate() {
        // Rebuild the full conjugate-symmetric spectrum
        buffer[..n_bins].copy_from_slice(&frame[..n_bins]);
        for k in 1..n_fft - n_bins + 1 {
            buffer[n_fft - k] = frame[k].conj();
        }
        ifft.process(&mut buffer);

        let start = t * hop;
        for i in 0..n_fft {
            output[start + i] += buffer[i].re * scale * window[i];
            window_sum[start + i] += window[i] * window[i];
        }
    }

    for (sample, &wsum) in output.iter_mut().zip(window_sum.iter()) {
        if wsum > WINDOW_SUM_FLOOR {
            *sample /= wsum;
        }
    }

    let pad = n_fft / 2;
    let mut result: Vec<f32> = output.into_iter().skip(pad).take(length).collect();
    result.resize(length, 0.0);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, sample_rate: f32, length: usize) -> Vec<f32> {
        (0..length)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate).sin())
            .collect()
    }

    #[test]
    fn test_frame_count_centered() {
        let samples = vec![0.0f32; 44100];
        let spec = stft(&samples, 2048, 512).unwrap();
        assert_eq!(spec.frames.len(), 1 + 44100 / 512);
        assert_eq!(spec.frames[0].len(), 1025);
    }

    #[test]
    fn test_sine_peak_bin() {
        // 1000 Hz at 16 kHz with n_fft 1024 -> bin 64
        let samples = sine(1000.0, 16000.0, 16000);
        let spec = stft(&samples, 1024, 256).unwrap();
        let magnitude = spec.magnitude();
        let mid = &magnitude[magnitude.len() / 2];
        let peak_bin = mid
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak_bin, 64);
    }

    #[test]
    fn test_inverse_reconstructs_signal() {
        let samples: Vec<f32> = sine(440.0, 22050.0, 5000)
            .iter()
            .zip(sine(3100.0, 22050.0, 5000))
            .map(|(a, b)| 0.6 * a + 0.3 * b)
            .collect();

        let spec = stft(&samples, 1024, 256).unwrap();
        let rebuilt = istft(&spec, samples.len());

        assert_eq!(rebuilt.len(), samples.len());
        let max_err = samples
            .iter()
            .zip(rebuilt.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0f32, f32::max);
        assert!(max_err < 1e-3, "reconstruction error too large: {}", max_err);
    }

    #[test]
    fn test_short_input_single_frame() {
        let spec = stft(&[0.5, -0.5, 0.25], 1024, 256).unwrap();
        assert_eq!(spec.frames.len(), 1);
    }

    #[test]
    fn test_invalid_params() {
        assert!(stft(&[0.0; 16], 0, 4).is_err());
        assert!(stft(&[0.0; 16], 8, 0).is_err());
    }
}
