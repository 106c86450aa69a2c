//! Beat tracking modules
//!
//! Generate a beat grid from the onset envelope and a global tempo:
//! - Dynamic-programming tracker (Ellis 2007)

pub mod dynamic;

pub use dynamic::DynamicBeatTracker;

/// Convert envelope frame indices to times in seconds
pub fn frames_to_seconds(frames: &[usize], sample_rate: u32, hop_size: usize) -> Vec<f32> {
    if sample_rate == 0 {
        return Vec::new();
    }
    let seconds_per_frame = hop_size as f32 / sample_rate as f32;
    frames
        .iter()
        .map(|&frame| frame as f32 * seconds_per_frame)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames_to_seconds() {
        let times = frames_to_seconds(&[0, 86, 172], 44100, 512);
        assert_eq!(times[0], 0.0);
        assert!((times[1] - 0.9985).abs() < 1e-3);
        assert!((times[2] - 1.9969).abs() < 1e-3);
    }
}
