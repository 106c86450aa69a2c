//! Channel mixing utilities (multi-channel to mono conversion)

/// Collapse interleaved multi-channel samples to mono by averaging each frame
///
/// # Arguments
///
/// * `interleaved` - Interleaved samples (`frame0_ch0, frame0_ch1, ...`)
/// * `channels` - Number of interleaved channels (0 is treated as 1)
///
/// # Returns
///
/// Mono samples, one per complete frame. A trailing partial frame is dropped.
pub fn downmix(interleaved: &[f32], channels: u16) -> Vec<f32> {
    let channels = channels.max(1) as usize;
    if channels == 1 {
        return interleaved.to_vec();
    }

    log::debug!(
        "Downmixing {} samples from {} channels to mono",
        interleaved.len(),
        channels
    );

    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mono_passthrough() {
        let samples = vec![0.1, -0.2, 0.3];
        assert_eq!(downmix(&samples, 1), samples);
    }

    #[test]
    fn test_stereo_average() {
        let samples = vec![1.0, 0.0, -0.5, -0.5, 0.25, 0.75];
        assert_eq!(downmix(&samples, 2), vec![0.5, -0.5, 0.5]);
    }

    #[test]
    fn test_partial_frame_dropped() {
        let samples = vec![1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.5];
        assert_eq!(downmix(&samples, 3), vec![1.0, 0.0]);
    }
}
