//! Audio decoding using Symphonia

use super::sample_buffer::{AudioBuffer, Samples};
use crate::error::HarmonyError;
use std::fs::File;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Decode audio file to interleaved f32 PCM
///
/// # Arguments
///
/// * `path` - Path to audio file (any format Symphonia's default features probe)
///
/// # Returns
///
/// `AudioBuffer` holding interleaved f32 samples with the file's sample rate
/// and channel count
///
/// # Errors
///
/// Returns `HarmonyError::Decoding` if the file cannot be opened, probed or
/// contains no decodable audio track
pub fn decode_audio(path: &Path) -> Result<AudioBuffer, HarmonyError> {
    log::debug!("Decoding audio file: {}", path.display());

    let src = File::open(path)
        .map_err(|e| HarmonyError::Decoding(format!("{}: {}", path.display(), e)))?;
    let mss = MediaSourceStream::new(Box::new(src), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let meta_opts: MetadataOptions = Default::default();
    let fmt_opts: FormatOptions = Default::default();

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &fmt_opts, &meta_opts)
        .map_err(|e| HarmonyError::Decoding(format!("Unsupported format: {}", e)))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| HarmonyError::Decoding("No supported audio tracks found".to_string()))?;

    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(44100);
    let mut channels = track
        .codec_params
        .channels
        .map(|c| c.count() as u16)
        .unwrap_or(1);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| HarmonyError::Decoding(format!("Unsupported codec: {}", e)))?;

    let mut all_samples: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(_)) => break, // end of stream
            Err(e) => {
                log::warn!("Stopping decode early: {}", e);
                break;
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                sample_rate = spec.rate;
                channels = spec.channels.count() as u16;

                let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                buf.copy_interleaved_ref(decoded);
                all_samples.extend_from_slice(buf.samples());
            }
            Err(SymphoniaError::DecodeError(e)) => {
                log::warn!("Skipping undecodable packet: {}", e);
            }
            Err(e) => {
                return Err(HarmonyError::Decoding(format!("Decode failed: {}", e)));
            }
        }
    }

    if all_samples.is_empty() {
        return Err(HarmonyError::Decoding(format!(
            "No audio decoded from {}",
            path.display()
        )));
    }

    log::debug!(
        "Decoded {} samples ({} channels) at {} Hz",
        all_samples.len(),
        channels,
        sample_rate
    );

    Ok(AudioBuffer::new(Samples::F32(all_samples), sample_rate, channels))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::wav::write_wav;

    #[test]
    fn test_decode_roundtrips_written_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");

        let samples: Vec<f32> = (0..4410)
            .map(|i| 0.5 * (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 44100.0).sin())
            .collect();
        write_wav(&path, &samples, 44100).unwrap();

        let decoded = decode_audio(&path).unwrap();
        assert_eq!(decoded.sample_rate, 44100);
        assert_eq!(decoded.channels, 1);
        assert_eq!(decoded.frames(), samples.len());
    }

    #[test]
    fn test_decode_missing_file() {
        let result = decode_audio(Path::new("/nonexistent/definitely_missing.wav"));
        assert!(matches!(result, Err(HarmonyError::Decoding(_))));
    }
}
