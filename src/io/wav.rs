//! Writing the normalized capture artifact

use crate::error::HarmonyError;
use std::path::Path;

/// Write mono f32 samples as a 32-bit float WAV file
///
/// Overwrites any existing file at `path`.
pub fn write_wav(path: &Path, samples: &[f32], sample_rate: u32) -> Result<(), HarmonyError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };

    let to_io = |e: hound::Error| HarmonyError::Io(format!("{}: {}", path.display(), e));

    let mut writer = hound::WavWriter::create(path, spec).map_err(to_io)?;
    for &sample in samples {
        writer.write_sample(sample).map_err(to_io)?;
    }
    writer.finalize().map_err(to_io)?;

    log::debug!("Wrote {} samples to {}", samples.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_wav_spec() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.wav");
        write_wav(&path, &[0.0, 0.5, -0.5, 1.0], 22050).unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 22050);
        assert_eq!(spec.sample_format, hound::SampleFormat::Float);
        assert_eq!(reader.len(), 4);
    }

    #[test]
    fn test_write_wav_bad_directory() {
        let result = write_wav(Path::new("/nonexistent/dir/out.wav"), &[0.0], 44100);
        assert!(matches!(result, Err(HarmonyError::Io(_))));
    }
}
