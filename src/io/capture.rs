//! Live audio capture from the default input device

use super::sample_buffer::{AudioBuffer, Samples};
use crate::error::HarmonyError;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Something that can record a fixed-length audio sample
///
/// Implementations block for the requested duration. A failure (no device,
/// nothing recorded) must be returned as an error, never replaced by silence.
pub trait AudioSource {
    /// Record `duration` of audio, preferably at `sample_rate`
    fn record(&mut self, duration: Duration, sample_rate: u32) -> Result<AudioBuffer, HarmonyError>;
}

/// Records from the system's default input device via cpal
#[derive(Debug, Default)]
pub struct DeviceSource;

impl DeviceSource {
    /// Create a source bound to the default host
    pub fn new() -> Self {
        Self
    }
}

impl AudioSource for DeviceSource {
    fn record(&mut self, duration: Duration, sample_rate: u32) -> Result<AudioBuffer, HarmonyError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| HarmonyError::Capture("No audio input device found".to_string()))?;

        let supported = pick_config(&device, sample_rate)?;
        let sample_format = supported.sample_format();
        let config: cpal::StreamConfig = supported.into();

        log::info!(
            "Recording {:.1}s from {} @ {} Hz, {} channel(s), {:?}",
            duration.as_secs_f32(),
            device.name().unwrap_or_else(|_| "Unknown".to_string()),
            config.sample_rate.0,
            config.channels,
            sample_format
        );

        let samples = match sample_format {
            cpal::SampleFormat::F32 => Samples::F32(record_stream::<f32>(&device, &config, duration)?),
            cpal::SampleFormat::F64 => Samples::F64(record_stream::<f64>(&device, &config, duration)?),
            cpal::SampleFormat::I16 => Samples::I16(record_stream::<i16>(&device, &config, duration)?),
            cpal::SampleFormat::I32 => Samples::I32(record_stream::<i32>(&device, &config, duration)?),
            cpal::SampleFormat::U16 => Samples::I16(
                record_stream::<u16>(&device, &config, duration)?
                    .into_iter()
                    .map(|s| (s as i32 - 32768) as i16)
                    .collect(),
            ),
            other => {
                return Err(HarmonyError::Capture(format!(
                    "Unsupported input sample format: {:?}",
                    other
                )))
            }
        };

        if samples.is_empty() {
            return Err(HarmonyError::Capture(
                "No audio data recorded! Check microphone input.".to_string(),
            ));
        }

        log::info!("Recording complete: {} samples", samples.len());
        Ok(AudioBuffer::new(samples, config.sample_rate.0, config.channels))
    }
}

/// Prefer an input config that supports the requested rate, else the device default
fn pick_config(
    device: &cpal::Device,
    sample_rate: u32,
) -> Result<cpal::SupportedStreamConfig, HarmonyError> {
    let wanted = cpal::SampleRate(sample_rate);

    if let Ok(mut ranges) = device.supported_input_configs() {
        if let Some(range) =
            ranges.find(|r| r.min_sample_rate() <= wanted && wanted <= r.max_sample_rate())
        {
            return Ok(range.with_sample_rate(wanted));
        }
    }

    log::warn!(
        "Input device does not support {} Hz, falling back to its default config",
        sample_rate
    );
    device
        .default_input_config()
        .map_err(|e| HarmonyError::Capture(format!("Failed to get input config: {}", e)))
}

fn record_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    duration: Duration,
) -> Result<Vec<T>, HarmonyError>
where
    T: cpal::SizedSample + Send + 'static,
{
    let expected =
        (duration.as_secs_f64() * config.sample_rate.0 as f64) as usize * config.channels as usize;
    let recorded = Arc::new(Mutex::new(Vec::<T>::with_capacity(expected)));
    let sink = Arc::clone(&recorded);

    let stream = device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                if let Ok(mut buf) = sink.lock() {
                    let room = expected.saturating_sub(buf.len());
                    buf.extend_from_slice(&data[..data.len().min(room)]);
                }
            },
            |err| log::error!("Input stream error: {}", err),
            None,
        )
        .map_err(|e| HarmonyError::Capture(format!("Failed to build input stream: {}", e)))?;

    stream
        .play()
        .map_err(|e| HarmonyError::Capture(format!("Failed to start input stream: {}", e)))?;
    std::thread::sleep(duration);
    drop(stream);

    let samples = match recorded.lock() {
        Ok(mut buf) => std::mem::take(&mut *buf),
        Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
    };
    Ok(samples)
}
