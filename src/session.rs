//! Session controller
//!
//! Composes capture, analysis, generation and playback behind operations
//! that never fail across their boundary: every call returns a
//! [`Response`] that serializes as `{"success": true, ...payload}` or
//! `{"success": false, "error": "..."}`.

use crate::analysis::result::{FeatureOutcome, PitchClass};
use crate::config::SessionConfig;
use crate::error::HarmonyError;
use crate::features::extract_features;
use crate::generation::{generate_artifacts, input};
use crate::io::{decode_audio, write_wav, AudioBuffer, AudioSource, DeviceSource};
use crate::playback::{FluidSynth, Orchestrator, StopStatus, SynthEngine};
use crate::preprocessing::preprocess;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;

/// Error reported when analysis yields no usable key
pub const NO_MUSIC_DETECTED: &str = "No valid music detected.";

/// Error reported when a sequence could not be rendered
pub const GENERATION_FAILED: &str = "Music generation failed.";

/// Error reported when play is called without both artifacts
pub const MISSING_FILES: &str = "Missing music files.";

/// Uniform operation outcome
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response<T> {
    /// Whether the operation succeeded
    pub success: bool,

    /// Operation-specific fields, present on success
    #[serde(flatten)]
    pub payload: Option<T>,

    /// Failure description, present on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> Response<T> {
    /// Successful response carrying `payload`
    pub fn ok(payload: T) -> Self {
        Self {
            success: true,
            payload: Some(payload),
            error: None,
        }
    }

    /// Failed response with `message`
    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            payload: None,
            error: Some(message.into()),
        }
    }
}

impl<T: Serialize> Response<T> {
    /// JSON form of the response
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(
                "{{\"success\":false,\"error\":{}}}",
                Value::String(format!("Failed to serialize response: {}", e))
            )
        })
    }
}

/// Result of an analysis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyzePayload {
    /// Tempo in whole BPM (0 when no rhythm was found)
    pub tempo: i64,
    /// Key index 0-11 as a string
    pub key: String,
    /// Key note name
    pub key_name: String,
}

impl AnalyzePayload {
    fn new(tempo: f32, key: PitchClass) -> Self {
        Self {
            tempo: whole_bpm(tempo),
            key: key.index().to_string(),
            key_name: key.name().to_string(),
        }
    }
}

/// Paths of the generated artifacts
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratePayload {
    /// Drum beat MIDI file
    pub beat: String,
    /// Chord progression MIDI file
    pub piano: String,
}

/// Human-readable status
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusPayload {
    /// Status message
    pub message: String,
}

impl StatusPayload {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Result of a full capture, analyze, generate and play run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunPayload {
    /// Analysis result
    #[serde(flatten)]
    pub analysis: AnalyzePayload,
    /// Generated artifacts now playing
    #[serde(flatten)]
    pub artifacts: GeneratePayload,
}

/// Owns the capture source and the playback orchestrator
pub struct Session<S: AudioSource, E: SynthEngine> {
    source: S,
    orchestrator: Orchestrator<E>,
    config: SessionConfig,
}

impl Session<DeviceSource, FluidSynth> {
    /// Session on the default input device, playing through FluidSynth
    pub fn with_device(config: SessionConfig) -> Self {
        let engine = FluidSynth::from_config(&config.playback);
        Self::new(DeviceSource::new(), engine, config)
    }
}

impl<S: AudioSource, E: SynthEngine> Session<S, E> {
    /// Create a session from its collaborators
    pub fn new(source: S, engine: E, config: SessionConfig) -> Self {
        let orchestrator = Orchestrator::new(engine, config.playback.clone());
        Self {
            source,
            orchestrator,
            config,
        }
    }

    /// Session configuration
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// True while playback loops are running
    pub fn is_playing(&self) -> bool {
        self.orchestrator.is_playing()
    }

    /// Record from the capture source and analyze the recording
    ///
    /// The normalized recording is also written to the configured audio
    /// artifact.
    pub fn capture_and_analyze(&mut self) -> Response<AnalyzePayload> {
        match self.capture_features() {
            Ok((tempo, key)) => Response::ok(AnalyzePayload::new(tempo, key)),
            Err(message) => Response::err(message),
        }
    }

    /// Decode an audio file and analyze it
    pub fn analyze_file(&self, path: &Path) -> Response<AnalyzePayload> {
        log::info!("Analyzing {}", path.display());
        let buffer = match decode_audio(path) {
            Ok(buffer) => buffer,
            Err(e) => {
                log::error!("Could not read {}: {}", path.display(), e);
                return Response::err(e.to_string());
            }
        };
        match self.analyze_buffer(buffer, false) {
            Ok((tempo, key)) => Response::ok(AnalyzePayload::new(tempo, key)),
            Err(message) => Response::err(message),
        }
    }

    /// Render the beat for `tempo` and the progression for `key`
    ///
    /// `tempo` may be a number, numeric string or one-element array; a
    /// missing or invalid `key` falls back to C.
    pub fn generate(&self, tempo: &Value, key: Option<&Value>) -> Response<GeneratePayload> {
        let tempo = match input::coerce_tempo(tempo) {
            Ok(tempo) => tempo,
            Err(e) => {
                log::warn!("Rejecting generation request: {}", e);
                return Response::err(e.to_string());
            }
        };
        let key = input::coerce_key(key);

        let artifacts = &self.config.artifacts;
        let generated = generate_artifacts(
            tempo,
            key,
            &artifacts.beat_path(),
            &artifacts.progression_path(),
        );
        match generated.paths() {
            Some((beat, piano)) => Response::ok(GeneratePayload {
                beat: beat.display().to_string(),
                piano: piano.display().to_string(),
            }),
            None => Response::err(GENERATION_FAILED),
        }
    }

    /// Start looping both artifacts, replacing any active playback
    pub fn play(&mut self, beat: Option<&Path>, piano: Option<&Path>) -> Response<StatusPayload> {
        let (Some(beat), Some(piano)) = (beat, piano) else {
            return Response::err(MISSING_FILES);
        };
        match self.orchestrator.play(beat, piano) {
            Ok(()) => Response::ok(StatusPayload::new("Music is playing.")),
            Err(HarmonyError::InvalidInput(message)) => Response::err(message),
            Err(e) => Response::err(e.to_string()),
        }
    }

    /// Stop playback; safe to call repeatedly
    pub fn stop(&mut self) -> Response<StatusPayload> {
        match self.orchestrator.stop() {
            StopStatus::Stopped { .. } => Response::ok(StatusPayload::new("Music playback stopped.")),
            StopStatus::NothingToStop => Response::ok(StatusPayload::new("Nothing to stop.")),
        }
    }

    /// Capture, analyze, generate and start playback
    ///
    /// Playback keeps running after this returns; call [`Session::stop`] to
    /// end it.
    pub fn run(&mut self) -> Response<RunPayload> {
        let (tempo, key) = match self.capture_features() {
            Ok(features) => features,
            Err(message) => return Response::err(message),
        };
        let analysis = AnalyzePayload::new(tempo, key);

        // Generation sees the same whole-BPM value the analysis reports
        let generated = self.generate(&Value::from(analysis.tempo), Some(&Value::from(key.index())));
        let Some(artifacts) = generated.payload else {
            return Response::err(generated.error.unwrap_or_else(|| GENERATION_FAILED.to_string()));
        };

        let played = self.play(
            Some(Path::new(&artifacts.beat)),
            Some(Path::new(&artifacts.piano)),
        );
        if let Some(error) = played.error {
            return Response::err(error);
        }

        Response::ok(RunPayload {
            analysis,
            artifacts,
        })
    }

    fn capture_features(&mut self) -> Result<(f32, PitchClass), String> {
        let capture = &self.config.capture;
        log::info!("Recording audio for {:.1} seconds", capture.duration_seconds);
        let buffer = capture
            .duration()
            .and_then(|duration| self.source.record(duration, capture.sample_rate))
            .map_err(|e| {
                log::error!("Capture failed: {}", e);
                e.to_string()
            })?;
        self.analyze_buffer(buffer, true)
    }

    fn analyze_buffer(
        &self,
        buffer: AudioBuffer,
        save_artifact: bool,
    ) -> Result<(f32, PitchClass), String> {
        let prepared = preprocess(buffer);

        if save_artifact {
            let path = self.config.artifacts.audio_path();
            if let Err(e) = write_wav(&path, prepared.samples(), prepared.sample_rate()) {
                log::warn!("Could not save normalized audio: {}", e);
            }
        }

        match extract_features(&prepared, &self.config.analysis) {
            FeatureOutcome::Detected(features) => match features.key {
                Some(key) => Ok((features.tempo, key)),
                None => Err(NO_MUSIC_DETECTED.to_string()),
            },
            FeatureOutcome::Undetermined(reason) => {
                log::warn!("No features determined: {}", reason);
                Err(NO_MUSIC_DETECTED.to_string())
            }
        }
    }
}

/// Whole BPM as reported to callers (non-finite counts as 0)
fn whole_bpm(tempo: f32) -> i64 {
    if tempo.is_finite() {
        tempo.trunc() as i64
    } else {
        0
    }
}
