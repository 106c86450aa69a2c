//! External synthesis engines
//!
//! The orchestrator only needs to start a process that plays one artifact
//! and exits when done. Everything else (waiting, termination) is handled
//! through the returned [`Child`].

use crate::config::PlaybackConfig;
use crate::error::HarmonyError;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

/// Starts a process that renders one artifact to audio
pub trait SynthEngine: Send + Sync + 'static {
    /// Spawn a process playing `artifact` once
    fn spawn(&self, artifact: &Path) -> Result<Child, HarmonyError>;

    /// Short name for logs
    fn name(&self) -> &str {
        "synth"
    }
}

/// FluidSynth command-line player
///
/// Runs `fluidsynth -ni [-a <driver>] [extra args...] <soundfont> <file>`.
#[derive(Debug, Clone)]
pub struct FluidSynth {
    /// Executable path or name
    pub program: PathBuf,
    /// SoundFont file
    pub soundfont: PathBuf,
    /// Audio driver override
    pub audio_driver: Option<String>,
    /// Extra arguments placed before the soundfont
    pub extra_args: Vec<String>,
}

impl FluidSynth {
    /// Build from playback configuration
    pub fn from_config(config: &PlaybackConfig) -> Self {
        Self {
            program: config.synth_program.clone(),
            soundfont: config.soundfont.clone(),
            audio_driver: config.audio_driver.clone(),
            extra_args: config.extra_args.clone(),
        }
    }

    /// Command-line arguments for playing `artifact`
    pub fn args(&self, artifact: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-ni".into()];
        if let Some(driver) = &self.audio_driver {
            args.push("-a".into());
            args.push(driver.into());
        }
        args.extend(self.extra_args.iter().map(OsString::from));
        args.push(self.soundfont.clone().into_os_string());
        args.push(artifact.as_os_str().to_owned());
        args
    }
}

impl SynthEngine for FluidSynth {
    fn spawn(&self, artifact: &Path) -> Result<Child, HarmonyError> {
        log::debug!(
            "Spawning {} for {}",
            self.program.display(),
            artifact.display()
        );
        Command::new(&self.program)
            .args(self.args(artifact))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                HarmonyError::Playback(format!(
                    "Failed to start {}: {}",
                    self.program.display(),
                    e
                ))
            })
    }

    fn name(&self) -> &str {
        "fluidsynth"
    }
}
