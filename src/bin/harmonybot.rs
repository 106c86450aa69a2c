//! harmonybot - listen, analyze, and play along
//!
//! Subcommands:
//! - `harmonybot run` - Record, analyze, generate and loop playback until Enter
//! - `harmonybot analyze [--file PATH]` - Tempo and key of a recording or file
//! - `harmonybot generate --tempo T [--key K]` - Write the beat and progression MIDI files
//! - `harmonybot play --beat B --piano P` - Loop two MIDI files until Enter

use clap::{Parser, Subcommand};
use harmonybot::session::{Response, Session};
use harmonybot::SessionConfig;
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::io::BufRead;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "harmonybot")]
#[command(about = "Detect tempo and key from live audio and play along")]
#[command(version)]
struct Cli {
    /// JSON session configuration (any subset of fields)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// FluidSynth executable
    #[arg(long, env = "HARMONYBOT_FLUIDSYNTH", global = true)]
    fluidsynth: Option<PathBuf>,

    /// SoundFont for playback
    #[arg(long, env = "HARMONYBOT_SOUNDFONT", global = true)]
    soundfont: Option<PathBuf>,

    /// Directory for generated files
    #[arg(long, global = true)]
    work_dir: Option<PathBuf>,

    /// Print responses as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record, analyze, generate and play until Enter is pressed
    Run,

    /// Analyze a recording from the microphone, or an audio file
    Analyze {
        /// Audio file to analyze instead of recording
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Generate the beat and chord progression MIDI files
    Generate {
        /// Tempo in BPM (number, numeric string or JSON array)
        #[arg(short, long)]
        tempo: String,

        /// Key index 0-11 (anything else falls back to C)
        #[arg(short, long)]
        key: Option<String>,
    },

    /// Loop two MIDI files until Enter is pressed
    Play {
        /// Drum beat MIDI file
        #[arg(long)]
        beat: PathBuf,

        /// Chord progression MIDI file
        #[arg(long)]
        piano: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let mut session = Session::with_device(config);

    let success = match cli.command {
        Commands::Run => {
            let response = session.run();
            let ok = report(&response, cli.json);
            if ok {
                wait_for_enter()?;
                report(&session.stop(), cli.json);
            }
            ok
        }
        Commands::Analyze { file } => {
            let response = match file {
                Some(path) => session.analyze_file(&path),
                None => session.capture_and_analyze(),
            };
            report(&response, cli.json)
        }
        Commands::Generate { tempo, key } => {
            let tempo = parse_loose(&tempo);
            let key = key.as_deref().map(parse_loose);
            report(&session.generate(&tempo, key.as_ref()), cli.json)
        }
        Commands::Play { beat, piano } => {
            let ok = report(&session.play(Some(&beat), Some(&piano)), cli.json);
            if ok {
                wait_for_enter()?;
                report(&session.stop(), cli.json);
            }
            ok
        }
    };

    if !success {
        std::process::exit(1);
    }
    Ok(())
}

fn load_config(cli: &Cli) -> Result<SessionConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .map_err(|e| format!("Cannot read config {}: {}", path.display(), e))?;
            serde_json::from_str(&text)
                .map_err(|e| format!("Invalid config {}: {}", path.display(), e))?
        }
        None => SessionConfig::default(),
    };

    if let Some(program) = &cli.fluidsynth {
        config.playback.synth_program = program.clone();
    }
    if let Some(soundfont) = &cli.soundfont {
        config.playback.soundfont = soundfont.clone();
    }
    if let Some(dir) = &cli.work_dir {
        config.artifacts.work_dir = dir.clone();
    }
    Ok(config)
}

/// JSON if the argument parses as JSON, else the raw string
fn parse_loose(arg: &str) -> Value {
    serde_json::from_str(arg).unwrap_or_else(|_| Value::String(arg.to_string()))
}

/// Print a response; returns whether it succeeded
fn report<T: Serialize>(response: &Response<T>, json: bool) -> bool {
    if json {
        println!("{}", response.to_json());
    } else if response.success {
        if let Ok(Value::Object(fields)) = serde_json::to_value(response) {
            for (name, value) in fields.iter().filter(|(name, _)| *name != "success") {
                match value {
                    Value::String(s) => println!("{}: {}", name, s),
                    other => println!("{}: {}", name, other),
                }
            }
        }
    } else {
        eprintln!(
            "Error: {}",
            response.error.as_deref().unwrap_or("unknown error")
        );
    }
    response.success
}

fn wait_for_enter() -> std::io::Result<()> {
    println!("Press Enter to stop playback...");
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(())
}
