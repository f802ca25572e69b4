// Commandline argument parser using clap for the radar binary

use crate::channel::Channel;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Headless 7.1 audio radar: feeds an audio source through the
/// direction pipeline and logs what the radar sees.
#[derive(Debug, Parser, Clone)]
#[clap(version, about)]
pub struct RadarArgs {
    #[command(subcommand)]
    /// Where the audio comes from, a WAV file or a synthesized scene
    pub command: InputTask,

    /// Path to the RON config file; written with defaults if missing
    #[arg(short = 'c', long = "config", default_value = "soundscope.ron")]
    pub config: PathBuf,

    /// Stop after this many seconds instead of running until the source drains
    #[arg(short = 'd', long = "duration")]
    pub duration: Option<f32>,

    /// Seconds between radar summary log lines
    #[arg(short = 'l', long = "log-every", default_value_t = 1.0)]
    pub log_every: f32,
}

/// The available audio inputs.
#[derive(Debug, Subcommand, Clone)]
pub enum InputTask {
    /// Replay a multichannel WAV file through the radar
    #[command(about)]
    Wav(WavCommand),

    /// Synthesize a test scene instead of reading a file
    #[command(about)]
    Synth(SynthCommand),
}

/// Arguments for WAV playback.
#[derive(Debug, Args, Clone)]
#[command(version, about)]
pub struct WavCommand {
    /// The 8-channel 16-bit PCM WAV file to replay
    #[arg(short = 'f', long = "file")]
    pub file: PathBuf,
}

/// Arguments for the synthetic scene generator.
#[derive(Debug, Args, Clone)]
#[command(version, about)]
pub struct SynthCommand {
    /// Which scene to play
    #[arg(short = 's', long = "scene", value_enum, default_value = "rotating")]
    pub scene: SceneKind,

    /// Channel for the single-channel scene (FL, FR, C, LFE, RL, RR, SL, SR)
    #[arg(long = "channel", default_value = "FL")]
    pub channel: Channel,

    /// Target RMS level of the generated tone
    #[arg(short = 'g', long = "level", default_value_t = 0.5)]
    pub level: f32,

    /// Seconds per revolution for the rotating scene
    #[arg(short = 'p', long = "period", default_value_t = 6.0)]
    pub period: f32,
}

/// Scene names for the commandline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SceneKind {
    /// All channels silent
    Silence,
    /// A steady tone on one channel
    Single,
    /// A tone sweeping around the listener
    Rotating,
    /// Equal tones on both sides, cancelling directionally
    Opposing,
}
