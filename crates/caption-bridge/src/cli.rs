use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "caption-bridge", version)]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,

    /// Display frames per second for the caption loop
    #[arg(long, default_value_t = 60.0)]
    pub fps: f64,

    /// Log a status line every N frames (0 disables)
    #[arg(long, default_value_t = 0)]
    pub stats_every: u64,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play an SRT file through the caption driver, printing captions as they are delivered
    Play {
        /// Path to a SubRip subtitle file
        path: PathBuf,

        /// Playback rate (non-zero; negative plays backwards)
        #[arg(long, default_value_t = 1.0, allow_negative_numbers = true)]
        rate: f32,

        /// Start position in milliseconds
        #[arg(long, default_value_t = 0)]
        start_ms: u64,

        /// Pause when playback reaches this position (milliseconds)
        #[arg(long)]
        pause_at_ms: Option<u64>,

        /// How long to stay paused, in wall-clock milliseconds
        #[arg(long, default_value_t = 1000)]
        resume_after_ms: u64,

        /// Print the final driver status as JSON
        #[arg(long)]
        status_json: bool,
    },

    /// Parse an SRT file and list its cues
    Cues {
        /// Path to a SubRip subtitle file
        path: PathBuf,
    },
}
