//! Caption Bridge: plays a SubRip file through the frame-synchronized caption driver.
//!
//! ## Pipeline
//! 1. **Decode**: a background thread releases SRT cues as overlay samples once the
//!    scripted playback clock reaches them.
//! 2. **Queue**: samples land in the sample queue the driver registered with the player.
//! 3. **Frame loop**: a fixed-rate tick calls the driver, which delivers at most one
//!    caption per frame and prints it.

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use caption_bridge::cli::{Args, Command};
use caption_bridge::config::{CaptionConfig, PauseWindow, PlayConfig};
use caption_bridge::runtime;

fn main() -> Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("info,caption_bridge=info,caption_player=info")
        }))
        .init();

    match args.cmd {
        Command::Play {
            path,
            rate,
            start_ms,
            pause_at_ms,
            resume_after_ms,
            status_json,
        } => runtime::run_play(PlayConfig {
            path,
            fps: args.fps,
            rate,
            start: Duration::from_millis(start_ms),
            pause: pause_at_ms.map(|at| PauseWindow {
                at: Duration::from_millis(at),
                resume_after: Duration::from_millis(resume_after_ms),
            }),
            status_json,
            install_ctrlc: true,
            captions: CaptionConfig {
                stats_log_interval_frames: args.stats_every,
                ..CaptionConfig::default()
            },
        }),
        Command::Cues { path } => runtime::run_cues(&path),
    }
}
