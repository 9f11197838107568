//! Caption bridge runtime.
//!
//! Wires a scripted player, its decode thread and the caption driver together, then runs
//! the frame loop until the script is exhausted or the user interrupts.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow, bail};
use caption_player::driver::CaptionDriver;
use caption_player::source::CaptionSource;
use caption_types::CaptionStatus;

use crate::config::{PauseWindow, PlayConfig};
use crate::player::{self, Direction, ScriptedPlayer};
use crate::srt;

/// Parse and print the cues of an SRT file.
pub fn run_cues(path: &Path) -> Result<()> {
    let cues = load_cues(path)?;
    for cue in &cues {
        println!(
            "{:>4}  {} --> {}  {}",
            cue.index,
            srt::format_timestamp(cue.show_at),
            srt::format_timestamp(cue.hide_at),
            cue.text.join(" / ")
        );
    }
    Ok(())
}

/// Play `config.path` through the caption driver, optionally printing the final status.
pub fn run_play(config: PlayConfig) -> Result<()> {
    let status = play(&config)?;
    if config.status_json {
        println!(
            "{}",
            serde_json::to_string_pretty(&status).context("encode status")?
        );
    }
    Ok(())
}

fn play(config: &PlayConfig) -> Result<CaptionStatus> {
    if !config.rate.is_finite() || config.rate == 0.0 {
        bail!("playback rate must be finite and non-zero, got {}", config.rate);
    }
    let direction = Direction::of_rate(config.rate);
    let cues = load_cues(&config.path)?;
    let samples = player::overlay_timeline(&cues, config.start, direction);
    tracing::info!(
        cues = cues.len(),
        samples = samples.len(),
        start_ms = config.start.as_millis() as u64,
        rate = config.rate,
        "subtitle script loaded"
    );

    let scripted = Arc::new(ScriptedPlayer::new(config.start, config.rate));
    let driver = CaptionDriver::new(config.captions.clone());
    {
        let clock = scripted.clone();
        driver.on_new_caption_text(move |text| print_caption(&clock, text));
    }
    driver.set_producer(&scripted);
    driver.register();
    // Bind before the decoder starts so the earliest cues already have a sink.
    driver.refresh_binding();

    let cancel = Arc::new(AtomicBool::new(false));
    let decoder = player::spawn_decoder(scripted.clone(), samples, direction, cancel.clone());

    let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(1);
    if config.install_ctrlc {
        let handler_tx = stop_tx.clone();
        ctrlc::set_handler(move || {
            let _ = handler_tx.try_send(());
        })
        .context("install ctrl-c handler")?;
    }

    let ticker = crossbeam_channel::tick(config.frame_interval());
    let mut pause = config.pause.map(PauseSchedule::new);
    loop {
        crossbeam_channel::select! {
            recv(ticker) -> _ => {}
            recv(stop_rx) -> _ => {
                tracing::info!("interrupted; stopping frame loop");
                break;
            }
        }
        if let Some(schedule) = pause.as_mut() {
            schedule.apply(&scripted, config.rate);
        }
        driver.tick();
        if decoder.is_finished() && driver.status().queued == 0 {
            break;
        }
    }
    drop(stop_tx);

    cancel.store(true, Ordering::Relaxed);
    let pushed = decoder
        .join()
        .map_err(|_| anyhow!("decoder thread panicked"))?;
    let status = driver.status();
    driver.deactivate();
    tracing::info!(
        pushed,
        delivered = status.delivered,
        "caption playback finished"
    );
    Ok(status)
}

fn load_cues(path: &Path) -> Result<Vec<srt::Cue>> {
    let input = std::fs::read_to_string(path)
        .with_context(|| format!("read subtitles {}", path.display()))?;
    srt::parse_srt(&input).with_context(|| format!("parse subtitles {}", path.display()))
}

fn print_caption(player: &ScriptedPlayer, text: &str) {
    let at = srt::format_timestamp(player.time());
    if text.is_empty() {
        println!("[{at}] (clear)");
    } else {
        println!("[{at}] {}", text.replace('\n', " / "));
    }
}

/// Pause/resume script applied on frame boundaries.
#[derive(Debug)]
enum PauseSchedule {
    Waiting(PauseWindow),
    Paused { since: Instant, resume_after: Duration },
    Done,
}

impl PauseSchedule {
    fn new(window: PauseWindow) -> Self {
        Self::Waiting(window)
    }

    fn apply(&mut self, player: &ScriptedPlayer, resume_rate: f32) {
        match *self {
            Self::Waiting(window) => {
                if Direction::of_rate(resume_rate).reached(player.time(), window.at) {
                    player.pause();
                    tracing::info!(at_ms = window.at.as_millis() as u64, "playback paused");
                    *self = Self::Paused {
                        since: Instant::now(),
                        resume_after: window.resume_after,
                    };
                }
            }
            Self::Paused {
                since,
                resume_after,
            } => {
                if since.elapsed() >= resume_after {
                    player.set_rate(resume_rate);
                    tracing::info!(rate = resume_rate, "playback resumed");
                    *self = Self::Done;
                }
            }
            Self::Done => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CaptionConfig;
    use std::path::PathBuf;

    fn write_script(name: &str, body: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "caption-bridge-{name}-{}.srt",
            std::process::id()
        ));
        std::fs::write(&path, body).expect("write temp srt");
        path
    }

    fn play_config(path: PathBuf) -> PlayConfig {
        PlayConfig {
            path,
            fps: 500.0,
            rate: 1.0,
            start: Duration::ZERO,
            pause: None,
            status_json: false,
            install_ctrlc: false,
            captions: CaptionConfig::default(),
        }
    }

    #[test]
    fn plays_script_to_completion() {
        let path = write_script(
            "complete",
            "1\n00:00:00,000 --> 00:00:00,030\nfirst\n\n2\n00:00:00,040 --> 00:00:00,060\nsecond\n",
        );
        let status = play(&play_config(path.clone())).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(status.delivered, 4);
        assert_eq!(status.queued, 0);
        assert!(status.bound);
    }

    #[test]
    fn start_offset_skips_earlier_cues() {
        let path = write_script(
            "offset",
            "1\n00:00:00,000 --> 00:00:00,010\nskipped\n\n2\n00:00:05,000 --> 00:00:05,020\nkept\n",
        );
        let mut config = play_config(path.clone());
        config.start = Duration::from_millis(4_990);
        let status = play(&config).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(status.delivered, 2);
    }

    #[test]
    fn pause_window_holds_then_resumes() {
        let path = write_script("pause", "1\n00:00:00,020 --> 00:00:00,040\nafter pause\n");
        let mut config = play_config(path.clone());
        config.pause = Some(PauseWindow {
            at: Duration::from_millis(5),
            resume_after: Duration::from_millis(30),
        });
        let started = Instant::now();
        let status = play(&config).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(status.delivered, 2);
        assert!(started.elapsed() >= Duration::from_millis(60));
    }

    #[test]
    fn reverse_rate_plays_back_to_earlier_cues() {
        let path = write_script(
            "reverse",
            "1\n00:00:00,200 --> 00:00:00,400\nback\n\n2\n00:00:02,000 --> 00:00:02,100\nahead\n",
        );
        let mut config = play_config(path.clone());
        config.start = Duration::from_secs(1);
        config.rate = -10.0;
        let status = play(&config).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(status.delivered, 2);
        assert_eq!(status.last_sample_ms, Some(200));
    }

    #[test]
    fn zero_or_non_finite_rate_is_rejected() {
        let path = write_script("stalled", "1\n00:00:02,000 --> 00:00:03,000\nnever\n");
        for rate in [0.0, f32::NAN, f32::INFINITY] {
            let mut config = play_config(path.clone());
            config.rate = rate;
            let err = play(&config).unwrap_err();
            assert!(format!("{err:#}").contains("non-zero"), "{err:#}");
        }
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = run_cues(Path::new("/definitely/not/here.srt")).unwrap_err();
        assert!(format!("{err:#}").contains("not/here.srt"));
    }

    #[test]
    fn pause_schedule_walks_through_states() {
        let player = ScriptedPlayer::new(Duration::from_secs(1), 1.0);
        let mut schedule = PauseSchedule::new(PauseWindow {
            at: Duration::from_millis(500),
            resume_after: Duration::ZERO,
        });

        schedule.apply(&player, 1.0);
        assert!(matches!(schedule, PauseSchedule::Paused { .. }));
        schedule.apply(&player, 2.0);
        assert!(matches!(schedule, PauseSchedule::Done));
        assert_eq!(player.rate(), 2.0);
    }
}
