use std::path::PathBuf;
use std::time::Duration;

pub use caption_player::config::CaptionConfig;

/// Pause playback once it reaches `at`, then resume after `resume_after` of wall time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PauseWindow {
    pub at: Duration,
    pub resume_after: Duration,
}

#[derive(Clone, Debug)]
pub struct PlayConfig {
    pub path: PathBuf,
    pub fps: f64,
    pub rate: f32,
    pub start: Duration,
    pub pause: Option<PauseWindow>,
    pub status_json: bool,
    /// Route Ctrl-C to a clean shutdown of the frame loop.
    pub install_ctrlc: bool,
    pub captions: CaptionConfig,
}

impl PlayConfig {
    /// Frame period for `fps`, clamped to 1..=1000 frames per second.
    pub fn frame_interval(&self) -> Duration {
        let fps = if self.fps.is_finite() { self.fps.clamp(1.0, 1000.0) } else { 60.0 };
        Duration::from_secs_f64(1.0 / fps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(fps: f64) -> PlayConfig {
        PlayConfig {
            path: PathBuf::from("x.srt"),
            fps,
            rate: 1.0,
            start: Duration::ZERO,
            pause: None,
            status_json: false,
            install_ctrlc: false,
            captions: CaptionConfig::default(),
        }
    }

    #[test]
    fn frame_interval_matches_fps() {
        assert_eq!(config(50.0).frame_interval(), Duration::from_millis(20));
    }

    #[test]
    fn frame_interval_clamps_bad_fps() {
        assert_eq!(config(0.0).frame_interval(), Duration::from_secs(1));
        assert_eq!(config(f64::NAN).frame_interval(), Duration::from_secs_f64(1.0 / 60.0));
        assert_eq!(config(1e9).frame_interval(), Duration::from_millis(1));
    }
}
