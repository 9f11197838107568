//! Scripted caption producer.
//!
//! Stands in for a media player: a wall-clock driven playback position plus a decode
//! thread that releases SRT cues as overlay samples once playback reaches them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use caption_player::queue::SampleQueue;
use caption_player::sample::{OverlaySample, SharedSample};
use caption_player::source::{CaptionSinks, CaptionSource};

use crate::srt::Cue;

const DECODE_POLL: Duration = Duration::from_millis(5);

/// Playback position derived from an anchor instant and a rate.
#[derive(Debug)]
struct Clock {
    anchor: Instant,
    base: Duration,
    rate: f32,
}

impl Clock {
    fn now(&self) -> Duration {
        let elapsed = self.anchor.elapsed().mul_f32(self.rate.abs());
        if self.rate >= 0.0 {
            self.base.saturating_add(elapsed)
        } else {
            self.base.saturating_sub(elapsed)
        }
    }

    fn rebase(&mut self, rate: f32) {
        self.base = self.now();
        self.anchor = Instant::now();
        self.rate = rate;
    }
}

/// Which way the playback clock runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Reverse,
}

impl Direction {
    /// Negative rates run backwards; everything else runs forwards.
    pub fn of_rate(rate: f32) -> Self {
        if rate < 0.0 { Self::Reverse } else { Self::Forward }
    }

    /// Whether a clock at `now` has reached `target` when moving this way.
    pub fn reached(self, now: Duration, target: Duration) -> bool {
        match self {
            Self::Forward => now >= target,
            Self::Reverse => now <= target,
        }
    }
}

/// Player facade that exposes a scripted timeline to the caption driver.
#[derive(Debug)]
pub struct ScriptedPlayer {
    clock: Mutex<Clock>,
    sinks: CaptionSinks,
}

impl ScriptedPlayer {
    pub fn new(start: Duration, rate: f32) -> Self {
        let rate = if rate.is_finite() { rate } else { 1.0 };
        Self {
            clock: Mutex::new(Clock {
                anchor: Instant::now(),
                base: start,
                rate,
            }),
            sinks: CaptionSinks::new(),
        }
    }

    /// Change the rate without jumping the position; `0.0` pauses.
    pub fn set_rate(&self, rate: f32) {
        if !rate.is_finite() {
            tracing::warn!(rate, "ignoring non-finite playback rate");
            return;
        }
        self.lock_clock().rebase(rate);
    }

    pub fn pause(&self) {
        self.set_rate(0.0);
    }

    /// Push a sample to every registered caption sink.
    pub fn deliver(&self, sample: &SharedSample) -> usize {
        self.sinks.deliver(sample)
    }

    fn lock_clock(&self) -> std::sync::MutexGuard<'_, Clock> {
        self.clock.lock().unwrap_or_else(|err| err.into_inner())
    }
}

impl CaptionSource for ScriptedPlayer {
    fn register_sink(&self, sink: Arc<SampleQueue>) {
        tracing::debug!("caption sink registered");
        self.sinks.add(&sink);
    }

    fn rate(&self) -> f32 {
        self.lock_clock().rate
    }

    fn time(&self) -> Duration {
        self.lock_clock().now()
    }
}

/// Build the overlay sample timeline for `cues` in the order `direction` meets them.
///
/// Going forward each cue shows its text at `show_at` and is cleared with an empty sample
/// at `hide_at`; in reverse it is entered at `hide_at` and cleared at `show_at`. Events
/// the clock has already passed at `from` are skipped.
pub fn overlay_timeline(cues: &[Cue], from: Duration, direction: Direction) -> Vec<SharedSample> {
    let mut samples: Vec<SharedSample> = cues
        .iter()
        .flat_map(|cue| {
            let (enter, leave) = match direction {
                Direction::Forward => (cue.show_at, cue.hide_at),
                Direction::Reverse => (cue.hide_at, cue.show_at),
            };
            let show = OverlaySample::new(enter, cue.joined_text())
                .with_duration(cue.duration())
                .into_shared();
            let clear = OverlaySample::new(leave, "").into_shared();
            [show, clear]
        })
        .filter(|s| direction.reached(s.time(), from))
        .collect();
    match direction {
        Direction::Forward => samples.sort_by_key(|s| s.time()),
        Direction::Reverse => samples.sort_by_key(|s| std::cmp::Reverse(s.time())),
    }
    samples
}

/// Spawn the decode thread. It returns the number of samples pushed into sinks.
///
/// `samples` must be ordered for `direction`, as [`overlay_timeline`] returns them. The
/// thread exits once every sample is out or `cancel` is set.
pub fn spawn_decoder(
    player: Arc<ScriptedPlayer>,
    samples: Vec<SharedSample>,
    direction: Direction,
    cancel: Arc<AtomicBool>,
) -> JoinHandle<usize> {
    std::thread::spawn(move || {
        let mut pushed = 0usize;
        for sample in samples {
            while !direction.reached(player.time(), sample.time()) {
                if cancel.load(Ordering::Relaxed) {
                    tracing::debug!(pushed, "decoder cancelled");
                    return pushed;
                }
                std::thread::sleep(DECODE_POLL);
            }
            if cancel.load(Ordering::Relaxed) {
                return pushed;
            }
            let reached = player.deliver(&sample);
            if reached == 0 {
                tracing::debug!(
                    time_ms = sample.time().as_millis() as u64,
                    "no caption sink; sample dropped"
                );
            }
            pushed += 1;
        }
        tracing::debug!(pushed, "decoder finished");
        pushed
    })
}
