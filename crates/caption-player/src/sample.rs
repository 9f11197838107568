use std::sync::Arc;
use std::time::Duration;

pub use caption_types::OverlayKind;

/// One timestamped unit of caption text produced by the decode pipeline.
///
/// Samples are immutable once built; the pipeline and the consumer share them via
/// [`SharedSample`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OverlaySample {
    time: Duration,
    duration: Option<Duration>,
    text: String,
    kind: OverlayKind,
}

/// Reference-counted handle passed from producer to consumer.
pub type SharedSample = Arc<OverlaySample>;

impl OverlaySample {
    /// A caption sample with no duration that shows `text` at `time`.
    pub fn new(time: Duration, text: impl Into<String>) -> Self {
        Self {
            time,
            duration: None,
            text: text.into(),
            kind: OverlayKind::default(),
        }
    }

    /// Attach an on-screen duration.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Override the default [`OverlayKind::Caption`].
    pub fn with_kind(mut self, kind: OverlayKind) -> Self {
        self.kind = kind;
        self
    }

    /// Presentation time relative to the start of the stream.
    pub fn time(&self) -> Duration {
        self.time
    }

    /// How long the text stays on screen, when the container says so.
    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    /// Caption text; empty clears the overlay.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Category of overlay the text belongs to.
    pub fn kind(&self) -> OverlayKind {
        self.kind
    }

    /// Wrap in an `Arc` for handing to sample queues.
    pub fn into_shared(self) -> SharedSample {
        Arc::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_to_caption_without_duration() {
        let sample = OverlaySample::new(Duration::from_millis(1500), "hello");
        assert_eq!(sample.time(), Duration::from_millis(1500));
        assert_eq!(sample.text(), "hello");
        assert_eq!(sample.duration(), None);
        assert_eq!(sample.kind(), OverlayKind::Caption);
    }

    #[test]
    fn builder_sets_duration_and_kind() {
        let sample = OverlaySample::new(Duration::ZERO, "bonjour")
            .with_duration(Duration::from_secs(2))
            .with_kind(OverlayKind::Subtitle);
        assert_eq!(sample.duration(), Some(Duration::from_secs(2)));
        assert_eq!(sample.kind(), OverlayKind::Subtitle);
    }
}
