use serde::{Deserialize, Serialize};

/// Category of an overlay sample produced by the decode pipeline.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OverlayKind {
    /// Closed captions (dialog plus sound cues).
    #[default]
    Caption,
    /// Subtitles (dialog only, usually translated).
    Subtitle,
    /// Generic timed text.
    Text,
}

/// Point-in-time view of a caption consumer, for logs and host UIs.
///
/// Fields are read from independent atomics, so a snapshot taken while the
/// frame thread is ticking may mix values from adjacent frames.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct CaptionStatus {
    /// `true` when the consumer is active and ticking.
    pub active: bool,
    /// `true` when a sample queue is currently registered with a producer.
    pub bound: bool,
    /// Cached playback rate; `0.0` when paused, stopped or unbound.
    pub rate: f32,
    /// Cached playback position in milliseconds.
    pub time_ms: u64,
    /// Presentation time of the last delivered caption, if playback is live.
    pub last_sample_ms: Option<u64>,
    /// Samples still waiting in the bound queue.
    pub queued: usize,
    /// Queue depth right after the most recent delivery.
    pub queued_at_last_delivery: usize,
    /// Captions delivered since the consumer was created.
    pub delivered: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlay_kind_serializes_snake_case() {
        let json = serde_json::to_string(&OverlayKind::Subtitle).unwrap();
        assert_eq!(json, "\"subtitle\"");
        let back: OverlayKind = serde_json::from_str("\"text\"").unwrap();
        assert_eq!(back, OverlayKind::Text);
    }

    #[test]
    fn caption_status_omits_nothing_when_idle() {
        let status = CaptionStatus::default();
        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(value["active"], false);
        assert_eq!(value["bound"], false);
        assert!(value["last_sample_ms"].is_null());
        assert_eq!(value["queued"], 0);
        assert_eq!(value["queued_at_last_delivery"], 0);
    }
}
