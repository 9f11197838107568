/// Tuning knobs for a caption consumer.
#[derive(Clone, Debug)]
pub struct CaptionConfig {
    /// Activate automatically when the host registers the consumer.
    pub auto_activate: bool,
    /// Initial capacity reserved by each new sample queue.
    pub queue_capacity_hint: usize,
    /// Emit a debug status line every N ticks; `0` disables it.
    pub stats_log_interval_frames: u64,
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            auto_activate: true,
            queue_capacity_hint: 16,
            stats_log_interval_frames: 0,
        }
    }
}
