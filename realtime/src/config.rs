/// Options for opening a `RealtimeDrumSynth`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RealtimeConfig {
    /// The longest block rendered in one go, in milliseconds. Device buffers
    /// longer than this are rendered in several blocks, and render buffers
    /// are reserved for this length up front.
    ///
    /// Default: `10.0`
    pub render_window_ms: f64,

    /// How many events can wait for the next audio block. Events sent while
    /// the queue is full are dropped.
    ///
    /// Default: `1024`
    pub event_queue_capacity: usize,

    /// If set to true, the output passes through a volume limiter before
    /// reaching the device.
    ///
    /// Default: `false`
    pub use_limiter: bool,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            render_window_ms: 10.0,
            event_queue_capacity: 1024,
            use_limiter: false,
        }
    }
}

impl RealtimeConfig {
    /// The render window in frames at the given sample rate, at least one.
    pub fn render_window_frames(&self, sample_rate: u32) -> usize {
        ((sample_rate as f64 * self.render_window_ms / 1000.0) as usize).max(1)
    }
}
