/// Options of an offline render.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RenderConfig {
    /// If set to true, the output passes through a volume limiter before
    /// being written.
    ///
    /// Default: `false`
    pub use_limiter: bool,

    /// Frames rendered per block. Events always land on their exact frame,
    /// whatever the block size.
    ///
    /// Default: `512`
    pub block_frames: usize,

    /// How long rendering may continue after the last event while voices
    /// are still sounding, in seconds.
    ///
    /// Default: `10.0`
    pub max_tail_seconds: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            use_limiter: false,
            block_frames: 512,
            max_tail_seconds: 10.0,
        }
    }
}
