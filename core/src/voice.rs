mod envelopes;
pub use envelopes::*;

mod sampler;
pub use sampler::*;

mod rendering;
pub use rendering::*;

/// How a voice should be released.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ReleaseType {
    /// Standard release. The envelope moves to its release stage and the
    /// voice keeps sounding until the tail has finished.
    Standard,

    /// Silences the voice instantly: the envelope returns to idle and the
    /// playback position is rewound. Used by chokes and retriggers.
    Kill,
}
