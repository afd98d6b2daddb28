/// Number of interleaved audio channels in a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChannelCount {
    Mono,
    Stereo,
}

impl ChannelCount {
    pub fn count(&self) -> u16 {
        match self {
            ChannelCount::Mono => 1,
            ChannelCount::Stereo => 2,
        }
    }

    pub fn from_count(count: u16) -> Option<Self> {
        match count {
            1 => Some(ChannelCount::Mono),
            2 => Some(ChannelCount::Stereo),
            _ => None,
        }
    }
}

impl From<u16> for ChannelCount {
    /// Anything other than a single channel is treated as stereo.
    fn from(value: u16) -> Self {
        if value == 1 {
            ChannelCount::Mono
        } else {
            ChannelCount::Stereo
        }
    }
}

/// Parameters of the output audio stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AudioStreamParams {
    pub sample_rate: u32,
    pub channels: ChannelCount,
}

impl AudioStreamParams {
    pub fn new(sample_rate: u32, channels: ChannelCount) -> Self {
        Self {
            sample_rate,
            channels,
        }
    }

    /// Converts a frame count to a sample count for interleaved buffers.
    pub fn frames_to_samples(&self, frames: usize) -> usize {
        frames * self.channels.count() as usize
    }
}
