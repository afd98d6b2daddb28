use std::sync::Arc;

use thiserror::Error;

/// Channel mask matching all 16 MIDI channels.
pub const ALL_MIDI_CHANNELS: u16 = 0xFFFF;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SampleError {
    #[error("Sample {0} has no audio channels")]
    NoChannels(String),

    #[error("Sample {0} has {1} audio channels, only mono and stereo are supported")]
    UnsupportedChannelCount(String, usize),

    #[error("Sample {0} has audio channels of different lengths")]
    MismatchedChannels(String),

    #[error("Sample {0} is empty")]
    Empty(String),

    #[error("Sample {name} declares {length} frames but only {available} were decoded")]
    LengthOutOfRange {
        name: String,
        length: usize,
        available: usize,
    },

    #[error("Sample {0} has a sample rate of zero")]
    ZeroSampleRate(String),

    #[error("Sample {0} is assigned to MIDI note {1}, which is out of range")]
    NoteOutOfRange(String, u8),
}

/// An immutable decoded recording, assigned to one MIDI note.
///
/// Holds planar PCM (one buffer per channel), the native sample rate of that
/// PCM, and the number of frames that are valid for playback.
#[derive(Debug, Clone)]
pub struct SampleAsset {
    name: String,
    channels: Arc<[Arc<[f32]>]>,
    sample_rate: u32,
    note: u8,
    midi_channels: u16,
    length: usize,
}

impl SampleAsset {
    /// Creates a sample that plays `length` frames of `channels`.
    pub fn new(
        name: impl Into<String>,
        channels: Arc<[Arc<[f32]>]>,
        sample_rate: u32,
        note: u8,
        length: usize,
    ) -> Result<Self, SampleError> {
        let name = name.into();

        if note > 127 {
            return Err(SampleError::NoteOutOfRange(name, note));
        }
        if sample_rate == 0 {
            return Err(SampleError::ZeroSampleRate(name));
        }

        let available = match channels.len() {
            0 => return Err(SampleError::NoChannels(name)),
            1 | 2 => channels[0].len(),
            count => return Err(SampleError::UnsupportedChannelCount(name, count)),
        };
        if channels.iter().any(|c| c.len() != available) {
            return Err(SampleError::MismatchedChannels(name));
        }
        if length == 0 {
            return Err(SampleError::Empty(name));
        }
        if length > available {
            return Err(SampleError::LengthOutOfRange {
                name,
                length,
                available,
            });
        }

        Ok(Self {
            name,
            channels,
            sample_rate,
            note,
            midi_channels: ALL_MIDI_CHANNELS,
            length,
        })
    }

    /// Creates a sample that plays all of the decoded frames.
    pub fn from_vecs(
        name: impl Into<String>,
        channels: Vec<Vec<f32>>,
        sample_rate: u32,
        note: u8,
    ) -> Result<Self, SampleError> {
        let length = channels.first().map(|c| c.len()).unwrap_or(0);
        let channels: Arc<[Arc<[f32]>]> = channels.into_iter().map(Arc::from).collect();
        Self::new(name, channels, sample_rate, note, length)
    }

    /// Restricts the sample to the given MIDI channels (1-16).
    /// Channels outside that range are ignored.
    pub fn with_midi_channels(mut self, channels: &[u8]) -> Self {
        self.midi_channels = channels
            .iter()
            .filter(|c| (1..=16).contains(*c))
            .fold(0, |mask, c| mask | (1 << (c - 1)));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn note(&self) -> u8 {
        self.note
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of valid frames.
    pub fn length(&self) -> usize {
        self.length
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn is_stereo(&self) -> bool {
        self.channels.len() > 1
    }

    pub fn channel(&self, index: usize) -> Option<&Arc<[f32]>> {
        self.channels.get(index)
    }

    #[inline(always)]
    pub fn applies_to_note(&self, note: u8) -> bool {
        self.note == note
    }

    #[inline(always)]
    pub fn applies_to_channel(&self, channel: u8) -> bool {
        (1..=16).contains(&channel) && self.midi_channels & (1 << (channel - 1)) != 0
    }

    #[inline(always)]
    pub fn applies_to(&self, note: u8, channel: u8) -> bool {
        self.applies_to_note(note) && self.applies_to_channel(channel)
    }
}
