use thiserror::Error;

use crate::{
    kit::{SampleAsset, MAX_VARIATIONS, MAX_VELOCITY_LAYERS},
    params::MicrophoneControls,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegisterError {
    #[error("MIDI note {0} is out of range")]
    NoteOutOfRange(u8),

    #[error("Sample {name} applies to note {sample_note} but was registered for note {note}")]
    NoteMismatch {
        name: String,
        note: u8,
        sample_note: u8,
    },

    #[error("Choke target {target} of note {note} is out of range")]
    ChokeTargetOutOfRange { note: u8, target: u8 },

    #[error("Velocity layer {index} of sample {name} is out of range")]
    LayerIndexOutOfRange { name: String, index: usize },

    #[error("Variation {index} of sample {name} is out of range")]
    VariationIndexOutOfRange { name: String, index: usize },

    #[error("Sample {name} is at {sample_rate}Hz but the stream runs at {stream_rate}Hz")]
    SampleRateMismatch {
        name: String,
        sample_rate: u32,
        stream_rate: u32,
    },
}

/// Everything needed to add one microphone channel to a kit.
#[derive(Debug, Clone)]
pub struct SampleRegistration {
    pub note: u8,
    pub velocity_index: usize,
    pub variation_index: usize,

    /// Replaces the choke list of the note's instrument.
    pub choke_targets: Vec<u8>,

    /// Microphone id, selects the mix bus.
    pub microphone: String,

    pub sample: SampleAsset,

    /// Live gain, pan and phase controls of the channel.
    pub controls: MicrophoneControls,
}

impl SampleRegistration {
    /// A registration on the first layer and variation of the sample's note,
    /// with no chokes and neutral controls.
    pub fn new(sample: SampleAsset, microphone: impl Into<String>) -> Self {
        Self {
            note: sample.note(),
            velocity_index: 0,
            variation_index: 0,
            choke_targets: Vec::new(),
            microphone: microphone.into(),
            sample,
            controls: MicrophoneControls::default(),
        }
    }

    pub fn velocity_index(mut self, index: usize) -> Self {
        self.velocity_index = index;
        self
    }

    pub fn variation_index(mut self, index: usize) -> Self {
        self.variation_index = index;
        self
    }

    pub fn choke_targets(mut self, targets: &[u8]) -> Self {
        self.choke_targets = targets.to_vec();
        self
    }

    pub fn controls(mut self, controls: MicrophoneControls) -> Self {
        self.controls = controls;
        self
    }

    pub(crate) fn validate(&self, stream_rate: u32) -> Result<(), RegisterError> {
        let name = || self.sample.name().to_owned();

        if self.note > 127 {
            return Err(RegisterError::NoteOutOfRange(self.note));
        }
        if !self.sample.applies_to_note(self.note) {
            return Err(RegisterError::NoteMismatch {
                name: name(),
                note: self.note,
                sample_note: self.sample.note(),
            });
        }
        if let Some(&target) = self.choke_targets.iter().find(|t| **t > 127) {
            return Err(RegisterError::ChokeTargetOutOfRange {
                note: self.note,
                target,
            });
        }
        if self.velocity_index >= MAX_VELOCITY_LAYERS {
            return Err(RegisterError::LayerIndexOutOfRange {
                name: name(),
                index: self.velocity_index,
            });
        }
        if self.variation_index >= MAX_VARIATIONS {
            return Err(RegisterError::VariationIndexOutOfRange {
                name: name(),
                index: self.variation_index,
            });
        }
        if self.sample.sample_rate() != stream_rate {
            return Err(RegisterError::SampleRateMismatch {
                name: name(),
                sample_rate: self.sample.sample_rate(),
                stream_rate,
            });
        }
        Ok(())
    }
}
