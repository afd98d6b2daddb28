use std::path::PathBuf;

use crate::{
    params::{NormalisableRange, DEFAULT_GAIN_RANGE, DEFAULT_PAN_RANGE},
    voice::EnvelopeDescriptor,
};

/// Defines how many threads decode sample files while a kit loads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum ThreadCount {
    /// Decode every file on the calling thread.
    None,

    /// Decode in rayon's global thread pool.
    Auto,

    /// Decode in a dedicated pool with the specified thread count.
    Manual(usize),
}

/// Options applied to every voice of a kit.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct KitInitOptions {
    /// The envelope every voice plays with.
    ///
    /// Default: a flat one-shot envelope (no attack, full sustain, no release)
    pub envelope: EnvelopeDescriptor,

    /// If set to true, voices release using a linear function instead of
    /// an exponential curve.
    ///
    /// Default: `false`
    pub linear_release: bool,

    /// Decibel range that the normalised gain controls map onto. The start
    /// of the range is treated as silence.
    ///
    /// Default: -60 dB to +12 dB
    pub gain_range: NormalisableRange,

    /// Range that the normalised pan controls map onto.
    ///
    /// Default: -1 (left) to 1 (right)
    pub pan_range: NormalisableRange,

    /// Threads used to decode sample files in `load_kit`.
    ///
    /// Default: `Auto`
    pub load_threads: ThreadCount,
}

impl Default for KitInitOptions {
    fn default() -> Self {
        Self {
            envelope: EnvelopeDescriptor::default(),
            linear_release: false,
            gain_range: DEFAULT_GAIN_RANGE,
            pan_range: DEFAULT_PAN_RANGE,
            load_threads: ThreadCount::Auto,
        }
    }
}

/// One recording of a kit: a file, and where it sits in the
/// note / velocity layer / variation / microphone hierarchy.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct SampleDescriptor {
    pub path: PathBuf,

    /// MIDI note (0-127) the sample plays on.
    pub note: u8,

    /// Velocity layer, 0 being the softest.
    pub velocity_index: usize,

    /// Round-robin variation within the velocity layer.
    pub variation_index: usize,

    /// Microphone id, e.g. "kick_in" or "overhead". Every distinct id gets
    /// its own mix bus.
    pub microphone: String,

    /// Notes silenced whenever this note is played.
    #[cfg_attr(feature = "serde", serde(default))]
    pub choke_targets: Vec<u8>,

    /// MIDI channels (1-16) the sample responds to. `None` means all of them.
    #[cfg_attr(feature = "serde", serde(default))]
    pub midi_channels: Option<Vec<u8>>,
}

impl SampleDescriptor {
    pub fn new(
        path: impl Into<PathBuf>,
        note: u8,
        velocity_index: usize,
        variation_index: usize,
        microphone: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            note,
            velocity_index,
            variation_index,
            microphone: microphone.into(),
            choke_targets: Vec::new(),
            midi_channels: None,
        }
    }

    pub fn with_choke_targets(mut self, targets: &[u8]) -> Self {
        self.choke_targets = targets.to_vec();
        self
    }

    pub fn with_midi_channels(mut self, channels: &[u8]) -> Self {
        self.midi_channels = Some(channels.to_vec());
        self
    }

    /// A name identifying the sample in diagnostics.
    pub fn display_name(&self) -> String {
        format!(
            "{} (note {}, layer {}, variation {}, mic {})",
            self.path.display(),
            self.note,
            self.velocity_index,
            self.variation_index,
            self.microphone
        )
    }
}

/// The declarative description of a whole kit.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct KitDescriptor {
    pub samples: Vec<SampleDescriptor>,
}

impl KitDescriptor {
    pub fn new(samples: Vec<SampleDescriptor>) -> Self {
        Self { samples }
    }

    pub fn push(&mut self, sample: SampleDescriptor) {
        self.samples.push(sample);
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
