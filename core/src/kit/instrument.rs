use std::sync::Arc;

use super::SampleAsset;

/// Index of a voice in the engine's voice pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VoiceId(pub usize);

/// Index of a mix bus, one per distinct microphone.
pub type BusId = usize;

/// The most velocity layers one instrument can hold.
pub const MAX_VELOCITY_LAYERS: usize = 128;

/// The most round-robin variations one velocity layer can hold.
pub const MAX_VARIATIONS: usize = 128;

/// One microphone's recording of a variation, paired with the voice that
/// plays it. The voice only ever plays this channel's sample.
#[derive(Debug, Clone)]
pub struct MicrophoneChannel {
    pub sample: Arc<SampleAsset>,
    pub voice: VoiceId,
    pub bus: BusId,
}

/// One round-robin alternative of a velocity layer.
#[derive(Debug, Clone, Default)]
pub struct Variation {
    pub microphones: Vec<MicrophoneChannel>,
}

impl Variation {
    pub fn is_empty(&self) -> bool {
        self.microphones.is_empty()
    }
}

/// A group of variations recorded at the same strike intensity.
#[derive(Debug, Clone, Default)]
pub struct VelocityLayer {
    variations: Vec<Variation>,
    cursor: usize,
}

impl VelocityLayer {
    pub fn variations(&self) -> &[Variation] {
        &self.variations
    }

    pub fn variation_count(&self) -> usize {
        self.variations.len()
    }

    /// Round-robin cursor. Always in `0..variation_count()` when the layer
    /// has variations.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The variation the next trigger will play, if there is one.
    pub fn current_variation(&self) -> Option<&Variation> {
        self.variations.get(self.cursor)
    }

    pub fn advance(&mut self) {
        if !self.variations.is_empty() {
            self.cursor = (self.cursor + 1) % self.variations.len();
        }
    }

    /// Returns the variation at `index`, growing the list with empty
    /// variations until it fits.
    pub(crate) fn variation_mut(&mut self, index: usize) -> &mut Variation {
        if index >= self.variations.len() {
            self.variations.resize_with(index + 1, Variation::default);
        }
        &mut self.variations[index]
    }
}

/// Everything registered under one MIDI note.
#[derive(Debug, Clone, Default)]
pub struct Instrument {
    choke_targets: Vec<u8>,
    velocity_layers: Vec<VelocityLayer>,
}

impl Instrument {
    /// Notes silenced whenever this instrument is triggered.
    pub fn choke_targets(&self) -> &[u8] {
        &self.choke_targets
    }

    /// Replaces the choke list. The latest registration for a note wins.
    pub(crate) fn set_choke_targets(&mut self, targets: &[u8]) {
        self.choke_targets.clear();
        self.choke_targets.extend_from_slice(targets);
    }

    pub fn velocity_layers(&self) -> &[VelocityLayer] {
        &self.velocity_layers
    }

    pub fn layer_count(&self) -> usize {
        self.velocity_layers.len()
    }

    pub(crate) fn layer_mut(&mut self, index: usize) -> Option<&mut VelocityLayer> {
        self.velocity_layers.get_mut(index)
    }

    /// Returns the layer at `index`, growing the list with empty layers until
    /// it fits.
    pub(crate) fn layer_mut_or_grow(&mut self, index: usize) -> &mut VelocityLayer {
        if index >= self.velocity_layers.len() {
            self.velocity_layers
                .resize_with(index + 1, VelocityLayer::default);
        }
        &mut self.velocity_layers[index]
    }
}

/// The velocity layers a note-on plays, and how loud.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerBlend {
    pub lower: usize,
    /// The layer blended in above `lower`, if any.
    pub higher: Option<usize>,
    /// Linear distance between the two layers, 0-1.
    pub blend: f32,
    /// Intensity applied to every triggered voice: the cube root of `blend`
    /// when blending, otherwise 1.
    pub perceived: f32,
}

impl LayerBlend {
    /// Maps a 0-1 velocity onto `layer_count` velocity layers.
    pub fn from_velocity(velocity: f32, layer_count: usize) -> Self {
        let velocity = if velocity.is_nan() {
            0.0
        } else {
            velocity.clamp(0.0, 1.0)
        };
        let position = velocity * layer_count.saturating_sub(1) as f32;

        let mut lower = position.floor() as usize;
        if lower >= layer_count {
            lower = 0;
        }
        let higher = lower + 1;
        let higher = if higher >= layer_count || velocity == 0.0 {
            None
        } else {
            Some(higher)
        };

        let blend = position - lower as f32;
        let perceived = if higher.is_some() { blend.cbrt() } else { 1.0 };

        Self {
            lower,
            higher,
            blend,
            perceived,
        }
    }
}

/// Instruments indexed directly by MIDI note.
#[derive(Debug, Clone)]
pub struct InstrumentRegistry {
    instruments: Box<[Option<Instrument>]>,
}

impl Default for InstrumentRegistry {
    fn default() -> Self {
        Self {
            instruments: (0..128).map(|_| None).collect(),
        }
    }
}

impl InstrumentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, note: u8) -> Option<&Instrument> {
        self.instruments.get(note as usize).and_then(|i| i.as_ref())
    }

    pub fn get_mut(&mut self, note: u8) -> Option<&mut Instrument> {
        self.instruments
            .get_mut(note as usize)
            .and_then(|i| i.as_mut())
    }

    /// Returns the instrument for `note`, creating an empty one on first use.
    /// `None` if the note is out of range.
    pub(crate) fn get_or_insert(&mut self, note: u8) -> Option<&mut Instrument> {
        self.instruments
            .get_mut(note as usize)
            .map(|i| i.get_or_insert_with(Instrument::default))
    }

    pub fn contains(&self, note: u8) -> bool {
        self.get(note).is_some()
    }

    /// Notes with an instrument, ascending.
    pub fn midi_notes(&self) -> Vec<u8> {
        self.iter().map(|(note, _)| note).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, &Instrument)> {
        self.instruments
            .iter()
            .enumerate()
            .filter_map(|(note, i)| i.as_ref().map(|i| (note as u8, i)))
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
