use crate::kit::BusId;

/// Wrapper enum for the events a `DrumSynth` accepts.
///
/// Channels are MIDI channels 1-16, velocities are normalised to 0-1.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum KitEvent {
    /// Triggers the instrument of a note on every microphone.
    NoteOn { channel: u8, note: u8, velocity: f32 },

    /// Triggers the instrument of a note on a single microphone bus.
    /// Chokes and round-robin behave as for `NoteOn`.
    NoteOnMicrophone {
        channel: u8,
        note: u8,
        velocity: f32,
        bus: BusId,
    },

    /// Accepted and ignored, drum hits always play to completion.
    NoteOff { channel: u8, note: u8 },

    /// Silences every voice immediately.
    AllNotesKilled,
}
