//! Live control values shared between the control context and the render path.
//!
//! The parameter store owns these values and writes them with atomic stores.
//! The engine only ever reads them, once per rendered sample, so a change is
//! picked up at most one sample late and a read can never tear.

use std::{
    collections::HashMap,
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use atomic_float::AtomicF32;

/// Maps a normalised 0-1 value onto a linear `start..=end` range.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NormalisableRange {
    pub start: f32,
    pub end: f32,
}

impl NormalisableRange {
    pub const fn new(start: f32, end: f32) -> Self {
        Self { start, end }
    }

    pub fn convert_from_0to1(&self, proportion: f32) -> f32 {
        let proportion = proportion.clamp(0.0, 1.0);
        self.start + (self.end - self.start) * proportion
    }

    pub fn convert_to_0to1(&self, value: f32) -> f32 {
        let length = self.end - self.start;
        if length == 0.0 {
            return 0.0;
        }
        ((value - self.start) / length).clamp(0.0, 1.0)
    }
}

/// Default microphone gain range in decibels. The bottom of the range is silence.
pub const DEFAULT_GAIN_RANGE: NormalisableRange = NormalisableRange::new(-60.0, 12.0);

/// Default pan range, hard left to hard right.
pub const DEFAULT_PAN_RANGE: NormalisableRange = NormalisableRange::new(-1.0, 1.0);

/// A shared floating point control value.
#[derive(Clone)]
pub struct FloatParameter(Arc<AtomicF32>);

impl FloatParameter {
    pub fn new(value: f32) -> Self {
        Self(Arc::new(AtomicF32::new(value)))
    }

    #[inline(always)]
    pub fn get(&self) -> f32 {
        self.0.load(Ordering::Relaxed)
    }

    pub fn set(&self, value: f32) {
        self.0.store(value, Ordering::Relaxed);
    }
}

impl fmt::Debug for FloatParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FloatParameter").field(&self.get()).finish()
    }
}

/// A shared on/off control value.
#[derive(Clone, Default)]
pub struct BoolParameter(Arc<AtomicBool>);

impl BoolParameter {
    pub fn new(value: bool) -> Self {
        Self(Arc::new(AtomicBool::new(value)))
    }

    #[inline(always)]
    pub fn get(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub fn set(&self, value: bool) {
        self.0.store(value, Ordering::Relaxed);
    }
}

impl fmt::Debug for BoolParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BoolParameter").field(&self.get()).finish()
    }
}

/// The three mix controls of a single microphone channel.
///
/// `gain` and `pan` hold normalised 0-1 values; the voice maps them through
/// its gain (dB) and pan ranges.
#[derive(Debug, Clone)]
pub struct MicrophoneControls {
    pub gain: FloatParameter,
    pub pan: FloatParameter,
    pub phase_invert: BoolParameter,
}

impl MicrophoneControls {
    /// Controls at unity gain, centred, phase not inverted.
    pub fn new(gain_range: NormalisableRange, pan_range: NormalisableRange) -> Self {
        Self {
            gain: FloatParameter::new(gain_range.convert_to_0to1(0.0)),
            pan: FloatParameter::new(pan_range.convert_to_0to1(0.0)),
            phase_invert: BoolParameter::new(false),
        }
    }
}

impl Default for MicrophoneControls {
    fn default() -> Self {
        Self::new(DEFAULT_GAIN_RANGE, DEFAULT_PAN_RANGE)
    }
}

/// A minimal in-memory control table, one `MicrophoneControls` per
/// (note, microphone) pair.
///
/// Only used at load time to hand out shared handles; the render path reads
/// the handles directly.
#[derive(Debug)]
pub struct MixerControls {
    gain_range: NormalisableRange,
    pan_range: NormalisableRange,
    controls: HashMap<(u8, String), MicrophoneControls>,
}

impl MixerControls {
    pub fn new(gain_range: NormalisableRange, pan_range: NormalisableRange) -> Self {
        Self {
            gain_range,
            pan_range,
            controls: HashMap::new(),
        }
    }

    /// Returns the controls for a note/microphone pair, creating defaults on first use.
    pub fn controls_for(&mut self, note: u8, microphone: &str) -> MicrophoneControls {
        let (gain_range, pan_range) = (self.gain_range, self.pan_range);
        self.controls
            .entry((note, microphone.to_owned()))
            .or_insert_with(|| MicrophoneControls::new(gain_range, pan_range))
            .clone()
    }

    pub fn get(&self, note: u8, microphone: &str) -> Option<&MicrophoneControls> {
        self.controls.get(&(note, microphone.to_owned()))
    }

    pub fn len(&self) -> usize {
        self.controls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }
}

impl Default for MixerControls {
    fn default() -> Self {
        Self::new(DEFAULT_GAIN_RANGE, DEFAULT_PAN_RANGE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_conversion() {
        let range = NormalisableRange::new(-60.0, 12.0);
        assert_eq!(range.convert_from_0to1(0.0), -60.0);
        assert_eq!(range.convert_from_0to1(1.0), 12.0);
        assert_eq!(range.convert_from_0to1(2.0), 12.0);
        assert!((range.convert_to_0to1(0.0) - 60.0 / 72.0).abs() < 1e-6);
        assert!((range.convert_from_0to1(range.convert_to_0to1(0.0))).abs() < 1e-4);

        let empty = NormalisableRange::new(1.0, 1.0);
        assert_eq!(empty.convert_to_0to1(5.0), 0.0);
    }

    #[test]
    fn test_default_controls_are_neutral() {
        let controls = MicrophoneControls::default();
        assert!(DEFAULT_GAIN_RANGE.convert_from_0to1(controls.gain.get()).abs() < 1e-4);
        assert_eq!(DEFAULT_PAN_RANGE.convert_from_0to1(controls.pan.get()), 0.0);
        assert!(!controls.phase_invert.get());
    }

    #[test]
    fn test_parameters_are_shared() {
        let controls = MicrophoneControls::default();
        let clone = controls.clone();
        clone.pan.set(1.0);
        clone.phase_invert.set(true);
        assert_eq!(controls.pan.get(), 1.0);
        assert!(controls.phase_invert.get());
    }

    #[test]
    fn test_mixer_controls_reuse_handles() {
        let mut mixer = MixerControls::default();
        let a = mixer.controls_for(36, "kick_in");
        let b = mixer.controls_for(36, "kick_in");
        let c = mixer.controls_for(36, "overhead");
        a.gain.set(0.25);
        assert_eq!(b.gain.get(), 0.25);
        assert_ne!(c.gain.get(), 0.25);
        assert_eq!(mixer.len(), 2);
        assert!(mixer.get(38, "kick_in").is_none());
    }
}
