use drumkit_core::synth::KitEvent;

/// A note-on at a point in time.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct TimedNoteOn {
    /// Seconds from the start of the render.
    pub time: f64,
    pub channel: u8,
    pub note: u8,
    pub velocity: f32,
}

impl TimedNoteOn {
    pub fn new(time: f64, channel: u8, note: u8, velocity: f32) -> Self {
        Self {
            time,
            channel,
            note,
            velocity,
        }
    }

    /// The frame the note lands on at the given sample rate.
    pub fn frame(&self, sample_rate: u32) -> usize {
        (self.time * sample_rate as f64).round() as usize
    }

    pub fn event(&self) -> KitEvent {
        KitEvent::NoteOn {
            channel: self.channel,
            note: self.note,
            velocity: self.velocity,
        }
    }
}

/// Note-ons ordered by time. Notes at the same time keep the order they
/// were added in.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct NoteSequence {
    notes: Vec<TimedNoteOn>,
}

impl NoteSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a note. Negative and non-finite times are moved to zero.
    pub fn push(&mut self, mut note: TimedNoteOn) {
        if !note.time.is_finite() || note.time < 0.0 {
            note.time = 0.0;
        }
        let index = self.notes.partition_point(|n| n.time <= note.time);
        self.notes.insert(index, note);
    }

    pub fn with_note(mut self, time: f64, channel: u8, note: u8, velocity: f32) -> Self {
        self.push(TimedNoteOn::new(time, channel, note, velocity));
        self
    }

    pub fn notes(&self) -> &[TimedNoteOn] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Time of the last note, in seconds.
    pub fn duration(&self) -> f64 {
        self.notes.last().map(|n| n.time).unwrap_or(0.0)
    }
}

impl FromIterator<TimedNoteOn> for NoteSequence {
    fn from_iter<I: IntoIterator<Item = TimedNoteOn>>(iter: I) -> Self {
        let mut sequence = NoteSequence::new();
        for note in iter {
            sequence.push(note);
        }
        sequence
    }
}
