use std::sync::Arc;

use crate::{
    helpers::db_to_amp,
    kit::SampleAsset,
    params::{MicrophoneControls, NormalisableRange},
    ChannelCount,
};

use super::{
    EnvelopeParameters, EnvelopeStage, F32BufferSampler, LinearSampleGrabber, ReleaseType,
    SampleGrabber, VoiceEnvelope,
};

/// The note a voice is currently sounding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveNote {
    pub note: u8,
    pub channel: u8,
}

type Grabber = LinearSampleGrabber<F32BufferSampler>;

/// A voice bound for its whole lifetime to one sample and to the mix controls
/// of one microphone channel.
///
/// Starting and stopping a note only overwrite the existing state, the voice
/// is never reallocated.
#[derive(Debug, Clone)]
pub struct RenderingVoice {
    sample: Arc<SampleAsset>,
    left: Grabber,
    right: Option<Grabber>,

    controls: MicrophoneControls,
    gain_range: NormalisableRange,
    pan_range: NormalisableRange,

    envelope: VoiceEnvelope,
    position: f64,
    velocity_gain: f32,
    active: Option<ActiveNote>,
}

fn grabber_for(sample: &SampleAsset, channel: usize) -> Option<Grabber> {
    sample.channel(channel).map(|data| {
        LinearSampleGrabber::new(F32BufferSampler::new(data.clone(), sample.length()))
    })
}

impl RenderingVoice {
    pub fn new(
        sample: Arc<SampleAsset>,
        controls: MicrophoneControls,
        envelope: EnvelopeParameters,
        gain_range: NormalisableRange,
        pan_range: NormalisableRange,
    ) -> Self {
        // Sample assets always have at least one channel
        let left = grabber_for(&sample, 0).unwrap_or_else(|| {
            LinearSampleGrabber::new(F32BufferSampler::new(Arc::from(Vec::new()), 0))
        });
        let right = grabber_for(&sample, 1);

        Self {
            sample,
            left,
            right,
            controls,
            gain_range,
            pan_range,
            envelope: VoiceEnvelope::new(envelope),
            position: 0.0,
            velocity_gain: 0.0,
            active: None,
        }
    }

    /// Restarts the voice from the first frame of its sample.
    pub fn start_note(&mut self, note: u8, channel: u8, intensity: f32) {
        self.position = 0.0;
        self.velocity_gain = intensity.clamp(0.0, 1.0);
        self.envelope.note_on();
        self.active = Some(ActiveNote { note, channel });
    }

    pub fn stop_note(&mut self, release: ReleaseType) {
        match release {
            ReleaseType::Standard => {
                if self.active.is_some() {
                    self.envelope.signal_release(ReleaseType::Standard);
                }
            }
            ReleaseType::Kill => self.kill(),
        }
    }

    #[inline(always)]
    fn kill(&mut self) {
        self.envelope.reset();
        self.position = 0.0;
        self.active = None;
    }

    #[inline(always)]
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Whether the voice was started on `channel` and plays a sample that
    /// applies to `note`.
    #[inline(always)]
    pub fn is_sounding(&self, note: u8, channel: u8) -> bool {
        match self.active {
            Some(active) => active.channel == channel && self.sample.applies_to_note(note),
            None => false,
        }
    }

    pub fn current_note(&self) -> Option<ActiveNote> {
        self.active
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn velocity_gain(&self) -> f32 {
        self.velocity_gain
    }

    pub fn envelope_stage(&self) -> EnvelopeStage {
        self.envelope.current_stage()
    }

    pub fn sample(&self) -> &Arc<SampleAsset> {
        &self.sample
    }

    pub fn controls(&self) -> &MicrophoneControls {
        &self.controls
    }

    #[inline(always)]
    fn linear_gain(&self) -> f32 {
        let db = self.gain_range.convert_from_0to1(self.controls.gain.get());
        if db <= self.gain_range.start {
            0.0
        } else {
            db_to_amp(db)
        }
    }

    #[inline(always)]
    fn pan_gains(&self) -> (f32, f32) {
        let pan = self
            .pan_range
            .convert_from_0to1(self.controls.pan.get())
            .clamp(-1.0, 1.0);
        let left = if pan <= 0.0 { 1.0 } else { 1.0 - pan };
        let right = if pan >= 0.0 { 1.0 } else { 1.0 + pan };
        (left, right)
    }

    /// Adds `num_frames` frames of this voice into the interleaved `out`
    /// buffer, starting at frame `start_frame`.
    ///
    /// Stops the voice as soon as playback reaches the end of the sample, and
    /// never reads past it.
    pub fn render_to(
        &mut self,
        out: &mut [f32],
        channels: ChannelCount,
        start_frame: usize,
        num_frames: usize,
    ) {
        if self.active.is_none() || num_frames == 0 {
            return;
        }

        let stride = channels.count() as usize;
        let end_frame = (start_frame + num_frames).min(out.len() / stride);
        let length = self.sample.length() as f64;

        for frame in start_frame..end_frame {
            if self.position >= length {
                self.kill();
                return;
            }

            let index = self.position as usize;
            let fractional = (self.position - index as f64) as f32;
            let left = self.left.get(index, fractional);
            let right = match &self.right {
                Some(right) => right.get(index, fractional),
                None => left,
            };

            let envelope = self.envelope.next_sample();
            let (pan_left, pan_right) = self.pan_gains();
            let phase = if self.controls.phase_invert.get() {
                -1.0
            } else {
                1.0
            };
            let common = envelope * self.linear_gain() * self.velocity_gain * phase;

            let left = left * pan_left * common;
            let right = right * pan_right * common;
            match channels {
                ChannelCount::Stereo => {
                    out[frame * 2] += left;
                    out[frame * 2 + 1] += right;
                }
                ChannelCount::Mono => out[frame] += (left + right) * 0.5,
            }

            self.position += 1.0;
            if self.left.is_past_end(self.position) || self.envelope.ended() {
                self.kill();
                return;
            }
        }
    }
}
