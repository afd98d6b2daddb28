use super::ReleaseType;

/// The stages in envelopes as a numbered enum
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EnvelopeStage {
    Idle = 0,
    Attack = 1,
    Decay = 2,
    Sustain = 3,
    Release = 4, // Goes to this stage as soon as the voice is released
}

impl EnvelopeStage {
    pub fn as_usize(&self) -> usize {
        *self as usize
    }

    pub fn next_stage(&self) -> EnvelopeStage {
        match self {
            EnvelopeStage::Idle => EnvelopeStage::Idle,
            EnvelopeStage::Attack => EnvelopeStage::Decay,
            EnvelopeStage::Decay => EnvelopeStage::Sustain,
            EnvelopeStage::Sustain => EnvelopeStage::Release,
            EnvelopeStage::Release => EnvelopeStage::Idle,
        }
    }
}

// The lerp equation is `start + (end - start) * factor`
// We store: start, length (= end - start)
#[derive(Debug, Clone, Copy)]
struct Lerper {
    start: f32,
    length: f32,
}

impl Lerper {
    fn new(start: f32, end: f32) -> Self {
        Lerper {
            start,
            length: end - start,
        }
    }

    #[inline(always)]
    fn lerp(&self, factor: f32) -> f32 {
        self.start + self.length * factor
    }
}

#[derive(Debug, Clone, Copy)]
struct LerpToZeroCurve {
    start: f32,
}

impl LerpToZeroCurve {
    #[inline(always)]
    fn lerp(&self, factor: f32) -> f32 {
        let mult = 1.0 - factor;
        mult.powi(8) * self.start
    }
}

#[derive(Debug, Clone, Copy)]
struct StageTime {
    time: u32,
    duration: u32,
}

impl StageTime {
    fn new(duration: u32) -> Self {
        StageTime { time: 0, duration }
    }

    #[inline(always)]
    fn progress(&self) -> f32 {
        self.time as f32 / self.duration as f32
    }

    #[inline(always)]
    fn is_ended(&self) -> bool {
        self.time >= self.duration
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EnvelopePart {
    Lerp {
        target: f32,   // Target value by the end of the envelope part
        duration: u32, // Duration in samples
    },
    LerpToZeroCurve {
        duration: u32,
    },
    Hold(f32),
}

impl EnvelopePart {
    pub fn lerp(target: f32, duration: u32) -> EnvelopePart {
        EnvelopePart::Lerp { target, duration }
    }

    pub fn lerp_to_zero_curve(duration: u32) -> EnvelopePart {
        EnvelopePart::LerpToZeroCurve { duration }
    }

    pub fn hold(value: f32) -> EnvelopePart {
        EnvelopePart::Hold(value)
    }
}

/// The envelope of every voice, in seconds.
///
/// The default is a flat one-shot envelope: full level from the first sample
/// and no release tail, so a drum hit is shaped only by its recording.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EnvelopeDescriptor {
    pub attack: f32,          // Seconds
    pub decay: f32,           // Seconds
    pub sustain_percent: f32, // % (0-1)
    pub release: f32,         // Seconds
}

impl Default for EnvelopeDescriptor {
    fn default() -> Self {
        Self {
            attack: 0.0,
            decay: 0.0,
            sustain_percent: 1.0,
            release: 0.0,
        }
    }
}

impl EnvelopeDescriptor {
    #[allow(clippy::wrong_self_convention)]
    pub fn to_envelope_params(&self, samplerate: u32, linear_release: bool) -> EnvelopeParameters {
        let samplerate = samplerate as f32;
        let samples = |seconds: f32| (seconds.max(0.0) * samplerate) as u32;
        let sustain = self.sustain_percent.clamp(0.0, 1.0);

        let release = if linear_release {
            EnvelopePart::lerp(0.0, samples(self.release))
        } else {
            EnvelopePart::lerp_to_zero_curve(samples(self.release))
        };

        EnvelopeParameters {
            parts: [
                // Idle
                EnvelopePart::hold(0.0),
                // Attack
                EnvelopePart::lerp(1.0, samples(self.attack)),
                // Decay
                EnvelopePart::lerp(sustain, samples(self.decay)),
                // Sustain
                EnvelopePart::hold(sustain),
                // Release
                release,
            ],
        }
    }
}

/// The per-stage envelope parts in samples.
/// Use EnvelopeDescriptor to generate the EnvelopeParameters struct.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeParameters {
    pub parts: [EnvelopePart; 5],
}

impl EnvelopeParameters {
    fn get_stage_data(&self, stage: EnvelopeStage, start_amp: f32) -> VoiceEnvelopeState {
        match self.parts[stage.as_usize()] {
            EnvelopePart::Lerp { target, duration } => {
                if duration == 0 {
                    self.get_stage_data(stage.next_stage(), target)
                } else {
                    VoiceEnvelopeState {
                        current_stage: stage,
                        stage_data: StageData::Lerp(
                            Lerper::new(start_amp, target),
                            StageTime::new(duration),
                        ),
                    }
                }
            }
            EnvelopePart::LerpToZeroCurve { duration } => {
                if duration == 0 {
                    self.get_stage_data(stage.next_stage(), 0.0)
                } else {
                    VoiceEnvelopeState {
                        current_stage: stage,
                        stage_data: StageData::LerpToZeroCurve(
                            LerpToZeroCurve { start: start_amp },
                            StageTime::new(duration),
                        ),
                    }
                }
            }
            EnvelopePart::Hold(value) => VoiceEnvelopeState {
                current_stage: stage,
                stage_data: StageData::Constant(value),
            },
        }
    }

    pub fn get_stage_duration(&self, stage: EnvelopeStage) -> u32 {
        match self.parts[stage.as_usize()] {
            EnvelopePart::Lerp { duration, .. } => duration,
            EnvelopePart::LerpToZeroCurve { duration } => duration,
            EnvelopePart::Hold(_) => 0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum StageData {
    Lerp(Lerper, StageTime),
    LerpToZeroCurve(LerpToZeroCurve, StageTime),
    Constant(f32),
}

#[derive(Debug, Clone, Copy)]
struct VoiceEnvelopeState {
    current_stage: EnvelopeStage,
    stage_data: StageData,
}

/// Attack/decay/sustain/release amplitude generator for one voice.
///
/// Starting, releasing and resetting only overwrite the existing state, so a
/// voice can be retriggered on the audio thread without allocating.
#[derive(Debug, Clone)]
pub struct VoiceEnvelope {
    params: EnvelopeParameters,
    state: VoiceEnvelopeState,
}

impl VoiceEnvelope {
    pub fn new(params: EnvelopeParameters) -> Self {
        let state = params.get_stage_data(EnvelopeStage::Idle, 0.0);
        VoiceEnvelope { params, state }
    }

    pub fn params(&self) -> &EnvelopeParameters {
        &self.params
    }

    pub fn get_value_at_current_time(&self) -> f32 {
        match &self.state.stage_data {
            StageData::Lerp(lerper, stage_time) => lerper.lerp(stage_time.progress()),
            StageData::LerpToZeroCurve(lerper, stage_time) => lerper.lerp(stage_time.progress()),
            StageData::Constant(constant) => *constant,
        }
    }

    pub fn current_stage(&self) -> EnvelopeStage {
        self.state.current_stage
    }

    /// The envelope has returned to idle and produces silence.
    #[inline(always)]
    pub fn ended(&self) -> bool {
        self.state.current_stage == EnvelopeStage::Idle
    }

    /// (Re)enters the attack stage from silence, whatever the current stage.
    pub fn note_on(&mut self) {
        self.state = self.params.get_stage_data(EnvelopeStage::Attack, 0.0);
    }

    pub fn signal_release(&mut self, rel_type: ReleaseType) {
        match rel_type {
            ReleaseType::Standard => {
                if !self.ended() {
                    let amp = self.get_value_at_current_time();
                    self.state = self.params.get_stage_data(EnvelopeStage::Release, amp);
                }
            }
            ReleaseType::Kill => self.reset(),
        }
    }

    pub fn reset(&mut self) {
        self.state = self.params.get_stage_data(EnvelopeStage::Idle, 0.0);
    }

    fn switch_to_next_stage(&mut self) {
        let amp = self.get_value_at_current_time();
        self.state = self
            .params
            .get_stage_data(self.current_stage().next_stage(), amp);
    }

    /// Returns the amplitude for the current sample and advances by one sample.
    #[inline(always)]
    pub fn next_sample(&mut self) -> f32 {
        let value = self.get_value_at_current_time();
        let should_progress = match &mut self.state.stage_data {
            StageData::Lerp(_, stage_time) | StageData::LerpToZeroCurve(_, stage_time) => {
                stage_time.time += 1;
                stage_time.is_ended()
            }
            StageData::Constant(_) => false,
        };
        if should_progress {
            self.switch_to_next_stage();
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lerp(from: f32, to: f32, fac: f32) -> f32 {
        from + (to - from) * fac
    }

    fn lerp_to_zero_curve(from: f32, fac: f32) -> f32 {
        let mult = (1. - fac).powi(8);
        mult * from
    }

    fn round(values: &mut [f32]) {
        for v in values.iter_mut() {
            *v = (*v * 10000.0).round() / 10000.0;
        }
    }

    #[test]
    fn test_stage_order() {
        assert_eq!(EnvelopeStage::Attack.next_stage(), EnvelopeStage::Decay);
        assert_eq!(EnvelopeStage::Release.next_stage(), EnvelopeStage::Idle);
        assert_eq!(EnvelopeStage::Idle.next_stage(), EnvelopeStage::Idle);
    }

    #[test]
    fn test_envelope() {
        let descriptor = EnvelopeDescriptor {
            attack: 15.0,
            decay: 17.0,
            sustain_percent: 0.4,
            release: 16.0,
        };
        let params = descriptor.to_envelope_params(1, false);
        let mut env = VoiceEnvelope::new(params);
        assert!(env.ended());

        env.note_on();
        assert_eq!(env.current_stage(), EnvelopeStage::Attack);

        let mut vec = Vec::new();
        for _ in 0..48 {
            vec.push(env.next_sample());
        }
        assert_eq!(env.current_stage(), EnvelopeStage::Sustain);
        env.signal_release(ReleaseType::Standard);
        assert_eq!(env.current_stage(), EnvelopeStage::Release);
        for _ in 0..20 {
            vec.push(env.next_sample());
        }
        assert!(env.ended());

        let mut expected_vec = Vec::new();
        for i in 0..15 {
            expected_vec.push(lerp(0.0, 1.0, i as f32 / 15.0));
        }
        for i in 0..17 {
            expected_vec.push(lerp(1.0, 0.4, i as f32 / 17.0));
        }
        for _ in 0..16 {
            expected_vec.push(0.4);
        }
        for i in 0..16 {
            expected_vec.push(lerp_to_zero_curve(0.4, i as f32 / 16.0));
        }
        for _ in 0..4 {
            expected_vec.push(0.0);
        }

        round(&mut vec);
        round(&mut expected_vec);
        assert_eq!(vec, expected_vec);
    }

    #[test]
    fn test_linear_release_from_mid_attack() {
        let descriptor = EnvelopeDescriptor {
            attack: 10.0,
            decay: 0.0,
            sustain_percent: 1.0,
            release: 4.0,
        };
        let mut env = VoiceEnvelope::new(descriptor.to_envelope_params(1, true));
        env.note_on();
        for _ in 0..5 {
            env.next_sample();
        }
        env.signal_release(ReleaseType::Standard);

        let mut vec = (0..5).map(|_| env.next_sample()).collect::<Vec<_>>();
        let mut expected = vec![0.5, 0.375, 0.25, 0.125, 0.0];
        round(&mut vec);
        round(&mut expected);
        assert_eq!(vec, expected);
        assert!(env.ended());
    }

    #[test]
    fn test_default_envelope_is_flat() {
        let params = EnvelopeDescriptor::default().to_envelope_params(48000, false);
        let mut env = VoiceEnvelope::new(params);
        env.note_on();
        assert_eq!(env.current_stage(), EnvelopeStage::Sustain);
        for _ in 0..64 {
            assert_eq!(env.next_sample(), 1.0);
        }

        // No release tail: releasing goes straight back to idle
        env.signal_release(ReleaseType::Standard);
        assert!(env.ended());
        assert_eq!(env.next_sample(), 0.0);
    }

    #[test]
    fn test_kill_and_retrigger() {
        let descriptor = EnvelopeDescriptor {
            attack: 4.0,
            decay: 0.0,
            sustain_percent: 1.0,
            release: 100.0,
        };
        let mut env = VoiceEnvelope::new(descriptor.to_envelope_params(1, false));
        env.note_on();
        env.next_sample();
        env.next_sample();

        env.signal_release(ReleaseType::Kill);
        assert!(env.ended());
        assert_eq!(env.get_value_at_current_time(), 0.0);

        // Retrigger restarts the attack curve from zero
        env.note_on();
        env.next_sample();
        env.next_sample();
        env.note_on();
        assert_eq!(env.next_sample(), 0.0);
        assert_eq!(env.next_sample(), 0.25);
    }

    #[test]
    fn test_release_on_idle_is_noop() {
        let params = EnvelopeDescriptor {
            attack: 0.0,
            decay: 0.0,
            sustain_percent: 1.0,
            release: 10.0,
        }
        .to_envelope_params(1, false);
        let mut env = VoiceEnvelope::new(params);
        env.signal_release(ReleaseType::Standard);
        assert!(env.ended());
        assert_eq!(params.get_stage_duration(EnvelopeStage::Release), 10);
        assert_eq!(params.get_stage_duration(EnvelopeStage::Sustain), 0);
    }
}
