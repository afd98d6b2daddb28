use crate::helpers::{amp_to_db, db_to_amp};

/// Settings of a feed-forward compressor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressorSettings {
    pub threshold_db: f32,
    pub ratio: f32,
    pub attack_ms: f32,
    pub release_ms: f32,
}

impl Default for CompressorSettings {
    fn default() -> Self {
        Self {
            threshold_db: -12.0,
            ratio: 4.0,
            attack_ms: 10.0,
            release_ms: 100.0,
        }
    }
}

fn smoothing_coefficient(ms: f32, sample_rate: f32) -> f32 {
    let samples = ms.max(0.0) * 0.001 * sample_rate;
    if samples < 1.0 {
        0.0
    } else {
        (-1.0 / samples).exp()
    }
}

/// A stereo-linked compressor. The level of the loudest channel of each frame
/// drives the gain of every channel.
#[derive(Debug, Clone)]
pub struct Compressor {
    settings: CompressorSettings,
    sample_rate: f32,
    channels: usize,
    attack_coef: f32,
    release_coef: f32,
    envelope: f32,
}

impl Compressor {
    pub fn new(settings: CompressorSettings, sample_rate: f32, channels: usize) -> Self {
        let mut compressor = Self {
            settings,
            sample_rate,
            channels: channels.max(1),
            attack_coef: 0.0,
            release_coef: 0.0,
            envelope: 0.0,
        };
        compressor.update_coefficients();
        compressor
    }

    fn update_coefficients(&mut self) {
        self.attack_coef = smoothing_coefficient(self.settings.attack_ms, self.sample_rate);
        self.release_coef = smoothing_coefficient(self.settings.release_ms, self.sample_rate);
    }

    pub fn settings(&self) -> CompressorSettings {
        self.settings
    }

    pub fn set_settings(&mut self, settings: CompressorSettings) {
        if settings != self.settings {
            self.settings = settings;
            self.update_coefficients();
        }
    }

    /// Gain applied for the current envelope level.
    fn gain(&self) -> f32 {
        let over = amp_to_db(self.envelope) - self.settings.threshold_db;
        if over <= 0.0 {
            return 1.0;
        }
        let ratio = self.settings.ratio.max(1.0);
        db_to_amp(-over * (1.0 - 1.0 / ratio))
    }

    pub fn process(&mut self, samples: &mut [f32]) {
        for frame in samples.chunks_mut(self.channels) {
            let level = frame.iter().fold(0.0f32, |m, s| m.max(s.abs()));
            let coef = if level > self.envelope {
                self.attack_coef
            } else {
                self.release_coef
            };
            self.envelope = level + coef * (self.envelope - level);

            let gain = self.gain();
            for s in frame.iter_mut() {
                *s *= gain;
            }
        }
    }
}
