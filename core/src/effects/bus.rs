use crate::{
    params::{BoolParameter, FloatParameter},
    AudioStreamParams,
};

use super::{
    Compressor, CompressorSettings, FilterKind, FilterSettings, MultiChannelBiQuad,
};

const Q_BUTTERWORTH: f32 = std::f32::consts::FRAC_1_SQRT_2;

/// Live controls of one mix bus's processing chain. Every stage starts
/// disabled, so a fresh bus passes audio through untouched.
#[derive(Debug, Clone)]
pub struct BusControls {
    pub compressor_enabled: BoolParameter,
    pub compressor_threshold_db: FloatParameter,
    pub compressor_ratio: FloatParameter,
    pub compressor_attack_ms: FloatParameter,
    pub compressor_release_ms: FloatParameter,

    pub high_pass_enabled: BoolParameter,
    pub high_pass_freq: FloatParameter,

    pub peak_enabled: BoolParameter,
    pub peak_freq: FloatParameter,
    pub peak_q: FloatParameter,
    pub peak_gain_db: FloatParameter,

    pub low_pass_enabled: BoolParameter,
    pub low_pass_freq: FloatParameter,
}

impl Default for BusControls {
    fn default() -> Self {
        let compressor = CompressorSettings::default();
        Self {
            compressor_enabled: BoolParameter::new(false),
            compressor_threshold_db: FloatParameter::new(compressor.threshold_db),
            compressor_ratio: FloatParameter::new(compressor.ratio),
            compressor_attack_ms: FloatParameter::new(compressor.attack_ms),
            compressor_release_ms: FloatParameter::new(compressor.release_ms),

            high_pass_enabled: BoolParameter::new(false),
            high_pass_freq: FloatParameter::new(80.0),

            peak_enabled: BoolParameter::new(false),
            peak_freq: FloatParameter::new(1000.0),
            peak_q: FloatParameter::new(Q_BUTTERWORTH),
            peak_gain_db: FloatParameter::new(0.0),

            low_pass_enabled: BoolParameter::new(false),
            low_pass_freq: FloatParameter::new(18000.0),
        }
    }
}

impl BusControls {
    fn compressor_settings(&self) -> CompressorSettings {
        CompressorSettings {
            threshold_db: self.compressor_threshold_db.get(),
            ratio: self.compressor_ratio.get(),
            attack_ms: self.compressor_attack_ms.get(),
            release_ms: self.compressor_release_ms.get(),
        }
    }

    fn high_pass_settings(&self) -> FilterSettings {
        FilterSettings::new(FilterKind::HighPass, self.high_pass_freq.get(), Q_BUTTERWORTH)
    }

    fn peak_settings(&self) -> FilterSettings {
        FilterSettings::new(
            FilterKind::Peak {
                gain_db: self.peak_gain_db.get(),
            },
            self.peak_freq.get(),
            self.peak_q.get(),
        )
    }

    fn low_pass_settings(&self) -> FilterSettings {
        FilterSettings::new(FilterKind::LowPass, self.low_pass_freq.get(), Q_BUTTERWORTH)
    }
}

/// The processing chain of one mix bus: compressor, high-pass, peak and
/// low-pass, in that order.
///
/// Settings are read from the controls once per block. Coefficients are only
/// rebuilt when a value changed, and processing never allocates.
pub struct BusProcessor {
    controls: BusControls,
    compressor: Compressor,
    high_pass: MultiChannelBiQuad,
    peak: MultiChannelBiQuad,
    low_pass: MultiChannelBiQuad,
}

impl BusProcessor {
    pub fn new(stream_params: AudioStreamParams) -> Self {
        Self::with_controls(stream_params, BusControls::default())
    }

    pub fn with_controls(stream_params: AudioStreamParams, controls: BusControls) -> Self {
        let sample_rate = stream_params.sample_rate as f32;
        let channels = stream_params.channels.count() as usize;
        Self {
            compressor: Compressor::new(controls.compressor_settings(), sample_rate, channels),
            high_pass: MultiChannelBiQuad::new(
                channels,
                controls.high_pass_settings(),
                sample_rate,
            ),
            peak: MultiChannelBiQuad::new(channels, controls.peak_settings(), sample_rate),
            low_pass: MultiChannelBiQuad::new(channels, controls.low_pass_settings(), sample_rate),
            controls,
        }
    }

    pub fn controls(&self) -> &BusControls {
        &self.controls
    }

    /// Processes an interleaved block in place.
    pub fn process(&mut self, samples: &mut [f32]) {
        let controls = &self.controls;

        if controls.compressor_enabled.get() {
            self.compressor.set_settings(controls.compressor_settings());
            self.compressor.process(samples);
        }

        if controls.high_pass_enabled.get() {
            self.high_pass.set_settings(controls.high_pass_settings());
            self.high_pass.process(samples);
        }

        if controls.peak_enabled.get() {
            self.peak.set_settings(controls.peak_settings());
            self.peak.process(samples);
        }

        if controls.low_pass_enabled.get() {
            self.low_pass.set_settings(controls.low_pass_settings());
            self.low_pass.process(samples);
        }
    }
}
