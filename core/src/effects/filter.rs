use biquad::*;

/// The response of a bus filter.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum FilterKind {
    LowPass,
    HighPass,
    /// Peaking EQ with the given gain in dB.
    Peak { gain_db: f32 },
}

/// Frequency, Q and response of a filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterSettings {
    pub kind: FilterKind,
    pub freq: f32,
    pub q: f32,
}

impl FilterSettings {
    pub fn new(kind: FilterKind, freq: f32, q: f32) -> Self {
        Self { kind, freq, q }
    }

    fn coeffs(&self, sample_rate: f32) -> Option<Coefficients<f32>> {
        if !self.freq.is_finite() {
            return None;
        }
        if let FilterKind::Peak { gain_db } = self.kind {
            if !gain_db.is_finite() {
                return None;
            }
        }
        // Keep the corner inside the audible range and below Nyquist
        let freq = self.freq.clamp(10.0, sample_rate * 0.49);
        let q = self.q.max(0.01);
        let kind = match self.kind {
            FilterKind::LowPass => Type::LowPass,
            FilterKind::HighPass => Type::HighPass,
            FilterKind::Peak { gain_db } => Type::PeakingEQ(gain_db),
        };
        Coefficients::<f32>::from_params(kind, sample_rate.hz(), freq.hz(), q).ok()
    }
}

/// A single channel biquad filter.
#[derive(Clone)]
pub struct BiQuadFilter {
    settings: FilterSettings,
    filter: DirectForm1<f32>,
    sample_rate: f32,
}

impl BiQuadFilter {
    pub fn new(settings: FilterSettings, sample_rate: f32) -> Self {
        let coeffs = settings
            .coeffs(sample_rate)
            .unwrap_or_else(pass_through_coeffs);

        Self {
            settings,
            filter: DirectForm1::<f32>::new(coeffs),
            sample_rate,
        }
    }

    pub fn settings(&self) -> FilterSettings {
        self.settings
    }

    /// Rebuilds the coefficients if the settings changed. Invalid settings
    /// leave the previous coefficients in place.
    pub fn set_settings(&mut self, settings: FilterSettings) {
        if settings == self.settings {
            return;
        }
        self.settings = settings;
        if let Some(coeffs) = settings.coeffs(self.sample_rate) {
            self.filter.update_coefficients(coeffs);
        }
    }

    #[inline(always)]
    pub fn process(&mut self, input: f32) -> f32 {
        self.filter.run(input)
    }
}

fn pass_through_coeffs() -> Coefficients<f32> {
    Coefficients {
        a1: 0.0,
        a2: 0.0,
        b0: 1.0,
        b1: 0.0,
        b2: 0.0,
    }
}

/// One biquad per channel of an interleaved stream.
#[derive(Clone)]
pub struct MultiChannelBiQuad {
    channels: Vec<BiQuadFilter>,
}

impl MultiChannelBiQuad {
    pub fn new(channels: usize, settings: FilterSettings, sample_rate: f32) -> Self {
        Self {
            channels: (0..channels)
                .map(|_| BiQuadFilter::new(settings, sample_rate))
                .collect(),
        }
    }

    pub fn set_settings(&mut self, settings: FilterSettings) {
        for filter in self.channels.iter_mut() {
            filter.set_settings(settings);
        }
    }

    pub fn process(&mut self, sample: &mut [f32]) {
        let channel_count = self.channels.len();
        if channel_count == 0 {
            return;
        }
        for (i, s) in sample.iter_mut().enumerate() {
            *s = self.channels[i % channel_count].process(*s);
        }
    }
}
