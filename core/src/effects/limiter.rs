use crate::ChannelCount;

#[derive(Debug, Clone)]
struct SingleChannelLimiter {
    loudness: f32,
    attack: f32,
    falloff: f32,
    strength: f32,
    min_thresh: f32,
}

impl SingleChannelLimiter {
    fn new() -> SingleChannelLimiter {
        SingleChannelLimiter {
            loudness: 1.0,
            attack: 100.0,
            falloff: 16000.0,
            strength: 1.0,
            min_thresh: 1.0,
        }
    }

    #[inline(always)]
    fn limit(&mut self, val: f32) -> f32 {
        let abs = val.abs();
        let speed = if self.loudness > abs {
            self.falloff
        } else {
            self.attack
        };
        self.loudness = ((self.loudness * speed + abs) / (speed + 1.0)).max(self.min_thresh);

        val / (self.loudness * self.strength + 2.0 * (1.0 - self.strength)) / 2.0
    }
}

/// A loudness follower per channel that scales peaks down to keep the mix
/// out of clipping.
///
/// Signals quieter than full scale are only halved, so the limiter is
/// applied to the final mix, never to individual buses.
#[derive(Debug, Clone)]
pub struct VolumeLimiter {
    channels: Vec<SingleChannelLimiter>,
}

impl VolumeLimiter {
    pub fn new(channels: ChannelCount) -> VolumeLimiter {
        VolumeLimiter {
            channels: vec![SingleChannelLimiter::new(); channels.count() as usize],
        }
    }

    /// Limits an interleaved buffer in place.
    pub fn limit(&mut self, samples: &mut [f32]) {
        let channel_count = self.channels.len();
        for (i, s) in samples.iter_mut().enumerate() {
            *s = self.channels[i % channel_count].limit(*s);
        }
    }
}
