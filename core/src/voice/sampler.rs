use std::sync::Arc;

// BufferSampler: Something that grabs a sample based on an index, and
// returns silence outside the valid range of the buffer.
//
// SampleGrabber: Something that takes a fractional location and returns an
// interpolated sample value.

pub trait BufferSampler: Send + Sync {
    fn get(&self, pos: usize) -> f32;
    fn length(&self) -> usize;
}

/// Reads one channel of a decoded sample, limited to its valid length.
#[derive(Debug, Clone)]
pub struct F32BufferSampler {
    data: Arc<[f32]>,
    length: usize,
}

impl F32BufferSampler {
    pub fn new(data: Arc<[f32]>, length: usize) -> Self {
        let length = length.min(data.len());
        Self { data, length }
    }
}

impl BufferSampler for F32BufferSampler {
    #[inline(always)]
    fn get(&self, pos: usize) -> f32 {
        if pos < self.length {
            self.data[pos]
        } else {
            0.0
        }
    }

    fn length(&self) -> usize {
        self.length
    }
}

pub trait SampleGrabber: Send + Sync {
    /// Index: the truncated index of the sample
    ///
    /// Fractional: The fractional part of the index, i.e. the 0-1 range decimal
    fn get(&self, index: usize, fractional: f32) -> f32;

    fn is_past_end(&self, pos: f64) -> bool;
}

#[derive(Debug, Clone)]
pub struct LinearSampleGrabber<Sampler: BufferSampler> {
    sampler: Sampler,
}

impl<Sampler: BufferSampler> LinearSampleGrabber<Sampler> {
    pub fn new(sampler: Sampler) -> Self {
        LinearSampleGrabber { sampler }
    }
}

impl<Sampler: BufferSampler> SampleGrabber for LinearSampleGrabber<Sampler> {
    #[inline(always)]
    fn get(&self, index: usize, fractional: f32) -> f32 {
        let first = self.sampler.get(index);
        let second = self.sampler.get(index + 1);
        first * (1.0 - fractional) + second * fractional
    }

    #[inline(always)]
    fn is_past_end(&self, pos: f64) -> bool {
        pos >= self.sampler.length() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grabber(data: &[f32], length: usize) -> LinearSampleGrabber<F32BufferSampler> {
        LinearSampleGrabber::new(F32BufferSampler::new(data.into(), length))
    }

    #[test]
    fn test_linear_interpolation() {
        let grabber = grabber(&[0.0, 1.0, -1.0], 3);
        assert_eq!(grabber.get(0, 0.0), 0.0);
        assert_eq!(grabber.get(0, 0.5), 0.5);
        assert_eq!(grabber.get(1, 0.25), 0.5);
        assert_eq!(grabber.get(2, 0.0), -1.0);
    }

    #[test]
    fn test_reads_past_valid_length_are_silent() {
        // Only the first two frames are valid
        let grabber = grabber(&[1.0, 1.0, 5.0, 5.0], 2);
        assert_eq!(grabber.get(1, 0.5), 0.5);
        assert_eq!(grabber.get(2, 0.0), 0.0);
        assert_eq!(grabber.get(100, 0.3), 0.0);
        assert!(!grabber.is_past_end(1.5));
        assert!(grabber.is_past_end(2.0));
    }

    #[test]
    fn test_length_is_clamped_to_buffer() {
        let sampler = F32BufferSampler::new(vec![1.0f32; 4].into(), 10);
        assert_eq!(sampler.length(), 4);
    }
}
