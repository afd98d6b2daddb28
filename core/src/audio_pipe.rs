use crate::AudioStreamParams;

/// An object to read audio samples from.
pub trait AudioPipe {
    /// The audio stream parameters of the audio pipe.
    fn stream_params(&self) -> &'_ AudioStreamParams;

    /// Reads interleaved samples from the pipe, overwriting `to`.
    ///
    /// The amount of samples read determines how far the engine advances in
    /// time. Note on events sent before a read take effect at the first frame
    /// of that read; use `DrumSynth::render_with_events` for events that need
    /// to land in the middle of a block.
    fn read_samples(&mut self, to: &mut [f32]) {
        debug_assert!(to.len() % self.stream_params().channels.count() as usize == 0);
        self.read_samples_unchecked(to);
    }

    /// Reads samples from the pipe without checking the channel count of the output.
    fn read_samples_unchecked(&mut self, to: &mut [f32]);
}
