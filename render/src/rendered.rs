use std::path::Path;

use drumkit_core::{
    effects::VolumeLimiter, helpers::prepare_cache_vec, synth::DrumSynth, synth::KitEvent,
    AudioPipe, AudioStreamParams,
};

use crate::writer::AudioFileWriter;

/// A drum synth whose output goes to a WAV file instead of a device.
pub struct DrumKitRender {
    synth: DrumSynth,
    audio_writer: AudioFileWriter,
    audio_params: AudioStreamParams,
    limiter: Option<VolumeLimiter>,
    output_vec: Vec<f32>,
    frames_written: usize,
}

impl DrumKitRender {
    /// Creates the output file. The file takes the sample rate and channel
    /// count of the synth.
    pub fn new(
        synth: DrumSynth,
        out_path: &Path,
        use_limiter: bool,
    ) -> Result<Self, hound::Error> {
        let audio_params = *synth.stream_params();
        let audio_writer = AudioFileWriter::create(out_path, audio_params)?;
        let limiter = use_limiter.then(|| VolumeLimiter::new(audio_params.channels));

        Ok(Self {
            synth,
            audio_writer,
            audio_params,
            limiter,
            output_vec: Vec::new(),
            frames_written: 0,
        })
    }

    pub fn get_params(&self) -> AudioStreamParams {
        self.audio_params
    }

    /// Renders and writes `frames` frames, applying `events` at their frame
    /// offsets within the block.
    pub fn render_block(
        &mut self,
        frames: usize,
        events: &[(usize, KitEvent)],
    ) -> Result<(), hound::Error> {
        let len = self.audio_params.frames_to_samples(frames);
        prepare_cache_vec(&mut self.output_vec, len, 0.0);
        self.synth.render_with_events(&mut self.output_vec, events);

        if let Some(limiter) = &mut self.limiter {
            limiter.limit(&mut self.output_vec);
        }

        self.audio_writer.write_samples(&self.output_vec)?;
        self.frames_written += frames;
        Ok(())
    }

    pub fn frames_written(&self) -> usize {
        self.frames_written
    }

    pub fn voice_count(&self) -> usize {
        self.synth.active_voice_count()
    }

    /// Flushes the file and writes its final header.
    pub fn finalize(self) -> Result<(), hound::Error> {
        self.audio_writer.finalize()
    }
}
