use std::{
    path::{Path, PathBuf},
    time::Instant,
};

use thiserror::Error;
use tracing::{info, warn};

use drumkit_core::{synth::DrumSynth, synth::KitEvent, AudioPipe};

use crate::{DrumKitRender, NoteSequence, RenderConfig};

/// Progress of a running render, passed to the progress callback after
/// every block.
#[derive(Debug, Clone, Copy)]
pub struct RenderStats {
    /// Seconds rendered so far.
    pub progress: f64,
    pub voice_count: usize,
}

/// What a finished render produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSummary {
    pub frames: usize,
    pub duration_seconds: f64,
    pub notes: usize,
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to write {}", .path.display())]
    Wav {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },

    #[error("The render block size must be at least one frame")]
    InvalidBlockSize,
}

pub struct DrumKitRenderBuilder<'a, StatsCallback: FnMut(RenderStats)> {
    config: RenderConfig,
    synth: DrumSynth,
    sequence: &'a NoteSequence,
    out_path: &'a Path,
    stats_callback: StatsCallback,
}

/// Starts building a render of `sequence` played on `synth` into a WAV file
/// at `out_path`.
pub fn drumkit_renderer<'a>(
    synth: DrumSynth,
    sequence: &'a NoteSequence,
    out_path: &'a Path,
) -> DrumKitRenderBuilder<'a, impl FnMut(RenderStats)> {
    DrumKitRenderBuilder {
        config: RenderConfig::default(),
        synth,
        sequence,
        out_path,
        stats_callback: |_| {},
    }
}

/// Renders `sequence` with the given config and no progress reporting.
pub fn render_sequence(
    synth: DrumSynth,
    sequence: &NoteSequence,
    out_path: impl AsRef<Path>,
    config: RenderConfig,
) -> Result<RenderSummary, RenderError> {
    drumkit_renderer(synth, sequence, out_path.as_ref())
        .with_config(config)
        .run()
}

impl<'a, ProgressCallback: FnMut(RenderStats)> DrumKitRenderBuilder<'a, ProgressCallback> {
    pub fn with_config(mut self, config: RenderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn use_limiter(mut self, use_limiter: bool) -> Self {
        self.config.use_limiter = use_limiter;
        self
    }

    pub fn with_block_frames(mut self, block_frames: usize) -> Self {
        self.config.block_frames = block_frames;
        self
    }

    pub fn with_max_tail_seconds(mut self, seconds: f64) -> Self {
        self.config.max_tail_seconds = seconds;
        self
    }

    pub fn with_progress_callback<F: FnMut(RenderStats)>(
        self,
        stats_callback: F,
    ) -> DrumKitRenderBuilder<'a, F> {
        DrumKitRenderBuilder {
            config: self.config,
            synth: self.synth,
            sequence: self.sequence,
            out_path: self.out_path,
            stats_callback,
        }
    }

    /// Renders every note, then keeps rendering until all voices are idle or
    /// the tail limit is reached.
    pub fn run(mut self) -> Result<RenderSummary, RenderError> {
        let block = self.config.block_frames;
        if block == 0 {
            return Err(RenderError::InvalidBlockSize);
        }

        let start = Instant::now();
        let out_path = self.out_path;
        let wav_error = |source| RenderError::Wav {
            path: out_path.to_path_buf(),
            source,
        };

        let sample_rate = self.synth.stream_params().sample_rate;
        let notes = self.sequence.notes();
        info!(
            path = %out_path.display(),
            notes = notes.len(),
            sample_rate,
            "Rendering note sequence"
        );

        let mut render = DrumKitRender::new(self.synth, out_path, self.config.use_limiter)
            .map_err(wav_error)?;
        let mut events: Vec<(usize, KitEvent)> = Vec::new();
        let mut next = 0;

        let mut report = |render: &DrumKitRender| {
            (self.stats_callback)(RenderStats {
                progress: render.frames_written() as f64 / sample_rate as f64,
                voice_count: render.voice_count(),
            })
        };

        while next < notes.len() {
            let block_start = render.frames_written();
            let block_end = block_start + block;

            events.clear();
            while let Some(note) = notes.get(next) {
                let frame = note.frame(sample_rate);
                if frame >= block_end {
                    break;
                }
                events.push((frame.saturating_sub(block_start), note.event()));
                next += 1;
            }

            render.render_block(block, &events).map_err(wav_error)?;
            report(&render);
        }

        let max_tail = (self.config.max_tail_seconds.max(0.0) * sample_rate as f64) as usize;
        let mut tail = 0;
        while render.voice_count() > 0 && tail < max_tail {
            render.render_block(block, &[]).map_err(wav_error)?;
            tail += block;
            report(&render);
        }
        if render.voice_count() > 0 {
            warn!(
                voices = render.voice_count(),
                "Tail limit reached with voices still sounding"
            );
        }

        let frames = render.frames_written();
        render.finalize().map_err(wav_error)?;

        let summary = RenderSummary {
            frames,
            duration_seconds: frames as f64 / sample_rate as f64,
            notes: notes.len(),
        };
        info!(
            frames,
            seconds = summary.duration_seconds,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Render finished"
        );

        Ok(summary)
    }
}
