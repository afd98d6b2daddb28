use std::{
    error::Error,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use cpal::{
    traits::{DeviceTrait, HostTrait, StreamTrait},
    BuildStreamError, DefaultStreamConfigError, Device, FromSample, PauseStreamError,
    PlayStreamError, Sample, SampleFormat, SizedSample, Stream, SupportedStreamConfig,
};
use crossbeam_channel::{bounded, Receiver};
use thiserror::Error;
use tracing::{error, info};

use drumkit_core::{
    effects::VolumeLimiter, helpers::prepare_cache_vec, synth::DrumSynth, synth::KitEvent,
    AudioPipe, AudioStreamParams, ChannelCount,
};

use crate::{config::RealtimeConfig, RealtimeEventSender};

#[derive(Debug, Error)]
pub enum RealtimeError {
    #[error("No audio output device is available")]
    NoOutputDevice,

    #[error("Failed to query the default output config")]
    DefaultStreamConfig(#[from] DefaultStreamConfigError),

    #[error("Output sample format {0:?} is not supported")]
    UnsupportedSampleFormat(SampleFormat),

    #[error("Failed to build the output stream")]
    BuildStream(#[from] BuildStreamError),

    #[error("Failed to start the output stream")]
    PlayStream(#[from] PlayStreamError),

    #[error("Failed to build the drum synth")]
    SynthBuild(#[source] Box<dyn Error + Send + Sync>),
}

#[derive(Debug, Clone)]
pub(crate) struct RealtimeSynthStats {
    active_voices: Arc<AtomicU64>,
    dropped_events: Arc<AtomicU64>,
}

impl RealtimeSynthStats {
    fn new() -> Self {
        Self {
            active_voices: Arc::new(AtomicU64::new(0)),
            dropped_events: Arc::new(AtomicU64::new(0)),
        }
    }
}

/// Reads the statistics of a running `RealtimeDrumSynth`.
#[derive(Debug, Clone)]
pub struct RealtimeStatsReader {
    stats: RealtimeSynthStats,
}

impl RealtimeStatsReader {
    /// Voices that were sounding at the end of the last audio block.
    pub fn active_voices(&self) -> u64 {
        self.stats.active_voices.load(Ordering::Relaxed)
    }

    /// Events dropped because the queue was full.
    pub fn dropped_events(&self) -> u64 {
        self.stats.dropped_events.load(Ordering::Relaxed)
    }
}

/// The part of the realtime engine that runs inside the device callback.
///
/// Every buffer it needs is allocated when it is created, so `render` never
/// allocates as long as the device asks for frames in any block size.
pub(crate) struct StreamRenderer {
    synth: DrumSynth,
    events: Receiver<KitEvent>,
    scratch: Vec<f32>,
    max_block_frames: usize,
    limiter: Option<VolumeLimiter>,
    stats: RealtimeSynthStats,
}

impl StreamRenderer {
    pub(crate) fn new(
        mut synth: DrumSynth,
        events: Receiver<KitEvent>,
        config: &RealtimeConfig,
        stats: RealtimeSynthStats,
    ) -> Self {
        let params = *synth.stream_params();
        let max_block_frames = config.render_window_frames(params.sample_rate);
        synth.prepare(max_block_frames);

        Self {
            synth,
            events,
            scratch: Vec::with_capacity(params.frames_to_samples(max_block_frames)),
            max_block_frames,
            limiter: config
                .use_limiter
                .then(|| VolumeLimiter::new(params.channels)),
            stats,
        }
    }

    /// Applies pending events, then fills an interleaved device buffer.
    ///
    /// Device channels past the synth's channels are silenced.
    pub(crate) fn render<T>(&mut self, data: &mut [T], device_channels: usize)
    where
        T: SizedSample + FromSample<f32>,
    {
        for event in self.events.try_iter() {
            self.synth.send_event(event);
        }

        let synth_channels = self.synth.stream_params().channels.count() as usize;
        let device_channels = device_channels.max(1);

        for chunk in data.chunks_mut(self.max_block_frames * device_channels) {
            let frames = chunk.len() / device_channels;
            prepare_cache_vec(&mut self.scratch, frames * synth_channels, 0.0);
            self.synth.read_samples(&mut self.scratch);
            if let Some(limiter) = self.limiter.as_mut() {
                limiter.limit(&mut self.scratch);
            }

            for (out, rendered) in chunk
                .chunks_mut(device_channels)
                .zip(self.scratch.chunks(synth_channels))
            {
                for (c, s) in out.iter_mut().enumerate() {
                    *s = T::from_sample(rendered.get(c).copied().unwrap_or(0.0));
                }
            }
        }

        self.stats
            .active_voices
            .store(self.synth.active_voice_count() as u64, Ordering::Relaxed);
    }
}

/// A drum synth playing on an audio output device.
///
/// Events are queued from any thread and applied at the start of the next
/// device buffer.
pub struct RealtimeDrumSynth {
    stream: Stream,
    event_sender: RealtimeEventSender,
    stats: RealtimeSynthStats,
    stream_params: AudioStreamParams,
}

impl RealtimeDrumSynth {
    /// Opens the default output device of the default host.
    ///
    /// `build` receives the stream parameters of the device and returns the
    /// synth to play, usually by loading a kit at that sample rate.
    pub fn open_with_default_output<F, E>(
        config: RealtimeConfig,
        build: F,
    ) -> Result<Self, RealtimeError>
    where
        F: FnOnce(AudioStreamParams) -> Result<DrumSynth, E>,
        E: Into<Box<dyn Error + Send + Sync>>,
    {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(RealtimeError::NoOutputDevice)?;
        let stream_config = device.default_output_config()?;

        Self::open(config, &device, stream_config, build)
    }

    pub fn open<F, E>(
        config: RealtimeConfig,
        device: &Device,
        stream_config: SupportedStreamConfig,
        build: F,
    ) -> Result<Self, RealtimeError>
    where
        F: FnOnce(AudioStreamParams) -> Result<DrumSynth, E>,
        E: Into<Box<dyn Error + Send + Sync>>,
    {
        let sample_rate = stream_config.sample_rate().0;
        let device_channels = stream_config.channels() as usize;
        let stream_params =
            AudioStreamParams::new(sample_rate, ChannelCount::from(stream_config.channels()));

        let device_name = device.name().unwrap_or_default();
        info!(
            device = device_name.as_str(),
            sample_rate,
            channels = device_channels,
            format = ?stream_config.sample_format(),
            "Opening output stream"
        );

        let synth = build(stream_params).map_err(|e| RealtimeError::SynthBuild(e.into()))?;

        let stats = RealtimeSynthStats::new();
        let (sender, receiver) = bounded(config.event_queue_capacity.max(1));
        let renderer = StreamRenderer::new(synth, receiver, &config, stats.clone());

        fn build_stream<T>(
            device: &Device,
            stream_config: &SupportedStreamConfig,
            mut renderer: StreamRenderer,
            device_channels: usize,
        ) -> Result<Stream, BuildStreamError>
        where
            T: SizedSample + FromSample<f32>,
        {
            let err_fn = |err| error!("An error occurred on the output stream: {}", err);

            device.build_output_stream(
                &stream_config.config(),
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    renderer.render(data, device_channels);
                },
                err_fn,
                None,
            )
        }

        let stream = match stream_config.sample_format() {
            SampleFormat::F32 => {
                build_stream::<f32>(device, &stream_config, renderer, device_channels)
            }
            SampleFormat::F64 => {
                build_stream::<f64>(device, &stream_config, renderer, device_channels)
            }
            SampleFormat::I16 => {
                build_stream::<i16>(device, &stream_config, renderer, device_channels)
            }
            SampleFormat::I32 => {
                build_stream::<i32>(device, &stream_config, renderer, device_channels)
            }
            SampleFormat::U16 => {
                build_stream::<u16>(device, &stream_config, renderer, device_channels)
            }
            format => return Err(RealtimeError::UnsupportedSampleFormat(format)),
        }?;

        stream.play()?;

        Ok(Self {
            stream,
            event_sender: RealtimeEventSender::new(sender, stats.dropped_events.clone()),
            stats,
            stream_params,
        })
    }

    pub fn send_event(&self, event: KitEvent) -> bool {
        self.event_sender.send_event(event)
    }

    /// Returns a sender that can be moved to other threads.
    pub fn get_sender(&self) -> RealtimeEventSender {
        self.event_sender.clone()
    }

    pub fn get_stats(&self) -> RealtimeStatsReader {
        RealtimeStatsReader {
            stats: self.stats.clone(),
        }
    }

    pub fn stream_params(&self) -> &AudioStreamParams {
        &self.stream_params
    }

    pub fn pause(&mut self) -> Result<(), PauseStreamError> {
        self.stream.pause()
    }

    pub fn resume(&mut self) -> Result<(), PlayStreamError> {
        self.stream.play()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drumkit_core::{
        kit::{KitInitOptions, SampleAsset},
        synth::SampleRegistration,
    };

    const RATE: u32 = 1000;

    fn renderer(
        channels: ChannelCount,
        config: RealtimeConfig,
    ) -> (StreamRenderer, RealtimeEventSender, RealtimeStatsReader) {
        let mut synth = DrumSynth::new(
            AudioStreamParams::new(RATE, channels),
            KitInitOptions::default(),
        );
        let sample = SampleAsset::from_vecs("kick", vec![vec![0.5; 64]], RATE, 36).unwrap();
        synth
            .register_sample(SampleRegistration::new(sample, "kick_in"))
            .unwrap();

        let stats = RealtimeSynthStats::new();
        let (sender, receiver) = bounded(config.event_queue_capacity);
        let renderer = StreamRenderer::new(synth, receiver, &config, stats.clone());
        let sender = RealtimeEventSender::new(sender, stats.dropped_events.clone());
        (renderer, sender, RealtimeStatsReader { stats })
    }

    fn small_window() -> RealtimeConfig {
        // 4 frames at 1kHz
        RealtimeConfig {
            render_window_ms: 4.0,
            event_queue_capacity: 8,
            use_limiter: false,
        }
    }

    #[test]
    fn test_render_spans_several_blocks() {
        let (mut renderer, sender, stats) = renderer(ChannelCount::Stereo, small_window());
        assert!(sender.note_on(10, 36, 1.0));

        let mut data = vec![0.0f32; 20];
        renderer.render(&mut data, 2);
        assert!(data.iter().all(|s| (s - 0.5).abs() < 1e-4));
        assert_eq!(stats.active_voices(), 1);

        assert!(sender.all_notes_killed());
        renderer.render(&mut data, 2);
        assert!(data.iter().all(|s| *s == 0.0));
        assert_eq!(stats.active_voices(), 0);
    }

    #[test]
    fn test_extra_device_channels_are_silent() {
        let (mut renderer, sender, _) = renderer(ChannelCount::Stereo, small_window());
        sender.note_on(10, 36, 1.0);

        let mut data = vec![1.0f32; 24];
        renderer.render(&mut data, 4);
        for frame in data.chunks(4) {
            assert!((frame[0] - 0.5).abs() < 1e-4);
            assert!((frame[1] - 0.5).abs() < 1e-4);
            assert_eq!(frame[2], 0.0);
            assert_eq!(frame[3], 0.0);
        }
    }

    #[test]
    fn test_integer_output() {
        let (mut renderer, sender, _) = renderer(ChannelCount::Mono, small_window());
        sender.note_on(10, 36, 1.0);

        let mut data = vec![0i16; 6];
        renderer.render(&mut data, 1);
        assert!(data.iter().all(|s| (*s as i32 - 16384).abs() <= 4));
    }

    #[test]
    fn test_limiter_scales_output() {
        let config = RealtimeConfig {
            use_limiter: true,
            ..small_window()
        };
        let (mut renderer, sender, _) = renderer(ChannelCount::Stereo, config);
        sender.note_on(10, 36, 1.0);

        let mut data = vec![0.0f32; 8];
        renderer.render(&mut data, 2);
        assert!(data.iter().all(|s| (s - 0.25).abs() < 1e-4));
    }

    #[test]
    fn test_dropped_events_are_reported() {
        let config = RealtimeConfig {
            event_queue_capacity: 1,
            ..small_window()
        };
        let (_renderer, sender, stats) = renderer(ChannelCount::Stereo, config);
        assert!(sender.note_on(10, 36, 1.0));
        assert!(!sender.note_on(10, 36, 1.0));
        assert_eq!(stats.dropped_events(), 1);
    }
}
