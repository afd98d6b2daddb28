use std::{
    collections::{HashMap, HashSet},
    path::PathBuf,
    sync::Arc,
    time::Instant,
};

use rayon::prelude::*;
use thiserror::Error;
use to_vec::ToVec;
use tracing::{debug, info};

use crate::{
    params::MixerControls,
    synth::{DrumSynth, RegisterError, SampleRegistration},
    AudioStreamParams,
};

use super::{
    load_audio_file, AudioLoadError, DecodedAudio, KitDescriptor, KitInitOptions, SampleAsset,
    SampleError, ThreadCount,
};

#[derive(Debug, Error)]
pub enum LoadKitError {
    #[error("The kit contains no samples")]
    EmptyKit,

    #[error("Error loading sample audio")]
    AudioLoadError(#[from] AudioLoadError),

    #[error("Invalid sample {name}")]
    InvalidSample {
        name: String,
        #[source]
        source: SampleError,
    },

    #[error("Failed to register sample {name}")]
    RegisterError {
        name: String,
        #[source]
        source: RegisterError,
    },

    #[error("Failed to build the loader thread pool")]
    ThreadPoolError(#[from] rayon::ThreadPoolBuildError),
}

/// A loaded kit: the engine, and the mix controls of every
/// (note, microphone) pair of it.
pub struct LoadedKit {
    pub synth: DrumSynth,
    pub mixer: MixerControls,
}

fn decode_all(
    paths: Vec<PathBuf>,
    stream_params: AudioStreamParams,
    threads: ThreadCount,
) -> Result<HashMap<PathBuf, Arc<DecodedAudio>>, LoadKitError> {
    let decode = |path: PathBuf| -> Result<(PathBuf, Arc<DecodedAudio>), AudioLoadError> {
        let audio = load_audio_file(&path, stream_params)?;
        debug!(
            path = %path.display(),
            frames = audio.frames(),
            source_rate = audio.source_rate,
            "Decoded sample"
        );
        Ok((path, Arc::new(audio)))
    };

    let decoded: Result<HashMap<_, _>, AudioLoadError> = match threads {
        ThreadCount::None => paths.into_iter().map(decode).collect(),
        ThreadCount::Auto => paths.into_par_iter().map(decode).collect(),
        ThreadCount::Manual(threads) => rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()?
            .install(|| paths.into_par_iter().map(decode).collect()),
    };

    Ok(decoded?)
}

/// Decodes every sample file of a kit and registers it with a new engine.
///
/// Files referenced by several entries are decoded once. Any failure aborts
/// the whole load, naming the resource that caused it.
pub fn load_kit(
    descriptor: &KitDescriptor,
    stream_params: AudioStreamParams,
    options: KitInitOptions,
) -> Result<LoadedKit, LoadKitError> {
    if descriptor.is_empty() {
        return Err(LoadKitError::EmptyKit);
    }

    let start = Instant::now();

    let unique_paths: HashSet<_> = descriptor.samples.iter().map(|s| s.path.clone()).collect();
    let decoded = decode_all(
        unique_paths.into_iter().to_vec(),
        stream_params,
        options.load_threads,
    )?;

    let mut synth = DrumSynth::new(stream_params, options);
    let mut mixer = MixerControls::new(options.gain_range, options.pan_range);

    for entry in descriptor.samples.iter() {
        // Every path was decoded above
        let Some(audio) = decoded.get(&entry.path) else {
            continue;
        };

        let channels: Arc<[Arc<[f32]>]> =
            audio.channels.iter().map(|c| Arc::from(c.as_slice())).collect();
        let mut sample = SampleAsset::new(
            entry.path.display().to_string(),
            channels,
            audio.sample_rate,
            entry.note,
            audio.frames(),
        )
        .map_err(|source| LoadKitError::InvalidSample {
            name: entry.display_name(),
            source,
        })?;
        if let Some(midi_channels) = &entry.midi_channels {
            sample = sample.with_midi_channels(midi_channels);
        }

        let registration = SampleRegistration {
            note: entry.note,
            velocity_index: entry.velocity_index,
            variation_index: entry.variation_index,
            choke_targets: entry.choke_targets.clone(),
            microphone: entry.microphone.clone(),
            sample,
            controls: mixer.controls_for(entry.note, &entry.microphone),
        };

        synth
            .register_sample(registration)
            .map_err(|source| LoadKitError::RegisterError {
                name: entry.display_name(),
                source,
            })?;
    }

    info!(
        samples = descriptor.samples.len(),
        files = decoded.len(),
        notes = synth.midi_notes().len(),
        microphones = synth.bus_count(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Loaded drum kit"
    );

    Ok(LoadedKit { synth, mixer })
}
