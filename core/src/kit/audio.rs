use std::{
    fs::File,
    io,
    path::{Path, PathBuf},
};

use symphonia::core::formats::FormatOptions;
use symphonia::core::{audio::AudioBuffer, conv::IntoSample, probe::Hint, sample::Sample};
use symphonia::core::{audio::AudioBufferRef, meta::MetadataOptions};
use symphonia::core::{audio::Signal, io::MediaSourceStream};
use symphonia::core::{codecs::DecoderOptions, errors::Error};

use thiserror::Error;

use crate::{AudioStreamParams, ChannelCount};

use self::resample::SincResampler;

pub mod resample;

#[derive(Debug, Error)]
pub enum AudioLoadError {
    #[error("IO Error reading {0}")]
    IOError(PathBuf, #[source] io::Error),

    #[error("Audio decoding failed for {0}")]
    AudioDecodingFailed(PathBuf, #[source] Error),

    #[error("Audio file {0} has an invalid channel count")]
    InvalidChannelCount(PathBuf),

    #[error("Audio file {0} has no tracks")]
    NoTracks(PathBuf),

    #[error("Audio file {0} contains no audio")]
    Empty(PathBuf),
}

/// Planar PCM decoded from a file and converted to the stream sample rate.
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    pub channels: Vec<Vec<f32>>,
    /// Sample rate of `channels`, always the stream rate.
    pub sample_rate: u32,
    /// Sample rate stored in the file.
    pub source_rate: u32,
}

impl DecodedAudio {
    pub fn frames(&self) -> usize {
        self.channels.first().map(|c| c.len()).unwrap_or(0)
    }

    pub fn channel_count(&self) -> ChannelCount {
        ChannelCount::from(self.channels.len() as u16)
    }
}

/// Converts planar PCM from `source_rate` to `target_rate`. Returns the input
/// untouched when the rates already match.
pub fn resample_channels(
    channels: Vec<Vec<f32>>,
    source_rate: u32,
    target_rate: u32,
) -> Vec<Vec<f32>> {
    if source_rate == target_rate || source_rate == 0 || target_rate == 0 {
        return channels;
    }

    let resampler = SincResampler::new(10000, source_rate, target_rate, 32);
    channels
        .into_iter()
        .map(|samples| resampler.resample_vec(&samples))
        .collect()
}

/// Decodes any format symphonia can probe into planar f32 PCM at the
/// stream's sample rate. Mono files stay mono.
pub fn load_audio_file(
    path: impl AsRef<Path>,
    stream_params: AudioStreamParams,
) -> Result<DecodedAudio, AudioLoadError> {
    let path = path.as_ref();
    let extension = path.extension().and_then(|ext| ext.to_str());

    let file = File::open(path).map_err(|e| AudioLoadError::IOError(path.to_owned(), e))?;

    // Create the media source stream using the boxed media source from above.
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    // Create a hint to help the format registry guess what format reader is appropriate.
    let mut hint = Hint::new();
    if let Some(extension) = extension {
        hint.with_extension(extension);
    }

    let format_opts: FormatOptions = Default::default();
    let metadata_opts: MetadataOptions = Default::default();
    let decoder_opts: DecoderOptions = Default::default();

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &format_opts, &metadata_opts)
        .map_err(|x| AudioLoadError::AudioDecodingFailed(path.to_owned(), x))?;

    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| AudioLoadError::NoTracks(path.to_owned()))?;

    let source_rate = track.codec_params.sample_rate.unwrap_or(44100);
    let channel_count = track.codec_params.channels.map(|c| c.count()).unwrap_or(1);

    ChannelCount::from_count(channel_count as u16)
        .ok_or_else(|| AudioLoadError::InvalidChannelCount(path.to_owned()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &decoder_opts)
        .map_err(|x| AudioLoadError::AudioDecodingFailed(path.to_owned(), x))?;

    let track_id = track.id;

    let mut builder = BuilderVecs::new(channel_count);

    loop {
        let packet = match format.next_packet() {
            Err(Error::IoError(error)) if error.kind() == io::ErrorKind::UnexpectedEof => {
                // Audio source ended. Currently the lib has no cleaner way of detecting this.
                break;
            }
            Err(error) => return Err(AudioLoadError::AudioDecodingFailed(path.to_owned(), error)),
            Ok(packet) => packet,
        };

        if packet.track_id() != track_id {
            continue;
        }

        // Corrupt packets are skipped
        match decoder.decode(&packet) {
            Ok(audio_buf) => builder.push(audio_buf),
            Err(Error::DecodeError(_)) => (),
            Err(e) => return Err(AudioLoadError::AudioDecodingFailed(path.to_owned(), e)),
        }
    }

    let channels = builder.finish();
    if channels.first().map(|c| c.is_empty()).unwrap_or(true) {
        return Err(AudioLoadError::Empty(path.to_owned()));
    }

    Ok(DecodedAudio {
        channels: resample_channels(channels, source_rate, stream_params.sample_rate),
        sample_rate: stream_params.sample_rate,
        source_rate,
    })
}

struct BuilderVecs {
    vecs: Vec<Vec<f32>>,
}

impl BuilderVecs {
    fn new(channels: usize) -> Self {
        Self {
            vecs: vec![Vec::new(); channels],
        }
    }

    fn push(&mut self, buffer: AudioBufferRef) {
        match buffer {
            AudioBufferRef::U8(buf) => self.push_buffer(&buf),
            AudioBufferRef::U16(buf) => self.push_buffer(&buf),
            AudioBufferRef::U24(buf) => self.push_buffer(&buf),
            AudioBufferRef::U32(buf) => self.push_buffer(&buf),
            AudioBufferRef::S8(buf) => self.push_buffer(&buf),
            AudioBufferRef::S16(buf) => self.push_buffer(&buf),
            AudioBufferRef::S24(buf) => self.push_buffer(&buf),
            AudioBufferRef::S32(buf) => self.push_buffer(&buf),
            AudioBufferRef::F32(buf) => self.push_buffer(&buf),
            AudioBufferRef::F64(buf) => self.push_buffer(&buf),
        }
    }

    fn push_buffer(&mut self, buffer: &AudioBuffer<impl Sample + IntoSample<f32>>) {
        let channels = buffer.spec().channels.count().min(self.vecs.len());

        for c in 0..channels {
            let channel = buffer.chan(c);
            self.vecs[c].extend(channel.iter().map(|&s| -> f32 { s.into_sample() }));
        }
    }

    fn finish(self) -> Vec<Vec<f32>> {
        let mut vecs = self.vecs;
        for chan in vecs.iter_mut() {
            chan.shrink_to_fit();
        }
        vecs
    }
}
