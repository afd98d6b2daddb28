use std::{fs::File, io::BufWriter, path::Path};

use hound::{WavSpec, WavWriter};

use drumkit_core::AudioStreamParams;

/// Writes interleaved 32-bit float samples to a WAV file.
pub(crate) struct AudioFileWriter {
    writer: WavWriter<BufWriter<File>>,
}

impl AudioFileWriter {
    pub fn create(path: &Path, params: AudioStreamParams) -> Result<Self, hound::Error> {
        let spec = WavSpec {
            channels: params.channels.count(),
            sample_rate: params.sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        Ok(Self {
            writer: WavWriter::create(path, spec)?,
        })
    }

    pub fn write_samples(&mut self, samples: &[f32]) -> Result<(), hound::Error> {
        for &s in samples {
            self.writer.write_sample(s)?;
        }
        Ok(())
    }

    pub fn finalize(self) -> Result<(), hound::Error> {
        self.writer.finalize()
    }
}
