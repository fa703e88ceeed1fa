use std::{fs::File, io::BufWriter, path::Path};

use hound::{WavSpec, WavWriter};

use crate::{
    config::{RenderAudioFormat, RenderConfig},
    RenderError,
};

pub struct AudioFileWriter {
    wav_writer: WavWriter<BufWriter<File>>,
    written: u64,
}

impl AudioFileWriter {
    pub fn new(config: &RenderConfig, path: &Path) -> Result<Self, RenderError> {
        let params = config.audio_params();
        match config.audio_format {
            RenderAudioFormat::Wav => {
                let spec = WavSpec {
                    channels: params.channels.count(),
                    sample_rate: params.sample_rate,
                    bits_per_sample: 32,
                    sample_format: hound::SampleFormat::Float,
                };
                let wav_writer = WavWriter::create(path, spec)?;
                Ok(Self {
                    wav_writer,
                    written: 0,
                })
            }
        }
    }

    /// Writes interleaved samples.
    pub fn write_samples(&mut self, samples: &[f32]) -> Result<(), RenderError> {
        for s in samples {
            self.wav_writer.write_sample(*s)?;
        }
        self.written += samples.len() as u64;
        Ok(())
    }

    /// Interleaved samples written so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn finalize(self) -> Result<(), RenderError> {
        self.wav_writer.finalize()?;
        Ok(())
    }
}
