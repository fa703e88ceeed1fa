use std::{fs::File, path::PathBuf, sync::Arc};

use rayon::prelude::*;
use symphonia::core::formats::FormatOptions;
use symphonia::core::{audio::AudioBuffer, conv::IntoSample, probe::Hint, sample::Sample};
use symphonia::core::{audio::AudioBufferRef, meta::MetadataOptions};
use symphonia::core::{audio::Signal, io::MediaSourceStream};
use symphonia::core::{codecs::DecoderOptions, errors::Error};

use super::{SampleBuffer, SampleLoadError, SampleOptions};

/// Decodes an audio file into a [`SampleBuffer`].
///
/// Any container and codec enabled in symphonia's default features is
/// accepted. Mono and stereo files are supported.
pub fn load_sample_file(
    path: &PathBuf,
    options: SampleOptions,
) -> Result<SampleBuffer, SampleLoadError> {
    let extension = path.extension().and_then(|ext| ext.to_str());

    let file = Box::new(File::open(path)?);

    // Create the media source stream using the boxed media source from above.
    let mss = MediaSourceStream::new(file, Default::default());

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
        .map_err(|x| SampleLoadError::AudioDecodingFailed(path.clone(), x))?;

    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| SampleLoadError::NoTracks(path.clone()))?;

    let sample_rate = track.codec_params.sample_rate.unwrap_or(44100);
    let channel_count = track.codec_params.channels.map(|c| c.count()).unwrap_or(1);
    if !(1..=2).contains(&channel_count) {
        return Err(SampleLoadError::InvalidChannelCount(channel_count));
    }

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &decoder_opts)
        .map_err(|x| SampleLoadError::AudioDecodingFailed(path.clone(), x))?;

    // Store the track identifier, we'll use it to filter packets.
    let track_id = track.id;

    let mut builder = BuilderVecs::new(channel_count);

    loop {
        let packet = match format.next_packet() {
            Err(Error::IoError(error)) if error.kind() == std::io::ErrorKind::UnexpectedEof => {
                // Audio source ended. Currently the lib has no cleaner way of detecting this.
                break;
            }
            Err(error) => return Err(SampleLoadError::AudioDecodingFailed(path.clone(), error)),
            Ok(packet) => packet,
        };

        if packet.track_id() != track_id {
            continue;
        }

        // Decode the packet into audio samples, skipping corrupt packets.
        match decoder.decode(&packet) {
            Ok(audio_buf) => builder.push(audio_buf),
            Err(Error::DecodeError(err)) => {
                tracing::warn!(path = %path.display(), "Skipping undecodable packet: {err}");
            }
            Err(e) => return Err(SampleLoadError::AudioDecodingFailed(path.clone(), e)),
        }
    }

    let buffer = SampleBuffer::from_planar(builder.finish(), sample_rate, options)?;
    tracing::debug!(
        path = %path.display(),
        frames = buffer.len(),
        channels = buffer.channel_count(),
        sample_rate,
        "Loaded sample"
    );
    Ok(buffer)
}

/// Loads several files in parallel, keeping the order of `files`.
pub fn load_sample_files(
    files: &[(PathBuf, SampleOptions)],
) -> Vec<Result<Arc<SampleBuffer>, SampleLoadError>> {
    files
        .par_iter()
        .map(|(path, options)| {
            load_sample_file(path, *options).map(Arc::new).map_err(|err| {
                tracing::error!(path = %path.display(), "Failed to load sample: {err}");
                err
            })
        })
        .collect()
}

struct BuilderVecs {
    vecs: Vec<Vec<f32>>,
}

impl BuilderVecs {
    fn new(channels: usize) -> Self {
        let mut vecs = Vec::new();
        for _ in 0..channels {
            vecs.push(Vec::new());
        }

        Self { vecs }
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
            self.vecs[c].reserve(channel.len());
            for &sample in channel.iter() {
                self.vecs[c].push(sample.into_sample());
            }
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file() {
        let result = load_sample_file(
            &PathBuf::from("does/not/exist.wav"),
            SampleOptions::default(),
        );
        assert!(matches!(result, Err(SampleLoadError::IOError(_))));
    }

    #[test]
    fn test_undecodable_file() {
        let path = std::env::temp_dir().join("wavesynth_not_audio.wav");
        std::fs::write(&path, b"definitely not a wave file").unwrap();
        let results = load_sample_files(&[(path.clone(), SampleOptions::default())]);
        assert_eq!(results.len(), 1);
        assert!(matches!(
            results[0],
            Err(SampleLoadError::AudioDecodingFailed(..))
        ));
        std::fs::remove_file(path).ok();
    }
}
