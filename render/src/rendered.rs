use std::path::Path;

use wavesynth_core::{
    channel_group::{ChannelGroup, SynthEvent},
    AudioPipe, AudioStreamParams,
};

use crate::{config::RenderConfig, writer::AudioFileWriter, RenderError};

/// Longest stretch rendered in one call, in seconds.
const MAX_BATCH_SECONDS: f64 = 10.0;

/// Length of one step while rendering the release tail, in seconds.
const TAIL_STEP_SECONDS: f64 = 0.1;

struct BatchRenderElements {
    output_vec: Vec<f32>,
    missed_samples: f64,
}

/// What a finished render produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSummary {
    pub frames: u64,
    pub seconds: f64,
}

/// Renders a [`ChannelGroup`] into an audio file, driven by the caller's
/// events and timing.
pub struct OfflineRender {
    config: RenderConfig,
    channel_group: ChannelGroup,
    audio_writer: AudioFileWriter,
    render_elements: BatchRenderElements,
}

impl OfflineRender {
    pub fn new(config: RenderConfig, out_path: &Path) -> Result<Self, RenderError> {
        let channel_group = ChannelGroup::new(config.group);
        let audio_writer = AudioFileWriter::new(&config, out_path)?;
        tracing::debug!(path = %out_path.display(), "opened render output");

        Ok(Self {
            config,
            channel_group,
            audio_writer,
            render_elements: BatchRenderElements {
                output_vec: Vec::new(),
                missed_samples: 0.0,
            },
        })
    }

    pub fn get_params(&self) -> AudioStreamParams {
        self.config.audio_params()
    }

    pub fn send_event(&mut self, event: SynthEvent) {
        self.channel_group.send_event(event);
    }

    /// Renders `event_time` seconds of audio. Fractions of a frame are
    /// carried over to the next call so that event timing doesn't drift.
    pub fn render_batch(&mut self, event_time: f64) -> Result<(), RenderError> {
        if event_time.is_nan() || event_time <= 0.0 {
            return Ok(());
        }

        let mut remaining_time = event_time;
        while remaining_time > MAX_BATCH_SECONDS {
            self.render_batch_inner(MAX_BATCH_SECONDS)?;
            remaining_time -= MAX_BATCH_SECONDS;
        }
        self.render_batch_inner(remaining_time)
    }

    fn render_batch_inner(&mut self, event_time: f64) -> Result<(), RenderError> {
        let params = self.get_params();
        let samples =
            params.sample_rate as f64 * event_time + self.render_elements.missed_samples;
        self.render_elements.missed_samples = samples % 1.0;
        let samples = samples as usize * params.channels.count() as usize;

        self.render_elements.output_vec.resize(samples, 0.0);
        self.channel_group
            .read_samples(&mut self.render_elements.output_vec);
        self.audio_writer
            .write_samples(&self.render_elements.output_vec)
    }

    /// Renders until the output falls silent or the tail limit is reached,
    /// then finishes the file.
    pub fn finalize(mut self) -> Result<RenderSummary, RenderError> {
        let params = self.get_params();
        let step = (params.sample_rate as f64 * TAIL_STEP_SECONDS).ceil() as usize
            * params.channels.count() as usize;
        let max_steps = (self.config.tail_limit.max(0.0) / TAIL_STEP_SECONDS).ceil() as usize;

        for _ in 0..max_steps {
            self.render_elements.output_vec.resize(step, 0.0);
            self.channel_group
                .read_samples(&mut self.render_elements.output_vec);

            let threshold = self.config.silence_threshold;
            let is_empty = self
                .render_elements
                .output_vec
                .iter()
                .all(|s| s.abs() <= threshold);
            if is_empty {
                break;
            }
            self.audio_writer
                .write_samples(&self.render_elements.output_vec)?;
        }

        let frames = self.audio_writer.written() / params.channels.count() as u64;
        self.audio_writer.finalize()?;

        let summary = RenderSummary {
            frames,
            seconds: frames as f64 / params.sample_rate.max(1) as f64,
        };
        tracing::info!(frames, seconds = summary.seconds, "render finished");
        Ok(summary)
    }

    pub fn voice_count(&self) -> u64 {
        self.channel_group.voice_count()
    }
}
