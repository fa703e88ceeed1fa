use std::sync::Arc;

use crossbeam_channel::{Sender, TrySendError};

use crate::{instrument::InstrumentParams, sample::SampleBuffer, waveform::Wavetable};

/// Shared data the render side is done with.
///
/// Dropping one of these may free memory, so the render side hands them
/// back to the control side instead.
#[derive(Debug)]
pub enum Retired {
    Instrument(Box<InstrumentParams>),
    Sample(Arc<SampleBuffer>),
    Wavetable(Arc<Wavetable>),
}

/// Where a channel sends [`Retired`] values.
///
/// Without a sender, values are dropped in place. Sending never blocks: if
/// the queue is full the value is dropped in place as well.
#[derive(Debug, Clone, Default)]
pub struct RetireSink {
    sender: Option<Sender<Retired>>,
}

impl RetireSink {
    pub fn new(sender: Sender<Retired>) -> Self {
        RetireSink {
            sender: Some(sender),
        }
    }

    /// A sink that drops everything immediately.
    pub fn inline() -> Self {
        RetireSink { sender: None }
    }

    pub fn is_deferred(&self) -> bool {
        self.sender.is_some()
    }

    /// Returns false if the value had to be dropped in place.
    pub fn retire(&self, value: Retired) -> bool {
        match &self.sender {
            Some(sender) => match sender.try_send(value) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => false,
            },
            None => false,
        }
    }

    pub fn retire_sample(&self, sample: Option<Arc<SampleBuffer>>) {
        if let Some(sample) = sample {
            self.retire(Retired::Sample(sample));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::SampleOptions;

    fn sample() -> Arc<SampleBuffer> {
        Arc::new(
            SampleBuffer::from_planar(vec![vec![0.0; 8]], 48000, SampleOptions::default()).unwrap(),
        )
    }

    #[test]
    fn test_deferred_drop() {
        let (sender, receiver) = crossbeam_channel::bounded(1);
        let sink = RetireSink::new(sender);
        let buffer = sample();

        sink.retire_sample(Some(buffer.clone()));
        assert_eq!(Arc::strong_count(&buffer), 2);

        // Queue is full, dropped in place
        assert!(!sink.retire(Retired::Sample(buffer.clone())));
        assert_eq!(Arc::strong_count(&buffer), 2);

        drop(receiver.try_recv().unwrap());
        assert_eq!(Arc::strong_count(&buffer), 1);
    }

    #[test]
    fn test_inline_sink() {
        let sink = RetireSink::inline();
        let buffer = sample();
        assert!(!sink.retire(Retired::Sample(buffer.clone())));
        assert_eq!(Arc::strong_count(&buffer), 1);
    }
}
