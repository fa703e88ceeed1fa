use crate::channel::ChannelEvent;

/// Wrapper enum for various events to be sent to the synthesizer.
#[derive(Debug, Clone)]
pub enum SynthEvent {
    /// An event to be sent to the specified channel
    Channel(u32, ChannelEvent),

    /// An event to be sent to all available channels.
    ///
    /// Config events are cloned for every channel. `RealtimeEventSender`
    /// splits them up before they reach the audio thread.
    AllChannels(ChannelEvent),
}
