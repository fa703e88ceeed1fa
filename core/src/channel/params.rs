use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

/// Counters written by the render side of a channel.
#[derive(Debug, Clone, Default)]
pub struct VoiceChannelStats {
    pub(super) voice_counter: Arc<AtomicU64>,
    pub(super) fading_counter: Arc<AtomicU64>,
    pub(super) stolen_counter: Arc<AtomicU64>,
}

/// Lock-free view of a channel's [`VoiceChannelStats`], readable from any thread.
#[derive(Debug, Clone)]
pub struct VoiceChannelStatsReader {
    stats: VoiceChannelStats,
}

impl VoiceChannelStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(super) fn store_counts(&self, active: usize, fading: usize) {
        self.voice_counter.store(active as u64, Ordering::Relaxed);
        self.fading_counter.store(fading as u64, Ordering::Relaxed);
    }

    pub(super) fn count_steal(&self) {
        self.stolen_counter.fetch_add(1, Ordering::Relaxed);
    }
}

impl VoiceChannelStatsReader {
    pub fn new(stats: VoiceChannelStats) -> Self {
        Self { stats }
    }

    /// Voices holding a pool slot.
    pub fn voice_count(&self) -> u64 {
        self.stats.voice_counter.load(Ordering::Relaxed)
    }

    /// Stolen voices still fading out.
    pub fn fading_count(&self) -> u64 {
        self.stats.fading_counter.load(Ordering::Relaxed)
    }

    /// Voices stolen since the channel was created.
    pub fn stolen_count(&self) -> u64 {
        self.stats.stolen_counter.load(Ordering::Relaxed)
    }
}
