use crate::{
    instrument::{BackendKind, InstrumentParams},
    voice::{Voice, VoiceControlData, KILL_FADE_SECONDS},
};

use super::{RetireSink, VoiceChannelStats};

/// What happens to the voice taken over when the pool is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum VoiceStealMode {
    /// The stolen voice keeps sounding in a tail slot while it fades out.
    #[default]
    FadeOut,
    /// The stolen voice stops immediately.
    HardCut,
}

/// Identifies a voice started by [`VoicePool::note_on`].
///
/// A handle goes stale once its voice ends or its slot is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VoiceHandle {
    slot: usize,
    generation: u64,
}

impl VoiceHandle {
    pub fn slot(&self) -> usize {
        self.slot
    }
}

struct Slot {
    voice: Voice,
    active: bool,
    generation: u64,
}

/// A fixed set of voice slots plus a smaller set of fade-out tails.
///
/// Everything is allocated up front, nothing here allocates after
/// construction. There is always at least one tail, so fading out a stolen
/// voice never degrades into a hard cut.
pub struct VoicePool {
    slots: Box<[Slot]>,
    /// Free slot indexes, sorted so that the lowest index is popped first
    free: Vec<usize>,
    tails: Box<[Slot]>,
    steal_mode: VoiceStealMode,
    next_sequence: u64,
    retire: RetireSink,
    stats: VoiceChannelStats,
}

impl VoicePool {
    pub fn new(voice_count: usize, tail_count: usize, sample_rate: f32) -> Self {
        let voice_count = voice_count.max(1);
        let make_slots = |count: usize| {
            (0..count)
                .map(|_| Slot {
                    voice: Voice::new(sample_rate),
                    active: false,
                    generation: 0,
                })
                .collect::<Vec<_>>()
                .into_boxed_slice()
        };

        VoicePool {
            slots: make_slots(voice_count),
            free: (0..voice_count).rev().collect(),
            tails: make_slots(tail_count.max(1)),
            steal_mode: VoiceStealMode::default(),
            next_sequence: 0,
            retire: RetireSink::inline(),
            stats: VoiceChannelStats::new(),
        }
    }

    pub fn set_retire_sink(&mut self, sink: RetireSink) {
        self.retire = sink;
    }

    pub(super) fn set_stats(&mut self, stats: VoiceChannelStats) {
        self.stats = stats;
    }

    pub fn steal_mode(&self) -> VoiceStealMode {
        self.steal_mode
    }

    pub fn set_steal_mode(&mut self, mode: VoiceStealMode) {
        self.steal_mode = mode;
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Voices holding a slot, including released ones that are still sounding.
    pub fn active_count(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Stolen voices that are still fading out.
    pub fn fading_count(&self) -> usize {
        self.tails.iter().filter(|t| t.active).count()
    }

    /// The voice behind a handle, if the handle is still current.
    pub fn get(&self, handle: VoiceHandle) -> Option<&Voice> {
        self.slots
            .get(handle.slot)
            .filter(|slot| slot.active && slot.generation == handle.generation)
            .map(|slot| &slot.voice)
    }

    pub fn voices(&self) -> impl Iterator<Item = &Voice> {
        self.slots.iter().filter(|s| s.active).map(|s| &s.voice)
    }

    /// Starts a voice, stealing one if every slot is taken.
    pub fn note_on(&mut self, note: u8, velocity: f32, params: &InstrumentParams) -> VoiceHandle {
        let index = match self.free.pop() {
            Some(index) => index,
            None => self.steal(),
        };

        let sequence = self.next_sequence;
        self.next_sequence += 1;

        let slot = &mut self.slots[index];
        slot.active = true;
        slot.generation += 1;
        let previous = slot.voice.start(note, velocity, sequence, params);
        let handle = VoiceHandle {
            slot: index,
            generation: slot.generation,
        };
        self.retire.retire_sample(previous);
        self.publish_counts();

        handle
    }

    /// Picks the voice that has been playing the longest and frees its slot.
    fn steal(&mut self) -> usize {
        let victim = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.active)
            .max_by(|(ia, a), (ib, b)| {
                a.voice
                    .age()
                    .cmp(&b.voice.age())
                    .then(b.voice.sequence().cmp(&a.voice.sequence()))
                    .then(ib.cmp(ia))
            })
            .map(|(i, _)| i)
            .unwrap_or(0);

        if self.steal_mode == VoiceStealMode::FadeOut && !self.tails.is_empty() {
            let tail = self.claim_tail();
            std::mem::swap(&mut self.slots[victim].voice, &mut self.tails[tail].voice);
            self.tails[tail].voice.kill(KILL_FADE_SECONDS);
            self.tails[tail].active = true;
        }

        self.slots[victim].active = false;
        self.stats.count_steal();
        victim
    }

    /// A free tail slot, cutting the oldest tail if all are in use.
    fn claim_tail(&mut self) -> usize {
        if let Some(index) = self.tails.iter().position(|t| !t.active) {
            return index;
        }

        let oldest = self
            .tails
            .iter()
            .enumerate()
            .min_by_key(|(_, t)| t.voice.sequence())
            .map(|(i, _)| i)
            .unwrap_or(0);
        self.tails[oldest].active = false;
        let sample = self.tails[oldest].voice.take_sample();
        self.retire.retire_sample(sample);
        oldest
    }

    /// Releases every held voice playing `note`.
    pub fn note_off(&mut self, note: u8) {
        for slot in self.slots.iter_mut().filter(|s| s.active) {
            if slot.voice.note() == note && !slot.voice.is_releasing() {
                slot.voice.note_off();
            }
        }
    }

    pub fn all_notes_off(&mut self) {
        for slot in self.slots.iter_mut().filter(|s| s.active) {
            slot.voice.note_off();
        }
    }

    /// Fades out every voice, including tails.
    pub fn kill_all(&mut self) {
        for slot in self
            .slots
            .iter_mut()
            .chain(self.tails.iter_mut())
            .filter(|s| s.active)
        {
            slot.voice.kill(KILL_FADE_SECONDS);
        }
    }

    /// Fades out every voice started with a backend other than `kind`.
    ///
    /// Returns whether there were any.
    pub fn kill_other_kinds(&mut self, kind: BackendKind) -> bool {
        let mut killed = false;
        for slot in self
            .slots
            .iter_mut()
            .chain(self.tails.iter_mut())
            .filter(|s| s.active && s.voice.kind() != kind)
        {
            slot.voice.kill(KILL_FADE_SECONDS);
            killed = true;
        }
        killed
    }

    /// Whether any voice started with a backend other than `kind` is sounding.
    pub fn has_other_kinds(&self, kind: BackendKind) -> bool {
        self.slots
            .iter()
            .chain(self.tails.iter())
            .any(|s| s.active && s.voice.kind() != kind)
    }

    /// Renders all voices into the outputs, then frees the ones that ended.
    pub fn render(
        &mut self,
        params: &InstrumentParams,
        control: &VoiceControlData,
        left: &mut [f32],
        right: &mut [f32],
    ) {
        self.render_with_outgoing(params, None, control, left, right);
    }

    /// Like [`VoicePool::render`], but voices started on another backend
    /// than `params` finish on `outgoing`, the instrument being replaced.
    pub fn render_with_outgoing(
        &mut self,
        params: &InstrumentParams,
        outgoing: Option<&InstrumentParams>,
        control: &VoiceControlData,
        left: &mut [f32],
        right: &mut [f32],
    ) {
        let kind = params.kind();
        for slot in self
            .slots
            .iter_mut()
            .chain(self.tails.iter_mut())
            .filter(|s| s.active)
        {
            let voice_params = match outgoing {
                Some(old) if slot.voice.kind() != kind => old,
                _ => params,
            };
            slot.voice.render_into(voice_params, control, left, right);
        }

        self.sweep();
    }

    /// Returns ended voices to the free list.
    pub fn sweep(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.active && slot.voice.ended() {
                slot.active = false;
                self.retire.retire_sample(slot.voice.take_sample());
                let pos = self.free.partition_point(|&free| free > index);
                self.free.insert(pos, index);
            }
        }

        for tail in self.tails.iter_mut() {
            if tail.active && tail.voice.ended() {
                tail.active = false;
                self.retire.retire_sample(tail.voice.take_sample());
            }
        }

        self.publish_counts();
    }

    fn publish_counts(&self) {
        self.stats
            .store_counts(self.active_count(), self.fading_count());
    }
}
