use std::sync::Arc;

use rand::{Rng, SeedableRng};
use wavesynth_core::{
    channel::{
        ChannelAudioEvent, ChannelConfigEvent, ChannelEvent, ChannelInitOptions,
        InstrumentChannel, VoicePool, VoiceStealMode,
    },
    channel_group::{ChannelGroup, ChannelGroupConfig, SynthEvent},
    instrument::{InstrumentParams, ParameterKey},
    realtime::{realtime_pair, RealtimeConfig, RealtimeSynth},
    sample::{LoopMode, LoopRegion, SampleBuffer, SampleOptions},
    voice::{Envelope, EnvelopeDescriptor, EnvelopeStage, VoiceControlData},
    AudioPipe, AudioStreamParams, ChannelCount,
};

fn organ_envelope() -> EnvelopeDescriptor {
    EnvelopeDescriptor {
        delay: 0.0,
        attack: 0.0,
        hold: 0.0,
        decay: 0.0,
        sustain: 1.0,
        release: 0.1,
        curve: 0.0,
    }
}

fn peak(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0f32, |a, b| a.max(b.abs()))
}

#[test]
fn a4_sine_end_to_end() {
    let mut channel = InstrumentChannel::new(
        ChannelInitOptions::default(),
        AudioStreamParams::new(44100, ChannelCount::Mono),
    );
    let instrument = InstrumentParams::sine()
        .with_amp_envelope(organ_envelope())
        .with_volume(1.0);
    channel.process_event(ChannelEvent::Config(ChannelConfigEvent::SetInstrument(
        Box::new(instrument),
    )));
    channel.process_event(ChannelEvent::Audio(ChannelAudioEvent::NoteOn {
        key: 69,
        vel: 1.0,
    }));

    let mut out = vec![0.0; 4410];
    channel.read_samples(&mut out);

    assert!(out[0].abs() < 1e-6);
    // One full period of 440Hz is 100.2 samples at 44.1kHz
    assert!(out[100].abs() < 0.02, "{}", out[100]);
    assert!((peak(&out) - 1.0).abs() < 0.01, "{}", peak(&out));
}

#[test]
fn velocity_scales_peak() {
    let mut channel =
        InstrumentChannel::new(ChannelInitOptions::default(), AudioStreamParams::default());
    channel.process_event(ChannelEvent::Config(ChannelConfigEvent::SetInstrument(
        Box::new(
            InstrumentParams::sine()
                .with_amp_envelope(organ_envelope())
                .with_volume(1.0),
        ),
    )));
    channel.note_on(69, 0.25);

    let mut left = vec![0.0; 2048];
    let mut right = vec![0.0; 2048];
    channel.render_block(&mut left, &mut right);
    assert!((peak(&left) - 0.25).abs() < 0.01);
}

#[test]
fn single_voice_pool_steals() {
    let params = InstrumentParams::sine().with_amp_envelope(organ_envelope());
    let control = VoiceControlData::new_defaults(48000.0);
    let mut pool = VoicePool::new(1, 1, 48000.0);

    let first = pool.note_on(60, 1.0, &params);
    let mut left = vec![0.0; 128];
    let mut right = vec![0.0; 128];
    pool.render(&params, &control, &mut left, &mut right);

    let second = pool.note_on(72, 1.0, &params);
    assert_eq!(pool.active_count(), 1);
    assert!(pool.get(first).is_none());
    assert_eq!(pool.get(second).map(|v| v.note()), Some(72));
}

#[test]
fn overflowing_pool_keeps_newest_notes() {
    let params = InstrumentParams::sine().with_amp_envelope(organ_envelope());
    let control = VoiceControlData::new_defaults(48000.0);

    for mode in [VoiceStealMode::FadeOut, VoiceStealMode::HardCut] {
        let voices = 8;
        let mut pool = VoicePool::new(voices, 4, 48000.0);
        pool.set_steal_mode(mode);

        let mut left = vec![0.0; 64];
        let mut right = vec![0.0; 64];
        for note in 0..=voices as u8 {
            pool.note_on(40 + note, 1.0, &params);
            pool.render(&params, &control, &mut left, &mut right);
        }

        assert_eq!(pool.active_count(), voices);
        let mut notes = pool.voices().map(|v| v.note()).collect::<Vec<_>>();
        notes.sort();
        assert_eq!(notes, (41..=48).collect::<Vec<u8>>());

        match mode {
            VoiceStealMode::FadeOut => assert_eq!(pool.fading_count(), 1),
            VoiceStealMode::HardCut => assert_eq!(pool.fading_count(), 0),
        }
    }
}

#[test]
fn fade_out_steal_avoids_clicks() {
    let params = InstrumentParams::sine()
        .with_amp_envelope(organ_envelope())
        .with_volume(1.0);
    let control = VoiceControlData::new_defaults(48000.0);

    let render_steal = |mode: VoiceStealMode| {
        let mut pool = VoicePool::new(1, 1, 48000.0);
        pool.set_steal_mode(mode);
        // 1.5kHz, so the voice is far from zero when it is stolen
        pool.note_on(90, 1.0, &params);
        let mut left = vec![0.0; 101];
        let mut right = vec![0.0; 101];
        pool.render(&params, &control, &mut left, &mut right);
        let before = left[100];

        pool.note_on(30, 1.0, &params);
        let mut left = vec![0.0; 1];
        let mut right = vec![0.0; 1];
        pool.render(&params, &control, &mut left, &mut right);
        (before, left[0])
    };

    let (before, after) = render_steal(VoiceStealMode::FadeOut);
    assert!(before.abs() > 0.1);
    assert!((after - before).abs() < 0.3, "{before} -> {after}");

    let (before, after) = render_steal(VoiceStealMode::HardCut);
    assert!((after - before).abs() > 0.1, "{before} -> {after}");
}

#[test]
fn random_envelopes_stay_bounded() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(0x5eed);

    for _ in 0..200 {
        let desc = EnvelopeDescriptor {
            delay: rng.gen_range(0.0..0.01),
            attack: rng.gen_range(0.0..0.02),
            hold: rng.gen_range(0.0..0.01),
            decay: rng.gen_range(0.0..0.02),
            sustain: rng.gen_range(0.0..=1.0),
            release: rng.gen_range(0.0..0.02),
            curve: rng.gen_range(-1.0..=1.0),
        };
        let mut env = Envelope::new(desc);
        let note_off_at = rng.gen_range(0..4000);

        for i in 0..6000 {
            if i == note_off_at {
                env.note_off();
            }
            let value = env.advance(1.0 / 48000.0);
            assert!((0.0..=1.0).contains(&value), "{desc:?}: {value}");
        }
        // Released long enough ago
        assert_eq!(env.stage(), EnvelopeStage::Off);
        assert_eq!(env.value(), 0.0);
    }
}

#[test]
fn looped_sample_plays_until_release() {
    let frames = (0..1000).map(|i| (i as f32 * 0.05).sin() * 0.5).collect();
    let buffer = SampleBuffer::from_planar(
        vec![frames],
        48000,
        SampleOptions {
            loop_region: Some(LoopRegion::new(200, 800, 64)),
            loop_mode: LoopMode::LoopSustain,
            ..Default::default()
        },
    )
    .unwrap();

    let mut group = ChannelGroup::new(ChannelGroupConfig {
        channel_count: 1,
        ..Default::default()
    });
    let instrument = InstrumentParams::sampler(Arc::new(buffer)).with_amp_envelope(EnvelopeDescriptor {
        release: 1.0,
        ..organ_envelope()
    });
    group.send_event(SynthEvent::Channel(
        0,
        ChannelEvent::Config(ChannelConfigEvent::SetInstrument(Box::new(instrument))),
    ));
    group.send_event(SynthEvent::Channel(
        0,
        ChannelEvent::Audio(ChannelAudioEvent::NoteOn { key: 60, vel: 1.0 }),
    ));

    let mut out = vec![0.0; 2 * 48000];
    group.read_samples(&mut out);
    assert_eq!(group.voice_count(), 1);
    assert!(peak(&out[out.len() - 2000..]) > 0.1);

    // Plays through the last 200 frames after the release, then stops
    group.send_event(SynthEvent::AllChannels(ChannelEvent::Audio(
        ChannelAudioEvent::NoteOff { key: 60 },
    )));
    let mut out = vec![0.0; 2 * 1024];
    group.read_samples(&mut out);
    assert_eq!(group.voice_count(), 0);
}

#[test]
fn replaced_sample_is_freed_on_control_side() {
    let buffer = Arc::new(
        SampleBuffer::from_planar(vec![vec![0.25; 4800]], 48000, SampleOptions::default())
            .unwrap(),
    );

    let RealtimeSynth {
        mut sender,
        mut renderer,
        ..
    } = realtime_pair(RealtimeConfig::default());

    sender
        .set_instrument(0, InstrumentParams::sampler(buffer.clone()))
        .unwrap();
    sender.note_on(0, 60, 1.0).unwrap();

    let mut out = vec![0.0; 512];
    renderer.read_samples(&mut out);
    // Held by the test, the mirror, the channel and the voice
    assert_eq!(Arc::strong_count(&buffer), 4);

    sender.set_instrument(0, InstrumentParams::sine()).unwrap();
    sender.all_notes_killed(0).unwrap();
    for _ in 0..4 {
        renderer.read_samples(&mut out);
    }

    // Nothing was freed on the render side
    assert_eq!(Arc::strong_count(&buffer), 3);
    assert_eq!(sender.collect_garbage(), 2);
    assert_eq!(Arc::strong_count(&buffer), 1);
}

#[test]
fn parameter_changes_reach_voices() {
    let RealtimeSynth {
        mut sender,
        mut renderer,
        mut meter,
    } = realtime_pair(RealtimeConfig::default());

    sender.set_instrument(0, InstrumentParams::sine()).unwrap();
    sender.note_on(0, 69, 1.0).unwrap();
    let mut out = vec![0.0; 4096];
    renderer.read_samples(&mut out);
    let loud = meter.levels().peak[0];

    sender.set_parameter(0, ParameterKey::Volume, 0.2).unwrap();
    renderer.read_samples(&mut out);
    let quiet = meter.levels().peak[0];

    assert!(loud > 0.5);
    assert!(quiet < loud * 0.3);
    assert_eq!(sender.voice_count(0), Some(1));
}
