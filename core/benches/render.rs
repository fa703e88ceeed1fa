use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use wavesynth_core::{
    channel::{ChannelAudioEvent, ChannelConfigEvent, ChannelEvent, ChannelInitOptions},
    channel_group::{ChannelGroup, ChannelGroupConfig, SynthEvent},
    instrument::{ChipParams, InstrumentParams, SubtractiveParams, WavetableParams},
    sample::{LoopMode, LoopRegion, SampleBuffer, SampleOptions},
    AudioPipe,
};

const VOICES: usize = 32;

fn instruments() -> Vec<(&'static str, InstrumentParams)> {
    let mut filtered = SubtractiveParams::default();
    filtered.oscillators[1].level = 0.5;
    filtered.sub_level = 0.5;
    filtered.filter.enabled = true;
    filtered.filter.cutoff = 2000.0;

    let frames = (0..48000)
        .map(|i| (i as f32 * 0.031).sin() * 0.5)
        .collect::<Vec<_>>();
    let sample = SampleBuffer::from_planar(
        vec![frames.clone(), frames],
        48000,
        SampleOptions {
            loop_region: Some(LoopRegion::new(1000, 47000, 256)),
            loop_mode: LoopMode::LoopContinuous,
            ..Default::default()
        },
    )
    .unwrap();

    vec![
        ("subtractive", InstrumentParams::subtractive(filtered)),
        ("wavetable", InstrumentParams::wavetable(WavetableParams::default())),
        ("chip", InstrumentParams::chip(ChipParams::default())),
        ("sampler", InstrumentParams::sampler(Arc::new(sample))),
    ]
}

fn full_group(instrument: &InstrumentParams) -> ChannelGroup {
    let mut group = ChannelGroup::new(ChannelGroupConfig {
        channel_init_options: ChannelInitOptions {
            voice_count: VOICES,
            ..Default::default()
        },
        channel_count: 1,
        ..Default::default()
    });
    group.send_event(SynthEvent::Channel(
        0,
        ChannelEvent::Config(ChannelConfigEvent::SetInstrument(Box::new(
            instrument.clone(),
        ))),
    ));
    for key in 0..VOICES as u8 {
        group.send_event(SynthEvent::Channel(
            0,
            ChannelEvent::Audio(ChannelAudioEvent::NoteOn {
                key: 40 + key,
                vel: 0.8,
            }),
        ));
    }
    group
}

fn criterion_benchmark(c: &mut Criterion) {
    let mut bench = c.benchmark_group("render 512 frames, 32 voices");
    for (name, instrument) in instruments() {
        bench.bench_with_input(BenchmarkId::from_parameter(name), &instrument, |b, i| {
            let mut group = full_group(i);
            let mut out = vec![0.0; 1024];
            b.iter(|| group.read_samples(&mut out));
        });
    }
    bench.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
