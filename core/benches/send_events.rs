use criterion::criterion_group;
use criterion::criterion_main;
use criterion::Criterion;

use wavesynth_core::channel::ChannelAudioEvent;
use wavesynth_core::channel::ChannelEvent;
use wavesynth_core::channel::ChannelInitOptions;
use wavesynth_core::channel::InstrumentChannel;
use wavesynth_core::AudioPipe;
use wavesynth_core::AudioStreamParams;
use wavesynth_core::ChannelCount;

fn stress_channel(channel: &mut InstrumentChannel) {
    let mut buffer = vec![0.0; 64];
    for _ in 0..40 {
        for i in 0..127 {
            channel.process_event(ChannelEvent::Audio(ChannelAudioEvent::NoteOn {
                key: i as u8,
                vel: 1.0,
            }));
        }
        for i in 0..127 {
            channel.process_event(ChannelEvent::Audio(ChannelAudioEvent::NoteOff {
                key: i as u8,
            }));
        }

        channel.read_samples(&mut buffer);
    }
}

fn criterion_benchmark(c: &mut Criterion) {
    let stream_params = AudioStreamParams::new(48000, ChannelCount::Stereo);

    c.bench_function("send events (32 voices, hard cut)", |f| {
        f.iter(|| {
            let init = ChannelInitOptions {
                voice_count: 32,
                fade_out_killing: false,
                ..Default::default()
            };
            let mut channel = InstrumentChannel::new(init, stream_params);
            stress_channel(&mut channel)
        })
    });

    c.bench_function("send events (32 voices, fade out)", |f| {
        f.iter(|| {
            let init = ChannelInitOptions {
                voice_count: 32,
                fade_out_killing: true,
                ..Default::default()
            };
            let mut channel = InstrumentChannel::new(init, stream_params);
            stress_channel(&mut channel)
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
