//! Benchmark for a realistic multi-effect chain with live automation.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use rackfx::{EffectChain, EffectKind};

use crate::BLOCK_SIZES;

const SAMPLE_RATE: f32 = 48_000.0;

pub fn bench_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("chain/full");

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size * 2).map(|i| (i as f32 * 0.1).sin()).collect();

        // A plausible performance rack: phaser into tape delay into
        // waveshaper, with automated sweep and mix.
        let mut chain = EffectChain::new(SAMPLE_RATE);
        let phaser = chain.push(EffectKind::Phaser);
        let delay = chain.push(EffectKind::TapeDelay);
        let shaper = chain.push(EffectKind::WaveShaper);

        chain.set_parameter(delay, "feedback", 0.4);
        chain.set_parameter(shaper, "drive", 4.0);
        chain.add_automation_point(phaser, "rate", 0.0, 0.2);
        chain.add_automation_point(phaser, "rate", 30.0, 6.0);
        chain.set_parameter_automated(phaser, "rate", true);
        chain.add_automation_point(delay, "mix", 0.0, 0.1);
        chain.add_automation_point(delay, "mix", 30.0, 0.8);
        chain.set_parameter_automated(delay, "mix", true);

        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("stereo", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                chain.process(black_box(&mut buffer), SAMPLE_RATE, 2);
            })
        });
    }

    group.finish();
}
