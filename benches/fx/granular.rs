//! Benchmarks for the granular engine at varying densities.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use rackfx::{EffectChain, EffectKind};

use crate::BLOCK_SIZES;

const SAMPLE_RATE: f32 = 48_000.0;

pub fn bench_granular(c: &mut Criterion) {
    let mut group = c.benchmark_group("fx/granular");

    // Density drives how many grains are alive at once; size 200 ms keeps
    // density * size grains in flight.
    let densities: &[f32] = &[10.0, 50.0, 100.0];

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size).map(|i| (i as f32 * 0.1).sin()).collect();

        for &density in densities {
            let mut chain = EffectChain::new(SAMPLE_RATE);
            let unit = chain.push(EffectKind::Granular);
            chain.set_parameter(unit, "density", density);
            chain.set_parameter(unit, "size", 200.0);
            chain.set_parameter(unit, "spread", 0.5);

            // Fill the history and grain pool to steady state.
            let mut warmup = input.clone();
            for _ in 0..200 {
                chain.process(&mut warmup, SAMPLE_RATE, 1);
            }

            let mut buffer = input.clone();
            group.bench_with_input(
                BenchmarkId::new(format!("density_{}", density as u32), size),
                &size,
                |b, _| {
                    b.iter(|| {
                        buffer.copy_from_slice(&input);
                        chain.process(black_box(&mut buffer), SAMPLE_RATE, 1);
                    })
                },
            );
        }
    }

    group.finish();
}
