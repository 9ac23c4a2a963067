//! Benchmarks for block convolution at several impulse response lengths.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use rackfx::{EffectChain, EffectKind};

use crate::BLOCK_SIZES;

const SAMPLE_RATE: f32 = 48_000.0;

pub fn bench_convolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("fx/convolution");

    // IR lengths chosen to cross FFT-size boundaries.
    let ir_lengths: &[usize] = &[
        1_024,  // small room
        12_000, // 250ms at 48kHz
        48_000, // 1 second tail
    ];

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size).map(|i| (i as f32 * 0.1).sin()).collect();

        for &ir_len in ir_lengths {
            let ir: Vec<f32> = (0..ir_len)
                .map(|i| 0.999f32.powi(i as i32) * ((i as f32) * 0.7).cos() * 0.1)
                .collect();

            let mut chain = EffectChain::new(SAMPLE_RATE);
            let unit = chain.push(EffectKind::Convolution);
            chain.set_parameter(unit, "mix", 1.0);
            chain.load_impulse_response(unit, &ir).unwrap();

            let mut buffer = input.clone();
            group.bench_with_input(
                BenchmarkId::new(format!("ir_{ir_len}"), size),
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
