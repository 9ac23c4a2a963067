//! Benchmarks for the ring buffer primitive and the tape delay.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use rackfx::{EffectChain, EffectKind};

use crate::BLOCK_SIZES;

const SAMPLE_RATE: f32 = 48_000.0;

pub fn bench_ring_buffer(c: &mut Criterion) {
    use rackfx::dsp::RingBuffer;

    let mut group = c.benchmark_group("fx/ring_buffer");

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size).map(|i| (i as f32 * 0.1).sin()).collect();

        // Write + integer read, the tape-delay inner loop shape.
        let mut rb = RingBuffer::new(48_000).unwrap();
        group.bench_with_input(BenchmarkId::new("write_read", size), &size, |b, _| {
            b.iter(|| {
                let mut sum = 0.0f32;
                for &sample in &input {
                    rb.write(black_box(sample));
                    sum += rb.read_delayed_int(black_box(4800));
                }
                sum
            })
        });

        // Fractional read with a modulated delay (chorus/vibrato shape).
        let mut rb = RingBuffer::new(48_000).unwrap();
        for &sample in &input {
            rb.write(sample);
        }
        group.bench_with_input(BenchmarkId::new("read_fractional", size), &size, |b, _| {
            b.iter(|| {
                let mut sum = 0.0f32;
                for i in 0..size {
                    let delay = 480.0 + (i as f32 * 0.1).sin() * 48.0;
                    sum += rb.read_delayed(black_box(delay));
                }
                sum
            })
        });
    }

    group.finish();
}

pub fn bench_tape_delay(c: &mut Criterion) {
    let mut group = c.benchmark_group("fx/tape_delay");

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size).map(|i| (i as f32 * 0.1).sin()).collect();

        let mut chain = EffectChain::new(SAMPLE_RATE);
        let unit = chain.push(EffectKind::TapeDelay);
        chain.set_parameter(unit, "feedback", 0.5);
        chain.set_parameter(unit, "wow", 0.5);
        chain.set_parameter(unit, "flutter", 0.5);

        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("process", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                chain.process(black_box(&mut buffer), SAMPLE_RATE, 1);
            })
        });
    }

    group.finish();
}
