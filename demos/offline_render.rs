//! Offline demo: render an impulse through the rack and print where the
//! echoes land. No audio device needed.
//!
//! Run with: cargo run --example offline_render

use rackfx::{EffectChain, EffectKind};

const SAMPLE_RATE: f32 = 48_000.0;

fn main() {
    let mut chain = EffectChain::new(SAMPLE_RATE);
    let delay = chain.push(EffectKind::TapeDelay);
    chain.set_parameter(delay, "time", 250.0);
    chain.set_parameter(delay, "feedback", 0.5);
    chain.set_parameter(delay, "mix", 1.0);
    chain.set_parameter(delay, "wow", 0.0);
    chain.set_parameter(delay, "flutter", 0.0);

    // Let parameter smoothing settle before measuring.
    let mut warmup = vec![0.0f32; 24_000];
    chain.process(&mut warmup, SAMPLE_RATE, 1);

    let seconds = 1.5;
    let total = (seconds * SAMPLE_RATE) as usize;
    let mut input = vec![0.0f32; total];
    input[0] = 1.0;

    let mut output = Vec::with_capacity(total);
    for block in input.chunks(512) {
        let mut buf = block.to_vec();
        let status = chain.process(&mut buf, SAMPLE_RATE, 1);
        assert!(!status.rejected_input);
        output.extend_from_slice(&buf);
    }

    println!("impulse through tape delay (250 ms, feedback 0.5):");
    for (i, &sample) in output.iter().enumerate() {
        if sample.abs() > 1e-3 {
            println!(
                "  echo at {:7} samples ({:6.1} ms): {:+.4}",
                i,
                i as f32 / SAMPLE_RATE * 1000.0,
                sample
            );
        }
    }

    let peak = output.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
    println!("peak level: {peak:.4}");
}
