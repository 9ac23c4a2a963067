//! End-to-end properties of the effect chain: the block contract, the
//! automation ordering guarantee, and the failure modes that only show up
//! when units are composed.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use rackfx::{EffectChain, EffectKind};

const SAMPLE_RATE: f32 = 44_100.0;

#[test]
fn tape_delay_impulse_scenario() {
    // time = 500 ms, feedback = 0, mix = 1 at 44.1 kHz: a unit impulse at
    // sample 0 comes back once, at sample 22050, at equal magnitude.
    let mut chain = EffectChain::new(SAMPLE_RATE);
    let unit = chain.push(EffectKind::TapeDelay);
    chain.set_parameter(unit, "time", 500.0);
    chain.set_parameter(unit, "feedback", 0.0);
    chain.set_parameter(unit, "mix", 1.0);
    chain.set_parameter(unit, "wow", 0.0);
    chain.set_parameter(unit, "flutter", 0.0);
    chain.set_parameter(unit, "saturation", 0.0);

    // Let parameter smoothing settle on the targets before the impulse.
    let mut warmup = vec![0.0f32; 8192];
    chain.process(&mut warmup, SAMPLE_RATE, 1);

    let total = 22_050 + 512;
    let mut input = vec![0.0f32; total];
    input[0] = 1.0;

    let mut output = Vec::with_capacity(total);
    for block in input.chunks(441) {
        let mut buf = block.to_vec();
        chain.process(&mut buf, SAMPLE_RATE, 1);
        output.extend_from_slice(&buf);
    }

    assert!(
        (output[22_050] - 1.0).abs() < 1e-3,
        "echo magnitude {} at 22050",
        output[22_050]
    );
    let stray: f32 = output
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != 22_050)
        .map(|(_, s)| s.abs())
        .fold(0.0, f32::max);
    assert!(stray < 1e-3, "stray energy {stray}");
}

#[test]
fn convolution_identity_through_the_chain() {
    let mut chain = EffectChain::new(SAMPLE_RATE);
    let unit = chain.push(EffectKind::Convolution);
    chain.set_parameter(unit, "mix", 1.0);
    chain.load_impulse_response(unit, &[1.0]).unwrap();
    assert!(chain.is_impulse_response_loaded(unit));

    let mut warmup = vec![0.0f32; 8192];
    chain.process(&mut warmup, SAMPLE_RATE, 1);

    let len = 8192;
    let input: Vec<f32> = (0..len).map(|i| (i as f32 * 0.05).sin() * 0.7).collect();
    let mut output = Vec::with_capacity(len);
    for block in input.chunks(512) {
        let mut buf = block.to_vec();
        chain.process(&mut buf, SAMPLE_RATE, 1);
        output.extend_from_slice(&buf);
    }

    // Identity holds after the engine's fixed analysis latency.
    let latency = 1024;
    for i in latency..len {
        assert!(
            (output[i] - input[i - latency]).abs() < 1e-3,
            "sample {i}: {} vs {}",
            output[i],
            input[i - latency]
        );
    }
}

#[test]
fn randomized_blocks_never_produce_non_finite_output() {
    let mut chain = EffectChain::new(SAMPLE_RATE);
    for kind in EffectKind::ALL {
        chain.push(kind);
    }
    let conv = EffectKind::ALL
        .iter()
        .position(|&k| k == EffectKind::Convolution)
        .unwrap();
    let ir: Vec<f32> = (0..256).map(|i| 0.9f32.powi(i) * 0.3).collect();
    chain.load_impulse_response(conv, &ir).unwrap();

    let mut rng = SmallRng::seed_from_u64(0xfeed_f00d);
    let mut buf = vec![0.0f32; 64 * 2];

    for block in 0..10_000u32 {
        // Shake the parameter space from time to time: every value the
        // host can request is legal, including out-of-range ones.
        if block % 250 == 0 {
            for unit in 0..chain.len() {
                for descriptor in chain.parameters(unit).to_vec() {
                    let wild = rng.random::<f32>() * 4.0 - 1.0;
                    let value = descriptor.min + (descriptor.max - descriptor.min) * wild;
                    chain.set_parameter(unit, descriptor.name, value);
                }
            }
        }
        if block == 3000 {
            chain.note_on(72, 90);
        }
        if block == 6000 {
            chain.start_recording(2);
        }
        if block == 6100 {
            chain.stop_recording(2);
        }

        for sample in buf.iter_mut() {
            *sample = rng.random::<f32>() * 4.0 - 2.0;
        }
        let status = chain.process(&mut buf, SAMPLE_RATE, 2);
        assert!(!status.rejected_input);
        for (i, &s) in buf.iter().enumerate() {
            assert!(s.is_finite(), "non-finite {s} at block {block} sample {i}");
        }
    }
}

#[test]
fn bypass_toggling_is_click_free() {
    // Phaser wet path is allpass (unit magnitude), so with preserved LFO
    // phase the bypass seam should be no larger than the natural
    // sample-to-sample movement of the material.
    let mut chain = EffectChain::new(SAMPLE_RATE);
    let unit = chain.push(EffectKind::Phaser);
    chain.set_parameter(unit, "mix", 0.4);
    chain.set_parameter(unit, "feedback", 0.0);

    let mut warmup = vec![0.0f32; 4096];
    chain.process(&mut warmup, SAMPLE_RATE, 1);

    let tone = |n: usize, offset: usize| {
        (core::f32::consts::TAU * 110.0 * (n + offset) as f32 / SAMPLE_RATE).sin() * 0.5
    };

    let mut output = Vec::new();
    let mut cursor = 0usize;
    for section in 0..6 {
        chain.set_bypassed(unit, section % 2 == 1);
        let mut buf: Vec<f32> = (0..1024).map(|n| tone(n, cursor)).collect();
        chain.process(&mut buf, SAMPLE_RATE, 1);
        output.extend_from_slice(&buf);
        cursor += 1024;
    }

    // 110 Hz at 0.5 amplitude moves at most ~0.008/sample on its own; the
    // bypass crossfade spreads the wet/dry difference over the smoothing
    // time, so the seam stays near that natural slope.
    let max_step = output
        .windows(2)
        .map(|w| (w[1] - w[0]).abs())
        .fold(0.0f32, f32::max);
    assert!(max_step < 0.1, "bypass seam stepped {max_step}");
}

#[test]
fn bypassed_lfo_phase_matches_a_free_running_one() {
    // Two identical vibratos; one is bypassed for a stretch, the other
    // runs the whole time. After re-enabling, both read the same LFO
    // phase, so on identical input they produce identical output.
    let mut running = EffectChain::new(SAMPLE_RATE);
    let ru = running.push(EffectKind::Vibrato);
    let mut toggled = EffectChain::new(SAMPLE_RATE);
    let tu = toggled.push(EffectKind::Vibrato);

    let tone: Vec<f32> = (0..4096)
        .map(|n| (core::f32::consts::TAU * 330.0 * n as f32 / SAMPLE_RATE).sin())
        .collect();

    // Identical warmup.
    let mut a = tone.clone();
    running.process(&mut a, SAMPLE_RATE, 1);
    let mut b = tone.clone();
    toggled.process(&mut b, SAMPLE_RATE, 1);

    // Gap: one processes audio, the other idles bypassed.
    let mut gap = tone.clone();
    running.process(&mut gap, SAMPLE_RATE, 1);
    toggled.set_bypassed(tu, true);
    let mut gap = tone.clone();
    toggled.process(&mut gap, SAMPLE_RATE, 1);
    toggled.set_bypassed(tu, false);

    // The delay-line contents differ after the gap (bypass does not feed
    // the line), but the modulation phase must agree: drive both with the
    // same audio and compare the *modulation*, via the delay sweep, after
    // the lines refill.
    let mut out_running = tone.clone();
    running.process(&mut out_running, SAMPLE_RATE, 1);
    let mut out_toggled = tone.clone();
    toggled.process(&mut out_toggled, SAMPLE_RATE, 1);

    // Both delay lines were fed identical audio throughout, so outputs
    // converge as soon as the re-enable crossfade finishes ramping in.
    let settled = 3200;
    for i in settled..4096 {
        assert!(
            (out_running[i] - out_toggled[i]).abs() < 1e-4,
            "phase drift at {i}: {} vs {}",
            out_running[i],
            out_toggled[i]
        );
    }
    let _ = (ru, a, b);
}

#[test]
fn looper_round_trip_through_the_chain() {
    let mut chain = EffectChain::new(SAMPLE_RATE);
    let unit = chain.push(EffectKind::Looper);
    chain.set_parameter(unit, "mix", 1.0);
    chain.set_parameter(unit, "feedback", 0.0);
    chain.set_parameter(unit, "speed", 1.0);
    chain.set_parameter(unit, "reverse", 0.0);

    let mut warmup = vec![0.0f32; 8192];
    chain.process(&mut warmup, SAMPLE_RATE, 1);

    let phrase: Vec<f32> = (0..500).map(|i| ((i as f32) * 0.13).sin()).collect();
    chain.start_recording(unit);
    let mut buf = phrase.clone();
    chain.process(&mut buf, SAMPLE_RATE, 1);
    chain.stop_recording(unit);

    let mut playback = vec![0.0f32; 500];
    chain.process(&mut playback, SAMPLE_RATE, 1);
    for (got, want) in playback.iter().zip(phrase.iter()) {
        assert!((got - want).abs() < 1e-4, "{got} != {want}");
    }
}

#[test]
fn preset_restore_survives_processing() {
    let mut chain = EffectChain::new(SAMPLE_RATE);
    chain.push(EffectKind::TapeDelay);
    chain.push(EffectKind::WaveShaper);
    chain.set_parameter(0, "feedback", 0.6);
    chain.add_automation_point(1, "drive", 0.0, 5.0);
    chain.set_parameter_automated(1, "drive", true);

    let preset = chain.snapshot();

    let mut restored = EffectChain::new(SAMPLE_RATE);
    restored.restore(&preset);

    let mut buf: Vec<f32> = (0..2048).map(|i| (i as f32 * 0.1).sin()).collect();
    let status = restored.process(&mut buf, SAMPLE_RATE, 1);
    assert!(!status.rejected_input);
    assert!(buf.iter().all(|s| s.is_finite()));
    assert!((restored.get_parameter(0, "feedback").unwrap() - 0.6).abs() < 1e-6);
    assert!((restored.get_parameter(1, "drive").unwrap() - 5.0).abs() < 1e-2);
}
