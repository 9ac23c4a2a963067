//! Live demo: a test tone through a phaser → tape delay rack, played
//! through the default output device.
//!
//! This is the shape of the external audio driver contract: the driver
//! owns the callback thread and calls `EffectChain::process` once per
//! block; parameter edits happen on the main thread through the
//! lock-free control queue.
//!
//! Run with: cargo run --example live_chain

use std::sync::mpsc;
use std::time::Duration;

use color_eyre::eyre::{eyre, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use rackfx::control::ControlMessage;
use rackfx::{EffectChain, EffectKind};

struct TestTone {
    phase: f32,
    sample_rate: f32,
}

impl TestTone {
    /// Short plucked blips so the delay trails are audible.
    fn fill(&mut self, buffer: &mut [f32], channels: usize) {
        for frame in buffer.chunks_exact_mut(channels) {
            self.phase += 1.0 / self.sample_rate;
            let t = self.phase % 1.0;
            let envelope = if t < 0.15 { (1.0 - t / 0.15).powi(2) } else { 0.0 };
            let sample = (core::f32::consts::TAU * 220.0 * self.phase).sin() * envelope * 0.4;
            for out in frame.iter_mut() {
                *out = sample;
            }
        }
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| eyre!("no output device available"))?;
    let config = device.default_output_config()?;
    let sample_rate = config.sample_rate().0 as f32;
    let channels = config.channels() as usize;

    let (producer, consumer) = rtrb::RingBuffer::<ControlMessage>::new(256);

    let mut chain = EffectChain::new(sample_rate);
    let phaser = chain.push(EffectKind::Phaser);
    let delay = chain.push(EffectKind::TapeDelay);
    chain.set_receiver(Box::new(consumer));
    chain.set_parameter(delay, "time", 400.0);
    chain.set_parameter(delay, "feedback", 0.55);
    chain.set_parameter(delay, "mix", 0.4);
    chain.set_parameter(delay, "wow", 0.4);
    chain.set_parameter(phaser, "mix", 0.5);

    let mut tone = TestTone {
        phase: 0.0,
        sample_rate,
    };

    let (error_tx, error_rx) = mpsc::channel();
    let stream = device.build_output_stream(
        &config.into(),
        move |data: &mut [f32], _| {
            tone.fill(data, channels);
            chain.process(data, sample_rate, channels);
        },
        move |err| {
            let _ = error_tx.send(err);
        },
        None,
    )?;
    stream.play()?;

    println!("playing 220 Hz blips through phaser -> tape delay");
    println!("sweeping the phaser rate over 10 seconds...");

    // Drive the phaser rate from the main thread through the queue, the
    // same path a UI would use.
    let mut producer = producer;
    for step in 0..100 {
        if let Ok(err) = error_rx.try_recv() {
            return Err(eyre!("stream error: {err}"));
        }
        let rate = 0.2 + step as f32 * 0.05;
        let _ = producer.push(ControlMessage::SetParameter {
            unit: phaser,
            param: 0, // rate is the first phaser descriptor
            value: rate,
        });
        std::thread::sleep(Duration::from_millis(100));
    }

    Ok(())
}
