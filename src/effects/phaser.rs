use crate::chain::BlockCtx;
use crate::dsp::allpass::Allpass;
use crate::dsp::lfo::{Lfo, LfoShape};
use crate::dsp::mix::blend_dry_wet;
use crate::params::ParameterDescriptor;
use crate::MAX_PROCESS_CHANNELS;

/*
Phaser
======

A cascade of first-order allpass sections whose corner frequency sweeps
with an LFO. Each section is flat in magnitude but rotates phase; summing
the cascade output back against the dry signal turns the rotations into
notches that sweep through the spectrum. Feedback sharpens the notches
into resonant peaks.

The sweep maps the LFO onto a 200 Hz - 2 kHz corner range. In stereo mode
the right channel runs its own LFO a quarter cycle ahead, which is what
makes a phaser feel wide: the notches move through each ear at different
moments.

`stages` is even (2 - 12); odd requests round down. More stages, more
notches.

Parameters
----------

Rate (0.05 - 10 Hz):  Sweep speed.
Depth (0 - 1):        Sweep range.
Feedback (0 - 0.95):  Wet signal fed back into the cascade input.
Stages (2 - 12):      Allpass sections in the cascade (even).
Mix (0 - 1):          Dry/wet blend.
Stereo (0 - 1):       Phase offset of the right channel's LFO.
*/

#[derive(Clone, Copy, Debug)]
pub enum PhaserParam {
    Rate,
    Depth,
    Feedback,
    Stages,
    Mix,
    Stereo,
}

pub static PHASER_PARAMS: &[ParameterDescriptor] = &[
    ParameterDescriptor::new("rate", 0.05, 10.0, 0.4, "Hz"),
    ParameterDescriptor::new("depth", 0.0, 1.0, 0.7, ""),
    ParameterDescriptor::new("feedback", 0.0, 0.95, 0.2, ""),
    ParameterDescriptor::new("stages", 2.0, 12.0, 4.0, ""),
    ParameterDescriptor::new("mix", 0.0, 1.0, 0.5, ""),
    ParameterDescriptor::new("stereo", 0.0, 1.0, 1.0, ""),
];

pub const MAX_STAGES: usize = 12;

const SWEEP_LOW_HZ: f32 = 200.0;
const SWEEP_HIGH_HZ: f32 = 2000.0;

/// Quarter-cycle offset between channel LFOs at full stereo.
const STEREO_OFFSET: f32 = 0.25;

struct Channel {
    stages: [Allpass; MAX_STAGES],
    lfo: Lfo,
    last_wet: f32,
}

pub struct Phaser {
    channels: [Channel; MAX_PROCESS_CHANNELS],
}

impl Phaser {
    pub fn new(_sample_rate: f32) -> Self {
        let channel = |phase: f32| Channel {
            stages: [Allpass::new(); MAX_STAGES],
            lfo: Lfo::with_phase(LfoShape::Sine, phase),
            last_wet: 0.0,
        };
        Self {
            // The stereo parameter scales the right offset at render time;
            // the LFOs themselves always run a quarter cycle apart.
            channels: [channel(0.0), channel(STEREO_OFFSET)],
        }
    }

    pub fn process_block(&mut self, buffer: &mut [f32], ctx: &BlockCtx, params: &[f32]) {
        let rate = params[PhaserParam::Rate as usize];
        let depth = params[PhaserParam::Depth as usize];
        let feedback = params[PhaserParam::Feedback as usize];
        let mix = params[PhaserParam::Mix as usize];
        let stereo = params[PhaserParam::Stereo as usize];

        // Even stage count; odd requests round down.
        let stages = (params[PhaserParam::Stages as usize] as usize).clamp(2, MAX_STAGES) & !1;

        let sample_rate = ctx.sample_rate;
        let channels = ctx.channels.max(1);

        for frame in buffer.chunks_exact_mut(channels) {
            // The right channel fades between left-locked and its own
            // quarter-offset LFO with `stereo`.
            let left = self.channels[0].lfo.value();
            let right = self.channels[1].lfo.value();
            let lfo_values = [left, left + (right - left) * stereo];

            for (ch_index, sample) in frame.iter_mut().take(MAX_PROCESS_CHANNELS).enumerate() {
                let ch = &mut self.channels[ch_index];
                let dry = *sample;

                let sweep = lfo_values[ch_index] * 0.5 + 0.5; // 0..1
                let corner =
                    SWEEP_LOW_HZ + (SWEEP_HIGH_HZ - SWEEP_LOW_HZ) * (0.1 + 0.9 * depth * sweep);

                let mut x = dry + feedback * ch.last_wet;
                for stage in ch.stages.iter_mut().take(stages) {
                    stage.set_corner(corner, sample_rate);
                    x = stage.tick(x);
                }
                ch.last_wet = x;
                *sample = blend_dry_wet(dry, x, mix);
            }

            for ch in self.channels.iter_mut() {
                ch.lfo.advance(1, rate, sample_rate);
            }
        }
    }

    pub fn advance_idle(&mut self, frames: usize, ctx: &BlockCtx, params: &[f32]) {
        let rate = params[PhaserParam::Rate as usize];
        for ch in self.channels.iter_mut() {
            ch.lfo.advance(frames, rate, ctx.sample_rate);
        }
    }

    pub fn reset(&mut self) {
        for ch in &mut self.channels {
            for stage in &mut ch.stages {
                stage.reset();
            }
            ch.last_wet = 0.0;
            ch.lfo.reset();
        }
        self.channels[1].lfo = Lfo::with_phase(LfoShape::Sine, STEREO_OFFSET);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 48_000.0;

    fn ctx(channels: usize) -> BlockCtx {
        BlockCtx {
            sample_rate: SAMPLE_RATE,
            channels,
        }
    }

    fn defaults() -> Vec<f32> {
        PHASER_PARAMS.iter().map(|d| d.default).collect()
    }

    #[test]
    fn dry_mix_preserves_signal() {
        let mut phaser = Phaser::new(SAMPLE_RATE);
        let mut p = defaults();
        p[PhaserParam::Mix as usize] = 0.0;

        let mut buf: Vec<f32> = (0..256).map(|i| (i as f32 * 0.1).sin()).collect();
        let original = buf.clone();
        phaser.process_block(&mut buf, &ctx(1), &p);
        for (a, b) in buf.iter().zip(original.iter()) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn wet_path_alters_the_signal() {
        let mut phaser = Phaser::new(SAMPLE_RATE);
        let mut p = defaults();
        p[PhaserParam::Mix as usize] = 1.0;

        let mut buf: Vec<f32> = (0..1024).map(|i| (i as f32 * 0.3).sin()).collect();
        let original = buf.clone();
        phaser.process_block(&mut buf, &ctx(1), &p);
        let diff: f32 = buf
            .iter()
            .zip(original.iter())
            .map(|(a, b)| (a - b).abs())
            .sum();
        assert!(diff > 1.0, "phaser did nothing: {diff}");
    }

    #[test]
    fn stereo_channels_diverge_with_offset_lfos() {
        let mut phaser = Phaser::new(SAMPLE_RATE);
        let mut p = defaults();
        p[PhaserParam::Mix as usize] = 1.0;
        p[PhaserParam::Rate as usize] = 5.0;

        // Identical signal on both channels.
        let mut buf = vec![0.0f32; 4096 * 2];
        for i in 0..4096 {
            let s = (i as f32 * 0.2).sin();
            buf[i * 2] = s;
            buf[i * 2 + 1] = s;
        }
        phaser.process_block(&mut buf, &ctx(2), &p);

        let diff: f32 = buf
            .chunks_exact(2)
            .map(|lr| (lr[0] - lr[1]).abs())
            .sum();
        assert!(diff > 1.0, "stereo mode left the channels identical");
    }

    #[test]
    fn output_stays_finite_with_max_feedback_and_stages() {
        let mut phaser = Phaser::new(SAMPLE_RATE);
        let mut p = defaults();
        p[PhaserParam::Feedback as usize] = 0.95;
        p[PhaserParam::Stages as usize] = 12.0;
        p[PhaserParam::Mix as usize] = 1.0;

        for _ in 0..40 {
            let mut buf: Vec<f32> = (0..512).map(|i| (i as f32 * 0.7).sin()).collect();
            phaser.process_block(&mut buf, &ctx(1), &p);
            assert!(buf.iter().all(|s| s.is_finite()));
        }
    }

    #[test]
    fn odd_stage_requests_round_down_to_even() {
        // 5 stages parses as 4; processing just has to stay sane.
        let mut phaser = Phaser::new(SAMPLE_RATE);
        let mut p = defaults();
        p[PhaserParam::Stages as usize] = 5.0;
        let mut buf = vec![0.5f32; 128];
        phaser.process_block(&mut buf, &ctx(1), &p);
        assert!(buf.iter().all(|s| s.is_finite()));
    }
}
