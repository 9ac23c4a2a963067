use crate::chain::BlockCtx;
use crate::dsp::delay::RingBuffer;
use crate::dsp::lfo::{Lfo, LfoShape};
use crate::dsp::mix::blend_dry_wet;
use crate::params::ParameterDescriptor;
use crate::MAX_PROCESS_CHANNELS;

/*
Vibrato
=======

Pitch modulation by reading a short delay line at a moving offset. As the
read position slides toward the write head the audio plays back faster
(pitch up); sliding away plays it slower (pitch down).

True vibrato is 100% wet: the default mix fully replaces the dry signal
with the pitch-modulated read. Blending dry back in (`mix` < 1) turns the
effect chorus-like, because the detuned copy beats against the original —
useful, but a different sound, which is why the replacement behavior is
the default.

One LFO drives both channels; independent per-channel vibrato would read
as random pitch wobble, not performance vibrato.

Parameters
----------

Rate (0.1 - 15 Hz):  Modulation speed; 5 - 7 Hz reads as a played vibrato.
Depth (0 - 1):       Modulation span, up to ~4 ms of delay sweep.
Shape (0 - 2):       LFO shape: 0 sine, 1 triangle, 2 square.
Mix (0 - 1):         Dry blend; 1.0 (default) is true vibrato.
*/

#[derive(Clone, Copy, Debug)]
pub enum VibratoParam {
    Rate,
    Depth,
    Shape,
    Mix,
}

pub static VIBRATO_PARAMS: &[ParameterDescriptor] = &[
    ParameterDescriptor::new("rate", 0.1, 15.0, 5.5, "Hz"),
    ParameterDescriptor::new("depth", 0.0, 1.0, 0.5, ""),
    ParameterDescriptor::new("shape", 0.0, 2.0, 0.0, ""),
    ParameterDescriptor::new("mix", 0.0, 1.0, 1.0, ""),
];

/// Center read offset; the sweep moves around this point.
const BASE_DELAY_MS: f32 = 6.0;
/// Full-depth sweep span on either side of the base.
const DEPTH_RANGE_MS: f32 = 4.0;
/// Delay line capacity: base + span + margin.
const MAX_DELAY_SECONDS: f32 = 0.016;

fn shape_from_param(value: f32) -> LfoShape {
    match value.round() as i32 {
        1 => LfoShape::Triangle,
        2 => LfoShape::Square,
        _ => LfoShape::Sine,
    }
}

pub struct Vibrato {
    lines: [RingBuffer; MAX_PROCESS_CHANNELS],
    lfo: Lfo,
}

impl Vibrato {
    pub fn new(sample_rate: f32) -> Self {
        let line = || {
            RingBuffer::for_time(MAX_DELAY_SECONDS, sample_rate)
                .expect("vibrato capacity is a compile-time constant")
        };
        Self {
            lines: [line(), line()],
            lfo: Lfo::new(LfoShape::Sine),
        }
    }

    pub fn process_block(&mut self, buffer: &mut [f32], ctx: &BlockCtx, params: &[f32]) {
        let rate = params[VibratoParam::Rate as usize];
        let depth = params[VibratoParam::Depth as usize];
        let mix = params[VibratoParam::Mix as usize];
        self.lfo.set_shape(shape_from_param(params[VibratoParam::Shape as usize]));

        let sample_rate = ctx.sample_rate;
        let channels = ctx.channels.max(1);
        let max_delay = self.lines[0].max_delay() as f32 - 1.0;

        for frame in buffer.chunks_exact_mut(channels) {
            let sweep = self.lfo.next(rate, sample_rate) * depth * DEPTH_RANGE_MS;
            let delay_ms = BASE_DELAY_MS + sweep;
            let delay_samples = (delay_ms / 1000.0 * sample_rate).clamp(1.0, max_delay);

            for (ch, sample) in frame.iter_mut().take(MAX_PROCESS_CHANNELS).enumerate() {
                let dry = *sample;
                let line = &mut self.lines[ch];
                let wet = line.tap(delay_samples);
                line.write(dry);
                *sample = blend_dry_wet(dry, wet, mix);
            }
        }
    }

    pub fn advance_idle(&mut self, frames: usize, ctx: &BlockCtx, params: &[f32]) {
        let rate = params[VibratoParam::Rate as usize];
        self.lfo.advance(frames, rate, ctx.sample_rate);
    }

    pub fn reset(&mut self) {
        for line in &mut self.lines {
            line.reset();
        }
        self.lfo.reset();
    }
}
