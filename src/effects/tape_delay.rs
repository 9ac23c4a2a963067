use crate::chain::BlockCtx;
use crate::dsp::delay::RingBuffer;
use crate::dsp::lfo::{Lfo, LfoShape};
use crate::dsp::mix::blend_dry_wet;
use crate::dsp::shaper::soft_clip;
use crate::params::ParameterDescriptor;
use crate::MAX_PROCESS_CHANNELS;

/*
Tape Delay
==========

Feedback delay modeled on a tape echo. Two slow LFOs modulate the read
position: "wow" (~0.5 Hz) emulates motor speed drift, "flutter" (~10 Hz)
the fast scrape of the capstan. Both are scaled by their depth parameters
and shared across channels, because a tape machine has one motor.

The repeat path can be pushed into tanh saturation by `saturation`, which
is where tape echoes get their darker, compressed trails.

Signal flow per sample (per channel):

  tap = buffer[write - delay(t)]          delay(t) = time + wow + flutter
  buffer[write] = input + feedback * tap
  out = dry/wet blend of input and (optionally saturated) tap

Parameters
----------

Time (1 - 2000 ms):   Base delay time.
Feedback (0 - 0.95):  Repeat gain. Capped below 1.0 so trails always decay.
Mix (0 - 1):          Dry/wet blend.
Wow (0 - 1):          Slow pitch drift depth (up to ~4 ms of sweep).
Flutter (0 - 1):      Fast pitch jitter depth (up to ~0.4 ms of sweep).
Saturation (0 - 1):   Soft-clip amount on the wet path.
*/

#[derive(Clone, Copy, Debug)]
pub enum TapeDelayParam {
    Time,
    Feedback,
    Mix,
    Wow,
    Flutter,
    Saturation,
}

pub static TAPE_DELAY_PARAMS: &[ParameterDescriptor] = &[
    ParameterDescriptor::new("time", 1.0, 2000.0, 350.0, "ms"),
    ParameterDescriptor::new("feedback", 0.0, 0.95, 0.35, ""),
    ParameterDescriptor::new("mix", 0.0, 1.0, 0.5, ""),
    ParameterDescriptor::new("wow", 0.0, 1.0, 0.2, ""),
    ParameterDescriptor::new("flutter", 0.0, 1.0, 0.1, ""),
    ParameterDescriptor::new("saturation", 0.0, 1.0, 0.0, ""),
];

const WOW_RATE_HZ: f32 = 0.5;
const FLUTTER_RATE_HZ: f32 = 10.0;
const WOW_RANGE_MS: f32 = 4.0;
const FLUTTER_RANGE_MS: f32 = 0.4;

/// Headroom on top of the maximum delay so full wow/flutter sweep never
/// asks the buffer for more than it holds.
const MAX_DELAY_SECONDS: f32 = 2.01;

pub struct TapeDelay {
    lines: [RingBuffer; MAX_PROCESS_CHANNELS],
    wow: Lfo,
    flutter: Lfo,
}

impl TapeDelay {
    pub fn new(sample_rate: f32) -> Self {
        let line = || {
            RingBuffer::for_time(MAX_DELAY_SECONDS, sample_rate)
                .expect("tape delay capacity is a compile-time constant")
        };
        Self {
            lines: [line(), line()],
            wow: Lfo::new(LfoShape::Sine),
            flutter: Lfo::new(LfoShape::Sine),
        }
    }

    pub fn process_block(&mut self, buffer: &mut [f32], ctx: &BlockCtx, params: &[f32]) {
        let time_ms = params[TapeDelayParam::Time as usize];
        let feedback = params[TapeDelayParam::Feedback as usize];
        let mix = params[TapeDelayParam::Mix as usize];
        let wow_depth = params[TapeDelayParam::Wow as usize];
        let flutter_depth = params[TapeDelayParam::Flutter as usize];
        let saturation = params[TapeDelayParam::Saturation as usize];

        let sample_rate = ctx.sample_rate;
        let channels = ctx.channels.max(1);
        let max_delay = self.lines[0].max_delay() as f32 - 1.0;

        for frame in buffer.chunks_exact_mut(channels) {
            let wow = self.wow.next(WOW_RATE_HZ, sample_rate) * wow_depth * WOW_RANGE_MS;
            let flutter =
                self.flutter.next(FLUTTER_RATE_HZ, sample_rate) * flutter_depth * FLUTTER_RANGE_MS;
            let delay_ms = time_ms + wow + flutter;
            let delay_samples = (delay_ms / 1000.0 * sample_rate).clamp(1.0, max_delay);

            for (ch, sample) in frame.iter_mut().take(MAX_PROCESS_CHANNELS).enumerate() {
                let dry = *sample;
                let line = &mut self.lines[ch];

                let tap = line.tap(delay_samples);
                line.write(dry + feedback * tap);

                let wet = if saturation > 0.0 {
                    let driven = soft_clip(tap, 1.0 + 4.0 * saturation);
                    blend_dry_wet(tap, driven, saturation)
                } else {
                    tap
                };
                *sample = blend_dry_wet(dry, wet, mix);
            }
        }
    }

    /// Keep the wow/flutter transport running while bypassed so
    /// re-enabling picks the modulation up mid-cycle.
    pub fn advance_idle(&mut self, frames: usize, ctx: &BlockCtx, _params: &[f32]) {
        self.wow.advance(frames, WOW_RATE_HZ, ctx.sample_rate);
        self.flutter.advance(frames, FLUTTER_RATE_HZ, ctx.sample_rate);
    }

    pub fn reset(&mut self) {
        for line in &mut self.lines {
            line.reset();
        }
        self.wow.reset();
        self.flutter.reset();
    }
}
