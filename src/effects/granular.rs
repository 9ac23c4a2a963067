use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::chain::BlockCtx;
use crate::dsp::mix::blend_dry_wet;
use crate::params::ParameterDescriptor;
use crate::MAX_PROCESS_CHANNELS;

/*
Granular Engine
===============

Chops the recent input history into short, windowed, independently pitched
grains and layers them back over the dry signal.

Lifecycle per grain: Inactive → Active (triggered) → Inactive (expired).
Grains live in a fixed pool that is scanned at each trigger; slots are
reused and never deallocated. When every slot is busy the trigger is
dropped silently — the pool must not grow on the audio thread, and a
missing grain in a dense cloud is inaudible anyway.

Triggering runs on a phase accumulator: `density` grains per second at the
current sample rate sets the accumulator increment, and each wrap spawns a
grain. A spawned grain captures a window of input history, a randomized
pitch within ±`spread` of `pitch`, and a randomized pan.

Grains read the shared history ring rather than copying samples out. The
capture window is anchored `length × pitch-ratio` behind the write head,
so even a grain pitched up 2 octaves only ever reads audio that has
already been written.

The amplitude window is a trapezoid with attack and release ramps of 10%
of the grain length each — short enough to keep transients, long enough to
avoid edge clicks.

Parameters
----------

Density (0.5 - 100 grains/s): Trigger rate.
Size (10 - 500 ms):           Grain length.
Pitch (0.25 - 4):             Playback ratio; 2.0 = octave up.
Spread (0 - 1):               Random pitch offset, ± around `pitch`.
Pan spread (0 - 1):           Random stereo placement per grain.
Mix (0 - 1):                  Dry/wet blend.
*/

#[derive(Clone, Copy, Debug)]
pub enum GranularParam {
    Density,
    Size,
    Pitch,
    Spread,
    PanSpread,
    Mix,
}

pub static GRANULAR_PARAMS: &[ParameterDescriptor] = &[
    ParameterDescriptor::new("density", 0.5, 100.0, 12.0, "grains/s"),
    ParameterDescriptor::new("size", 10.0, 500.0, 120.0, "ms"),
    ParameterDescriptor::new("pitch", 0.25, 4.0, 1.0, "x"),
    ParameterDescriptor::new("spread", 0.0, 1.0, 0.0, ""),
    ParameterDescriptor::new("pan_spread", 0.0, 1.0, 0.5, ""),
    ParameterDescriptor::new("mix", 0.0, 1.0, 0.5, ""),
];

/// Grain slots. Scanned linearly at trigger time.
pub const GRAIN_POOL_SIZE: usize = 100;

/// Input history retained for grain capture. Must exceed the worst case
/// read span: max grain size × max pitch ratio (0.5 s × 4).
const HISTORY_SECONDS: f32 = 2.5;

/// Attack/release fraction of the trapezoid window.
const WINDOW_RAMP: f32 = 0.1;

#[derive(Debug, Clone, Copy)]
struct Grain {
    active: bool,
    /// Absolute history index where the capture window starts.
    source_start: u64,
    /// Output frames this grain lasts.
    length: u32,
    /// Frames played so far.
    age: u32,
    /// Source read increment per output frame.
    pitch_ratio: f32,
    /// Stereo placement, -1 (left) to +1 (right).
    pan: f32,
}

impl Grain {
    const fn idle() -> Self {
        Self {
            active: false,
            source_start: 0,
            length: 0,
            age: 0,
            pitch_ratio: 1.0,
            pan: 0.0,
        }
    }

    /// Trapezoid envelope for the grain's current age.
    #[inline]
    fn envelope(&self) -> f32 {
        let phase = self.age as f32 / self.length as f32;
        let rise = phase / WINDOW_RAMP;
        let fall = (1.0 - phase) / WINDOW_RAMP;
        rise.min(fall).min(1.0).max(0.0)
    }
}

pub struct Granular {
    history: Vec<f32>,
    /// Total mono frames ever written; `history[written % len]` is next.
    written: u64,
    grains: [Grain; GRAIN_POOL_SIZE],
    trigger_phase: f32,
    /// Pitch multiplier set by MIDI note-on (1.0 = untransposed).
    note_ratio: f32,
    rng: SmallRng,
}

impl Granular {
    pub fn new(sample_rate: f32) -> Self {
        let frames = (HISTORY_SECONDS * sample_rate).ceil() as usize;
        Self {
            history: vec![0.0; frames],
            written: 0,
            grains: [Grain::idle(); GRAIN_POOL_SIZE],
            trigger_phase: 0.0,
            note_ratio: 1.0,
            rng: SmallRng::seed_from_u64(0x5eed_9a11),
        }
    }

    pub fn active_grains(&self) -> usize {
        self.grains.iter().filter(|g| g.active).count()
    }

    /// Retune the grain cloud around a MIDI note (60 = untransposed).
    pub fn note_on(&mut self, note: u8, _velocity: u8) {
        self.note_ratio = 2.0_f32.powf((note as f32 - 60.0) / 12.0);
    }

    pub fn note_off(&mut self, _note: u8) {
        self.note_ratio = 1.0;
    }

    fn try_trigger(&mut self, size_frames: u32, pitch: f32, spread: f32, pan_spread: f32) {
        // Scan for a free slot; a saturated pool drops the trigger.
        let Some(slot) = self.grains.iter().position(|g| !g.active) else {
            return;
        };

        let pitch_offset = (self.rng.random::<f32>() * 2.0 - 1.0) * spread;
        let ratio = ((pitch + pitch_offset) * self.note_ratio).clamp(0.25, 4.0);
        let pan = (self.rng.random::<f32>() * 2.0 - 1.0) * pan_spread;

        // Anchor the window so the full read span is already-written audio.
        let span = (size_frames as f64 * ratio as f64).ceil() as u64 + 2;
        let source_start = self.written.saturating_sub(span);

        self.grains[slot] = Grain {
            active: true,
            source_start,
            length: size_frames.max(2),
            age: 0,
            pitch_ratio: ratio,
            pan,
        };
    }

    pub fn process_block(&mut self, buffer: &mut [f32], ctx: &BlockCtx, params: &[f32]) {
        let density = params[GranularParam::Density as usize];
        let size_ms = params[GranularParam::Size as usize];
        let pitch = params[GranularParam::Pitch as usize];
        let spread = params[GranularParam::Spread as usize];
        let pan_spread = params[GranularParam::PanSpread as usize];
        let mix = params[GranularParam::Mix as usize];

        let sample_rate = ctx.sample_rate;
        let channels = ctx.channels.max(1);
        let size_frames = (size_ms / 1000.0 * sample_rate) as u32;
        let trigger_increment = density / sample_rate;
        let history_len = self.history.len();

        for frame in buffer.chunks_exact_mut(channels) {
            // Mono-ize the processed channels into the history ring.
            let heard = frame.iter().take(MAX_PROCESS_CHANNELS).sum::<f32>()
                / channels.min(MAX_PROCESS_CHANNELS) as f32;
            self.history[(self.written % history_len as u64) as usize] = heard;
            self.written += 1;

            self.trigger_phase += trigger_increment;
            if self.trigger_phase >= 1.0 {
                self.trigger_phase -= 1.0;
                self.try_trigger(size_frames, pitch, spread, pan_spread);
            }

            // Mix every active grain into a stereo pair.
            let mut wet = [0.0f32; 2];
            for grain in self.grains.iter_mut() {
                if !grain.active {
                    continue;
                }
                let env = grain.envelope();
                let position =
                    grain.source_start as f64 + grain.age as f64 * grain.pitch_ratio as f64;
                grain.age += 1;
                if grain.age >= grain.length {
                    grain.active = false;
                }
                if env <= 0.0 {
                    continue;
                }
                let sample = {
                    let len = history_len as u64;
                    let i0 = (position as u64) % len;
                    let i1 = (i0 + 1) % len;
                    let frac = (position - position.floor()) as f32;
                    let s0 = self.history[i0 as usize];
                    let s1 = self.history[i1 as usize];
                    (s0 + (s1 - s0) * frac) * env
                };
                let left_gain = (1.0 - grain.pan) * 0.5;
                let right_gain = (1.0 + grain.pan) * 0.5;
                wet[0] += sample * left_gain;
                wet[1] += sample * right_gain;
            }

            if channels == 1 {
                frame[0] = blend_dry_wet(frame[0], wet[0] + wet[1], mix);
            } else {
                for (ch, sample) in frame.iter_mut().take(MAX_PROCESS_CHANNELS).enumerate() {
                    *sample = blend_dry_wet(*sample, wet[ch], mix);
                }
            }
        }
    }

    /// Bypassed granular keeps its trigger clock running and lets live
    /// grains age out, but captures no history and spawns nothing new.
    pub fn advance_idle(&mut self, frames: usize, ctx: &BlockCtx, params: &[f32]) {
        let density = params[GranularParam::Density as usize];
        self.trigger_phase =
            (self.trigger_phase + density / ctx.sample_rate * frames as f32).fract();
        for grain in self.grains.iter_mut() {
            if grain.active {
                grain.age = grain.age.saturating_add(frames as u32);
                if grain.age >= grain.length {
                    grain.active = false;
                }
            }
        }
    }

    pub fn reset(&mut self) {
        self.history.fill(0.0);
        self.written = 0;
        self.trigger_phase = 0.0;
        self.note_ratio = 1.0;
        for grain in self.grains.iter_mut() {
            grain.active = false;
        }
    }
}
