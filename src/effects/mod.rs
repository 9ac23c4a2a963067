//! Block-processing effect units.
//!
//! Each unit lives in its own module with the same shape: a parameter
//! enum, a `&'static` descriptor table, the DSP struct, and its tests.
//! [`EffectUnit`] is the tagged variant the chain owns and dispatches
//! over — one flat enum instead of an inheritance tree, with the small
//! capability traits [`Automatable`] and [`MidiReceiver`] layered on the
//! structs that support them.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Block convolution with a loaded impulse response.
pub mod convolution;
/// Soft/hard/foldback clipping.
pub mod distortion;
/// Granular resynthesis of the recent input.
pub mod granular;
/// Phrase recording and overdubbed playback.
pub mod looper;
/// Swept allpass cascade.
pub mod phaser;
/// Segment-reversed delay.
pub mod reverse_delay;
/// Wow/flutter feedback delay.
pub mod tape_delay;
/// LFO-driven pitch modulation.
pub mod vibrato;
/// Drive/bias/symmetry transfer curve.
pub mod waveshaper;

pub use convolution::Convolution;
pub use distortion::Distortion;
pub use granular::Granular;
pub use looper::Looper;
pub use phaser::Phaser;
pub use reverse_delay::ReverseDelay;
pub use tape_delay::TapeDelay;
pub use vibrato::Vibrato;
pub use waveshaper::WaveShaper;

use crate::chain::BlockCtx;
use crate::params::ParameterDescriptor;

/// Exposes a parameter descriptor table for automation.
pub trait Automatable {
    fn descriptors(&self) -> &'static [ParameterDescriptor];
}

/// Receives MIDI note events routed by the chain.
pub trait MidiReceiver {
    fn note_on(&mut self, note: u8, velocity: u8);
    fn note_off(&mut self, note: u8);
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectKind {
    TapeDelay,
    ReverseDelay,
    Looper,
    Granular,
    Convolution,
    Phaser,
    Vibrato,
    WaveShaper,
    Distortion,
}

impl EffectKind {
    pub const ALL: [EffectKind; 9] = [
        EffectKind::TapeDelay,
        EffectKind::ReverseDelay,
        EffectKind::Looper,
        EffectKind::Granular,
        EffectKind::Convolution,
        EffectKind::Phaser,
        EffectKind::Vibrato,
        EffectKind::WaveShaper,
        EffectKind::Distortion,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EffectKind::TapeDelay => "tape_delay",
            EffectKind::ReverseDelay => "reverse_delay",
            EffectKind::Looper => "looper",
            EffectKind::Granular => "granular",
            EffectKind::Convolution => "convolution",
            EffectKind::Phaser => "phaser",
            EffectKind::Vibrato => "vibrato",
            EffectKind::WaveShaper => "waveshaper",
            EffectKind::Distortion => "distortion",
        }
    }

    pub fn descriptors(self) -> &'static [ParameterDescriptor] {
        match self {
            EffectKind::TapeDelay => tape_delay::TAPE_DELAY_PARAMS,
            EffectKind::ReverseDelay => reverse_delay::REVERSE_DELAY_PARAMS,
            EffectKind::Looper => looper::LOOPER_PARAMS,
            EffectKind::Granular => granular::GRANULAR_PARAMS,
            EffectKind::Convolution => convolution::CONVOLUTION_PARAMS,
            EffectKind::Phaser => phaser::PHASER_PARAMS,
            EffectKind::Vibrato => vibrato::VIBRATO_PARAMS,
            EffectKind::WaveShaper => waveshaper::WAVESHAPER_PARAMS,
            EffectKind::Distortion => distortion::DISTORTION_PARAMS,
        }
    }
}

/// Tagged variant over every effect. Exclusively owned by one chain slot;
/// all per-effect DSP state lives inside the variant.
pub enum EffectUnit {
    TapeDelay(TapeDelay),
    ReverseDelay(ReverseDelay),
    Looper(Looper),
    Granular(Granular),
    Convolution(Convolution),
    Phaser(Phaser),
    Vibrato(Vibrato),
    WaveShaper(WaveShaper),
    Distortion(Distortion),
}

impl EffectUnit {
    pub fn create(kind: EffectKind, sample_rate: f32) -> Self {
        match kind {
            EffectKind::TapeDelay => EffectUnit::TapeDelay(TapeDelay::new(sample_rate)),
            EffectKind::ReverseDelay => EffectUnit::ReverseDelay(ReverseDelay::new(sample_rate)),
            EffectKind::Looper => EffectUnit::Looper(Looper::new(sample_rate)),
            EffectKind::Granular => EffectUnit::Granular(Granular::new(sample_rate)),
            EffectKind::Convolution => EffectUnit::Convolution(Convolution::new(sample_rate)),
            EffectKind::Phaser => EffectUnit::Phaser(Phaser::new(sample_rate)),
            EffectKind::Vibrato => EffectUnit::Vibrato(Vibrato::new(sample_rate)),
            EffectKind::WaveShaper => EffectUnit::WaveShaper(WaveShaper::new(sample_rate)),
            EffectKind::Distortion => EffectUnit::Distortion(Distortion::new(sample_rate)),
        }
    }

    pub fn kind(&self) -> EffectKind {
        match self {
            EffectUnit::TapeDelay(_) => EffectKind::TapeDelay,
            EffectUnit::ReverseDelay(_) => EffectKind::ReverseDelay,
            EffectUnit::Looper(_) => EffectKind::Looper,
            EffectUnit::Granular(_) => EffectKind::Granular,
            EffectUnit::Convolution(_) => EffectKind::Convolution,
            EffectUnit::Phaser(_) => EffectKind::Phaser,
            EffectUnit::Vibrato(_) => EffectKind::Vibrato,
            EffectUnit::WaveShaper(_) => EffectKind::WaveShaper,
            EffectUnit::Distortion(_) => EffectKind::Distortion,
        }
    }

    pub fn process_block(&mut self, buffer: &mut [f32], ctx: &BlockCtx, params: &[f32]) {
        match self {
            EffectUnit::TapeDelay(fx) => fx.process_block(buffer, ctx, params),
            EffectUnit::ReverseDelay(fx) => fx.process_block(buffer, ctx, params),
            EffectUnit::Looper(fx) => fx.process_block(buffer, ctx, params),
            EffectUnit::Granular(fx) => fx.process_block(buffer, ctx, params),
            EffectUnit::Convolution(fx) => fx.process_block(buffer, ctx, params),
            EffectUnit::Phaser(fx) => fx.process_block(buffer, ctx, params),
            EffectUnit::Vibrato(fx) => fx.process_block(buffer, ctx, params),
            EffectUnit::WaveShaper(fx) => fx.process_block(buffer, ctx, params),
            EffectUnit::Distortion(fx) => fx.process_block(buffer, ctx, params),
        }
    }

    /// Advance free-running state (LFO phases, trigger clocks) without
    /// touching audio. Called for bypassed units so re-enabling them is
    /// click-free.
    pub fn advance_idle(&mut self, frames: usize, ctx: &BlockCtx, params: &[f32]) {
        match self {
            EffectUnit::TapeDelay(fx) => fx.advance_idle(frames, ctx, params),
            EffectUnit::ReverseDelay(fx) => fx.advance_idle(frames, ctx, params),
            EffectUnit::Looper(fx) => fx.advance_idle(frames, ctx, params),
            EffectUnit::Granular(fx) => fx.advance_idle(frames, ctx, params),
            EffectUnit::Convolution(fx) => fx.advance_idle(frames, ctx, params),
            EffectUnit::Phaser(fx) => fx.advance_idle(frames, ctx, params),
            EffectUnit::Vibrato(fx) => fx.advance_idle(frames, ctx, params),
            EffectUnit::WaveShaper(fx) => fx.advance_idle(frames, ctx, params),
            EffectUnit::Distortion(fx) => fx.advance_idle(frames, ctx, params),
        }
    }

    /// Clear DSP state (buffers, filters, grains) without touching
    /// parameters.
    pub fn reset(&mut self) {
        match self {
            EffectUnit::TapeDelay(fx) => fx.reset(),
            EffectUnit::ReverseDelay(fx) => fx.reset(),
            EffectUnit::Looper(fx) => fx.reset(),
            EffectUnit::Granular(fx) => fx.reset(),
            EffectUnit::Convolution(fx) => fx.reset(),
            EffectUnit::Phaser(fx) => fx.reset(),
            EffectUnit::Vibrato(fx) => fx.reset(),
            EffectUnit::WaveShaper(fx) => fx.reset(),
            EffectUnit::Distortion(fx) => fx.reset(),
        }
    }

    /// The MIDI-capable variant, if this unit has one.
    pub fn as_midi_receiver(&mut self) -> Option<&mut dyn MidiReceiver> {
        match self {
            EffectUnit::Granular(fx) => Some(fx),
            _ => None,
        }
    }

    pub fn as_looper_mut(&mut self) -> Option<&mut Looper> {
        match self {
            EffectUnit::Looper(fx) => Some(fx),
            _ => None,
        }
    }

    pub fn as_convolution_mut(&mut self) -> Option<&mut Convolution> {
        match self {
            EffectUnit::Convolution(fx) => Some(fx),
            _ => None,
        }
    }

    pub fn as_convolution(&self) -> Option<&Convolution> {
        match self {
            EffectUnit::Convolution(fx) => Some(fx),
            _ => None,
        }
    }
}

impl Automatable for EffectUnit {
    fn descriptors(&self) -> &'static [ParameterDescriptor] {
        self.kind().descriptors()
    }
}

impl MidiReceiver for Granular {
    fn note_on(&mut self, note: u8, velocity: u8) {
        Granular::note_on(self, note, velocity);
    }

    fn note_off(&mut self, note: u8) {
        Granular::note_off(self, note);
    }
}
