//! Low-level DSP primitives used by the effect units.
//!
//! These components are allocation-free and realtime-safe, making them safe
//! to embed directly inside effect structs. They intentionally stay focused
//! on the signal-processing math so the effect layer can layer on parameter
//! handling and modulation.

/// One-pole allpass section for phase-shifting cascades.
pub mod allpass;
/// Fixed-capacity ring buffer with fractional delayed reads.
pub mod delay;
/// Free-running low frequency oscillator with selectable shape.
pub mod lfo;
/// Dry/wet blending helpers shared by every effect.
pub mod mix;
/// Waveshaping transfer curves and DC removal.
pub mod shaper;

pub use delay::RingBuffer;
pub use lfo::{Lfo, LfoShape};
