/*
Waveshaping Transfer Curves
===========================

Stateless per-sample nonlinearities used by the waveshaper and distortion
units, plus the DC blocker that cleans up the offset asymmetric shaping
introduces.

All curves clamp their input before any transcendental call so a finite
input can never produce a non-finite output, no matter how hard the drive
parameter pushes the signal.
*/

/// Input clamp applied before transcendental shaping. tanh saturates well
/// before this, so the clamp is inaudible.
const SHAPER_INPUT_LIMIT: f32 = 64.0;

/// Soft clipping: warm, tape-style saturation via tanh.
#[inline]
pub fn soft_clip(sample: f32, drive: f32) -> f32 {
    (sample * drive).clamp(-SHAPER_INPUT_LIMIT, SHAPER_INPUT_LIMIT).tanh()
}

/// Hard clipping: drive into a fixed threshold ceiling.
#[inline]
pub fn hard_clip(sample: f32, drive: f32, threshold: f32) -> f32 {
    (sample * drive).clamp(-threshold, threshold)
}

/// Foldback: the signal reflects off the threshold instead of flattening,
/// producing metallic upper harmonics.
#[inline]
pub fn foldback(sample: f32, drive: f32, threshold: f32) -> f32 {
    let mut x = sample * drive;
    // Each pass reflects once; bounded input needs a bounded pass count.
    for _ in 0..32 {
        if x > threshold {
            x = 2.0 * threshold - x;
        } else if x < -threshold {
            x = -2.0 * threshold - x;
        } else {
            break;
        }
    }
    x.clamp(-threshold, threshold)
}

/// Drive/bias/symmetry transfer curve.
///
/// `bias` shifts the input into the curve (even harmonics), `symmetry`
/// scales the negative half relative to the positive half. The bias offset
/// is subtracted back out post-shaping; the owning effect still runs a
/// [`DcBlocker`] to remove what asymmetry leaves behind.
#[inline]
pub fn shape(sample: f32, drive: f32, bias: f32, symmetry: f32) -> f32 {
    let x = sample.clamp(-SHAPER_INPUT_LIMIT, SHAPER_INPUT_LIMIT);
    let x = if x < 0.0 { x * symmetry } else { x };
    let driven = ((x + bias) * drive).clamp(-SHAPER_INPUT_LIMIT, SHAPER_INPUT_LIMIT);
    driven.tanh() - (bias * drive).clamp(-SHAPER_INPUT_LIMIT, SHAPER_INPUT_LIMIT).tanh()
}

/// One-pole DC blocker: y[n] = x[n] - x[n-1] + R * y[n-1].
///
/// R close to 1 puts the highpass corner a few Hz up, low enough to leave
/// program material untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct DcBlocker {
    x1: f32,
    y1: f32,
}

impl DcBlocker {
    const R: f32 = 0.995;

    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn tick(&mut self, x: f32) -> f32 {
        let y = x - self.x1 + Self::R * self.y1;
        self.x1 = x;
        self.y1 = y;
        y
    }

    pub fn reset(&mut self) {
        self.x1 = 0.0;
        self.y1 = 0.0;
    }
}
