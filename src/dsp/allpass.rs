/*
One-Pole Allpass Section
========================

First-order allpass: flat magnitude response, frequency-dependent phase
shift. Cascading several sections and sweeping their corner frequency with
an LFO is the classic phaser topology; summing the cascade back with the
dry signal turns the phase shifts into moving notches.

Transfer function: H(z) = (-a1 + z^-1) / (1 - a1 * z^-1)

The coefficient comes from the bilinear-transform warped corner frequency,
so the 90-degree phase-shift point lands on the requested frequency.
*/

#[derive(Debug, Clone, Copy, Default)]
pub struct Allpass {
    a1: f32,
    zm1: f32,
}

impl Allpass {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place the 90-degree point at `freq_hz`.
    #[inline]
    pub fn set_corner(&mut self, freq_hz: f32, sample_rate: f32) {
        // Keep the warped frequency strictly inside (0, Nyquist).
        let freq = freq_hz.clamp(1.0, sample_rate * 0.49);
        let w = (core::f32::consts::PI * freq / sample_rate).tan();
        self.a1 = (1.0 - w) / (1.0 + w);
    }

    #[inline]
    pub fn tick(&mut self, x: f32) -> f32 {
        let y = -self.a1 * x + self.zm1;
        self.zm1 = x + self.a1 * y;
        y
    }

    pub fn reset(&mut self) {
        self.zm1 = 0.0;
    }
}
