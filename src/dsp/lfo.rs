#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/*
Low Frequency Oscillator
========================

Free-running control-rate oscillator used for delay-time modulation (tape
wow/flutter, vibrato) and allpass-coefficient sweeps (phaser).

The phase is kept as a normalized cycle in [0, 1) and advanced by
`rate / sample_rate` per sample. Keeping the phase normalized makes the
shape functions trivial and lets the phase keep running while an effect is
bypassed, so re-enabling the effect resumes the modulation mid-cycle
instead of jumping back to zero (an audible click).

Output is bipolar in [-1, +1] for every shape.
*/

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LfoShape {
    Sine,
    Triangle,
    Square,
}

#[derive(Debug, Clone)]
pub struct Lfo {
    shape: LfoShape,
    phase: f32, // normalized cycles in [0, 1)
}

impl Lfo {
    pub fn new(shape: LfoShape) -> Self {
        Self { shape, phase: 0.0 }
    }

    /// Start at a fixed phase offset (used for stereo quadrature pairs).
    pub fn with_phase(shape: LfoShape, phase: f32) -> Self {
        Self {
            shape,
            phase: phase.rem_euclid(1.0),
        }
    }

    pub fn set_shape(&mut self, shape: LfoShape) {
        self.shape = shape;
    }

    #[inline]
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Current output without advancing the phase.
    #[inline]
    pub fn value(&self) -> f32 {
        match self.shape {
            LfoShape::Sine => (core::f32::consts::TAU * self.phase).sin(),
            LfoShape::Triangle => {
                // Rises -1..+1 over the first half cycle, falls back over
                // the second.
                if self.phase < 0.5 {
                    4.0 * self.phase - 1.0
                } else {
                    3.0 - 4.0 * self.phase
                }
            }
            LfoShape::Square => {
                if self.phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
        }
    }

    /// Produce the next sample and advance the phase.
    #[inline]
    pub fn next(&mut self, rate_hz: f32, sample_rate: f32) -> f32 {
        let out = self.value();
        self.advance(1, rate_hz, sample_rate);
        out
    }

    /// Advance the phase by `frames` samples without producing output.
    ///
    /// Called while the owning effect is bypassed so the modulation stays
    /// continuous across bypass toggles.
    #[inline]
    pub fn advance(&mut self, frames: usize, rate_hz: f32, sample_rate: f32) {
        if sample_rate <= 0.0 {
            return;
        }
        let dp = rate_hz / sample_rate;
        self.phase = (self.phase + dp * frames as f32).rem_euclid(1.0);
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}
