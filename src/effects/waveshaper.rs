use crate::chain::BlockCtx;
use crate::dsp::mix::blend_dry_wet;
use crate::dsp::shaper::{shape, DcBlocker};
use crate::params::ParameterDescriptor;
use crate::MAX_PROCESS_CHANNELS;

/*
WaveShaper
==========

Per-sample nonlinear transfer curve with drive, bias, and symmetry
controls. Bias pushes the signal into an asymmetric region of the curve
(even harmonics, "tube" character); symmetry scales the negative half
relative to the positive one (more even-harmonic skew). Both leave a DC
offset behind, which the per-channel DC blocker removes before the output
reaches the mix stage.

The shaping math clamps its input before every tanh call, so a finite
input sample can never come out non-finite regardless of settings.

Parameters
----------

Drive (1 - 20):       Input gain into the curve.
Bias (-0.5 - 0.5):    Static offset into the curve.
Symmetry (0.1 - 2):   Negative-half gain; 1.0 is symmetric.
Mix (0 - 1):          Dry/wet blend.
*/

#[derive(Clone, Copy, Debug)]
pub enum WaveShaperParam {
    Drive,
    Bias,
    Symmetry,
    Mix,
}

pub static WAVESHAPER_PARAMS: &[ParameterDescriptor] = &[
    ParameterDescriptor::new("drive", 1.0, 20.0, 2.0, "x"),
    ParameterDescriptor::new("bias", -0.5, 0.5, 0.0, ""),
    ParameterDescriptor::new("symmetry", 0.1, 2.0, 1.0, ""),
    ParameterDescriptor::new("mix", 0.0, 1.0, 1.0, ""),
];

pub struct WaveShaper {
    dc_blockers: [DcBlocker; MAX_PROCESS_CHANNELS],
}

impl WaveShaper {
    pub fn new(_sample_rate: f32) -> Self {
        Self {
            dc_blockers: [DcBlocker::new(), DcBlocker::new()],
        }
    }

    pub fn process_block(&mut self, buffer: &mut [f32], ctx: &BlockCtx, params: &[f32]) {
        let drive = params[WaveShaperParam::Drive as usize];
        let bias = params[WaveShaperParam::Bias as usize];
        let symmetry = params[WaveShaperParam::Symmetry as usize];
        let mix = params[WaveShaperParam::Mix as usize];

        let channels = ctx.channels.max(1);

        for frame in buffer.chunks_exact_mut(channels) {
            for (ch, sample) in frame.iter_mut().take(MAX_PROCESS_CHANNELS).enumerate() {
                let dry = *sample;
                let shaped = shape(dry, drive, bias, symmetry);
                let wet = self.dc_blockers[ch].tick(shaped);
                *sample = blend_dry_wet(dry, wet, mix);
            }
        }
    }

    pub fn advance_idle(&mut self, _frames: usize, _ctx: &BlockCtx, _params: &[f32]) {
        // Stateless apart from the DC blocker, which should not drift
        // while no signal flows.
    }

    pub fn reset(&mut self) {
        for blocker in &mut self.dc_blockers {
            blocker.reset();
        }
    }
}
