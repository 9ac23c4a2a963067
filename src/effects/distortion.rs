use crate::chain::BlockCtx;
use crate::dsp::mix::blend_dry_wet;
use crate::dsp::shaper::{foldback, hard_clip, soft_clip};
use crate::params::ParameterDescriptor;

/*
Distortion
==========

Adds harmonics and grit by clipping. Three transfer curves, selected by
the `mode` parameter:

Soft:     Warm, tube-like saturation. Gradually compresses peaks.
Hard:     Harsh, buzzy clipping. Odd harmonics, fuzz-pedal character.
Foldback: The signal reflects off the threshold instead of flattening.
          Complex, metallic — a sound-design tool more than an amp.

Lowering `threshold` makes hard and foldback modes bite earlier at the
same drive; soft mode ignores it (tanh has its own knee).

Parameters
----------

Drive (1 - 10):        How hard the signal is pushed into the curve.
Mode (0 - 2):          0 soft, 1 hard, 2 foldback.
Threshold (0.05 - 1):  Clip ceiling for hard and foldback modes.
Mix (0 - 1):           Dry/wet blend.
*/

#[derive(Clone, Copy, Debug)]
pub enum DistortionParam {
    Drive,
    Mode,
    Threshold,
    Mix,
}

pub static DISTORTION_PARAMS: &[ParameterDescriptor] = &[
    ParameterDescriptor::new("drive", 1.0, 10.0, 3.0, "x"),
    ParameterDescriptor::new("mode", 0.0, 2.0, 0.0, ""),
    ParameterDescriptor::new("threshold", 0.05, 1.0, 1.0, ""),
    ParameterDescriptor::new("mix", 0.0, 1.0, 0.5, ""),
];

/// Type of distortion/waveshaping
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DistortionMode {
    /// Soft clipping - warm, tube-like saturation
    Soft,
    /// Hard clipping - harsh, buzzy distortion
    Hard,
    /// Foldback - complex, metallic harmonics
    Foldback,
}

fn mode_from_param(value: f32) -> DistortionMode {
    match value.round() as i32 {
        1 => DistortionMode::Hard,
        2 => DistortionMode::Foldback,
        _ => DistortionMode::Soft,
    }
}

pub struct Distortion;

impl Distortion {
    pub fn new(_sample_rate: f32) -> Self {
        Self
    }

    pub fn process_block(&mut self, buffer: &mut [f32], _ctx: &BlockCtx, params: &[f32]) {
        let drive = params[DistortionParam::Drive as usize];
        let mode = mode_from_param(params[DistortionParam::Mode as usize]);
        let threshold = params[DistortionParam::Threshold as usize];
        let mix = params[DistortionParam::Mix as usize];

        // Channel-agnostic: the curve is stateless, so interleaved frames
        // shape correctly without per-channel bookkeeping.
        for sample in buffer.iter_mut() {
            let dry = *sample;
            let wet = match mode {
                DistortionMode::Soft => soft_clip(dry, drive),
                DistortionMode::Hard => hard_clip(dry, drive, threshold),
                DistortionMode::Foldback => foldback(dry, drive, threshold),
            };
            *sample = blend_dry_wet(dry, wet, mix);
        }
    }

    pub fn advance_idle(&mut self, _frames: usize, _ctx: &BlockCtx, _params: &[f32]) {
        // Stateless.
    }

    pub fn reset(&mut self) {
        // Stateless.
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> BlockCtx {
        BlockCtx {
            sample_rate: 48_000.0,
            channels: 1,
        }
    }

    fn params(drive: f32, mode: f32, threshold: f32, mix: f32) -> Vec<f32> {
        vec![drive, mode, threshold, mix]
    }

    #[test]
    fn soft_mode_modifies_the_signal() {
        let mut node = Distortion::new(48_000.0);
        let mut buf = vec![0.5, -0.5, 0.8, -0.8];
        let original = buf.clone();
        node.process_block(&mut buf, &ctx(), &params(4.0, 0.0, 1.0, 1.0));
        assert!(buf
            .iter()
            .zip(original.iter())
            .any(|(a, b)| (a - b).abs() > 0.01));
    }

    #[test]
    fn dry_mix_preserves_signal() {
        let mut node = Distortion::new(48_000.0);
        let mut buf = vec![0.5, -0.5, 0.3, -0.3];
        let original = buf.clone();
        node.process_block(&mut buf, &ctx(), &params(4.0, 0.0, 1.0, 0.0));
        for (a, b) in buf.iter().zip(original.iter()) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn hard_clipping_limits_amplitude() {
        let mut node = Distortion::new(48_000.0);
        let mut buf = vec![0.5, -0.5, 0.8, -0.8];
        node.process_block(&mut buf, &ctx(), &params(5.0, 1.0, 0.5, 1.0));
        for sample in &buf {
            assert!(sample.abs() <= 0.5 + 1e-6);
        }
    }

    #[test]
    fn foldback_extreme_values_stay_bounded() {
        let mut node = Distortion::new(48_000.0);
        let mut buf = vec![1.0, -1.0, 0.5, -0.5];
        node.process_block(&mut buf, &ctx(), &params(10.0, 2.0, 0.5, 1.0));
        for sample in &buf {
            assert!(sample.is_finite());
            assert!(sample.abs() <= 0.5 + 1e-6);
        }
    }
}
