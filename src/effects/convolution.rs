use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::chain::BlockCtx;
use crate::dsp::delay::RingBuffer;
use crate::dsp::mix::blend_dry_wet;
use crate::params::ParameterDescriptor;
use crate::{ConfigError, MAX_PROCESS_CHANNELS};

/*
Convolution Engine
==================

Block convolution against a loaded impulse response, done in the frequency
domain with windowed overlap-add:

  1. Slide a Hann analysis window (1024 frames) over the input at a 512
     frame hop (50% overlap).
  2. Zero-pad each windowed frame to the FFT size, transform, multiply
     bin-wise with the precomputed IR spectrum, inverse-transform.
  3. Overlap-add the result into a per-channel accumulator; each hop emits
     the accumulator's front 512 frames as wet output.

Periodic Hann at 50% overlap sums to exactly 1.0 (the COLA property), so
with a unit-impulse IR the wet path reproduces the input bit-faithfully,
delayed by the analysis window length — reported via `latency_samples`.
The FFT size is the next power of two that holds `window + IR - 1`
samples, so the circular convolution never wraps into the frame.

The IR spectrum, FFT plans, and every buffer whose size depends on the IR
are bundled into a [`ConvState`] prepared off the audio thread by
[`prepare_impulse_response`]. Installing one is a pointer swap, so the
processing thread never sees half-updated transform data. With no state
installed the effect is a pass-through no-op.

Post-processing on the accumulated wet path (never inside the transform):
`predelay` (wet delay line), `damping` (one-pole lowpass), `width`
(mid/side scaling, stereo only). `decay` reshapes the IR envelope at
preparation time instead, since the tail length cannot be shortened after
the convolution has happened.

Parameters
----------

Mix (0 - 1):           Dry/wet blend.
Predelay (0 - 250 ms): Wet-path delay before the reverb onset.
Decay (0.1 - 1):       IR tail attenuation, applied when preparing an IR.
Damping (0 - 1):       High-frequency rolloff on the wet path.
Width (0 - 1):         Stereo image of the wet path; 0 collapses to mono.
*/

#[derive(Clone, Copy, Debug)]
pub enum ConvolutionParam {
    Mix,
    Predelay,
    Decay,
    Damping,
    Width,
}

pub static CONVOLUTION_PARAMS: &[ParameterDescriptor] = &[
    ParameterDescriptor::new("mix", 0.0, 1.0, 0.3, ""),
    ParameterDescriptor::new("predelay", 0.0, 250.0, 0.0, "ms"),
    ParameterDescriptor::new("decay", 0.1, 1.0, 1.0, ""),
    ParameterDescriptor::new("damping", 0.0, 1.0, 0.0, ""),
    ParameterDescriptor::new("width", 0.0, 1.0, 1.0, ""),
];

/// Analysis window length in frames.
pub const WINDOW: usize = 1024;
/// Hop between analysis frames (50% overlap).
pub const HOP: usize = WINDOW / 2;
/// Longest accepted impulse response (~3 s at 44.1 kHz).
pub const MAX_IR_SAMPLES: usize = 131_072;

const MAX_PREDELAY_SECONDS: f32 = 0.26;

/// Everything whose size or content depends on the loaded impulse
/// response. Prepared off the audio thread, installed by pointer swap.
pub struct ConvState {
    fft_size: usize,
    ir_len: usize,
    /// Forward transform of the (decay-shaped, zero-padded) IR.
    spectrum: Vec<Complex<f32>>,
    fft: Arc<dyn Fft<f32>>,
    ifft: Arc<dyn Fft<f32>>,
    /// In-place transform buffer, `fft_size` bins.
    work: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    /// Per-channel overlap-add accumulators, `fft_size` frames.
    accum: [Vec<f32>; MAX_PROCESS_CHANNELS],
}

impl ConvState {
    pub fn ir_len(&self) -> usize {
        self.ir_len
    }
}

impl std::fmt::Debug for ConvState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConvState")
            .field("ir_len", &self.ir_len)
            .field("fft_size", &self.fft_size)
            .finish_non_exhaustive()
    }
}

/// Build a [`ConvState`] for `ir`. Runs FFT planning and allocation, so
/// call it from a loader thread, never from the audio callback.
pub fn prepare_impulse_response(
    ir: &[f32],
    sample_rate: f32,
    decay: f32,
) -> Result<Box<ConvState>, ConfigError> {
    if ir.is_empty() {
        return Err(ConfigError::EmptyImpulseResponse);
    }
    if ir.len() > MAX_IR_SAMPLES {
        return Err(ConfigError::ImpulseResponseTooLong {
            len: ir.len(),
            max: MAX_IR_SAMPLES,
        });
    }
    if ir.iter().any(|s| !s.is_finite()) {
        return Err(ConfigError::MalformedImpulseResponse);
    }

    let fft_size = (WINDOW + ir.len() - 1).next_power_of_two();
    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(fft_size);
    let ifft = planner.plan_fft_inverse(fft_size);

    // Shape the tail while we are still off the audio thread: decay = 1
    // leaves the IR untouched, lower values roll the tail off faster.
    let decay = decay.clamp(0.1, 1.0);
    let rolloff_per_second = (1.0 - decay) * 8.0;
    let mut spectrum: Vec<Complex<f32>> = vec![Complex::default(); fft_size];
    for (i, &s) in ir.iter().enumerate() {
        let t = i as f32 / sample_rate;
        spectrum[i] = Complex::new(s * (-rolloff_per_second * t).exp(), 0.0);
    }

    let scratch_len = fft
        .get_inplace_scratch_len()
        .max(ifft.get_inplace_scratch_len());
    let mut scratch = vec![Complex::default(); scratch_len];
    fft.process_with_scratch(&mut spectrum, &mut scratch);

    log::info!(
        "prepared impulse response: {} samples, fft size {}",
        ir.len(),
        fft_size
    );

    Ok(Box::new(ConvState {
        fft_size,
        ir_len: ir.len(),
        spectrum,
        fft,
        ifft,
        work: vec![Complex::default(); fft_size],
        scratch,
        accum: [vec![0.0; fft_size], vec![0.0; fft_size]],
    }))
}

struct WetChannel {
    /// Sliding input window, chronological via `input_pos`.
    input: Vec<f32>,
    /// Wet frames emitted by the last transform, consumed one per frame.
    ready: Vec<f32>,
    predelay: RingBuffer,
    lowpass: f32,
}

impl WetChannel {
    fn new(sample_rate: f32) -> Self {
        Self {
            input: vec![0.0; WINDOW],
            ready: vec![0.0; HOP],
            predelay: RingBuffer::for_time(MAX_PREDELAY_SECONDS, sample_rate)
                .expect("predelay capacity is a compile-time constant"),
            lowpass: 0.0,
        }
    }

    fn reset(&mut self) {
        self.input.fill(0.0);
        self.ready.fill(0.0);
        self.predelay.reset();
        self.lowpass = 0.0;
    }
}

pub struct Convolution {
    state: Option<Box<ConvState>>,
    channels: [WetChannel; MAX_PROCESS_CHANNELS],
    window: Vec<f32>,
    /// Shared write cursor into the sliding input windows.
    input_pos: usize,
    /// Frames consumed since the last transform, 0..HOP.
    hop_pos: usize,
}

impl Convolution {
    pub fn new(sample_rate: f32) -> Self {
        // Periodic Hann: w[n] + w[n + HOP] == 1 for every n.
        let window = (0..WINDOW)
            .map(|n| 0.5 * (1.0 - (core::f32::consts::TAU * n as f32 / WINDOW as f32).cos()))
            .collect();
        Self {
            state: None,
            channels: [WetChannel::new(sample_rate), WetChannel::new(sample_rate)],
            window,
            input_pos: 0,
            hop_pos: 0,
        }
    }

    /// Swap in a prepared IR state. Called from the message drain at the
    /// top of a block; the swap itself is the whole install.
    pub fn install(&mut self, state: Box<ConvState>) {
        self.state = Some(state);
        for ch in &mut self.channels {
            ch.ready.fill(0.0);
        }
        self.hop_pos = 0;
    }

    pub fn clear_impulse_response(&mut self) {
        self.state = None;
    }

    pub fn is_impulse_response_loaded(&self) -> bool {
        self.state.is_some()
    }

    /// Wet-path delay relative to the dry input.
    pub fn latency_samples(&self) -> usize {
        WINDOW
    }

    /// Window, transform, multiply, inverse, overlap-add: one hop's worth
    /// of work for one channel.
    fn transform_channel(
        state: &mut ConvState,
        channel: &mut WetChannel,
        window: &[f32],
        input_pos: usize,
        accum_index: usize,
    ) {
        let n = state.fft_size;
        // Oldest sample first: the write cursor points at the oldest slot.
        for (j, w) in window.iter().enumerate() {
            let sample = channel.input[(input_pos + j) % WINDOW];
            state.work[j] = Complex::new(sample * w, 0.0);
        }
        for bin in state.work[WINDOW..].iter_mut() {
            *bin = Complex::default();
        }

        state.fft.process_with_scratch(&mut state.work, &mut state.scratch);
        for (bin, ir_bin) in state.work.iter_mut().zip(state.spectrum.iter()) {
            *bin *= ir_bin;
        }
        state
            .ifft
            .process_with_scratch(&mut state.work, &mut state.scratch);

        let scale = 1.0 / n as f32;
        let accum = &mut state.accum[accum_index];
        for (acc, bin) in accum.iter_mut().zip(state.work.iter()) {
            *acc += bin.re * scale;
        }

        channel.ready.copy_from_slice(&accum[..HOP]);
        accum.copy_within(HOP.., 0);
        accum[n - HOP..].fill(0.0);
    }

    pub fn process_block(&mut self, buffer: &mut [f32], ctx: &BlockCtx, params: &[f32]) {
        let mix = params[ConvolutionParam::Mix as usize];
        let predelay_ms = params[ConvolutionParam::Predelay as usize];
        let damping = params[ConvolutionParam::Damping as usize];
        let width = params[ConvolutionParam::Width as usize];

        let Some(state) = self.state.as_deref_mut() else {
            return; // no IR loaded: pass-through
        };

        let channels = ctx.channels.max(1);
        let active = channels.min(MAX_PROCESS_CHANNELS);
        let predelay_samples = (predelay_ms / 1000.0 * ctx.sample_rate).max(0.0);
        let lp_coeff = 1.0 - 0.95 * damping;

        for frame in buffer.chunks_exact_mut(channels) {
            let mut wet = [0.0f32; MAX_PROCESS_CHANNELS];
            for (ch_index, sample) in frame.iter_mut().take(active).enumerate() {
                let ch = &mut self.channels[ch_index];
                ch.input[self.input_pos] = *sample;
                wet[ch_index] = ch.ready[self.hop_pos];
            }

            self.input_pos = (self.input_pos + 1) % WINDOW;
            self.hop_pos += 1;
            if self.hop_pos == HOP {
                self.hop_pos = 0;
                for (ch_index, ch) in self.channels.iter_mut().take(active).enumerate() {
                    Self::transform_channel(state, ch, &self.window, self.input_pos, ch_index);
                }
            }

            // Post-processing on the wet path only.
            for (ch_index, w) in wet.iter_mut().take(active).enumerate() {
                let ch = &mut self.channels[ch_index];
                if predelay_samples >= 1.0 {
                    ch.predelay.write(*w);
                    *w = ch.predelay.read_delayed(predelay_samples);
                } else {
                    ch.predelay.write(*w);
                }
                ch.lowpass += lp_coeff * (*w - ch.lowpass);
                *w = ch.lowpass;
            }

            if active == 2 {
                let mid = (wet[0] + wet[1]) * 0.5;
                let side = (wet[0] - wet[1]) * 0.5 * width;
                wet[0] = mid + side;
                wet[1] = mid - side;
            }

            for (ch_index, sample) in frame.iter_mut().take(active).enumerate() {
                *sample = blend_dry_wet(*sample, wet[ch_index], mix);
            }
        }
    }

    pub fn advance_idle(&mut self, _frames: usize, _ctx: &BlockCtx, _params: &[f32]) {
        // No free-running modulation state.
    }

    pub fn reset(&mut self) {
        for ch in &mut self.channels {
            ch.reset();
        }
        if let Some(state) = self.state.as_deref_mut() {
            for accum in &mut state.accum {
                accum.fill(0.0);
            }
        }
        self.input_pos = 0;
        self.hop_pos = 0;
    }
}
