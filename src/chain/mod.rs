//! The effect chain and its block-processing entry point.
//!
//! An [`EffectChain`] owns an ordered list of effect units, each paired
//! with its parameter bank and a bypass flag. The external audio driver
//! calls [`EffectChain::process`] once per block; everything else —
//! parameter edits, automation, MIDI, impulse responses — reaches the
//! chain either through direct calls between blocks or through the
//! lock-free control queue.
//!
//! There is no global instance: callers construct a chain, own it, and
//! pass it into their audio callback.

use crate::control::{ControlMessage, LooperCommand, MessageReceiver};
use crate::effects::convolution::{self, ConvState};
use crate::effects::looper::LooperState;
use crate::effects::{EffectKind, EffectUnit};
use crate::params::{AutomationPoint, ParamBank, ParameterDescriptor, Smoother};
use crate::{ConfigError, MAX_BLOCK_SIZE};

/// Dry-copy scratch capacity in samples. Bounds the frames-per-slice the
/// chain hands to units: `MAX_BLOCK_SIZE` frames up to four channels,
/// proportionally fewer frames above that.
const SCRATCH_SAMPLES: usize = MAX_BLOCK_SIZE * 4;

/// Per-block render context handed to every effect.
#[derive(Debug, Clone, Copy)]
pub struct BlockCtx {
    pub sample_rate: f32,
    pub channels: usize,
}

/// Outcome of one `process` call. Checked once per block, outside the
/// per-sample loops; the audio path never returns errors or panics.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessStatus {
    /// The input block contained non-finite samples and was zeroed.
    pub rejected_input: bool,
    /// Control messages drained and applied at the top of the block.
    pub messages_applied: usize,
}

pub(crate) struct ChainSlot {
    pub(crate) unit: EffectUnit,
    pub(crate) bank: ParamBank,
    pub(crate) bypassed: bool,
    /// Wet amount ramped toward 1 (active) or 0 (bypassed). Toggling
    /// bypass crossfades over the smoothing time instead of stepping.
    bypass_gain: Smoother,
}

pub struct EffectChain {
    slots: Vec<ChainSlot>,
    sample_rate: f32,
    transport_time: f64,
    receiver: Option<Box<dyn MessageReceiver + Send>>,
    /// Dry copy used for the bypass crossfade. Sized once; the audio path
    /// never grows it.
    scratch: Vec<f32>,
}

impl EffectChain {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            slots: Vec::new(),
            sample_rate,
            transport_time: 0.0,
            receiver: None,
            scratch: vec![0.0; SCRATCH_SAMPLES],
        }
    }

    /// Attach the consuming end of the control queue. The producing end
    /// stays with the UI/host threads.
    pub fn set_receiver(&mut self, receiver: Box<dyn MessageReceiver + Send>) {
        self.receiver = Some(receiver);
    }

    /// Append an effect. Allocates; call during setup, not from the audio
    /// callback.
    pub fn push(&mut self, kind: EffectKind) -> usize {
        self.slots.push(ChainSlot {
            unit: EffectUnit::create(kind, self.sample_rate),
            bank: ParamBank::new(kind.descriptors(), self.sample_rate),
            bypassed: false,
            bypass_gain: Smoother::new(1.0, self.sample_rate),
        });
        self.slots.len() - 1
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn kind_at(&self, unit: usize) -> Option<EffectKind> {
        self.slots.get(unit).map(|s| s.unit.kind())
    }

    pub fn transport_time(&self) -> f64 {
        self.transport_time
    }

    /// Reposition the automation clock (host transport seek).
    pub fn set_transport_time(&mut self, time: f64) {
        self.transport_time = time.max(0.0);
    }

    // ---- parameter API (by name; string lookups stay off the hot path) ----

    pub fn parameters(&self, unit: usize) -> &'static [ParameterDescriptor] {
        self.slots
            .get(unit)
            .map(|s| s.bank.descriptors())
            .unwrap_or(&[])
    }

    pub fn set_parameter(&mut self, unit: usize, name: &str, value: f32) -> bool {
        let Some(slot) = self.slots.get_mut(unit) else {
            return false;
        };
        match slot.bank.find(name) {
            Some(index) => {
                slot.bank.set(index, value);
                true
            }
            None => false,
        }
    }

    /// Last smoothed value, as consumed by the DSP code.
    pub fn get_parameter(&self, unit: usize, name: &str) -> Option<f32> {
        let slot = self.slots.get(unit)?;
        let index = slot.bank.find(name)?;
        Some(slot.bank.get(index))
    }

    pub fn set_parameter_automated(&mut self, unit: usize, name: &str, automated: bool) -> bool {
        let Some(slot) = self.slots.get_mut(unit) else {
            return false;
        };
        match slot.bank.find(name) {
            Some(index) => {
                slot.bank.set_automated(index, automated);
                true
            }
            None => false,
        }
    }

    pub fn add_automation_point(&mut self, unit: usize, name: &str, time: f64, value: f32) -> bool {
        self.with_curve(unit, name, |curve| curve.insert(time, value))
    }

    pub fn remove_automation_point(&mut self, unit: usize, name: &str, time: f64) -> bool {
        self.with_curve(unit, name, |curve| {
            curve.remove(time);
        })
    }

    pub fn clear_automation(&mut self, unit: usize, name: &str) -> bool {
        self.with_curve(unit, name, |curve| curve.clear())
    }

    pub fn evaluate_automation(&self, unit: usize, name: &str, time: f64) -> Option<f32> {
        let slot = self.slots.get(unit)?;
        let index = slot.bank.find(name)?;
        let curve = slot.bank.curve(index)?;
        Some(curve.evaluate(time).unwrap_or(slot.bank.target(index)))
    }

    fn with_curve(
        &mut self,
        unit: usize,
        name: &str,
        edit: impl FnOnce(&mut crate::params::AutomationCurve),
    ) -> bool {
        let Some(slot) = self.slots.get_mut(unit) else {
            return false;
        };
        let Some(index) = slot.bank.find(name) else {
            return false;
        };
        if let Some(curve) = slot.bank.curve_mut(index) {
            edit(curve);
            true
        } else {
            false
        }
    }

    // ---- bypass ----

    pub fn set_bypassed(&mut self, unit: usize, bypassed: bool) {
        if let Some(slot) = self.slots.get_mut(unit) {
            slot.bypassed = bypassed;
        }
    }

    pub fn is_bypassed(&self, unit: usize) -> bool {
        self.slots.get(unit).map(|s| s.bypassed).unwrap_or(false)
    }

    // ---- MIDI / transport (between-blocks calls, per the block contract) ----

    pub fn note_on(&mut self, note: u8, velocity: u8) {
        for slot in &mut self.slots {
            if let Some(rx) = slot.unit.as_midi_receiver() {
                rx.note_on(note, velocity);
            }
        }
    }

    pub fn note_off(&mut self, note: u8) {
        for slot in &mut self.slots {
            if let Some(rx) = slot.unit.as_midi_receiver() {
                rx.note_off(note);
            }
        }
    }

    pub fn looper_state(&self, unit: usize) -> Option<LooperState> {
        match self.slots.get(unit)?.unit {
            EffectUnit::Looper(ref looper) => Some(looper.state()),
            _ => None,
        }
    }

    pub fn start_recording(&mut self, unit: usize) {
        if let Some(looper) = self.looper_mut(unit) {
            looper.start_recording();
        }
    }

    pub fn stop_recording(&mut self, unit: usize) {
        if let Some(looper) = self.looper_mut(unit) {
            looper.stop_recording();
        }
    }

    pub fn start_playback(&mut self, unit: usize) {
        if let Some(looper) = self.looper_mut(unit) {
            looper.start_playback();
        }
    }

    pub fn stop_playback(&mut self, unit: usize) {
        if let Some(looper) = self.looper_mut(unit) {
            looper.stop_playback();
        }
    }

    /// Resize a looper's buffer. Reallocates, so it is a between-blocks
    /// operation and is rejected while that looper records.
    pub fn set_loop_length(&mut self, unit: usize, frames: usize) -> Result<(), ConfigError> {
        match self.looper_mut(unit) {
            Some(looper) => looper.set_loop_length(frames),
            None => Err(ConfigError::NotLooper { unit }),
        }
    }

    fn looper_mut(&mut self, unit: usize) -> Option<&mut crate::effects::Looper> {
        self.slots.get_mut(unit)?.unit.as_looper_mut()
    }

    // ---- impulse response ----

    /// Prepare and install an impulse response on a convolution unit.
    ///
    /// Preparation plans FFTs and allocates, so this is a between-blocks
    /// call; hosts loading from another thread should run
    /// [`convolution::prepare_impulse_response`] there and send the result
    /// through the control queue instead.
    pub fn load_impulse_response(&mut self, unit: usize, ir: &[f32]) -> Result<(), ConfigError> {
        let decay_index = EffectKind::Convolution
            .descriptors()
            .iter()
            .position(|d| d.name == "decay")
            .unwrap_or(0);
        let Some(slot) = self.slots.get_mut(unit) else {
            return Err(ConfigError::NotConvolution { unit });
        };
        let decay = slot.bank.target(decay_index);
        let state = convolution::prepare_impulse_response(ir, self.sample_rate, decay)?;
        match slot.unit.as_convolution_mut() {
            Some(conv) => {
                conv.install(state);
                Ok(())
            }
            None => Err(ConfigError::NotConvolution { unit }),
        }
    }

    pub fn clear_impulse_response(&mut self, unit: usize) {
        if let Some(slot) = self.slots.get_mut(unit) {
            if let Some(conv) = slot.unit.as_convolution_mut() {
                conv.clear_impulse_response();
            }
        }
    }

    pub fn is_impulse_response_loaded(&self, unit: usize) -> bool {
        self.slots
            .get(unit)
            .and_then(|s| s.unit.as_convolution())
            .map(|c| c.is_impulse_response_loaded())
            .unwrap_or(false)
    }

    /// Clear every unit's DSP state without touching parameters.
    pub fn reset(&mut self) {
        for slot in &mut self.slots {
            slot.unit.reset();
        }
        self.transport_time = 0.0;
    }

    // ---- the audio path ----

    /// Process one block in place: `buffer` holds `channels`-interleaved
    /// frames. The frame count may vary between calls; blocks larger than
    /// [`MAX_BLOCK_SIZE`] frames are processed in slices internally.
    pub fn process(
        &mut self,
        buffer: &mut [f32],
        sample_rate: f32,
        channels: usize,
    ) -> ProcessStatus {
        let mut status = ProcessStatus::default();
        let channels = channels.max(1);

        if sample_rate > 0.0 && sample_rate != self.sample_rate {
            // Smoothing coefficients track the driver's rate; buffer
            // capacities keep their construction-time sizing.
            self.sample_rate = sample_rate;
            for slot in &mut self.slots {
                slot.bank.set_sample_rate(sample_rate);
                slot.bypass_gain.set_sample_rate(sample_rate);
            }
        }

        // Fatal-invariant boundary: a block carrying NaN/Inf would poison
        // every feedback buffer downstream. Zero it and report.
        if buffer.iter().any(|s| !s.is_finite()) {
            buffer.fill(0.0);
            status.rejected_input = true;
            return status;
        }

        status.messages_applied = self.drain_messages();

        let ctx = BlockCtx {
            sample_rate: self.sample_rate,
            channels,
        };
        // Slices never exceed the dry-copy scratch.
        let chunk_frames = MAX_BLOCK_SIZE.min(self.scratch.len() / channels).max(1);
        let max_chunk = chunk_frames * channels;
        let mut remaining = buffer;
        while !remaining.is_empty() {
            let take = remaining.len().min(max_chunk);
            let (chunk, rest) = remaining.split_at_mut(take);
            self.process_chunk(chunk, &ctx);
            remaining = rest;
        }

        status
    }

    fn process_chunk(&mut self, chunk: &mut [f32], ctx: &BlockCtx) {
        let channels = ctx.channels;
        let frames = chunk.len() / channels;
        if frames == 0 {
            return;
        }

        let slots = &mut self.slots;
        let scratch = &mut self.scratch;
        for slot in slots.iter_mut() {
            // Automation for this block is evaluated (and smoothed and
            // clamped) before the unit consumes a single sample of it.
            let params = slot.bank.evaluate(self.transport_time, frames);

            slot.bypass_gain
                .set_target(if slot.bypassed { 0.0 } else { 1.0 });
            let ramping = slot.bypass_gain.is_smoothing();

            if slot.bypassed && !ramping {
                // Settled bypass: untouched audio, but free-running state
                // (LFO phase, trigger clocks) keeps moving.
                slot.unit.advance_idle(frames, ctx, params);
            } else if !ramping {
                slot.unit.process_block(chunk, ctx, params);
            } else {
                // Mid-toggle: process, then crossfade against the dry
                // copy so bypass engages without a step.
                let len = chunk.len();
                scratch[..len].copy_from_slice(chunk);
                slot.unit.process_block(chunk, ctx, params);
                for (frame_index, frame) in chunk.chunks_exact_mut(channels).enumerate() {
                    let gain = slot.bypass_gain.next();
                    for (ch, sample) in frame.iter_mut().enumerate() {
                        let dry = scratch[frame_index * channels + ch];
                        *sample = dry + (*sample - dry) * gain;
                    }
                }
            }
        }

        self.transport_time += frames as f64 / self.sample_rate as f64;
    }

    fn drain_messages(&mut self) -> usize {
        let Some(mut receiver) = self.receiver.take() else {
            return 0;
        };
        let mut applied = 0;
        while let Some(message) = receiver.pop() {
            self.apply_message(message);
            applied += 1;
        }
        self.receiver = Some(receiver);
        applied
    }

    fn apply_message(&mut self, message: ControlMessage) {
        match message {
            ControlMessage::SetParameter { unit, param, value } => {
                if let Some(slot) = self.slots.get_mut(unit) {
                    slot.bank.set(param, value);
                }
            }
            ControlMessage::SetAutomated {
                unit,
                param,
                automated,
            } => {
                if let Some(slot) = self.slots.get_mut(unit) {
                    slot.bank.set_automated(param, automated);
                }
            }
            ControlMessage::AddAutomationPoint {
                unit,
                param,
                time,
                value,
            } => {
                if let Some(curve) = self
                    .slots
                    .get_mut(unit)
                    .and_then(|s| s.bank.curve_mut(param))
                {
                    curve.insert(time, value);
                }
            }
            ControlMessage::RemoveAutomationPoint { unit, param, time } => {
                if let Some(curve) = self
                    .slots
                    .get_mut(unit)
                    .and_then(|s| s.bank.curve_mut(param))
                {
                    curve.remove(time);
                }
            }
            ControlMessage::ClearAutomation { unit, param } => {
                if let Some(curve) = self
                    .slots
                    .get_mut(unit)
                    .and_then(|s| s.bank.curve_mut(param))
                {
                    curve.clear();
                }
            }
            ControlMessage::SetBypassed { unit, bypassed } => self.set_bypassed(unit, bypassed),
            ControlMessage::NoteOn { note, velocity } => self.note_on(note, velocity),
            ControlMessage::NoteOff { note } => self.note_off(note),
            ControlMessage::Looper { unit, command } => match command {
                LooperCommand::StartRecording => self.start_recording(unit),
                LooperCommand::StopRecording => self.stop_recording(unit),
                LooperCommand::StartPlayback => self.start_playback(unit),
                LooperCommand::StopPlayback => self.stop_playback(unit),
            },
            ControlMessage::InstallImpulseResponse { unit, state } => {
                self.install_impulse_response(unit, state);
            }
            ControlMessage::ClearImpulseResponse { unit } => self.clear_impulse_response(unit),
            ControlMessage::ResetUnit { unit } => {
                if let Some(slot) = self.slots.get_mut(unit) {
                    slot.unit.reset();
                }
            }
        }
    }

    /// Swap a prepared IR into a convolution unit. May run inside the
    /// audio-thread message drain, so it does nothing but the swap.
    pub fn install_impulse_response(&mut self, unit: usize, state: Box<ConvState>) {
        if let Some(slot) = self.slots.get_mut(unit) {
            if let Some(conv) = slot.unit.as_convolution_mut() {
                conv.install(state);
            }
        }
    }

    pub(crate) fn slots(&self) -> &[ChainSlot] {
        &self.slots
    }

    pub(crate) fn slots_mut(&mut self) -> &mut Vec<ChainSlot> {
        &mut self.slots
    }

    /// Re-export of [`AutomationPoint`] positions for host display.
    pub fn automation_points(&self, unit: usize, name: &str) -> Option<&[AutomationPoint]> {
        let slot = self.slots.get(unit)?;
        let index = slot.bank.find(name)?;
        Some(slot.bank.curve(index)?.points())
    }
}
