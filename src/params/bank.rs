use crate::params::{
    curve::AutomationCurve, descriptor::ParameterDescriptor, smoother::Smoother,
};

/*
Parameter Bank
==============

Per-effect table of parameter state, indexed by the position in the
effect's descriptor table. One slot per parameter: manual target, one-pole
smoother, automation flag, automation curve.

The bank is evaluated exactly once per block, before its effect processes
audio: automation (when enabled) produces the target, the target is clamped
to the descriptor range, and the smoother advances by the block length.
DSP code only ever sees the resulting `values()` slice, which upholds the
core invariant that raw automation values never reach the signal path.
*/

struct ParamSlot {
    target: f32,
    smoother: Smoother,
    automated: bool,
    curve: AutomationCurve,
}

pub struct ParamBank {
    descriptors: &'static [ParameterDescriptor],
    slots: Vec<ParamSlot>,
    values: Vec<f32>,
}

impl ParamBank {
    pub fn new(descriptors: &'static [ParameterDescriptor], sample_rate: f32) -> Self {
        let slots = descriptors
            .iter()
            .map(|d| ParamSlot {
                target: d.default,
                smoother: Smoother::new(d.default, sample_rate),
                automated: false,
                curve: AutomationCurve::new(),
            })
            .collect();
        let values = descriptors.iter().map(|d| d.default).collect();
        Self {
            descriptors,
            slots,
            values,
        }
    }

    pub fn descriptors(&self) -> &'static [ParameterDescriptor] {
        self.descriptors
    }

    /// Index of the parameter named `name`. Host-API convenience; never
    /// called on the audio path.
    pub fn find(&self, name: &str) -> Option<usize> {
        self.descriptors.iter().position(|d| d.name == name)
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        for slot in &mut self.slots {
            slot.smoother.set_sample_rate(sample_rate);
        }
    }

    /// Clamp `value` to the descriptor range and set it as the manual
    /// target. Out-of-range requests are clamped, not rejected.
    pub fn set(&mut self, index: usize, value: f32) {
        if let Some(slot) = self.slots.get_mut(index) {
            slot.target = self.descriptors[index].clamp(value);
        }
    }

    /// Last smoothed value handed to the DSP code.
    pub fn get(&self, index: usize) -> f32 {
        self.values.get(index).copied().unwrap_or(0.0)
    }

    /// Manual target as set by the host (pre-smoothing).
    pub fn target(&self, index: usize) -> f32 {
        self.slots.get(index).map(|s| s.target).unwrap_or(0.0)
    }

    pub fn set_automated(&mut self, index: usize, automated: bool) {
        if let Some(slot) = self.slots.get_mut(index) {
            slot.automated = automated;
        }
    }

    pub fn is_automated(&self, index: usize) -> bool {
        self.slots.get(index).map(|s| s.automated).unwrap_or(false)
    }

    pub fn curve(&self, index: usize) -> Option<&AutomationCurve> {
        self.slots.get(index).map(|s| &s.curve)
    }

    pub fn curve_mut(&mut self, index: usize) -> Option<&mut AutomationCurve> {
        self.slots.get_mut(index).map(|s| &mut s.curve)
    }

    /// Evaluate automation at `time`, clamp, and advance smoothing by
    /// `block_frames`. Returns the values the effect consumes this block.
    pub fn evaluate(&mut self, time: f64, block_frames: usize) -> &[f32] {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            let descriptor = &self.descriptors[index];
            let target = if slot.automated {
                // An automated parameter with an empty curve falls back to
                // the manual target.
                slot.curve.evaluate(time).unwrap_or(slot.target)
            } else {
                slot.target
            };
            slot.smoother.set_target(descriptor.clamp(target));
            slot.smoother.skip(block_frames);
            self.values[index] = slot.smoother.current();
        }
        &self.values
    }

    /// Snap every smoother to its current target. Used after preset
    /// restore so old values do not glide into the new state.
    pub fn snap_to_targets(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            slot.smoother.reset(slot.target);
            self.values[index] = slot.target;
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
