//! Parameter and automation snapshots.
//!
//! A [`PresetState`] captures everything a host needs to reproduce a
//! chain's control state: effect kinds in order, bypass flags, manual
//! targets, automation flags and curves. DSP state (buffer contents,
//! grains, LFO phases) is deliberately not captured — a preset restores
//! settings, not sound in flight.
//!
//! With the `serde` feature the snapshot types derive
//! `Serialize`/`Deserialize`; how the bytes are stored or shipped is the
//! host's concern.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::chain::EffectChain;
use crate::effects::EffectKind;
use crate::params::AutomationPoint;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone)]
pub struct ParameterSnapshot {
    pub name: String,
    pub value: f32,
    pub automated: bool,
    pub points: Vec<AutomationPoint>,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone)]
pub struct UnitSnapshot {
    pub kind: EffectKind,
    pub bypassed: bool,
    pub parameters: Vec<ParameterSnapshot>,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Default)]
pub struct PresetState {
    pub units: Vec<UnitSnapshot>,
}

impl EffectChain {
    /// Capture the current control state. Allocates; not an audio-path
    /// call.
    pub fn snapshot(&self) -> PresetState {
        let units = self
            .slots()
            .iter()
            .map(|slot| {
                let parameters = slot
                    .bank
                    .descriptors()
                    .iter()
                    .enumerate()
                    .map(|(index, descriptor)| ParameterSnapshot {
                        name: descriptor.name.to_string(),
                        value: slot.bank.target(index),
                        automated: slot.bank.is_automated(index),
                        points: slot
                            .bank
                            .curve(index)
                            .map(|c| c.points().to_vec())
                            .unwrap_or_default(),
                    })
                    .collect();
                UnitSnapshot {
                    kind: slot.unit.kind(),
                    bypassed: slot.bypassed,
                    parameters,
                }
            })
            .collect();
        PresetState { units }
    }

    /// Restore a snapshot. Rebuilds the chain if the effect line-up
    /// differs, so this allocates and must run between blocks, never from
    /// the audio callback. Smoothers snap to the restored targets instead
    /// of gliding from the old state.
    pub fn restore(&mut self, preset: &PresetState) {
        let lineup_matches = self.len() == preset.units.len()
            && preset
                .units
                .iter()
                .enumerate()
                .all(|(i, u)| self.kind_at(i) == Some(u.kind));

        if !lineup_matches {
            let sample_rate = self.sample_rate();
            self.slots_mut().clear();
            for unit in &preset.units {
                self.push(unit.kind);
            }
            log::info!(
                "preset rebuilt chain: {} unit(s) at {} Hz",
                preset.units.len(),
                sample_rate
            );
        }

        for (index, unit) in preset.units.iter().enumerate() {
            self.set_bypassed(index, unit.bypassed);
            let Some(slot) = self.slots_mut().get_mut(index) else {
                continue;
            };
            for parameter in &unit.parameters {
                let Some(param_index) = slot.bank.find(&parameter.name) else {
                    continue; // unknown name in a stale preset: skip
                };
                slot.bank.set(param_index, parameter.value);
                slot.bank.set_automated(param_index, parameter.automated);
                if let Some(curve) = slot.bank.curve_mut(param_index) {
                    curve.clear();
                    for point in &parameter.points {
                        curve.insert(point.time, point.value);
                    }
                }
            }
            slot.bank.snap_to_targets();
        }
    }
}

/// Named in-memory preset storage. Persistence of the bytes themselves is
/// an external collaborator's job.
#[derive(Debug, Default)]
pub struct PresetBank {
    presets: Vec<(String, PresetState)>,
}

impl PresetBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store under `name`, replacing an existing preset of the same name.
    pub fn save(&mut self, name: &str, state: PresetState) {
        match self.presets.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = state,
            None => self.presets.push((name.to_string(), state)),
        }
    }

    pub fn load(&self, name: &str) -> Option<&PresetState> {
        self.presets
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, state)| state)
    }

    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.presets.len();
        self.presets.retain(|(n, _)| n != name);
        self.presets.len() != before
    }

    pub fn list(&self) -> impl Iterator<Item = &str> {
        self.presets.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }
}
