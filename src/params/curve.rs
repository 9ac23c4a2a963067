#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/*
Automation Curve
================

A time-ordered sequence of (time, value) control points for one parameter.
Evaluation linearly interpolates between the two bracketing points and
extrapolates flat before the first / after the last point; an empty curve
defers to the manually set target.

Curve edits arrive on the audio thread via the control queue, so the point
storage is bounded: capacity is reserved up front and inserts beyond it are
dropped silently. `Vec::insert` within reserved capacity shifts elements
but never reallocates.

Invariant: points are strictly time-ascending; inserting at an existing
timestamp overwrites that point instead of duplicating it.
*/

/// Points per curve. Edits past this are dropped, not grown into.
pub const MAX_AUTOMATION_POINTS: usize = 256;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutomationPoint {
    pub time: f64,
    pub value: f32,
}

#[derive(Debug, Clone)]
pub struct AutomationCurve {
    points: Vec<AutomationPoint>,
}

impl Default for AutomationCurve {
    fn default() -> Self {
        Self::new()
    }
}

impl AutomationCurve {
    pub fn new() -> Self {
        Self {
            points: Vec::with_capacity(MAX_AUTOMATION_POINTS),
        }
    }

    /// Insert a point, keeping time-ascending order. An insert at an
    /// existing timestamp overwrites; an insert into a full curve is
    /// dropped.
    pub fn insert(&mut self, time: f64, value: f32) {
        if !time.is_finite() || !value.is_finite() {
            return;
        }
        match self.points.binary_search_by(|p| p.time.total_cmp(&time)) {
            Ok(idx) => self.points[idx].value = value,
            Err(idx) => {
                if self.points.len() < MAX_AUTOMATION_POINTS {
                    self.points.insert(idx, AutomationPoint { time, value });
                }
            }
        }
    }

    /// Remove the point at `time`, if one exists.
    pub fn remove(&mut self, time: f64) -> bool {
        match self.points.binary_search_by(|p| p.time.total_cmp(&time)) {
            Ok(idx) => {
                self.points.remove(idx);
                true
            }
            Err(_) => false,
        }
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn points(&self) -> &[AutomationPoint] {
        &self.points
    }

    /// Evaluate the curve at `time`. Returns `None` when no points exist
    /// so the caller can fall back to the manual target.
    pub fn evaluate(&self, time: f64) -> Option<f32> {
        let points = &self.points;
        let (first, last) = (points.first()?, points.last()?);

        if time <= first.time {
            return Some(first.value);
        }
        if time >= last.time {
            return Some(last.value);
        }

        // Index of the first point strictly after `time`.
        let upper = points.partition_point(|p| p.time <= time);
        let b = points[upper];
        let a = points[upper - 1];

        let span = b.time - a.time;
        let frac = ((time - a.time) / span) as f32;
        Some(a.value + (b.value - a.value) * frac)
    }
}
