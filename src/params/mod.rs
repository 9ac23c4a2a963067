//! Parameter descriptors, automation curves, and smoothing.
//!
//! Parameters are addressed by small per-effect indices; the only
//! string-keyed lookup (`ParamBank::find`) exists for the host-facing API
//! and never runs on the audio path. Every value DSP code reads has been
//! clamped to its descriptor range and smoothed first.

/// Per-parameter state table evaluated once per block.
pub mod bank;
/// Time-ordered automation points with linear interpolation.
pub mod curve;
/// Immutable parameter metadata tables.
pub mod descriptor;
/// One-pole exponential parameter smoothing.
pub mod smoother;

pub use bank::ParamBank;
pub use curve::{AutomationCurve, AutomationPoint};
pub use descriptor::ParameterDescriptor;
pub use smoother::Smoother;
