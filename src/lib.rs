pub mod chain; // Effect chain and block-processing entry point
pub mod control; // Lock-free control messages from UI/automation threads
pub mod dsp;
pub mod effects; // Block-processing effect units
pub mod params; // Descriptors, automation curves, smoothing
pub mod preset;

pub use chain::{BlockCtx, EffectChain, ProcessStatus};
pub use effects::{EffectKind, EffectUnit};

/// Largest block a single `process` call may carry. Internal scratch
/// buffers are sized by this so the audio path never allocates.
pub const MAX_BLOCK_SIZE: usize = 2048;

/// Maximum channels with per-channel DSP state. Buffers may carry more;
/// channels beyond this pass through untouched.
pub const MAX_PROCESS_CHANNELS: usize = 2;

/// Errors surfaced at load/initialize time. The audio path itself never
/// returns errors; see [`chain::ProcessStatus`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("ring buffer capacity {capacity} cannot hold a {required}-sample delay")]
    DelayCapacity { capacity: usize, required: usize },
    #[error("impulse response is empty")]
    EmptyImpulseResponse,
    #[error("impulse response contains non-finite samples")]
    MalformedImpulseResponse,
    #[error("impulse response of {len} samples exceeds the {max} sample limit")]
    ImpulseResponseTooLong { len: usize, max: usize },
    #[error("loop length of {frames} frames is outside the supported range")]
    LoopLength { frames: usize },
    #[error("unit {unit} is not a convolution effect")]
    NotConvolution { unit: usize },
    #[error("unit {unit} is not a looper")]
    NotLooper { unit: usize },
    #[error("loop length cannot change while the looper is recording")]
    LooperBusy,
}
