//! Benchmarks for the effect units and primitives.

mod chain;
mod convolution;
mod delay;
mod granular;

pub use chain::bench_chain;
pub use convolution::bench_convolution;
pub use delay::{bench_ring_buffer, bench_tape_delay};
pub use granular::bench_granular;
