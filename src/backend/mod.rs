//! Algorithms run by the optimiser suite that are not registered passes.

mod constant_optimiser;
mod stack_compressor;

pub use constant_optimiser::{ConstantOptimiser, GasMeter};
pub use stack_compressor::{Compression, StackCompressor};
