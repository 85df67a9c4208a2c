//! Yul optimiser suite.

pub mod analysis;
pub mod backend;
pub mod dialect;
pub mod opts;
pub mod passes;
pub mod utils;
pub mod yul;
