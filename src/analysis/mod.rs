//! Read-only analyses over Yul code.

mod call_graph;
mod equality;
mod metrics;
mod references;
mod scope;
pub mod semantics;

pub use call_graph::CallGraph;
pub use equality::SyntacticallyEqual;
pub use metrics::CodeSize;
pub use references::{all_names, Declarations, References};
pub use scope::{analyze_strict, AnalysisError, AnalysisInfo, Signature};
