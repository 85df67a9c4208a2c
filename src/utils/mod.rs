pub mod diagnostics;
pub mod rewrite;

pub use diagnostics::{Diagnostic, Reporter};
