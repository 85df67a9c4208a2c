//! Yul front end.

pub mod ast;
mod parser;
pub mod printer;
pub mod visitor;

pub use parser::{error_span, Rule, YulParser};
pub use visitor::{Visitor, VisitorMut};
