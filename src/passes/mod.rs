//! Optimisation passes and the machinery that sequences them.

mod dataflow;
mod manager;
mod names;
mod sequence;
mod suite;
mod transform;

pub use manager::{
    abbreviation_to_name, all_steps, name_to_abbreviation, step_for, Pass,
    PassContext, Step, SYNTAX_CHARACTERS,
};
pub use names::NameDispenser;
pub use sequence::{
    run_until_stable, Convergence, DebugMode, Element, Runner, Sequence,
    SequenceError,
};
pub use suite::{
    OptimiserError, OptimiserSuite, Settings, SuiteStats, DEFAULT_MAX_ROUNDS,
    DEFAULT_SEQUENCE, MAX_STACK_COMPRESSION_ITERATIONS,
};
pub use transform::{
    Disambiguator, ExpressionJoiner, Rematerialiser, UnusedPruner,
    VarNameCleaner,
};

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::BTreeSet;

    use super::{Pass, PassContext};
    use crate::dialect::Dialect;
    use crate::yul::ast::Block;
    use crate::yul::printer::print;
    use crate::yul::YulParser;

    pub fn parse(src: &str) -> Block {
        YulParser::parse_block(src).unwrap()
    }

    /// Runs a single pass on EVM code.
    pub fn apply<P: Pass>(src: &str, reserved: &[&str]) -> Block {
        let dialect = Dialect::evm();
        let reserved: BTreeSet<_> =
            reserved.iter().map(|name| name.to_string()).collect();

        let mut ast = parse(src);
        let mut ctx = PassContext::new(&dialect, &ast, &reserved);

        P::run(&mut ctx, &mut ast);

        ast
    }

    /// Asserts that the pass turns `src` into `expected`.
    #[track_caller]
    pub fn check<P: Pass>(src: &str, expected: &str) {
        assert_eq!(print(&apply::<P>(src, &[])), print(&parse(expected)));
    }
}
