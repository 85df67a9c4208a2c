//! The optimiser suite: the fixed pipeline wrapped around a step sequence.

use std::collections::BTreeSet;

use log::{debug, info};
use thiserror::Error;

use super::manager::{Pass, PassContext};
use super::sequence::{
    Convergence, DebugMode, Runner, Sequence, SequenceError,
};
use super::transform::{Disambiguator, VarNameCleaner};
use crate::analysis::analyze_strict;
use crate::backend::{ConstantOptimiser, GasMeter, StackCompressor};
use crate::dialect::{Dialect, DialectKind};
use crate::yul::ast::{Name, Object, Statement};

/// The tuned schedule run when no custom sequence is given.
pub const DEFAULT_SEQUENCE: &str = concat!(
    "dhfoDgvulfnTUtnIf", // none of these can make stack problems worse
    "(",
    "xarrscLM", // SSA and simplification
    "cCTUtTOntnfDIul", // structural simplification
    "Lcul",
    "Vcul jj", // leave SSA
    "eul", // expression inlining
    "xarulrul",
    "xarrcL", // back into SSA
    "gvif", // full inlining
    "CTUcarrLsTOtfDncarrIulc",
    ")",
    "jmuljuljul VcTOcul jmul", // short and readable output
);

/// Normal forms every custom sequence may rely on.
const BOOTSTRAP_SEQUENCE: &str = "hgo";

pub const MAX_STACK_COMPRESSION_ITERATIONS: usize = 16;

pub const DEFAULT_MAX_ROUNDS: usize = 12;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    pub optimize_stack_allocation: bool,
    /// Replaces the default sequence. Runs after the bootstrap sequence.
    pub custom_sequence: Option<String>,
    pub default_sequence: String,
    /// Round limit of every stability loop.
    pub max_rounds: usize,
    pub debug: DebugMode,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            optimize_stack_allocation: false,
            custom_sequence: None,
            default_sequence: DEFAULT_SEQUENCE.to_string(),
            max_rounds: DEFAULT_MAX_ROUNDS,
            debug: DebugMode::None,
        }
    }
}

/// Counters exposing where the suite gave up early.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SuiteStats {
    pub loops: Vec<Convergence>,
    /// Loops stopped by the round limit.
    pub capped_loops: usize,
    pub stack_compression_iterations: usize,
    pub stack_fits: bool,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum OptimiserError {
    #[error("malformed step sequence: {0}")]
    Sequence(#[from] SequenceError),
    #[error("the {0} dialect requires a gas meter")]
    MissingGasMeter(DialectKind),
}

pub struct OptimiserSuite;

impl OptimiserSuite {
    /// Optimises the code of `object` in place and refreshes its analysis.
    ///
    /// Sequences and the gas meter are checked before the code is touched.
    /// Code failing strict analysis afterwards is a bug in some pass and
    /// aborts.
    pub fn run(
        dialect: &Dialect,
        meter: Option<&GasMeter>,
        object: &mut Object,
        reserved: &BTreeSet<Name>,
        settings: &Settings,
    ) -> Result<SuiteStats, OptimiserError> {
        let sequence = match &settings.custom_sequence {
            Some(custom) => Sequence::parse(custom)?,
            None => Sequence::parse(&settings.default_sequence)?,
        };

        let meter = match (dialect.kind(), meter) {
            (DialectKind::Evm, None) => {
                return Err(OptimiserError::MissingGasMeter(dialect.kind()));
            }
            (_, meter) => meter,
        };

        let mut reserved = reserved.clone();
        reserved.extend(dialect.fixed_function_names());

        info!("disambiguating `{}`", object.name);
        Disambiguator::disambiguate(dialect, &mut object.code, &reserved);

        let mut ctx = PassContext::new(dialect, &object.code, &reserved);
        let mut runner = Runner::new(settings.debug, settings.max_rounds);
        let ast = &mut object.code;

        if settings.custom_sequence.is_some() {
            info!("running custom sequence");
            runner.run_sequence(BOOTSTRAP_SEQUENCE, &mut ctx, ast)?;
        } else {
            info!("running default sequence");
        }

        runner.run(&sequence, &mut ctx, ast);
        runner.run_sequence("g", &mut ctx, ast)?;

        let compression = StackCompressor::run(
            dialect,
            object,
            &reserved,
            settings.optimize_stack_allocation,
            MAX_STACK_COMPRESSION_ITERATIONS,
        );

        debug!(
            "stack compression: {} iterations, fits: {}",
            compression.iterations, compression.fits
        );

        let ast = &mut object.code;

        runner.run_sequence("fDnTOc g", &mut ctx, ast)?;

        match dialect.kind() {
            DialectKind::Evm => {
                if let Some(meter) = meter {
                    info!("optimising constants");
                    ConstantOptimiser::run(dialect, meter, ast);
                }
            }
            DialectKind::Wasm => {
                if let [Statement::Block(first), _, ..] = &ast.statements[..] {
                    if first.is_empty() {
                        ast.statements.remove(0);
                    }
                }
            }
            DialectKind::Generic => {}
        }

        VarNameCleaner::run(&mut ctx, ast);

        match analyze_strict(dialect, object) {
            Ok(info) => object.info = Some(info),
            Err(err) => panic!("optimiser produced invalid code: {err}"),
        }

        let loops = runner.into_loops();
        let capped_loops = loops.iter().filter(|l| !l.converged).count();

        info!(
            "optimised `{}`: {} loops, {} capped",
            object.name,
            loops.len(),
            capped_loops
        );

        Ok(SuiteStats {
            loops,
            capped_loops,
            stack_compression_iterations: compression.iterations,
            stack_fits: compression.fits,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{all_names, Declarations};
    use crate::passes::manager::abbreviation_to_name;
    use crate::yul::printer::print;
    use crate::yul::YulParser;

    fn meter() -> GasMeter {
        GasMeter::new(200, false)
    }

    fn optimise(
        src: &str,
        reserved: &[&str],
        settings: &Settings,
    ) -> (Object, SuiteStats) {
        let mut object = YulParser::parse_object(src).unwrap();
        let reserved: BTreeSet<_> =
            reserved.iter().map(|name| name.to_string()).collect();

        let stats = OptimiserSuite::run(
            &Dialect::evm(),
            Some(&meter()),
            &mut object,
            &reserved,
            settings,
        )
        .unwrap();

        (object, stats)
    }

    fn custom(sequence: &str) -> Settings {
        Settings {
            custom_sequence: Some(sequence.to_string()),
            ..Settings::default()
        }
    }

    #[test]
    fn default_sequence_is_well_formed() {
        let stripped: String = DEFAULT_SEQUENCE
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();

        assert_eq!(
            stripped,
            "dhfoDgvulfnTUtnIf(xarrscLMcCTUtTOntnfDIulLculVculjjeulxarulrul\
             xarrcLgvifCTUcarrLsTOtfDncarrIulc)jmuljuljulVcTOculjmul"
        );
        assert!(Sequence::parse(DEFAULT_SEQUENCE).is_ok());
        assert!(BOOTSTRAP_SEQUENCE
            .chars()
            .all(|c| abbreviation_to_name().contains_key(&c)));
    }

    #[test]
    fn malformed_sequences_are_rejected_first() {
        for sequence in ["(", ")", "((", "()(", "?"] {
            let mut object =
                YulParser::parse_object("{ let x := 1 { let x := 2 } }")
                    .unwrap();
            let original = object.clone();

            let result = OptimiserSuite::run(
                &Dialect::evm(),
                Some(&meter()),
                &mut object,
                &BTreeSet::new(),
                &custom(sequence),
            );

            assert!(matches!(result, Err(OptimiserError::Sequence(_))));
            assert_eq!(object, original);
        }
    }

    #[test]
    fn evm_needs_a_gas_meter() {
        let mut object = YulParser::parse_object("{ }").unwrap();

        let result = OptimiserSuite::run(
            &Dialect::evm(),
            None,
            &mut object,
            &BTreeSet::new(),
            &Settings::default(),
        );

        assert_eq!(
            result,
            Err(OptimiserError::MissingGasMeter(DialectKind::Evm))
        );
    }

    const EQUIVALENT_FUNCTIONS: &str = "{
        sstore(f(calldataload(0)), g(calldataload(32)))
        function f(a) -> r {
            r := add(a, sload(a))
            sstore(a, r)
        }
        function g(b) -> s {
            s := add(b, sload(b))
            sstore(b, s)
        }
    }";

    #[test]
    fn equivalent_functions_collapse() {
        let (object, _) =
            optimise(EQUIVALENT_FUNCTIONS, &[], &Settings::default());

        let functions = Declarations::of_block(&object.code).functions;

        assert!(functions.len() <= 1, "{}", print(&object.code));
        assert!(object.info.is_some());
    }

    #[test]
    fn default_sequence_keeps_names_unique() {
        let dialect = Dialect::evm();
        let reserved = dialect.fixed_function_names();
        let mut ast = YulParser::parse_block(EQUIVALENT_FUNCTIONS).unwrap();

        Disambiguator::disambiguate(&dialect, &mut ast, &reserved);

        let mut ctx = PassContext::new(&dialect, &ast, &reserved);
        let mut runner = Runner::new(DebugMode::None, DEFAULT_MAX_ROUNDS);

        runner
            .run_sequence(DEFAULT_SEQUENCE, &mut ctx, &mut ast)
            .unwrap();

        let decls = Declarations::of_block(&ast);
        let repeated: Vec<_> = decls
            .counts
            .iter()
            .filter(|(_, count)| **count > 1)
            .collect();

        assert!(repeated.is_empty(), "{repeated:?} in {}", print(&ast));
        assert!(decls.functions.len() <= 1, "{}", print(&ast));
    }

    #[test]
    fn reserved_names_in_sibling_scopes() {
        let src = "{
            { let x := calldataload(1) sstore(x, x) }
            { let x := calldataload(3) sstore(x, x) }
        }";

        for settings in [Settings::default(), custom("f")] {
            let (object, _) = optimise(src, &["x"], &settings);

            assert!(object.info.is_some());
            assert!(
                all_names(&object.code).contains("x"),
                "{}",
                print(&object.code)
            );
        }
    }

    #[test]
    fn single_use_literal_is_rematerialised() {
        let src = "{ let x := 7 sstore(0, x) }";
        let expected =
            print(&YulParser::parse_block("{ { sstore(0, 7) } }").unwrap());

        for settings in [Settings::default(), custom("dmu")] {
            let (object, _) = optimise(src, &[], &settings);

            assert_eq!(print(&object.code), expected);
        }
    }

    #[test]
    fn reserved_identifiers_survive() {
        let src = "{
            let keep := calldataload(0)
            let x := keep
            function entry(a) -> r { r := a }
            function unused() { }
        }";

        let sequences = [Settings::default(), custom("dhgvulfnTUtnIxarsVjmul")];

        for settings in sequences {
            let (object, _) = optimise(src, &["keep", "entry"], &settings);
            let names = all_names(&object.code);

            assert!(names.contains("keep"), "{}", print(&object.code));
            assert!(names.contains("entry"), "{}", print(&object.code));
        }
    }

    #[test]
    fn reports_loops() {
        let (_, stats) = optimise(
            "{ sstore(0, add(1, 2)) }",
            &[],
            &custom("(sc)(u)"),
        );

        assert_eq!(stats.loops.len(), 2);
        assert_eq!(stats.capped_loops, 0);
        assert!(stats.loops.iter().all(|l| l.rounds <= DEFAULT_MAX_ROUNDS));
        assert!(stats.stack_fits);
    }

    #[test]
    fn wasm_drops_an_empty_leading_block() {
        let mut object = YulParser::parse_object(
            "{ function main() { i64.store(0, 1) } }",
        )
        .unwrap();

        OptimiserSuite::run(
            &Dialect::wasm(),
            None,
            &mut object,
            &BTreeSet::from(["main".to_string()]),
            &custom(""),
        )
        .unwrap();

        assert_eq!(
            print(&object.code),
            print(
                &YulParser::parse_block(
                    "{ function main() { i64.store(0, 1) } }"
                )
                .unwrap()
            )
        );
    }
}
