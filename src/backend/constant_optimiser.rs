//! Replacing expensive constants by cheaper computations.

use log::debug;
use malachite::num::arithmetic::traits::PowerOf2;
use malachite::num::basic::traits::{One, Zero};
use malachite::num::logic::traits::SignificantBits;
use malachite::Natural;

use crate::dialect::Dialect;
use crate::yul::ast::*;
use crate::yul::visitor::{self, VisitorMut};

/// Gas paid for every `PUSH` and for the cheap arithmetic opcodes.
const VERY_LOW_GAS: usize = 3;
/// Gas paid for `PUSH0`.
const BASE_GAS: usize = 2;
/// Gas paid per byte of transaction data during creation.
const TX_DATA_GAS: usize = 16;
/// Gas paid per byte of deployed code.
const CREATE_DATA_GAS: usize = 200;

/// Weighs execution cost against code size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GasMeter {
    /// Expected number of executions of the code.
    pub runs: usize,
    /// The code runs once as part of contract creation.
    pub is_creation: bool,
}

impl GasMeter {
    pub fn new(runs: usize, is_creation: bool) -> GasMeter {
        GasMeter { runs, is_creation }
    }

    /// Combined cost of running `expr` over its expected lifetime and of
    /// storing its code.
    pub fn cost(&self, expr: &Expression) -> usize {
        let (gas, bytes) = GasMeter::measure(expr);
        let runs = if self.is_creation { 1 } else { self.runs };
        let data = if self.is_creation {
            TX_DATA_GAS
        } else {
            CREATE_DATA_GAS
        };

        gas * runs + bytes * data
    }

    /// Execution gas and code bytes of an expression built from literals and
    /// arithmetic.
    fn measure(expr: &Expression) -> (usize, usize) {
        match expr {
            Expression::Literal(literal) if literal.is_zero() => (BASE_GAS, 1),
            Expression::Literal(literal) => {
                let bytes = literal.value.significant_bits().div_ceil(8);

                (VERY_LOW_GAS, 1 + bytes as usize)
            }
            Expression::Identifier(_) => (VERY_LOW_GAS, 1),
            Expression::FunctionCall(call) => call
                .args
                .iter()
                .map(GasMeter::measure)
                .fold((VERY_LOW_GAS, 1), |(gas, bytes), (g, b)| {
                    (gas + g, bytes + b)
                }),
        }
    }
}

pub struct ConstantOptimiser;

impl ConstantOptimiser {
    /// Rewrites every number literal that a cheaper computation can
    /// produce. Switch case labels stay literals.
    pub fn run(dialect: &Dialect, meter: &GasMeter, ast: &mut Block) {
        let has = |name: &str| dialect.is_builtin(name);

        if !(has("not") && has("shl") && has("sub")) {
            return;
        }

        Representations { meter }.visit_block(ast);
    }
}

struct Representations<'m> {
    meter: &'m GasMeter,
}

impl Representations<'_> {
    fn cheapest(&self, literal: &Literal) -> Option<Expression> {
        let original = Expression::Literal(literal.clone());
        let mut best = (self.meter.cost(&original), None);

        for candidate in candidates(&literal.value) {
            let cost = self.meter.cost(&candidate);

            if cost < best.0 {
                best = (cost, Some(candidate));
            }
        }

        best.1
    }
}

impl VisitorMut for Representations<'_> {
    fn visit_expression(&mut self, expr: &mut Expression) {
        match expr {
            Expression::Literal(literal)
                if literal.kind == LiteralKind::Number =>
            {
                if let Some(replacement) = self.cheapest(literal) {
                    debug!("representing {literal} as a computation");

                    *expr = replacement;
                }
            }
            _ => visitor::visit_expression_mut(self, expr),
        }
    }
}

/// Computations yielding `value`: its complement, or a power of two with an
/// optional decrement.
fn candidates(value: &Natural) -> Vec<Expression> {
    let mut candidates = Vec::new();
    let mask = Natural::power_of_2(WORD_BITS) - Natural::ONE;

    if *value <= mask {
        candidates.push(Expression::call(
            "not",
            vec![Expression::number(&mask - value)],
        ));
    }

    let shift = |k: u64| {
        Expression::call(
            "shl",
            vec![Expression::number(k), Expression::number(Natural::ONE)],
        )
    };

    if *value != Natural::ZERO {
        let bits = value.significant_bits();

        if *value == Natural::power_of_2(bits - 1) {
            candidates.push(shift(bits - 1));
        }

        let below = Natural::power_of_2(bits) - Natural::ONE;

        if bits < WORD_BITS && *value == below {
            candidates.push(Expression::call(
                "sub",
                vec![shift(bits), Expression::number(Natural::ONE)],
            ));
        }
    }

    candidates
}
