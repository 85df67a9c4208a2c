//! Constant folding and algebraic identities on builtin calls.

use malachite::num::basic::traits::One;
use malachite::Natural;

use crate::analysis::semantics::is_movable;
use crate::dialect::Dialect;
use crate::passes::{Pass, PassContext};
use crate::yul::ast::*;
use crate::yul::visitor::{self, VisitorMut};

pub struct ExpressionSimplifier;

impl Pass for ExpressionSimplifier {
    const NAME: &'static str = "ExpressionSimplifier";

    fn run(ctx: &mut PassContext, ast: &mut Block) {
        Simplifier {
            dialect: ctx.dialect,
        }
        .visit_block(ast);
    }
}

struct Simplifier<'a> {
    dialect: &'a Dialect,
}

impl Simplifier<'_> {
    fn fold(&self, call: &FunctionCall) -> Option<Expression> {
        let builtin = self.dialect.builtin(&call.name)?;
        let fold = builtin.fold?;

        if call.args.len() != builtin.parameters {
            return None;
        }

        let values = call
            .args
            .iter()
            .map(|arg| arg.as_literal().map(|lit| lit.value.clone()))
            .collect::<Option<Vec<_>>>()?;

        fold(&values).map(Expression::number)
    }

    /// Rules dropping an operand only fire if that operand is movable.
    fn identity(&self, call: &FunctionCall) -> Option<Expression> {
        self.dialect.builtin(&call.name)?;

        let zero =
            |e: &Expression| e.as_literal().map_or(false, Literal::is_zero);
        let one = |e: &Expression| {
            e.as_literal().map_or(false, |lit| lit.value == Natural::ONE)
        };
        let movable = |e: &Expression| is_movable(self.dialect, e);

        let simplified = match (call.name.as_str(), &call.args[..]) {
            ("add" | "or" | "xor", [x, z]) if zero(z) => x.clone(),
            ("add" | "or" | "xor", [z, x]) if zero(z) => x.clone(),
            ("sub", [x, z]) if zero(z) => x.clone(),
            ("mul" | "div", [x, o]) if one(o) => x.clone(),
            ("mul", [o, x]) if one(o) => x.clone(),
            ("shl" | "shr", [z, x]) if zero(z) => x.clone(),

            ("mul" | "and", [x, z]) if zero(z) && movable(x) => zero_literal(),
            ("mul" | "and", [z, x]) if zero(z) && movable(x) => zero_literal(),
            ("div" | "mod", [x, z]) if zero(z) && movable(x) => zero_literal(),

            ("sub" | "xor" | "lt" | "gt", [x, y]) if x == y && movable(x) => {
                zero_literal()
            }
            ("eq", [x, y]) if x == y && movable(x) => Expression::number(1u32),
            ("and" | "or", [x, y]) if x == y && movable(x) => x.clone(),

            ("iszero", [Expression::FunctionCall(inner)])
                if inner.name == "iszero" =>
            {
                match &inner.args[..] {
                    [inverted @ Expression::FunctionCall(innermost)]
                        if innermost.name == "iszero" =>
                    {
                        inverted.clone()
                    }
                    _ => return None,
                }
            }
            _ => return None,
        };

        Some(simplified)
    }
}

fn zero_literal() -> Expression {
    Expression::Literal(Literal::zero())
}

impl VisitorMut for Simplifier<'_> {
    fn visit_expression(&mut self, expr: &mut Expression) {
        visitor::visit_expression_mut(self, expr);

        if let Expression::FunctionCall(call) = expr {
            if let Some(simplified) =
                self.fold(call).or_else(|| self.identity(call))
            {
                *expr = simplified;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::testing::check;

    #[test]
    fn folds_constants() {
        check::<ExpressionSimplifier>(
            "{
                sstore(add(2, mul(3, 4)), sub(0, 1))
                sstore(shl(4, 1), iszero(lt(1, 2)))
            }",
            "{
                sstore(14, 0xffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff)
                sstore(16, 0)
            }",
        );
    }

    #[test]
    fn identities() {
        check::<ExpressionSimplifier>(
            "{
                let x := calldataload(0)
                sstore(add(x, 0), mul(1, x))
                sstore(sub(x, x), eq(x, x))
                sstore(and(x, x), shl(0, x))
                sstore(iszero(iszero(iszero(x))), mul(x, 0))
            }",
            "{
                let x := calldataload(0)
                sstore(x, x)
                sstore(0, 1)
                sstore(x, x)
                sstore(iszero(x), 0)
            }",
        );
    }

    #[test]
    fn keeps_effects() {
        check::<ExpressionSimplifier>(
            "{
                sstore(mul(sload(0), 0), sub(f(), f()))
                function f() -> r { }
            }",
            "{
                sstore(mul(sload(0), 0), sub(f(), f()))
                function f() -> r { }
            }",
        );
    }
}
