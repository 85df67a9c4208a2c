use crate::analysis::semantics::is_movable;
use crate::analysis::References;
use crate::dialect::Dialect;
use crate::passes::dataflow::{walk_block, DataFlow, Knowledge};
use crate::passes::{Pass, PassContext};
use crate::yul::ast::*;

/// Replaces movable expressions by a variable known to hold the same value.
pub struct CommonSubexpressionEliminator;

impl Pass for CommonSubexpressionEliminator {
    const NAME: &'static str = "CommonSubexpressionEliminator";

    fn run(ctx: &mut PassContext, ast: &mut Block) {
        let mut flow = Eliminator {
            dialect: ctx.dialect,
            knowledge: Knowledge::default(),
        };

        walk_block(&mut flow, ast);
    }
}

struct Eliminator<'a> {
    dialect: &'a Dialect,
    knowledge: Knowledge,
}

impl DataFlow for Eliminator<'_> {
    fn knowledge(&mut self) -> &mut Knowledge {
        &mut self.knowledge
    }

    fn rewrite(&mut self, expr: &mut Expression) {
        let Expression::FunctionCall(call) = expr else {
            return;
        };

        for arg in &mut call.args {
            self.rewrite(arg);
        }

        if !is_movable(self.dialect, expr) {
            return;
        }

        if let Some(var) = self.knowledge.variable_holding(expr) {
            *expr = Expression::Identifier(var.clone());
        }
    }

    fn learn(&mut self, names: &[Name], value: Option<&Expression>) {
        let ([name], Some(value)) = (names, value) else {
            return;
        };

        if matches!(value, Expression::FunctionCall(_))
            && is_movable(self.dialect, value)
            && References::of_expression(value).reads(name) == 0
        {
            self.knowledge.record(name.clone(), value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::testing::check;

    #[test]
    fn reuses_variables() {
        check::<CommonSubexpressionEliminator>(
            "{
                let a := calldataload(0)
                let x := add(a, 1)
                let y := mul(add(a, 1), 2)
                sstore(add(a, 1), y)
            }",
            "{
                let a := calldataload(0)
                let x := add(a, 1)
                let y := mul(x, 2)
                sstore(x, y)
            }",
        );
    }

    #[test]
    fn respects_assignments_and_effects() {
        check::<CommonSubexpressionEliminator>(
            "{
                let a := calldataload(0)
                let x := add(a, 1)
                a := 7
                sstore(add(a, 1), 0)
                let s := sload(0)
                sstore(0, sload(0))
            }",
            "{
                let a := calldataload(0)
                let x := add(a, 1)
                a := 7
                sstore(add(a, 1), 0)
                let s := sload(0)
                sstore(0, sload(0))
            }",
        );
    }
}
