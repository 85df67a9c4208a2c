//! Moving loop conditions into and out of the loop body.

use std::mem;

use crate::passes::{Pass, PassContext};
use crate::utils::rewrite::for_each_block_mut;
use crate::yul::ast::*;

/// Rewrites `for { } c { } { body }` into
/// `for { } 1 { } { if iszero(c) { break } body }`.
pub struct ForLoopConditionIntoBody;

impl Pass for ForLoopConditionIntoBody {
    const NAME: &'static str = "ForLoopConditionIntoBody";

    fn run(ctx: &mut PassContext, ast: &mut Block) {
        let Some(negation) = ctx.dialect.boolean_negation() else {
            return;
        };

        for_each_block_mut(ast, &mut |block| {
            for stmt in &mut block.statements {
                let Statement::ForLoop(for_loop) = stmt else {
                    continue;
                };

                if let Expression::Literal(_) = for_loop.condition {
                    continue;
                }

                let condition = mem::replace(
                    &mut for_loop.condition,
                    Expression::number(1u32),
                );

                let exit = Statement::If(If {
                    condition: negate(negation, condition),
                    body: Block::new(vec![Statement::Break]),
                });

                for_loop.body.statements.insert(0, exit);
            }
        });
    }
}

/// Reverses [`ForLoopConditionIntoBody`] for loops with a constant true
/// condition whose body starts with a conditional `break`.
pub struct ForLoopConditionOutOfBody;

impl Pass for ForLoopConditionOutOfBody {
    const NAME: &'static str = "ForLoopConditionOutOfBody";

    fn run(ctx: &mut PassContext, ast: &mut Block) {
        let Some(negation) = ctx.dialect.boolean_negation() else {
            return;
        };

        for_each_block_mut(ast, &mut |block| {
            for stmt in &mut block.statements {
                let Statement::ForLoop(for_loop) = stmt else {
                    continue;
                };

                match &for_loop.condition {
                    Expression::Literal(lit) if !lit.is_zero() => {}
                    _ => continue,
                }

                let exits = match for_loop.body.statements.first() {
                    Some(Statement::If(stmt)) => {
                        stmt.body.statements == [Statement::Break]
                    }
                    _ => false,
                };

                if !exits {
                    continue;
                }

                let Statement::If(exit) = for_loop.body.statements.remove(0)
                else {
                    continue;
                };

                for_loop.condition = negate(negation, exit.condition);
            }
        });
    }
}

/// `iszero(c)`, or `e` if `c` is `iszero(e)`.
fn negate(negation: &str, condition: Expression) -> Expression {
    match condition {
        Expression::FunctionCall(mut call)
            if call.name == negation && call.args.len() == 1 =>
        {
            call.args.remove(0)
        }
        condition => Expression::call(negation, vec![condition]),
    }
}
