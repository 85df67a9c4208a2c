use std::mem;

use crate::passes::names::NameDispenser;
use crate::passes::{Pass, PassContext};
use crate::utils::rewrite::{
    for_each_block_mut, rewrite_statements, take_statement, Replacement,
};
use crate::yul::ast::*;

/// Moves every nested call into a variable of its own, so that calls only
/// take literals and identifiers as arguments:
///
/// ```text
/// sstore(add(x, 1), mload(y))
/// ```
///
/// becomes
///
/// ```text
/// let _1 := mload(y)
/// let _2 := add(x, 1)
/// sstore(_2, _1)
/// ```
///
/// with fresh names handed out in evaluation order. `if` conditions and
/// `switch` expressions are moved out entirely; loop conditions are left as
/// they are.
pub struct ExpressionSplitter;

impl Pass for ExpressionSplitter {
    const NAME: &'static str = "ExpressionSplitter";

    fn run(ctx: &mut PassContext, ast: &mut Block) {
        let names = &mut ctx.dispenser;

        for_each_block_mut(ast, &mut |block| {
            rewrite_statements(&mut block.statements, |stmt| {
                let mut prelude = Replacement::new();

                match stmt {
                    Statement::Expression(expr) => {
                        split_arguments(expr, names, &mut prelude)
                    }
                    Statement::Assignment(assignment) => split_arguments(
                        &mut assignment.value,
                        names,
                        &mut prelude,
                    ),
                    Statement::VariableDeclaration(decl) => {
                        if let Some(value) = &mut decl.value {
                            split_arguments(value, names, &mut prelude)
                        }
                    }
                    Statement::If(stmt) => {
                        outline(&mut stmt.condition, names, &mut prelude)
                    }
                    Statement::Switch(switch) => {
                        outline(&mut switch.expression, names, &mut prelude)
                    }
                    _ => {}
                }

                if prelude.is_empty() {
                    return None;
                }

                prelude.push(take_statement(stmt));
                Some(prelude)
            })
        });
    }
}

fn split_arguments(
    expr: &mut Expression,
    names: &mut NameDispenser,
    prelude: &mut Replacement,
) {
    if let Expression::FunctionCall(call) = expr {
        for arg in call.args.iter_mut().rev() {
            outline(arg, names, prelude);
        }
    }
}

/// Replaces a call by a fresh variable declared in the prelude.
fn outline(
    expr: &mut Expression,
    names: &mut NameDispenser,
    prelude: &mut Replacement,
) {
    if expr.is_atomic() {
        return;
    }

    split_arguments(expr, names, prelude);

    let name = names.new_name("");
    let value = mem::replace(expr, Expression::Identifier(name.clone()));

    prelude.push(Statement::declare(name, value));
}
