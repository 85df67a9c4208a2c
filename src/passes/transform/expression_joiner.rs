use crate::analysis::References;
use crate::passes::{Pass, PassContext};
use crate::utils::rewrite::for_each_block_mut;
use crate::yul::ast::*;

/// Moves the value of a variable that is read exactly once into the
/// statement right after its declaration, provided only literals and
/// identifiers are evaluated before the read:
///
/// ```text
/// let x := add(a, 1)
/// sstore(x, 0)
/// ```
///
/// becomes `sstore(add(a, 1), 0)`.
pub struct ExpressionJoiner;

impl Pass for ExpressionJoiner {
    const NAME: &'static str = "ExpressionJoiner";

    fn run(ctx: &mut PassContext, ast: &mut Block) {
        let refs = References::of_block(ast);

        let joinable = |name: &Name| {
            refs.reads(name) == 1
                && !refs.is_assigned(name)
                && !ctx.is_reserved(name)
        };

        for_each_block_mut(ast, &mut |block| {
            let mut i = 0;

            while i + 1 < block.statements.len() {
                let (current, rest) = block.statements[i..].split_at_mut(1);

                if join(&mut current[0], &mut rest[0], &joinable) {
                    block.statements.remove(i);
                    i = i.saturating_sub(1);
                } else {
                    i += 1;
                }
            }
        });
    }
}

fn join<F>(decl: &mut Statement, next: &mut Statement, joinable: &F) -> bool
where
    F: Fn(&Name) -> bool,
{
    let Statement::VariableDeclaration(VariableDeclaration {
        names,
        value: value @ Some(_),
    }) = decl
    else {
        return false;
    };

    let [var] = &names[..] else {
        return false;
    };

    if !joinable(var) {
        return false;
    }

    let target = match next {
        Statement::Expression(expr) => expr,
        Statement::Assignment(assignment) => &mut assignment.value,
        Statement::VariableDeclaration(decl) => match &mut decl.value {
            Some(value) => value,
            None => return false,
        },
        Statement::If(stmt) => &mut stmt.condition,
        Statement::Switch(switch) => &mut switch.expression,
        _ => return false,
    };

    substitute_first(target, var, value)
}

/// Replaces the read of `var` if nothing but literals and identifiers is
/// evaluated before it.
fn substitute_first(
    expr: &mut Expression,
    var: &Name,
    value: &mut Option<Expression>,
) -> bool {
    match expr {
        Expression::Identifier(name) if name == var => match value.take() {
            Some(value) => {
                *expr = value;
                true
            }
            None => false,
        },
        Expression::FunctionCall(call) => {
            // Arguments are evaluated from right to left.
            let first = call
                .args
                .iter()
                .rposition(|arg| !arg.is_atomic())
                .unwrap_or(0);

            call.args[first..]
                .iter_mut()
                .any(|arg| substitute_first(arg, var, value))
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::testing::check;

    #[test]
    fn joins_chains() {
        check::<ExpressionJoiner>(
            "{
                let a := calldataload(0)
                let b := add(a, 1)
                let c := mload(b)
                sstore(c, 2)
            }",
            "{ sstore(mload(add(calldataload(0), 1)), 2) }",
        );
    }

    #[test]
    fn joins_backwards() {
        check::<ExpressionJoiner>(
            "{
                let a := calldataload(0)
                let b := calldataload(1)
                sstore(b, a)
            }",
            "{ sstore(calldataload(1), calldataload(0)) }",
        );
    }

    #[test]
    fn respects_evaluation_order() {
        check::<ExpressionJoiner>(
            "{
                let a := sload(0)
                sstore(a, f())
                let b := sload(1)
                sstore(b, b)
                function f() -> r { sstore(0, 1) }
            }",
            "{
                let a := sload(0)
                sstore(a, f())
                let b := sload(1)
                sstore(b, b)
                function f() -> r { sstore(0, 1) }
            }",
        );
    }
}
