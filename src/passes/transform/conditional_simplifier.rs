//! Making the value of a condition explicit after it was tested, and
//! removing those assignments again.

use crate::analysis::semantics::terminates_control_flow;
use crate::dialect::Dialect;
use crate::passes::{Pass, PassContext};
use crate::utils::rewrite::for_each_block_mut;
use crate::yul::ast::*;

/// Inserts `x := 0` after `if x { ... }` when the body always leaves, and
/// `x := k` at the start of every `case k` of `switch x`.
pub struct ConditionalSimplifier;

impl Pass for ConditionalSimplifier {
    const NAME: &'static str = "ConditionalSimplifier";

    fn run(ctx: &mut PassContext, ast: &mut Block) {
        for_each_block_mut(ast, &mut |block| {
            let mut i = 0;

            while i < block.statements.len() {
                match &mut block.statements[i] {
                    Statement::If(stmt) => {
                        if let Some(var) = leaving_condition(ctx.dialect, stmt)
                        {
                            let reset = Statement::assign(
                                var.clone(),
                                Expression::Literal(Literal::zero()),
                            );

                            if block.statements.get(i + 1) != Some(&reset) {
                                block.statements.insert(i + 1, reset);
                            }

                            i += 1;
                        }
                    }
                    Statement::Switch(switch) => {
                        let Expression::Identifier(var) = &switch.expression
                        else {
                            i += 1;
                            continue;
                        };

                        for case in &mut switch.cases {
                            let Some(value) = &case.value else {
                                continue;
                            };

                            let known = case_assignment(var, value);

                            if case.body.statements.first() != Some(&known) {
                                case.body.statements.insert(0, known);
                            }
                        }
                    }
                    _ => {}
                }

                i += 1;
            }
        });
    }
}

/// Removes the assignments [`ConditionalSimplifier`] inserts.
pub struct ConditionalUnsimplifier;

impl Pass for ConditionalUnsimplifier {
    const NAME: &'static str = "ConditionalUnsimplifier";

    fn run(ctx: &mut PassContext, ast: &mut Block) {
        for_each_block_mut(ast, &mut |block| {
            let mut i = 0;

            while i < block.statements.len() {
                match &mut block.statements[i] {
                    Statement::If(stmt) => {
                        if let Some(var) = leaving_condition(ctx.dialect, stmt)
                        {
                            let reset = Statement::assign(
                                var.clone(),
                                Expression::Literal(Literal::zero()),
                            );

                            if block.statements.get(i + 1) == Some(&reset) {
                                block.statements.remove(i + 1);
                            }
                        }
                    }
                    Statement::Switch(switch) => {
                        if let Expression::Identifier(var) = &switch.expression
                        {
                            for case in &mut switch.cases {
                                let Some(value) = &case.value else {
                                    continue;
                                };

                                let known = case_assignment(var, value);

                                if case.body.statements.first() == Some(&known)
                                {
                                    case.body.statements.remove(0);
                                }
                            }
                        }
                    }
                    _ => {}
                }

                i += 1;
            }
        });
    }
}

/// The tested variable of an `if` whose body never falls through.
fn leaving_condition<'a>(dialect: &Dialect, stmt: &'a If) -> Option<&'a Name> {
    let var = stmt.condition.as_identifier()?;
    let last = stmt.body.statements.last()?;

    terminates_control_flow(dialect, last).then_some(var)
}

fn case_assignment(var: &Name, value: &Literal) -> Statement {
    Statement::assign(
        var.clone(),
        Expression::Literal(Literal::number(value.value.clone())),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::testing::check;

    const SIMPLIFIED: &str = "{
        let x := calldataload(0)
        if x { revert(0, 0) }
        x := 0
        sstore(0, x)
        switch x
        case 0 { x := 0 sstore(1, x) }
        case 2 { x := 2 sstore(2, x) }
        default { sstore(3, x) }
        if x { sstore(4, x) }
    }";

    #[test]
    fn simplifies() {
        check::<ConditionalSimplifier>(
            "{
                let x := calldataload(0)
                if x { revert(0, 0) }
                sstore(0, x)
                switch x
                case 0 { sstore(1, x) }
                case 2 { sstore(2, x) }
                default { sstore(3, x) }
                if x { sstore(4, x) }
            }",
            SIMPLIFIED,
        );
    }

    #[test]
    fn simplifying_twice_changes_nothing() {
        check::<ConditionalSimplifier>(SIMPLIFIED, SIMPLIFIED);
    }

    #[test]
    fn unsimplifies() {
        check::<ConditionalUnsimplifier>(
            SIMPLIFIED,
            "{
                let x := calldataload(0)
                if x { revert(0, 0) }
                sstore(0, x)
                switch x
                case 0 { sstore(1, x) }
                case 2 { sstore(2, x) }
                default { sstore(3, x) }
                if x { sstore(4, x) }
            }",
        );
    }
}
