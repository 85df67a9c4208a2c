use std::collections::BTreeSet;

use crate::analysis::semantics::is_movable;
use crate::analysis::{Declarations, References};
use crate::dialect::Dialect;
use crate::passes::dataflow::assigned_in_loop;
use crate::passes::{Pass, PassContext};
use crate::utils::rewrite::{
    for_each_block_mut, rewrite_statements, take_statement, Replacement,
};
use crate::yul::ast::*;

/// Moves declarations of movable values that do not depend on anything
/// changing in a loop in front of that loop.
pub struct LoopInvariantCodeMotion;

impl Pass for LoopInvariantCodeMotion {
    const NAME: &'static str = "LoopInvariantCodeMotion";

    fn run(ctx: &mut PassContext, ast: &mut Block) {
        let dialect = ctx.dialect;

        for_each_block_mut(ast, &mut |block| {
            rewrite_statements(&mut block.statements, |stmt| {
                let Statement::ForLoop(for_loop) = stmt else {
                    return None;
                };

                let mut hoisted = hoist(dialect, for_loop);

                if hoisted.is_empty() {
                    return None;
                }

                hoisted.push(take_statement(stmt));
                Some(hoisted)
            })
        });
    }
}

fn hoist(dialect: &Dialect, for_loop: &mut ForLoop) -> Replacement {
    let assigned = assigned_in_loop(for_loop);
    let mut declared: BTreeSet<Name> = [
        &for_loop.pre,
        &for_loop.body,
        &for_loop.post,
    ]
    .into_iter()
    .flat_map(|block| Declarations::of_block(block).variables)
    .collect();

    let mut hoisted = Replacement::new();
    let mut i = 0;

    while i < for_loop.body.statements.len() {
        let invariant = match &for_loop.body.statements[i] {
            Statement::VariableDeclaration(VariableDeclaration {
                names,
                value: Some(value),
            }) => {
                let varies = |name: &Name| {
                    assigned.contains(name) || declared.contains(name)
                };

                names.len() == 1
                    && !assigned.contains(&names[0])
                    && is_movable(dialect, value)
                    && !References::of_expression(value)
                        .read_names()
                        .any(varies)
            }
            _ => false,
        };

        if !invariant {
            i += 1;
            continue;
        }

        let stmt = for_loop.body.statements.remove(i);

        if let Statement::VariableDeclaration(decl) = &stmt {
            for name in &decl.names {
                declared.remove(name);
            }
        }

        hoisted.push(stmt);
    }

    hoisted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::testing::check;

    #[test]
    fn hoists_invariants() {
        check::<LoopInvariantCodeMotion>(
            "{
                let a := calldataload(0)
                for { let i := 0 } lt(i, 10) { i := add(i, 1) } {
                    let b := add(a, 1)
                    let c := mul(b, 2)
                    let d := add(i, c)
                    let e := sload(c)
                    let g := 1
                    g := 2
                    sstore(d, add(e, g))
                }
            }",
            "{
                let a := calldataload(0)
                let b := add(a, 1)
                let c := mul(b, 2)
                for { let i := 0 } lt(i, 10) { i := add(i, 1) } {
                    let d := add(i, c)
                    let e := sload(c)
                    let g := 1
                    g := 2
                    sstore(d, add(e, g))
                }
            }",
        );
    }
}
