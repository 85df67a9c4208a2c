//! Conversion to a form in which most variables are assigned only once.
//!
//! Every value given to a reassigned variable `a` is first stored in a fresh
//! variable:
//!
//! ```text
//! let a := e1      let a_1 := e1  let a := a_1
//! a := e2      =>  let a_2 := e2  a := a_2
//! sstore(a, 0)     sstore(a_2, 0)
//! ```
//!
//! Reads of `a` are then replaced by the fresh variable holding its current
//! value wherever that is known. The remaining assignments are cleaned up by
//! [`super::RedundantAssignEliminator`] and [`super::UnusedPruner`].

use std::collections::BTreeSet;

use smallvec::smallvec;

use crate::analysis::References;
use crate::passes::dataflow::{walk_block, DataFlow, Knowledge};
use crate::passes::{Pass, PassContext};
use crate::utils::rewrite::{
    for_each_block_mut, rewrite_statements, Replacement,
};
use crate::yul::ast::*;

pub struct SSATransform;

impl Pass for SSATransform {
    const NAME: &'static str = "SSATransform";

    fn run(ctx: &mut PassContext, ast: &mut Block) {
        let assigned = References::of_block(ast).assigned_names().clone();

        if assigned.is_empty() {
            return;
        }

        let names = &mut ctx.dispenser;

        for_each_block_mut(ast, &mut |block| {
            rewrite_statements(&mut block.statements, |stmt| {
                let (targets, value, declares) = match &*stmt {
                    Statement::Assignment(assignment) => {
                        (&assignment.names, &assignment.value, false)
                    }
                    Statement::VariableDeclaration(VariableDeclaration {
                        names: targets,
                        value: Some(value),
                    }) => (targets, value, true),
                    _ => return None,
                };

                if value.is_atomic()
                    || !targets.iter().any(|name| assigned.contains(name))
                {
                    return None;
                }

                let fresh: Vec<Name> =
                    targets.iter().map(|name| names.new_name(name)).collect();

                let mut replacement: Replacement =
                    smallvec![Statement::VariableDeclaration(
                        VariableDeclaration {
                            names: fresh.clone(),
                            value: Some(value.clone()),
                        }
                    )];

                for (target, fresh) in targets.iter().zip(fresh) {
                    let target = target.clone();
                    let fresh = Expression::Identifier(fresh);

                    replacement.push(if declares {
                        Statement::declare(target, fresh)
                    } else {
                        Statement::assign(target, fresh)
                    });
                }

                Some(replacement)
            })
        });

        walk_block(
            &mut CurrentValues {
                assigned: &assigned,
                knowledge: Knowledge::default(),
            },
            ast,
        );
    }
}

/// Replaces reads of reassigned variables by the variable holding their
/// current value.
struct CurrentValues<'a> {
    assigned: &'a BTreeSet<Name>,
    knowledge: Knowledge,
}

impl DataFlow for CurrentValues<'_> {
    fn knowledge(&mut self) -> &mut Knowledge {
        &mut self.knowledge
    }

    fn rewrite(&mut self, expr: &mut Expression) {
        match expr {
            Expression::Identifier(name) => {
                if let Some(value) = self.knowledge.value_of(name) {
                    *expr = value.clone();
                }
            }
            Expression::FunctionCall(call) => {
                for arg in &mut call.args {
                    self.rewrite(arg);
                }
            }
            Expression::Literal(_) => {}
        }
    }

    fn learn(&mut self, names: &[Name], value: Option<&Expression>) {
        if let ([name], Some(Expression::Identifier(current))) = (names, value)
        {
            if self.assigned.contains(name) && current != name {
                let current = Expression::Identifier(current.clone());

                self.knowledge.record(name.clone(), current);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::testing::check;

    #[test]
    fn introduces_fresh_variables() {
        check::<SSATransform>(
            "{
                let a := calldataload(0)
                a := add(a, 1)
                sstore(a, 0)
                if a { a := mul(a, 2) }
                sstore(a, 1)
            }",
            "{
                let a_2 := calldataload(0)
                let a := a_2
                let a_3 := add(a_2, 1)
                a := a_3
                sstore(a_3, 0)
                if a_3 { let a_1 := mul(a_3, 2) a := a_1 }
                sstore(a, 1)
            }",
        );
    }
}
