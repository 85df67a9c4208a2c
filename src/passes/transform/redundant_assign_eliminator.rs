use std::collections::BTreeSet;

use crate::analysis::semantics::is_side_effect_free;
use crate::analysis::References;
use crate::passes::{Pass, PassContext};
use crate::utils::rewrite::for_each_block_mut;
use crate::yul::ast::*;
use crate::yul::visitor::{self, Visitor};

/// Removes assignments whose value can never be observed: assignments to
/// variables that are never read, and assignments immediately overwritten
/// by the next statement.
pub struct RedundantAssignEliminator;

impl Pass for RedundantAssignEliminator {
    const NAME: &'static str = "RedundantAssignEliminator";

    fn run(ctx: &mut PassContext, ast: &mut Block) {
        let refs = References::of_block(ast);

        let mut returns = ReturnVariables::default();
        returns.visit_block(ast);

        let unobserved = |name: &Name| {
            refs.reads(name) == 0
                && !returns.0.contains(name)
                && !ctx.is_reserved(name)
        };

        for_each_block_mut(ast, &mut |block| {
            let mut i = 0;

            while i < block.statements.len() {
                let Statement::Assignment(assignment) = &block.statements[i]
                else {
                    i += 1;
                    continue;
                };

                let next = block.statements.get(i + 1);

                let removable =
                    is_side_effect_free(ctx.dialect, &assignment.value)
                        && (assignment.names.iter().all(|n| unobserved(n))
                            || overwritten(assignment, next));

                if removable {
                    block.statements.remove(i);
                    // The previous statement may now be overwritten.
                    i = i.saturating_sub(1);
                } else {
                    i += 1;
                }
            }
        });
    }
}

/// Whether the next statement assigns the same variable without reading it.
fn overwritten(assignment: &Assignment, next: Option<&Statement>) -> bool {
    let Some(Statement::Assignment(next)) = next else {
        return false;
    };

    next.names == assignment.names
        && assignment.names.len() == 1
        && References::of_expression(&next.value).reads(&next.names[0]) == 0
}

#[derive(Default)]
struct ReturnVariables(BTreeSet<Name>);

impl<'ast> Visitor<'ast> for ReturnVariables {
    fn visit_function_definition(&mut self, def: &'ast FunctionDefinition) {
        self.0.extend(def.returns.iter().cloned());

        visitor::visit_function_definition(self, def)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::testing::check;

    #[test]
    fn removes_unobserved() {
        check::<RedundantAssignEliminator>(
            "{
                let a := calldataload(0)
                let b := 1
                b := a
                a := 2
                a := add(a, 1)
                a := 3
                sstore(a, 0)
                function f() -> r { let t := 0 t := 1 r := 2 }
            }",
            "{
                let a := calldataload(0)
                let b := 1
                a := 3
                sstore(a, 0)
                function f() -> r { let t := 0 r := 2 }
            }",
        );
    }

    #[test]
    fn keeps_effects() {
        check::<RedundantAssignEliminator>(
            "{
                let a := 0
                a := f()
                a := 1
                sstore(a, a)
                function f() -> r { sstore(0, 1) }
            }",
            "{
                let a := 0
                a := f()
                a := 1
                sstore(a, a)
                function f() -> r { sstore(0, 1) }
            }",
        );
    }
}
