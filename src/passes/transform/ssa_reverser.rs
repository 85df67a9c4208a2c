use std::mem;

use crate::passes::{Pass, PassContext};
use crate::utils::rewrite::for_each_block_mut;
use crate::yul::ast::*;

/// Undoes the temporaries introduced by [`super::SSATransform`]:
///
/// ```text
/// let a_1 := e
/// a := a_1
/// ```
///
/// becomes `a := e let a_1 := a`, after which `a_1` is typically removed by
/// rematerialisation and pruning. Declarations `let a := a_1` are treated the
/// same way.
pub struct SSAReverser;

impl Pass for SSAReverser {
    const NAME: &'static str = "SSAReverser";

    fn run(_ctx: &mut PassContext, ast: &mut Block) {
        for_each_block_mut(ast, &mut |block| {
            let mut i = 0;

            while i + 1 < block.statements.len() {
                let (first, rest) = block.statements[i..].split_at_mut(1);

                if reverse(&mut first[0], &mut rest[0]) {
                    block.statements.swap(i, i + 1);
                    i += 2;
                } else {
                    i += 1;
                }
            }
        });
    }
}

/// Exchanges the values of the two statements in place; the caller swaps
/// the statements afterwards.
fn reverse(first: &mut Statement, second: &mut Statement) -> bool {
    let Statement::VariableDeclaration(VariableDeclaration {
        names: temporaries,
        value: Some(value),
    }) = first
    else {
        return false;
    };

    let [temporary] = &temporaries[..] else {
        return false;
    };

    let (names, copied) = match second {
        Statement::Assignment(assignment) => {
            (&assignment.names, &mut assignment.value)
        }
        Statement::VariableDeclaration(VariableDeclaration {
            names,
            value: Some(value),
        }) => (&*names, value),
        _ => return false,
    };

    let [target] = &names[..] else {
        return false;
    };

    if copied.as_identifier() != Some(temporary) {
        return false;
    }

    *copied = mem::replace(value, Expression::Identifier(target.clone()));

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::testing::check;

    #[test]
    fn reverses() {
        check::<SSAReverser>(
            "{
                let a := calldataload(0)
                let a_1 := add(a, 1)
                a := a_1
                let b_2 := mload(a)
                let b := b_2
                sstore(a_1, b_2)
            }",
            "{
                let a := calldataload(0)
                a := add(a, 1)
                let a_1 := a
                let b := mload(a)
                let b_2 := b
                sstore(a_1, b_2)
            }",
        );
    }
}
