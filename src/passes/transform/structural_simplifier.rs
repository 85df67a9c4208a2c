use std::mem;

use smallvec::smallvec;

use crate::passes::{Pass, PassContext};
use crate::utils::rewrite::{
    for_each_block_mut, rewrite_statements, Replacement,
};
use crate::yul::ast::*;

/// Resolves control flow on constant conditions.
pub struct StructuralSimplifier;

impl Pass for StructuralSimplifier {
    const NAME: &'static str = "StructuralSimplifier";

    fn run(_ctx: &mut PassContext, ast: &mut Block) {
        for_each_block_mut(ast, &mut |block| {
            rewrite_statements(&mut block.statements, simplify)
        });
    }
}

fn simplify(stmt: &mut Statement) -> Option<Replacement> {
    let taken = match stmt {
        Statement::If(stmt) => {
            let condition = stmt.condition.as_literal()?;

            if condition.is_zero() {
                return Some(Replacement::new());
            }

            mem::take(&mut stmt.body)
        }
        Statement::Switch(switch) => {
            let value = switch.expression.as_literal()?.value.clone();

            let matching = switch
                .cases
                .iter()
                .position(|case| {
                    case.value.as_ref().map_or(false, |lit| lit.value == value)
                })
                .or_else(|| {
                    switch.cases.iter().position(|case| case.value.is_none())
                });

            match matching {
                Some(index) => mem::take(&mut switch.cases[index].body),
                None => return Some(Replacement::new()),
            }
        }
        Statement::ForLoop(for_loop) => {
            if !for_loop.condition.as_literal()?.is_zero() {
                return None;
            }

            mem::take(&mut for_loop.pre)
        }
        _ => return None,
    };

    Some(smallvec![Statement::Block(taken)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::testing::check;

    #[test]
    fn constant_conditions() {
        check::<StructuralSimplifier>(
            "{
                if 0 { sstore(0, 0) }
                if true { sstore(1, 1) }
                switch 2 case 1 { sstore(2, 1) } case 2 { sstore(2, 2) }
                switch 3 case 1 { sstore(3, 1) } default { sstore(3, 3) }
                switch 4 case 1 { sstore(4, 1) }
                for { let i := 5 } 0 { } { sstore(i, 5) }
                for { } 1 { } { break }
            }",
            "{
                { sstore(1, 1) }
                { sstore(2, 2) }
                { sstore(3, 3) }
                { let i := 5 }
                for { } 1 { } { break }
            }",
        );
    }
}
