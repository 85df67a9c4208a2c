use std::mem;

use smallvec::smallvec;

use crate::analysis::Declarations;
use crate::passes::{Pass, PassContext};
use crate::utils::rewrite::{
    for_each_block_mut, rewrite_statements, take_statement, Replacement,
};
use crate::yul::ast::*;

/// Moves the initialisation of a loop in front of it, so that
/// `for { init } c { post } { body }` becomes
/// `init for { } c { post } { body }`.
///
/// When `init` declares a name declared elsewhere in the enclosing block,
/// the result is wrapped into a block of its own.
pub struct ForLoopInitRewriter;

impl Pass for ForLoopInitRewriter {
    const NAME: &'static str = "ForLoopInitRewriter";

    fn run(_ctx: &mut PassContext, ast: &mut Block) {
        for_each_block_mut(ast, &mut |block| {
            let decls = Declarations::of_block(block);

            rewrite_statements(&mut block.statements, |stmt| {
                let Statement::ForLoop(for_loop) = stmt else {
                    return None;
                };

                if for_loop.pre.is_empty() {
                    return None;
                }

                let merge = decls.only_declared_in(&for_loop.pre);
                let pre = mem::take(&mut for_loop.pre);

                let mut replacement = Replacement::from_vec(pre.statements);
                replacement.push(take_statement(stmt));

                if merge {
                    Some(replacement)
                } else {
                    Some(smallvec![Statement::Block(Block::new(
                        replacement.into_vec()
                    ))])
                }
            })
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::testing::{apply, check, parse};
    use crate::yul::printer::print;

    #[test]
    fn moves_init() {
        check::<ForLoopInitRewriter>(
            "{
                for { let i := 0 } lt(i, 10) { i := add(i, 1) } {
                    for { let j := 0 } lt(j, i) { j := add(j, 1) } { }
                }
            }",
            "{
                let i := 0
                for { } lt(i, 10) { i := add(i, 1) } {
                    let j := 0
                    for { } lt(j, i) { j := add(j, 1) } { }
                }
            }",
        );
    }

    #[test]
    fn repeated_reserved_names_keep_a_scope() {
        let src = "{
            for { let i := 0 } lt(i, 2) { i := add(i, 1) } { }
            for { let i := 0 } lt(i, 3) { i := add(i, 1) } { }
        }";

        assert_eq!(
            print(&apply::<ForLoopInitRewriter>(src, &["i"])),
            print(&parse(
                "{
                    { let i := 0 for { } lt(i, 2) { i := add(i, 1) } { } }
                    { let i := 0 for { } lt(i, 3) { i := add(i, 1) } { } }
                }"
            ))
        );
    }
}
