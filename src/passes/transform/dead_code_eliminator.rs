use crate::analysis::semantics::terminates_control_flow;
use crate::passes::{Pass, PassContext};
use crate::utils::rewrite::for_each_block_mut;
use crate::yul::ast::*;

/// Removes statements that can never run because control flow left the
/// block before them. Function definitions are kept.
pub struct DeadCodeEliminator;

impl Pass for DeadCodeEliminator {
    const NAME: &'static str = "DeadCodeEliminator";

    fn run(ctx: &mut PassContext, ast: &mut Block) {
        for_each_block_mut(ast, &mut |block| {
            let terminator = block
                .statements
                .iter()
                .position(|stmt| terminates_control_flow(ctx.dialect, stmt));

            if let Some(index) = terminator {
                let mut i = 0;

                block.statements.retain(|stmt| {
                    i += 1;
                    i <= index + 1 || stmt.is_function()
                });
            }
        });
    }
}
