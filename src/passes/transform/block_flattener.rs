use std::mem;

use crate::analysis::Declarations;
use crate::passes::{Pass, PassContext};
use crate::utils::rewrite::{for_each_block_mut, inner_blocks};
use crate::yul::ast::*;

/// Inlines nested blocks into their parent. The top-level block keeps its
/// grouped shape, and a block declaring a name that is also declared
/// elsewhere in the parent (a reserved name kept by every declaration) stays
/// a scope of its own.
pub struct BlockFlattener;

impl Pass for BlockFlattener {
    const NAME: &'static str = "BlockFlattener";

    fn run(_ctx: &mut PassContext, ast: &mut Block) {
        for stmt in &mut ast.statements {
            for block in inner_blocks(stmt) {
                for_each_block_mut(block, &mut flatten);
            }
        }
    }
}

fn flatten(block: &mut Block) {
    if !block.statements.iter().any(|stmt| matches!(stmt, Statement::Block(_)))
    {
        return;
    }

    let decls = Declarations::of_block(block);

    block.statements = mem::take(&mut block.statements)
        .into_iter()
        .flat_map(|stmt| match stmt {
            Statement::Block(inner) if decls.only_declared_in(&inner) => {
                inner.statements
            }
            stmt => vec![stmt],
        })
        .collect();
}
