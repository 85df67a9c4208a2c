use std::iter;
use std::mem;

use crate::passes::{Pass, PassContext};
use crate::yul::ast::*;

/// Brings the top-level block into the shape `{ { code } functions... }`.
pub struct FunctionGrouper;

impl Pass for FunctionGrouper {
    const NAME: &'static str = "FunctionGrouper";

    fn run(_ctx: &mut PassContext, ast: &mut Block) {
        if is_grouped(ast) {
            return;
        }

        let (functions, code): (Vec<_>, Vec<_>) = mem::take(&mut ast.statements)
            .into_iter()
            .partition(Statement::is_function);

        ast.statements = iter::once(Statement::Block(Block::new(code)))
            .chain(functions)
            .collect();
    }
}

fn is_grouped(ast: &Block) -> bool {
    match ast.statements.split_first() {
        Some((Statement::Block(_), functions)) => {
            functions.iter().all(Statement::is_function)
        }
        _ => false,
    }
}
