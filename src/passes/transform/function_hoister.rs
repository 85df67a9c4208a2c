use std::mem;

use crate::passes::{Pass, PassContext};
use crate::utils::rewrite::inner_blocks;
use crate::yul::ast::*;

/// Moves every function definition to the top-level block.
pub struct FunctionHoister;

impl Pass for FunctionHoister {
    const NAME: &'static str = "FunctionHoister";

    fn run(_ctx: &mut PassContext, ast: &mut Block) {
        let mut functions = Vec::new();

        for stmt in &mut ast.statements {
            for block in inner_blocks(stmt) {
                hoist(block, &mut functions);
            }
        }

        ast.statements.extend(functions);
    }
}

fn hoist(block: &mut Block, functions: &mut Vec<Statement>) {
    for mut stmt in mem::take(&mut block.statements) {
        for inner in inner_blocks(&mut stmt) {
            hoist(inner, functions);
        }

        if stmt.is_function() {
            functions.push(stmt);
        } else {
            block.statements.push(stmt);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::testing::check;

    #[test]
    fn hoists_nested_functions() {
        check::<FunctionHoister>(
            "{
                { function f() { function g() { } g() } f() }
                function h() { }
            }",
            "{
                { f() }
                function h() { }
                function g() { }
                function f() { g() }
            }",
        );
    }
}
