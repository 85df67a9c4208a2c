//! Code size estimates.

use crate::yul::ast::*;
use crate::yul::visitor::{self, Visitor};

/// Weighs every statement and every call as one unit. Blocks, literals and
/// identifiers are free, and function definitions only count when asked to.
pub struct CodeSize {
    size: usize,
    include_functions: bool,
}

impl CodeSize {
    pub fn code_size(block: &Block) -> usize {
        let mut metric = CodeSize {
            size: 0,
            include_functions: false,
        };

        metric.visit_block(block);
        metric.size
    }

    pub fn code_size_including_functions(block: &Block) -> usize {
        let mut metric = CodeSize {
            size: 0,
            include_functions: true,
        };

        metric.visit_block(block);
        metric.size
    }

    pub fn function_size(def: &FunctionDefinition) -> usize {
        CodeSize::code_size_including_functions(&def.body)
    }
}

impl<'ast> Visitor<'ast> for CodeSize {
    fn visit_statement(&mut self, stmt: &'ast Statement) {
        match stmt {
            Statement::FunctionDefinition(_) if !self.include_functions => {
                return;
            }
            Statement::Block(_) => {}
            _ => self.size += 1,
        }

        visitor::visit_statement(self, stmt)
    }

    fn visit_expression(&mut self, expr: &'ast Expression) {
        if let Expression::FunctionCall(_) = expr {
            self.size += 1;
        }

        visitor::visit_expression(self, expr)
    }
}
