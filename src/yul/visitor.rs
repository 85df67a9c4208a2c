//! AST traversal.

use super::ast::*;

/// Read-only traversal. Loops are walked as pre, condition, body, post.
pub trait Visitor<'ast> {
    fn visit_block(&mut self, block: &'ast Block) {
        visit_block(self, block)
    }

    fn visit_statement(&mut self, stmt: &'ast Statement) {
        visit_statement(self, stmt)
    }

    fn visit_function_definition(&mut self, def: &'ast FunctionDefinition) {
        visit_function_definition(self, def)
    }

    fn visit_expression(&mut self, expr: &'ast Expression) {
        visit_expression(self, expr)
    }
}

pub fn visit_block<'ast, V: Visitor<'ast> + ?Sized>(
    v: &mut V,
    block: &'ast Block,
) {
    for stmt in &block.statements {
        v.visit_statement(stmt);
    }
}

pub fn visit_statement<'ast, V: Visitor<'ast> + ?Sized>(
    v: &mut V,
    stmt: &'ast Statement,
) {
    match stmt {
        Statement::Expression(expr) => v.visit_expression(expr),
        Statement::Assignment(assignment) => {
            v.visit_expression(&assignment.value)
        }
        Statement::VariableDeclaration(decl) => {
            if let Some(value) = &decl.value {
                v.visit_expression(value);
            }
        }
        Statement::FunctionDefinition(def) => v.visit_function_definition(def),
        Statement::If(stmt) => {
            v.visit_expression(&stmt.condition);
            v.visit_block(&stmt.body);
        }
        Statement::Switch(switch) => {
            v.visit_expression(&switch.expression);

            for case in &switch.cases {
                v.visit_block(&case.body);
            }
        }
        Statement::ForLoop(for_loop) => {
            v.visit_block(&for_loop.pre);
            v.visit_expression(&for_loop.condition);
            v.visit_block(&for_loop.body);
            v.visit_block(&for_loop.post);
        }
        Statement::Break | Statement::Continue | Statement::Leave => {}
        Statement::Block(block) => v.visit_block(block),
    }
}

pub fn visit_function_definition<'ast, V: Visitor<'ast> + ?Sized>(
    v: &mut V,
    def: &'ast FunctionDefinition,
) {
    v.visit_block(&def.body)
}

pub fn visit_expression<'ast, V: Visitor<'ast> + ?Sized>(
    v: &mut V,
    expr: &'ast Expression,
) {
    if let Expression::FunctionCall(call) = expr {
        // Arguments are evaluated right to left.
        for arg in call.args.iter().rev() {
            v.visit_expression(arg);
        }
    }
}

/// Mutating traversal with the same order as [`Visitor`].
pub trait VisitorMut {
    fn visit_block(&mut self, block: &mut Block) {
        visit_block_mut(self, block)
    }

    fn visit_statement(&mut self, stmt: &mut Statement) {
        visit_statement_mut(self, stmt)
    }

    fn visit_function_definition(&mut self, def: &mut FunctionDefinition) {
        visit_function_definition_mut(self, def)
    }

    fn visit_expression(&mut self, expr: &mut Expression) {
        visit_expression_mut(self, expr)
    }
}

pub fn visit_block_mut<V: VisitorMut + ?Sized>(v: &mut V, block: &mut Block) {
    for stmt in &mut block.statements {
        v.visit_statement(stmt);
    }
}

pub fn visit_statement_mut<V: VisitorMut + ?Sized>(
    v: &mut V,
    stmt: &mut Statement,
) {
    match stmt {
        Statement::Expression(expr) => v.visit_expression(expr),
        Statement::Assignment(assignment) => {
            v.visit_expression(&mut assignment.value)
        }
        Statement::VariableDeclaration(decl) => {
            if let Some(value) = &mut decl.value {
                v.visit_expression(value);
            }
        }
        Statement::FunctionDefinition(def) => v.visit_function_definition(def),
        Statement::If(stmt) => {
            v.visit_expression(&mut stmt.condition);
            v.visit_block(&mut stmt.body);
        }
        Statement::Switch(switch) => {
            v.visit_expression(&mut switch.expression);

            for case in &mut switch.cases {
                v.visit_block(&mut case.body);
            }
        }
        Statement::ForLoop(for_loop) => {
            v.visit_block(&mut for_loop.pre);
            v.visit_expression(&mut for_loop.condition);
            v.visit_block(&mut for_loop.body);
            v.visit_block(&mut for_loop.post);
        }
        Statement::Break | Statement::Continue | Statement::Leave => {}
        Statement::Block(block) => v.visit_block(block),
    }
}

pub fn visit_function_definition_mut<V: VisitorMut + ?Sized>(
    v: &mut V,
    def: &mut FunctionDefinition,
) {
    v.visit_block(&mut def.body)
}

pub fn visit_expression_mut<V: VisitorMut + ?Sized>(
    v: &mut V,
    expr: &mut Expression,
) {
    if let Expression::FunctionCall(call) = expr {
        for arg in call.args.iter_mut().rev() {
            v.visit_expression(arg);
        }
    }
}
