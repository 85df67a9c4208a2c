//! In-place rewriting helpers shared by the transformation passes.

use std::collections::HashMap;
use std::mem;

use smallvec::SmallVec;

use crate::yul::ast::*;
use crate::yul::visitor::{self, VisitorMut};

/// Statements replacing a single statement.
pub type Replacement = SmallVec<[Statement; 2]>;

/// Offers every statement of the list to `f` in order. A returned replacement
/// is spliced in place of the statement and is not offered again.
pub fn rewrite_statements<F>(statements: &mut Vec<Statement>, mut f: F)
where
    F: FnMut(&mut Statement) -> Option<Replacement>,
{
    let mut i = 0;

    while i < statements.len() {
        match f(&mut statements[i]) {
            Some(replacement) => {
                let len = replacement.len();

                statements.splice(i..=i, replacement);
                i += len;
            }
            None => i += 1,
        }
    }
}

/// Moves a statement out, leaving an empty block behind.
pub fn take_statement(stmt: &mut Statement) -> Statement {
    mem::replace(stmt, Statement::Block(Block::default()))
}

/// Calls `f` on every block of the tree, innermost blocks first.
pub fn for_each_block_mut<F>(block: &mut Block, f: &mut F)
where
    F: FnMut(&mut Block),
{
    for stmt in &mut block.statements {
        for inner in inner_blocks(stmt) {
            for_each_block_mut(inner, f);
        }
    }

    f(block)
}

/// Blocks directly nested in a statement.
pub fn inner_blocks(stmt: &mut Statement) -> SmallVec<[&mut Block; 3]> {
    match stmt {
        Statement::FunctionDefinition(def) => {
            SmallVec::from_iter([&mut def.body])
        }
        Statement::If(stmt) => SmallVec::from_iter([&mut stmt.body]),
        Statement::Switch(switch) => {
            switch.cases.iter_mut().map(|case| &mut case.body).collect()
        }
        Statement::ForLoop(for_loop) => SmallVec::from_iter([
            &mut for_loop.pre,
            &mut for_loop.body,
            &mut for_loop.post,
        ]),
        Statement::Block(block) => SmallVec::from_iter([block]),
        _ => SmallVec::new(),
    }
}

/// Renames declarations and references according to the map.
pub struct Renamer<'a> {
    names: &'a HashMap<Name, Name>,
}

impl<'a> Renamer<'a> {
    pub fn new(names: &'a HashMap<Name, Name>) -> Renamer<'a> {
        Renamer { names }
    }

    fn rename(&self, name: &mut Name) {
        if let Some(new) = self.names.get(name) {
            name.clone_from(new);
        }
    }

    fn rename_all(&self, names: &mut [Name]) {
        for name in names {
            self.rename(name);
        }
    }
}

impl VisitorMut for Renamer<'_> {
    fn visit_statement(&mut self, stmt: &mut Statement) {
        match stmt {
            Statement::Assignment(assignment) => {
                self.rename_all(&mut assignment.names)
            }
            Statement::VariableDeclaration(decl) => {
                self.rename_all(&mut decl.names)
            }
            _ => {}
        }

        visitor::visit_statement_mut(self, stmt)
    }

    fn visit_function_definition(&mut self, def: &mut FunctionDefinition) {
        self.rename(&mut def.name);
        self.rename_all(&mut def.params);
        self.rename_all(&mut def.returns);

        visitor::visit_function_definition_mut(self, def)
    }

    fn visit_expression(&mut self, expr: &mut Expression) {
        match expr {
            Expression::Identifier(name) => self.rename(name),
            Expression::FunctionCall(call) => self.rename(&mut call.name),
            Expression::Literal(_) => {}
        }

        visitor::visit_expression_mut(self, expr)
    }
}

/// Replaces every read of a variable with a copy of an expression.
pub fn substitute(expr: &mut Expression, values: &HashMap<Name, Expression>) {
    match expr {
        Expression::Identifier(name) => {
            if let Some(value) = values.get(name) {
                *expr = value.clone();
            }
        }
        Expression::FunctionCall(call) => {
            for arg in &mut call.args {
                substitute(arg, values);
            }
        }
        Expression::Literal(_) => {}
    }
}
