//! Structural equality modulo consistent renaming of declared names.

use std::collections::HashMap;

use crate::yul::ast::*;

/// Compares code while tracking a bijection between the names declared on
/// either side. Free names must match exactly.
#[derive(Default)]
pub struct SyntacticallyEqual {
    left: HashMap<Name, usize>,
    right: HashMap<Name, usize>,
    next: usize,
}

impl SyntacticallyEqual {
    pub fn blocks(a: &Block, b: &Block) -> bool {
        SyntacticallyEqual::default().block(a, b)
    }

    pub fn statements(a: &Statement, b: &Statement) -> bool {
        SyntacticallyEqual::default().statement(a, b)
    }

    pub fn expressions(a: &Expression, b: &Expression) -> bool {
        SyntacticallyEqual::default().expression(a, b)
    }

    /// Equal signatures and bodies up to renaming, including the function
    /// names themselves.
    pub fn functions(a: &FunctionDefinition, b: &FunctionDefinition) -> bool {
        let mut eq = SyntacticallyEqual::default();

        eq.declare(&a.name, &b.name);
        eq.function(a, b)
    }

    fn declare(&mut self, a: &Name, b: &Name) {
        let id = self.next;
        self.next += 1;

        self.left.insert(a.clone(), id);
        self.right.insert(b.clone(), id);
    }

    fn declare_all(&mut self, a: &[Name], b: &[Name]) -> bool {
        if a.len() != b.len() {
            return false;
        }

        for (a, b) in a.iter().zip(b) {
            self.declare(a, b);
        }

        true
    }

    fn name(&self, a: &Name, b: &Name) -> bool {
        match (self.left.get(a), self.right.get(b)) {
            (Some(x), Some(y)) => x == y,
            (None, None) => a == b,
            _ => false,
        }
    }

    fn names(&self, a: &[Name], b: &[Name]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(a, b)| self.name(a, b))
    }

    fn block(&mut self, a: &Block, b: &Block) -> bool {
        if a.statements.len() != b.statements.len() {
            return false;
        }

        // Functions are visible in their whole block.
        for (x, y) in a.statements.iter().zip(&b.statements) {
            match (x, y) {
                (
                    Statement::FunctionDefinition(f),
                    Statement::FunctionDefinition(g),
                ) => {
                    self.declare(&f.name, &g.name);
                }
                (Statement::FunctionDefinition(_), _)
                | (_, Statement::FunctionDefinition(_)) => return false,
                _ => {}
            }
        }

        a.statements
            .iter()
            .zip(&b.statements)
            .all(|(x, y)| self.statement(x, y))
    }

    fn function(
        &mut self,
        a: &FunctionDefinition,
        b: &FunctionDefinition,
    ) -> bool {
        self.declare_all(&a.params, &b.params)
            && self.declare_all(&a.returns, &b.returns)
            && self.block(&a.body, &b.body)
    }

    fn statement(&mut self, a: &Statement, b: &Statement) -> bool {
        match (a, b) {
            (Statement::Expression(x), Statement::Expression(y)) => {
                self.expression(x, y)
            }
            (Statement::Assignment(x), Statement::Assignment(y)) => {
                self.expression(&x.value, &y.value)
                    && self.names(&x.names, &y.names)
            }
            (
                Statement::VariableDeclaration(x),
                Statement::VariableDeclaration(y),
            ) => {
                let values = match (&x.value, &y.value) {
                    (Some(v), Some(w)) => self.expression(v, w),
                    (None, None) => true,
                    _ => false,
                };

                values && self.declare_all(&x.names, &y.names)
            }
            (
                Statement::FunctionDefinition(x),
                Statement::FunctionDefinition(y),
            ) => {
                self.name(&x.name, &y.name) && self.function(x, y)
            }
            (Statement::If(x), Statement::If(y)) => {
                self.expression(&x.condition, &y.condition)
                    && self.block(&x.body, &y.body)
            }
            (Statement::Switch(x), Statement::Switch(y)) => {
                self.expression(&x.expression, &y.expression)
                    && x.cases.len() == y.cases.len()
                    && x.cases.iter().zip(&y.cases).all(|(c, d)| {
                        c.value == d.value && self.block(&c.body, &d.body)
                    })
            }
            (Statement::ForLoop(x), Statement::ForLoop(y)) => {
                self.block(&x.pre, &y.pre)
                    && self.expression(&x.condition, &y.condition)
                    && self.block(&x.body, &y.body)
                    && self.block(&x.post, &y.post)
            }
            (Statement::Break, Statement::Break)
            | (Statement::Continue, Statement::Continue)
            | (Statement::Leave, Statement::Leave) => true,
            (Statement::Block(x), Statement::Block(y)) => self.block(x, y),
            _ => false,
        }
    }

    fn expression(&mut self, a: &Expression, b: &Expression) -> bool {
        match (a, b) {
            (Expression::Literal(x), Expression::Literal(y)) => x == y,
            (Expression::Identifier(x), Expression::Identifier(y)) => {
                self.name(x, y)
            }
            (Expression::FunctionCall(x), Expression::FunctionCall(y)) => {
                self.name(&x.name, &y.name)
                    && x.args.len() == y.args.len()
                    && x.args
                        .iter()
                        .zip(&y.args)
                        .all(|(v, w)| self.expression(v, w))
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::yul::YulParser;

    fn block(src: &str) -> Block {
        YulParser::parse_block(src).unwrap()
    }

    #[test]
    fn renaming() {
        assert!(SyntacticallyEqual::blocks(
            &block("{ let x := 1 sstore(x, y) }"),
            &block("{ let a := 1 sstore(a, y) }"),
        ));
        assert!(!SyntacticallyEqual::blocks(
            &block("{ let x := 1 sstore(x, y) }"),
            &block("{ let a := 1 sstore(a, z) }"),
        ));
        assert!(!SyntacticallyEqual::blocks(
            &block("{ let x, y := f() sstore(x, y) }"),
            &block("{ let x, y := f() sstore(y, x) }"),
        ));
    }

    #[test]
    fn functions() {
        let code = block(
            "{
                function f(a) -> r { r := add(a, 1) }
                function g(b) -> s { s := add(b, 1) }
                function h(b) -> s { s := add(1, b) }
            }",
        );
        let defs: Vec<_> = code
            .statements
            .iter()
            .filter_map(Statement::as_function)
            .collect();

        assert!(SyntacticallyEqual::functions(defs[0], defs[1]));
        assert!(!SyntacticallyEqual::functions(defs[0], defs[2]));
    }

    #[test]
    fn recursion_through_own_name() {
        let code = block(
            "{
                function f(a) { f(a) }
                function g(b) { g(b) }
            }",
        );
        let defs: Vec<_> = code
            .statements
            .iter()
            .filter_map(Statement::as_function)
            .collect();

        assert!(SyntacticallyEqual::functions(defs[0], defs[1]));
    }
}
