use std::collections::{BTreeMap, BTreeSet};

use crate::yul::ast::*;
use crate::yul::visitor::{self, Visitor};

/// Counts how often each name is read, called or assigned to.
#[derive(Debug, Default)]
pub struct References {
    reads: BTreeMap<Name, usize>,
    calls: BTreeMap<Name, usize>,
    assigned: BTreeSet<Name>,
}

impl References {
    pub fn of_block(block: &Block) -> References {
        let mut refs = References::default();
        refs.visit_block(block);
        refs
    }

    pub fn of_statement(stmt: &Statement) -> References {
        let mut refs = References::default();
        refs.visit_statement(stmt);
        refs
    }

    pub fn of_expression(expr: &Expression) -> References {
        let mut refs = References::default();
        refs.visit_expression(expr);
        refs
    }

    pub fn reads(&self, name: &str) -> usize {
        self.reads.get(name).copied().unwrap_or(0)
    }

    pub fn calls(&self, name: &str) -> usize {
        self.calls.get(name).copied().unwrap_or(0)
    }

    pub fn uses(&self, name: &str) -> usize {
        self.reads(name) + self.calls(name)
    }

    pub fn is_assigned(&self, name: &str) -> bool {
        self.assigned.contains(name)
    }

    pub fn read_names(&self) -> impl Iterator<Item = &Name> {
        self.reads.keys()
    }

    pub fn assigned_names(&self) -> &BTreeSet<Name> {
        &self.assigned
    }
}

impl<'ast> Visitor<'ast> for References {
    fn visit_statement(&mut self, stmt: &'ast Statement) {
        if let Statement::Assignment(assignment) = stmt {
            self.assigned.extend(assignment.names.iter().cloned());
        }

        visitor::visit_statement(self, stmt)
    }

    fn visit_expression(&mut self, expr: &'ast Expression) {
        match expr {
            Expression::Identifier(name) => {
                *self.reads.entry(name.clone()).or_default() += 1;
            }
            Expression::FunctionCall(call) => {
                *self.calls.entry(call.name.clone()).or_default() += 1;
            }
            Expression::Literal(_) => {}
        }

        visitor::visit_expression(self, expr)
    }
}

/// Names introduced anywhere inside a block.
#[derive(Debug, Default)]
pub struct Declarations {
    pub variables: BTreeSet<Name>,
    pub functions: BTreeSet<Name>,
    /// Number of declarations of every name, parameters included.
    pub counts: BTreeMap<Name, usize>,
}

impl Declarations {
    pub fn of_block(block: &Block) -> Declarations {
        let mut decls = Declarations::default();
        decls.visit_block(block);
        decls
    }

    /// Whether the names `block` declares at its own level are declared
    /// nowhere else in the analyzed code, so the block's scope can be merged
    /// into an enclosing one.
    pub fn only_declared_in(&self, block: &Block) -> bool {
        block.statements.iter().all(|stmt| match stmt {
            Statement::VariableDeclaration(decl) => {
                decl.names.iter().all(|name| self.counts.get(name) == Some(&1))
            }
            Statement::FunctionDefinition(def) => {
                self.counts.get(&def.name) == Some(&1)
            }
            _ => true,
        })
    }

    fn count(&mut self, name: &Name) {
        *self.counts.entry(name.clone()).or_default() += 1;
    }
}

impl<'ast> Visitor<'ast> for Declarations {
    fn visit_statement(&mut self, stmt: &'ast Statement) {
        if let Statement::VariableDeclaration(decl) = stmt {
            self.variables.extend(decl.names.iter().cloned());

            for name in &decl.names {
                self.count(name);
            }
        }

        visitor::visit_statement(self, stmt)
    }

    fn visit_function_definition(&mut self, def: &'ast FunctionDefinition) {
        self.functions.insert(def.name.clone());
        self.variables
            .extend(def.params.iter().chain(&def.returns).cloned());

        self.count(&def.name);

        for name in def.params.iter().chain(&def.returns) {
            self.count(name);
        }

        visitor::visit_function_definition(self, def)
    }
}

/// Every name that occurs in a block, declared or referenced.
pub fn all_names(block: &Block) -> BTreeSet<Name> {
    let decls = Declarations::of_block(block);
    let refs = References::of_block(block);

    decls
        .variables
        .into_iter()
        .chain(decls.functions)
        .chain(refs.reads.into_keys())
        .chain(refs.calls.into_keys())
        .chain(refs.assigned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::yul::YulParser;

    #[test]
    fn counts() {
        let block = YulParser::parse_block(
            "{
                let x := add(y, y)
                x := f(x)
                function f(a) -> r { r := a }
            }",
        )
        .unwrap();

        let refs = References::of_block(&block);

        assert_eq!(refs.reads("y"), 2);
        assert_eq!(refs.reads("x"), 1);
        assert_eq!(refs.calls("f"), 1);
        assert_eq!(refs.uses("add"), 1);
        assert!(refs.is_assigned("x"));
        assert!(refs.is_assigned("r"));
        assert!(!refs.is_assigned("y"));

        let decls = Declarations::of_block(&block);

        assert_eq!(
            decls.variables,
            ["a", "r", "x"].into_iter().map(String::from).collect()
        );
        assert!(decls.functions.contains("f"));
        assert!(all_names(&block).contains("y"));
    }

    #[test]
    fn scopes_merge_only_without_clashes() {
        let block = YulParser::parse_block(
            "{
                { let x := 1 let u := x }
                { let x := 2 }
                { let v := 3 }
            }",
        )
        .unwrap();

        let decls = Declarations::of_block(&block);
        let inner = |i: usize| match &block.statements[i] {
            Statement::Block(inner) => inner,
            _ => unreachable!(),
        };

        assert_eq!(decls.counts["x"], 2);
        assert!(!decls.only_declared_in(inner(0)));
        assert!(!decls.only_declared_in(inner(1)));
        assert!(decls.only_declared_in(inner(2)));
    }
}
