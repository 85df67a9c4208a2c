use std::collections::{BTreeSet, HashMap, HashSet};

use crate::dialect::Dialect;
use crate::passes::names::NameDispenser;
use crate::passes::{Pass, PassContext};
use crate::yul::ast::*;

/// Renames declarations so that no name is declared twice anywhere in the
/// tree. The first declaration of a name and declarations of reserved names
/// keep their name; references are resolved through the scopes in which
/// they occur.
///
/// Not part of the step alphabet: the suite runs it once before any other
/// pass, which all rely on names being unique.
pub struct Disambiguator;

impl Pass for Disambiguator {
    const NAME: &'static str = "Disambiguator";

    fn run(ctx: &mut PassContext, ast: &mut Block) {
        Scopes::new(&mut ctx.dispenser, ctx.reserved).block(ast);
    }
}

impl Disambiguator {
    /// Disambiguates with a dispenser of its own, for use before a
    /// [`PassContext`] exists.
    pub fn disambiguate(
        dialect: &Dialect,
        ast: &mut Block,
        reserved: &BTreeSet<Name>,
    ) {
        let mut names = NameDispenser::new(dialect, ast, reserved);

        Scopes::new(&mut names, reserved).block(ast);
    }
}

struct Scopes<'a> {
    names: &'a mut NameDispenser,
    reserved: &'a BTreeSet<Name>,
    declared: HashSet<Name>,
    /// Original to new name, innermost scope last.
    scopes: Vec<HashMap<Name, Name>>,
}

impl<'a> Scopes<'a> {
    fn new(
        names: &'a mut NameDispenser,
        reserved: &'a BTreeSet<Name>,
    ) -> Scopes<'a> {
        Scopes {
            names,
            reserved,
            declared: HashSet::new(),
            scopes: Vec::new(),
        }
    }

    fn declare(&mut self, name: &mut Name) {
        let renamed = if self.reserved.contains(name)
            || self.declared.insert(name.clone())
        {
            name.clone()
        } else {
            self.names.new_name(name)
        };

        self.scopes
            .last_mut()
            .expect("declaration outside of a scope")
            .insert(name.clone(), renamed.clone());

        *name = renamed;
    }

    fn resolve(&self, name: &mut Name) {
        let renamed = self
            .scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name.as_str()));

        if let Some(renamed) = renamed {
            name.clone_from(renamed);
        }
    }

    fn block(&mut self, block: &mut Block) {
        self.scopes.push(HashMap::new());
        self.statements(block);
        self.scopes.pop();
    }

    /// Walks statements in the current scope.
    fn statements(&mut self, block: &mut Block) {
        for stmt in &mut block.statements {
            if let Statement::FunctionDefinition(def) = stmt {
                self.declare(&mut def.name);
            }
        }

        for stmt in &mut block.statements {
            self.statement(stmt);
        }
    }

    fn statement(&mut self, stmt: &mut Statement) {
        match stmt {
            Statement::Expression(expr) => self.expression(expr),
            Statement::Assignment(assignment) => {
                self.expression(&mut assignment.value);

                for name in &mut assignment.names {
                    self.resolve(name);
                }
            }
            Statement::VariableDeclaration(decl) => {
                if let Some(value) = &mut decl.value {
                    self.expression(value);
                }

                for name in &mut decl.names {
                    self.declare(name);
                }
            }
            Statement::FunctionDefinition(def) => {
                self.scopes.push(HashMap::new());

                for name in def.params.iter_mut().chain(&mut def.returns) {
                    self.declare(name);
                }

                self.block(&mut def.body);
                self.scopes.pop();
            }
            Statement::If(stmt) => {
                self.expression(&mut stmt.condition);
                self.block(&mut stmt.body);
            }
            Statement::Switch(switch) => {
                self.expression(&mut switch.expression);

                for case in &mut switch.cases {
                    self.block(&mut case.body);
                }
            }
            Statement::ForLoop(for_loop) => {
                self.scopes.push(HashMap::new());
                self.statements(&mut for_loop.pre);
                self.expression(&mut for_loop.condition);
                self.block(&mut for_loop.body);
                self.block(&mut for_loop.post);
                self.scopes.pop();
            }
            Statement::Break | Statement::Continue | Statement::Leave => {}
            Statement::Block(block) => self.block(block),
        }
    }

    fn expression(&mut self, expr: &mut Expression) {
        match expr {
            Expression::Identifier(name) => self.resolve(name),
            Expression::FunctionCall(call) => {
                self.resolve(&mut call.name);

                for arg in &mut call.args {
                    self.expression(arg);
                }
            }
            Expression::Literal(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::testing::{apply, check, parse};
    use crate::yul::printer::print;

    const SHADOWED: &str = "{
        { let x := 1 sstore(x, 0) }
        { let x := 2 sstore(x, f(x)) }
        function f(x) -> y { y := g(x) function g(x) -> y { y := x } }
    }";

    #[test]
    fn makes_names_unique() {
        check::<Disambiguator>(
            SHADOWED,
            "{
                { let x := 1 sstore(x, 0) }
                { let x_1 := 2 sstore(x_1, f(x_1)) }
                function f(x_2) -> y {
                    y := g(x_2)
                    function g(x_3) -> y_4 { y_4 := x_3 }
                }
            }",
        );
    }

    #[test]
    fn is_idempotent() {
        let once = apply::<Disambiguator>(SHADOWED, &[]);
        let twice = apply::<Disambiguator>(&print(&once), &[]);

        assert_eq!(print(&once), print(&twice));
    }

    #[test]
    fn reserved_names_are_kept() {
        let ast = apply::<Disambiguator>(
            "{ { let x := 1 sstore(x, 0) } { let x := 2 sstore(x, 1) } }",
            &["x"],
        );

        assert_eq!(
            print(&ast),
            print(&parse(
                "{ { let x := 1 sstore(x, 0) } { let x := 2 sstore(x, 1) } }"
            ))
        );
    }
}
