//! Forward propagation of `variable = value` facts.
//!
//! Relies on every declared name being unique, so scoping only matters where
//! a fact would outlive the block that established it.

use std::collections::BTreeSet;
use std::mem;

use crate::analysis::References;
use crate::yul::ast::*;

/// Facts of the form `name = value` holding at the current point.
#[derive(Clone, Debug, Default)]
pub struct Knowledge {
    facts: Vec<(Name, Expression)>,
}

impl Knowledge {
    pub fn value_of(&self, name: &str) -> Option<&Expression> {
        self.facts
            .iter()
            .rev()
            .find(|(var, _)| var == name)
            .map(|(_, value)| value)
    }

    pub fn variable_holding(&self, value: &Expression) -> Option<&Name> {
        self.facts
            .iter()
            .rev()
            .find(|(_, known)| known == value)
            .map(|(var, _)| var)
    }

    pub fn record(&mut self, name: Name, value: Expression) {
        self.forget([&name]);
        self.facts.push((name, value));
    }

    /// Drops every fact mentioning one of the names.
    pub fn forget<'a, I>(&mut self, names: I)
    where
        I: IntoIterator<Item = &'a Name>,
    {
        for name in names {
            self.facts.retain(|(var, value)| {
                var != name && References::of_expression(value).reads(name) == 0
            });
        }
    }
}

pub trait DataFlow {
    fn knowledge(&mut self) -> &mut Knowledge;

    /// Rewrites an expression evaluated at the current point.
    fn rewrite(&mut self, expr: &mut Expression);

    /// Records facts established by declaring or assigning the names.
    fn learn(&mut self, names: &[Name], value: Option<&Expression>);
}

pub fn walk_block<F: DataFlow + ?Sized>(flow: &mut F, block: &mut Block) {
    for stmt in &mut block.statements {
        walk_statement(flow, stmt);
    }
}

pub fn walk_statement<F: DataFlow + ?Sized>(
    flow: &mut F,
    stmt: &mut Statement,
) {
    match stmt {
        Statement::Expression(expr) => flow.rewrite(expr),
        Statement::Assignment(assignment) => {
            flow.rewrite(&mut assignment.value);
            flow.knowledge().forget(&assignment.names);
            flow.learn(&assignment.names, Some(&assignment.value));
        }
        Statement::VariableDeclaration(decl) => {
            if let Some(value) = &mut decl.value {
                flow.rewrite(value);
            }

            flow.knowledge().forget(&decl.names);
            flow.learn(&decl.names, decl.value.as_ref());
        }
        Statement::FunctionDefinition(def) => {
            let outer = mem::take(flow.knowledge());

            walk_block(flow, &mut def.body);

            *flow.knowledge() = outer;
        }
        Statement::If(stmt) => {
            flow.rewrite(&mut stmt.condition);
            walk_nested(flow, &mut stmt.body);
        }
        Statement::Switch(switch) => {
            flow.rewrite(&mut switch.expression);

            for case in &mut switch.cases {
                walk_nested(flow, &mut case.body);
            }
        }
        Statement::ForLoop(for_loop) => {
            let assigned = assigned_in_loop(for_loop);

            flow.knowledge().forget(&assigned);

            let outer = flow.knowledge().clone();

            walk_block(flow, &mut for_loop.pre);
            flow.knowledge().forget(&assigned);

            flow.rewrite(&mut for_loop.condition);
            walk_nested(flow, &mut for_loop.body);
            walk_nested(flow, &mut for_loop.post);

            *flow.knowledge() = outer;
        }
        Statement::Break | Statement::Continue | Statement::Leave => {}
        Statement::Block(block) => walk_nested(flow, block),
    }
}

/// Walks a block that may or may not run, keeping only facts that survive it.
fn walk_nested<F: DataFlow + ?Sized>(flow: &mut F, block: &mut Block) {
    let outer = flow.knowledge().clone();

    walk_block(flow, block);

    *flow.knowledge() = outer;
    flow.knowledge()
        .forget(References::of_block(block).assigned_names());
}

/// Variables assigned anywhere in a loop.
pub fn assigned_in_loop(for_loop: &ForLoop) -> BTreeSet<Name> {
    [&for_loop.pre, &for_loop.body, &for_loop.post]
        .into_iter()
        .flat_map(|block| References::of_block(block).assigned_names().clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::yul::printer::print;
    use crate::yul::YulParser;

    /// Replaces variables by the literals they hold.
    #[derive(Default)]
    struct Literals(Knowledge);

    impl DataFlow for Literals {
        fn knowledge(&mut self) -> &mut Knowledge {
            &mut self.0
        }

        fn rewrite(&mut self, expr: &mut Expression) {
            match expr {
                Expression::Identifier(name) => {
                    if let Some(value) = self.0.value_of(name) {
                        *expr = value.clone();
                    }
                }
                Expression::FunctionCall(call) => {
                    for arg in &mut call.args {
                        self.rewrite(arg);
                    }
                }
                Expression::Literal(_) => {}
            }
        }

        fn learn(&mut self, names: &[Name], value: Option<&Expression>) {
            if let ([name], Some(Expression::Literal(lit))) = (names, value) {
                self.0.record(name.clone(), Expression::Literal(lit.clone()));
            }
        }
    }

    fn propagate(src: &str) -> String {
        let mut block = YulParser::parse_block(src).unwrap();

        walk_block(&mut Literals::default(), &mut block);

        print(&block)
    }

    #[test]
    fn straight_line() {
        assert_eq!(
            propagate("{ let x := 1 sstore(x, x) x := 2 sstore(x, 0) }"),
            "{\n    let x := 1\n    sstore(1, 1)\n    x := 2\n    sstore(2, 0)\n}\n"
        );
    }

    #[test]
    fn branches_invalidate() {
        assert_eq!(
            propagate("{ let x := 1 if y { x := 2 } sstore(x, 0) }"),
            "{\n    let x := 1\n    if y {\n        x := 2\n    }\n    sstore(x, 0)\n}\n"
        );
    }

    #[test]
    fn loops_invalidate() {
        assert_eq!(
            propagate(
                "{ let x := 1 for { } lt(x, 10) { x := add(x, 1) } { sstore(x, 0) } }"
            ),
            print(
                &YulParser::parse_block(
                    "{ let x := 1 for { } lt(x, 10) { x := add(x, 1) } { sstore(x, 0) } }"
                )
                .unwrap()
            )
        );
    }

    #[test]
    fn functions_start_empty() {
        assert_eq!(
            propagate("{ let x := 1 function f(x) { sstore(x, 0) } }"),
            print(
                &YulParser::parse_block(
                    "{ let x := 1 function f(x) { sstore(x, 0) } }"
                )
                .unwrap()
            )
        );
    }
}
