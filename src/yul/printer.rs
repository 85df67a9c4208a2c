//! Pretty-printing.

use std::fmt;

use itertools::Itertools;
use pretty::{Arena, DocAllocator, DocBuilder};

use super::ast::*;

const STANDARD_INDENT: isize = 4;
const DEFAULT_WIDTH: usize = 80;

pub struct Printer<'ast> {
    object: Option<&'ast str>,
    code: &'ast Block,
    width: usize,
}

impl<'ast> Printer<'ast> {
    pub fn new(code: &'ast Block, width: usize) -> Printer<'ast> {
        Printer {
            object: None,
            code,
            width,
        }
    }

    pub fn object(object: &'ast Object, width: usize) -> Printer<'ast> {
        Printer {
            object: Some(&object.name),
            code: &object.code,
            width,
        }
    }
}

/// Renders a block with the default width.
pub fn print(code: &Block) -> String {
    Printer::new(code, DEFAULT_WIDTH).to_string()
}

impl fmt::Display for Printer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let arena = Arena::<()>::new();

        let doc = match self.object {
            Some(name) => arena
                .text("object \"")
                .append(name)
                .append("\" {")
                .append(
                    arena
                        .hardline()
                        .append("code ")
                        .append(self.code.pretty(&arena))
                        .nest(STANDARD_INDENT),
                )
                .append(arena.hardline())
                .append("}"),
            None => self.code.pretty(&arena),
        };

        doc.append(arena.hardline()).render_fmt(self.width, f)
    }
}

impl Block {
    fn pretty<'a, D, A>(&'a self, allocator: &'a D) -> DocBuilder<'a, D, A>
    where
        D: DocAllocator<'a, A>,
        D::Doc: Clone,
        A: Clone,
    {
        if self.statements.is_empty() {
            return allocator.text("{ }");
        }

        allocator
            .text("{")
            .append(
                allocator
                    .hardline()
                    .append(allocator.intersperse(
                        self.statements.iter().map(|stmt| stmt.pretty(allocator)),
                        allocator.hardline(),
                    ))
                    .nest(STANDARD_INDENT),
            )
            .append(allocator.hardline())
            .append("}")
    }
}

impl Statement {
    fn pretty<'a, D, A>(&'a self, allocator: &'a D) -> DocBuilder<'a, D, A>
    where
        D: DocAllocator<'a, A>,
        D::Doc: Clone,
        A: Clone,
    {
        match self {
            Statement::Expression(expr) => expr.pretty(allocator),
            Statement::Assignment(assignment) => allocator
                .text(assignment.names.iter().join(", "))
                .append(" := ")
                .append(assignment.value.pretty(allocator)),
            Statement::VariableDeclaration(decl) => {
                let names = allocator
                    .text("let ")
                    .append(decl.names.iter().join(", "));

                match &decl.value {
                    Some(value) => {
                        names.append(" := ").append(value.pretty(allocator))
                    }
                    None => names,
                }
            }
            Statement::FunctionDefinition(def) => {
                let returns = if def.returns.is_empty() {
                    allocator.nil()
                } else {
                    allocator
                        .text(" -> ")
                        .append(def.returns.iter().join(", "))
                };

                allocator
                    .text("function ")
                    .append(def.name.as_str())
                    .append(
                        allocator.text(def.params.iter().join(", ")).parens(),
                    )
                    .append(returns)
                    .append(allocator.space())
                    .append(def.body.pretty(allocator))
            }
            Statement::If(stmt) => allocator
                .text("if ")
                .append(stmt.condition.pretty(allocator))
                .append(allocator.space())
                .append(stmt.body.pretty(allocator)),
            Statement::Switch(switch) => allocator
                .text("switch ")
                .append(switch.expression.pretty(allocator))
                .append(allocator.concat(switch.cases.iter().map(|case| {
                    let label = match &case.value {
                        Some(value) => {
                            allocator.text("case ").append(value.to_string())
                        }
                        None => allocator.text("default"),
                    };

                    allocator
                        .hardline()
                        .append(label)
                        .append(allocator.space())
                        .append(case.body.pretty(allocator))
                }))),
            Statement::ForLoop(for_loop) => allocator
                .text("for ")
                .append(for_loop.pre.pretty(allocator))
                .append(allocator.space())
                .append(for_loop.condition.pretty(allocator))
                .append(allocator.space())
                .append(for_loop.post.pretty(allocator))
                .append(allocator.space())
                .append(for_loop.body.pretty(allocator)),
            Statement::Break => allocator.text("break"),
            Statement::Continue => allocator.text("continue"),
            Statement::Leave => allocator.text("leave"),
            Statement::Block(block) => block.pretty(allocator),
        }
    }
}

impl Expression {
    fn pretty<'a, D, A>(&'a self, allocator: &'a D) -> DocBuilder<'a, D, A>
    where
        D: DocAllocator<'a, A>,
        D::Doc: Clone,
        A: Clone,
    {
        match self {
            Expression::Literal(lit) => allocator.text(lit.to_string()),
            Expression::Identifier(name) => allocator.text(name.as_str()),
            Expression::FunctionCall(call) => {
                allocator.text(call.name.as_str()).append(
                    allocator
                        .intersperse(
                            call.args.iter().map(|arg| arg.pretty(allocator)),
                            allocator.text(", "),
                        )
                        .parens(),
                )
            }
        }
    }
}
