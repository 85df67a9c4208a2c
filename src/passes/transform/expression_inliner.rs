use std::collections::HashMap;

use crate::analysis::semantics::is_movable;
use crate::analysis::{CallGraph, References};
use crate::dialect::Dialect;
use crate::passes::{Pass, PassContext};
use crate::utils::rewrite::substitute;
use crate::yul::ast::*;
use crate::yul::visitor::{self, VisitorMut};

/// Inlines calls to functions of the form
/// `function f(a, b) -> r { r := e }` where every argument is movable.
pub struct ExpressionInliner;

impl Pass for ExpressionInliner {
    const NAME: &'static str = "ExpressionInliner";

    fn run(ctx: &mut PassContext, ast: &mut Block) {
        let recursive = CallGraph::new(ast).recursive_functions();

        let candidates: HashMap<Name, FunctionDefinition> = ast
            .statements
            .iter()
            .filter_map(Statement::as_function)
            .filter(|def| !recursive.contains(&def.name))
            .filter(|def| {
                def.params
                    .iter()
                    .chain(&def.returns)
                    .all(|name| !ctx.is_reserved(name))
            })
            .filter(|def| single_expression(def).is_some())
            .map(|def| (def.name.clone(), def.clone()))
            .collect();

        if candidates.is_empty() {
            return;
        }

        Inliner {
            dialect: ctx.dialect,
            candidates: &candidates,
        }
        .visit_block(ast);
    }
}

/// The returned expression of a function consisting of a single assignment
/// to its only return variable.
fn single_expression(def: &FunctionDefinition) -> Option<&Expression> {
    let [ret] = &def.returns[..] else {
        return None;
    };

    let [Statement::Assignment(assignment)] = &def.body.statements[..] else {
        return None;
    };

    match &assignment.names[..] {
        [name] if name == ret => {}
        _ => return None,
    }

    let refs = References::of_expression(&assignment.value);

    (refs.reads(ret) == 0).then_some(&assignment.value)
}

struct Inliner<'a> {
    dialect: &'a Dialect,
    candidates: &'a HashMap<Name, FunctionDefinition>,
}

impl Inliner<'_> {
    fn inline(&self, call: &FunctionCall) -> Option<Expression> {
        let def = self.candidates.get(&call.name)?;
        let body = single_expression(def)?;
        let refs = References::of_expression(body);

        if call.args.len() != def.params.len() {
            return None;
        }

        let substitutable =
            call.args.iter().zip(&def.params).all(|(arg, param)| {
                is_movable(self.dialect, arg)
                    && (arg.is_atomic() || refs.reads(param) <= 1)
            });

        if !substitutable {
            return None;
        }

        let values: HashMap<Name, Expression> = def
            .params
            .iter()
            .cloned()
            .zip(call.args.iter().cloned())
            .collect();

        let mut inlined = body.clone();
        substitute(&mut inlined, &values);

        Some(inlined)
    }
}

impl VisitorMut for Inliner<'_> {
    fn visit_expression(&mut self, expr: &mut Expression) {
        visitor::visit_expression_mut(self, expr);

        if let Expression::FunctionCall(call) = expr {
            if let Some(inlined) = self.inline(call) {
                *expr = inlined;
            }
        }
    }
}
