//! Replacing variables by the values they are known to hold.

use crate::analysis::semantics::is_movable;
use crate::analysis::References;
use crate::dialect::Dialect;
use crate::passes::dataflow::{walk_block, DataFlow, Knowledge};
use crate::passes::{Pass, PassContext};
use crate::yul::ast::*;

/// Replaces reads of variables holding a literal, another variable, or a
/// movable expression that is read only once.
pub struct Rematerialiser;

impl Pass for Rematerialiser {
    const NAME: &'static str = "Rematerialiser";

    fn run(ctx: &mut PassContext, ast: &mut Block) {
        let refs = References::of_block(ast);

        walk_block(
            &mut Propagator {
                dialect: ctx.dialect,
                refs: Some(&refs),
                knowledge: Knowledge::default(),
            },
            ast,
        );
    }
}

/// Replaces reads of variables holding a literal.
pub struct LiteralRematerialiser;

impl Pass for LiteralRematerialiser {
    const NAME: &'static str = "LiteralRematerialiser";

    fn run(ctx: &mut PassContext, ast: &mut Block) {
        walk_block(
            &mut Propagator {
                dialect: ctx.dialect,
                refs: None,
                knowledge: Knowledge::default(),
            },
            ast,
        );
    }
}

struct Propagator<'a> {
    dialect: &'a Dialect,
    /// References of the whole tree, absent when only literals propagate.
    refs: Option<&'a References>,
    knowledge: Knowledge,
}

impl Propagator<'_> {
    fn propagates(&self, name: &Name, value: &Expression) -> bool {
        let Some(refs) = self.refs else {
            return matches!(value, Expression::Literal(_));
        };

        match value {
            Expression::Literal(_) => true,
            Expression::Identifier(source) => source != name,
            Expression::FunctionCall(_) => {
                refs.reads(name) == 1
                    && !refs.is_assigned(name)
                    && is_movable(self.dialect, value)
                    && References::of_expression(value).reads(name) == 0
            }
        }
    }
}

impl DataFlow for Propagator<'_> {
    fn knowledge(&mut self) -> &mut Knowledge {
        &mut self.knowledge
    }

    fn rewrite(&mut self, expr: &mut Expression) {
        match expr {
            Expression::Identifier(name) => {
                if let Some(value) = self.knowledge.value_of(name) {
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
        let [name] = names else {
            return;
        };

        let value = match value {
            Some(value) => value.clone(),
            None => Expression::Literal(Literal::zero()),
        };

        if self.propagates(name, &value) {
            self.knowledge.record(name.clone(), value);
        }
    }
}
