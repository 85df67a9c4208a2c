use std::collections::HashMap;

use crate::analysis::SyntacticallyEqual;
use crate::passes::{Pass, PassContext};
use crate::yul::ast::*;
use crate::yul::visitor::{self, VisitorMut};

/// Redirects calls of a function to an earlier function with the same code.
/// The unused duplicates are left for [`super::UnusedPruner`].
pub struct EquivalentFunctionCombiner;

impl Pass for EquivalentFunctionCombiner {
    const NAME: &'static str = "EquivalentFunctionCombiner";

    fn run(ctx: &mut PassContext, ast: &mut Block) {
        let functions: Vec<&FunctionDefinition> = ast
            .statements
            .iter()
            .filter_map(Statement::as_function)
            .collect();

        let mut replacements: HashMap<Name, Name> = HashMap::new();

        for (i, def) in functions.iter().enumerate() {
            if ctx.is_reserved(&def.name) {
                continue;
            }

            let original = functions[..i].iter().find(|earlier| {
                !replacements.contains_key(&earlier.name)
                    && SyntacticallyEqual::functions(earlier, def)
            });

            if let Some(original) = original {
                replacements.insert(def.name.clone(), original.name.clone());
            }
        }

        if !replacements.is_empty() {
            CallRedirector(&replacements).visit_block(ast);
        }
    }
}

struct CallRedirector<'a>(&'a HashMap<Name, Name>);

impl VisitorMut for CallRedirector<'_> {
    fn visit_expression(&mut self, expr: &mut Expression) {
        if let Expression::FunctionCall(call) = expr {
            if let Some(target) = self.0.get(&call.name) {
                call.name.clone_from(target);
            }
        }

        visitor::visit_expression_mut(self, expr)
    }
}
