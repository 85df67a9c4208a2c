use std::collections::{BTreeSet, HashMap};
use std::mem;

use crate::passes::names::strip_suffix;
use crate::passes::{Pass, PassContext};
use crate::utils::rewrite::Renamer;
use crate::yul::ast::*;
use crate::yul::visitor::{self, Visitor, VisitorMut};

/// Gives variables short names again once names no longer need to be
/// unique: numeric suffixes are dropped where that causes no clash inside
/// the function declaring the variable.
///
/// Function names, builtins and reserved names are never taken, and
/// reserved variables keep their names. Not part of the step alphabet: the
/// suite runs it once at the very end.
pub struct VarNameCleaner;

impl Pass for VarNameCleaner {
    const NAME: &'static str = "VarNameCleaner";

    fn run(ctx: &mut PassContext, ast: &mut Block) {
        let mut scopes = ScopeCollector::default();
        scopes.visit_block(ast);
        scopes.variables.push(mem::take(&mut scopes.current));

        let mut taken: BTreeSet<Name> = ctx.dialect.fixed_function_names();
        taken.extend(scopes.functions.iter().cloned());
        taken.extend(ctx.reserved.iter().cloned());

        let mut renaming = HashMap::new();

        for variables in &scopes.variables {
            let mut used: BTreeSet<Name> = variables
                .iter()
                .filter(|name| ctx.is_reserved(name))
                .cloned()
                .collect();

            for name in variables {
                if ctx.is_reserved(name) {
                    continue;
                }

                let base = strip_suffix(name);
                let mut candidate = base.to_owned();
                let mut suffix = 0;

                while taken.contains(&candidate) || used.contains(&candidate) {
                    suffix += 1;
                    candidate = format!("{base}_{suffix}");
                }

                used.insert(candidate.clone());

                if candidate != *name {
                    renaming.insert(name.clone(), candidate);
                }
            }
        }

        Renamer::new(&renaming).visit_block(ast);
    }
}

/// Variables in declaration order, one list for every function. Variables
/// of the top-level code are left in `current`.
#[derive(Default)]
struct ScopeCollector {
    functions: Vec<Name>,
    variables: Vec<Vec<Name>>,
    current: Vec<Name>,
}

impl<'ast> Visitor<'ast> for ScopeCollector {
    fn visit_statement(&mut self, stmt: &'ast Statement) {
        if let Statement::VariableDeclaration(decl) = stmt {
            self.current.extend(decl.names.iter().cloned());
        }

        visitor::visit_statement(self, stmt)
    }

    fn visit_function_definition(&mut self, def: &'ast FunctionDefinition) {
        self.functions.push(def.name.clone());

        let outer = mem::replace(
            &mut self.current,
            def.params.iter().chain(&def.returns).cloned().collect(),
        );

        visitor::visit_function_definition(self, def);

        let variables = mem::replace(&mut self.current, outer);
        self.variables.push(variables);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::testing::{apply, check, parse};
    use crate::yul::printer::print;

    #[test]
    fn strips_suffixes() {
        check::<VarNameCleaner>(
            "{
                let x_1 := 1
                let x_2 := x_1
                let y_7 := f_3(x_2)
                function f_3(x_4) -> x_5 { let f := x_4 x_5 := f }
            }",
            "{
                let x := 1
                let x_1 := x
                let y := f_3(x_1)
                function f_3(x) -> x_1 { let f := x x_1 := f }
            }",
        );
    }

    #[test]
    fn keeps_reserved() {
        let ast = apply::<VarNameCleaner>(
            "{ let x_1 := 1 let x := x_1 sstore(x, x_1) }",
            &["x_1"],
        );

        assert_eq!(
            print(&ast),
            print(&parse("{ let x_1 := 1 let x := x_1 sstore(x, x_1) }"))
        );
    }
}
