use std::collections::{BTreeMap, HashMap};

use crate::analysis::{CallGraph, CodeSize, Declarations, References};
use crate::passes::names::NameDispenser;
use crate::passes::{Pass, PassContext};
use crate::utils::rewrite::{
    for_each_block_mut, rewrite_statements, take_statement, Renamer,
    Replacement,
};
use crate::yul::ast::*;
use crate::yul::visitor::{self, Visitor, VisitorMut};

/// Functions at most this large are inlined at every call site.
const INLINE_THRESHOLD: usize = 6;

/// Replaces calls at statement level by a copy of the called function's
/// body with every declared name made fresh:
///
/// ```text
/// x := f(a, 1)
/// ```
///
/// becomes
///
/// ```text
/// {
///     let p_2 := 1
///     let p_1 := a
///     let r_3 := 0
///     ... body of f ...
///     x := r_3
/// }
/// ```
pub struct FullInliner;

impl Pass for FullInliner {
    const NAME: &'static str = "FullInliner";

    fn run(ctx: &mut PassContext, ast: &mut Block) {
        let recursive = CallGraph::new(ast).recursive_functions();
        let refs = References::of_block(ast);

        let mut collector = Collector::default();
        collector.visit_block(ast);

        let candidates: HashMap<Name, FunctionDefinition> = collector
            .functions
            .into_iter()
            .filter(|(name, def)| {
                !recursive.contains(name)
                    && !contains_leave(&def.body)
                    && !declares_reserved(ctx, def)
                    && (CodeSize::function_size(def) <= INLINE_THRESHOLD
                        || refs.calls(name) == 1)
            })
            .collect();

        if candidates.is_empty() {
            return;
        }

        let names = &mut ctx.dispenser;

        for_each_block_mut(ast, &mut |block| {
            rewrite_statements(&mut block.statements, |stmt| {
                inline_call(stmt, &candidates, names)
            })
        });
    }
}

fn inline_call(
    stmt: &mut Statement,
    candidates: &HashMap<Name, FunctionDefinition>,
    names: &mut NameDispenser,
) -> Option<Replacement> {
    let (targets, value) = match &*stmt {
        Statement::Expression(expr) => (None, expr),
        Statement::Assignment(assignment) => {
            (Some(&assignment.names), &assignment.value)
        }
        Statement::VariableDeclaration(VariableDeclaration {
            names: targets,
            value: Some(value),
        }) => (Some(targets), value),
        _ => return None,
    };

    let call = value.as_call()?;
    let def = candidates.get(&call.name)?;

    if call.args.len() != def.params.len() {
        return None;
    }

    let mut renaming = HashMap::new();
    let decls = Declarations::of_block(&def.body);

    for name in def
        .params
        .iter()
        .chain(&def.returns)
        .chain(&decls.variables)
        .chain(&decls.functions)
    {
        renaming.insert(name.clone(), names.new_name(name));
    }

    let mut inlined = Vec::new();

    for (param, arg) in def.params.iter().zip(&call.args).rev() {
        inlined.push(Statement::declare(renaming[param].clone(), arg.clone()));
    }

    for ret in &def.returns {
        inlined.push(Statement::declare(
            renaming[ret].clone(),
            Expression::Literal(Literal::zero()),
        ));
    }

    let mut body = def.body.clone();
    Renamer::new(&renaming).visit_block(&mut body);
    inlined.extend(body.statements);

    let mut replacement = Replacement::new();

    if let Some(targets) = targets {
        for (target, ret) in targets.iter().zip(&def.returns) {
            inlined.push(Statement::assign(
                target.clone(),
                Expression::Identifier(renaming[ret].clone()),
            ));
        }

        if let Statement::VariableDeclaration(decl) = take_statement(stmt) {
            replacement.push(Statement::VariableDeclaration(
                VariableDeclaration {
                    names: decl.names,
                    value: None,
                },
            ));
        }
    }

    replacement.push(Statement::Block(Block::new(inlined)));

    Some(replacement)
}

fn declares_reserved(ctx: &PassContext, def: &FunctionDefinition) -> bool {
    let decls = Declarations::of_block(&def.body);

    def.params
        .iter()
        .chain(&def.returns)
        .chain(&decls.variables)
        .chain(&decls.functions)
        .any(|name| ctx.is_reserved(name))
}

/// Whether a `leave` returns from the function owning the block.
fn contains_leave(block: &Block) -> bool {
    block.statements.iter().any(|stmt| match stmt {
        Statement::Leave => true,
        Statement::If(stmt) => contains_leave(&stmt.body),
        Statement::Switch(switch) => {
            switch.cases.iter().any(|case| contains_leave(&case.body))
        }
        Statement::ForLoop(for_loop) => {
            contains_leave(&for_loop.pre)
                || contains_leave(&for_loop.body)
                || contains_leave(&for_loop.post)
        }
        Statement::Block(block) => contains_leave(block),
        _ => false,
    })
}

#[derive(Default)]
struct Collector {
    functions: BTreeMap<Name, FunctionDefinition>,
}

impl<'ast> Visitor<'ast> for Collector {
    fn visit_function_definition(&mut self, def: &'ast FunctionDefinition) {
        self.functions.insert(def.name.clone(), def.clone());

        visitor::visit_function_definition(self, def)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::testing::{apply, check, parse};
    use crate::yul::printer::print;

    #[test]
    fn inlines_statement_calls() {
        check::<FullInliner>(
            "{
                let a := calldataload(0)
                let x := f(a, 1)
                g(x)
                function f(p, q) -> r { let t := add(p, q) r := mul(t, 2) }
                function g(v) { sstore(v, v) }
            }",
            "{
                let a := calldataload(0)
                let x
                {
                    let q_2 := 1
                    let p_1 := a
                    let r_3 := 0
                    let t_4 := add(p_1, q_2)
                    r_3 := mul(t_4, 2)
                    x := r_3
                }
                {
                    let v_5 := x
                    sstore(v_5, v_5)
                }
                function f(p, q) -> r { let t := add(p, q) r := mul(t, 2) }
                function g(v) { sstore(v, v) }
            }",
        );
    }

    #[test]
    fn skips_leave_recursion_and_nested_calls() {
        let src = "{
            sstore(0, f(1))
            let y := h(2)
            k()
            function f(a) -> r { r := a }
            function h(b) -> s { s := b if b { leave } }
            function k() { k() }
        }";

        assert_eq!(print(&apply::<FullInliner>(src, &[])), print(&parse(src)));
    }

    #[test]
    fn skips_reserved_declarations() {
        let src = "{ f() function f() { let keep := 1 sstore(keep, 0) } }";

        assert_eq!(
            print(&apply::<FullInliner>(src, &["keep"])),
            print(&parse(src))
        );
    }
}
