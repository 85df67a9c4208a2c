use smallvec::smallvec;

use crate::analysis::semantics::is_side_effect_free;
use crate::analysis::References;
use crate::passes::{Pass, PassContext};
use crate::utils::rewrite::{
    for_each_block_mut, rewrite_statements, Replacement,
};
use crate::yul::ast::*;

/// Removes functions that are never called, variables that are never used
/// and expression statements without effect, until nothing else can go.
///
/// A declaration of a single unused variable whose value has side effects
/// is turned into an expression statement discarding the value.
pub struct UnusedPruner;

impl Pass for UnusedPruner {
    const NAME: &'static str = "UnusedPruner";

    fn run(ctx: &mut PassContext, ast: &mut Block) {
        while prune(ctx, ast) {}
    }
}

/// One pruning round. Returns whether anything was removed.
fn prune(ctx: &PassContext, ast: &mut Block) -> bool {
    let refs = References::of_block(ast);
    let unused = |name: &Name| {
        refs.uses(name) == 0
            && !refs.is_assigned(name)
            && !ctx.is_reserved(name)
    };

    let mut changed = false;

    for_each_block_mut(ast, &mut |block| {
        rewrite_statements(&mut block.statements, |stmt| {
            let replacement = prune_statement(ctx, stmt, &unused)?;

            changed = true;
            Some(replacement)
        })
    });

    changed
}

fn prune_statement<F>(
    ctx: &PassContext,
    stmt: &mut Statement,
    unused: &F,
) -> Option<Replacement>
where
    F: Fn(&Name) -> bool,
{
    match stmt {
        Statement::FunctionDefinition(def) if unused(&def.name) => {
            Some(Replacement::new())
        }
        Statement::Expression(expr)
            if is_side_effect_free(ctx.dialect, expr) =>
        {
            Some(Replacement::new())
        }
        Statement::VariableDeclaration(decl)
            if decl.names.iter().all(|name| unused(name)) =>
        {
            let value = match decl.value.take() {
                Some(value) if !is_side_effect_free(ctx.dialect, &value) => {
                    value
                }
                _ => return Some(Replacement::new()),
            };

            match (ctx.dialect.discard(), &decl.names[..]) {
                (Some(discard), [_]) => {
                    Some(smallvec![Statement::Expression(Expression::call(
                        discard,
                        vec![value]
                    ))])
                }
                _ => {
                    decl.value = Some(value);
                    None
                }
            }
        }
        _ => None,
    }
}
