use std::mem;

use smallvec::smallvec;

use crate::analysis::semantics::is_side_effect_free;
use crate::dialect::Dialect;
use crate::passes::{Pass, PassContext};
use crate::utils::rewrite::{
    for_each_block_mut, rewrite_statements, Replacement,
};
use crate::yul::ast::*;

/// Removes empty conditionals and lowers switches with at most one case.
pub struct ControlFlowSimplifier;

impl Pass for ControlFlowSimplifier {
    const NAME: &'static str = "ControlFlowSimplifier";

    fn run(ctx: &mut PassContext, ast: &mut Block) {
        let dialect = ctx.dialect;

        for_each_block_mut(ast, &mut |block| {
            rewrite_statements(&mut block.statements, |stmt| match &*stmt {
                Statement::If(cond) if cond.body.is_empty() => {
                    evaluate_for_effect(dialect, cond.condition.clone())
                        .ok()
                        .map(|discarded| discarded.into_iter().collect())
                }
                Statement::Switch(_) => simplify_switch(dialect, stmt),
                _ => None,
            })
        });
    }
}

fn simplify_switch(
    dialect: &Dialect,
    stmt: &mut Statement,
) -> Option<Replacement> {
    let Statement::Switch(switch) = stmt else {
        return None;
    };

    let has_empty_default = switch
        .cases
        .iter()
        .any(|case| case.value.is_none() && case.body.is_empty());

    if has_empty_default {
        switch.cases.retain(|case| case.value.is_some());
    }

    if switch.cases.iter().all(|case| case.value.is_some()) {
        switch.cases.retain(|case| !case.body.is_empty());
    }

    match &mut switch.cases[..] {
        [] => {
            let expr = switch.expression.clone();

            match evaluate_for_effect(dialect, expr) {
                Ok(None) => Some(Replacement::new()),
                Ok(Some(discarded)) => Some(smallvec![discarded]),
                // Keep the empty switch as the only place evaluating the
                // expression.
                Err(()) => None,
            }
        }
        [case] if case.value.is_none() => {
            let expr = switch.expression.clone();
            let discarded = evaluate_for_effect(dialect, expr).ok()?;

            let mut replacement: Replacement = discarded.into_iter().collect();
            replacement.push(Statement::Block(mem::take(&mut case.body)));

            Some(replacement)
        }
        [case] => {
            let equality = dialect.equality()?;
            let value = case.value.clone()?;

            Some(smallvec![Statement::If(If {
                condition: Expression::call(
                    equality,
                    vec![switch.expression.clone(), Expression::Literal(value)],
                ),
                body: mem::take(&mut case.body),
            })])
        }
        _ => None,
    }
}

/// Statement evaluating an expression only for its effects: nothing if it has
/// none, a call to the discarding builtin otherwise. Fails if the dialect
/// cannot discard values.
fn evaluate_for_effect(
    dialect: &Dialect,
    expr: Expression,
) -> Result<Option<Statement>, ()> {
    if is_side_effect_free(dialect, &expr) {
        return Ok(None);
    }

    let discard = dialect.discard().ok_or(())?;

    Ok(Some(Statement::Expression(Expression::call(discard, vec![expr]))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::testing::check;

    #[test]
    fn empty_conditionals() {
        check::<ControlFlowSimplifier>(
            "{ if calldataload(0) { } if f() { } function f() -> r { } }",
            "{ pop(f()) function f() -> r { } }",
        );
    }

    #[test]
    fn switches() {
        check::<ControlFlowSimplifier>(
            "{
                let x := calldataload(0)
                switch x case 0 { } default { }
                switch x case 1 { sstore(0, 1) } default { }
                switch x default { sstore(0, 2) }
                switch sload(x) case 3 { } case 4 { sstore(0, 4) }
            }",
            "{
                let x := calldataload(0)
                if eq(x, 1) { sstore(0, 1) }
                { sstore(0, 2) }
                if eq(sload(x), 4) { sstore(0, 4) }
            }",
        );
    }
}
