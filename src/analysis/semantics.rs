//! Effect classification of expressions and statements.
//!
//! Calls to user-defined functions are always treated as having unknown
//! effects.

use crate::dialect::{Access, Dialect, Location};
use crate::yul::ast::*;

/// The expression can be evaluated at a different point, duplicated or
/// removed without changing behaviour.
pub fn is_movable(dialect: &Dialect, expr: &Expression) -> bool {
    match expr {
        Expression::Literal(_) | Expression::Identifier(_) => true,
        Expression::FunctionCall(call) => {
            dialect.builtin(&call.name).map_or(false, |b| b.movable)
                && call.args.iter().all(|arg| is_movable(dialect, arg))
        }
    }
}

/// The expression can be removed if its value is unused.
pub fn is_side_effect_free(dialect: &Dialect, expr: &Expression) -> bool {
    match expr {
        Expression::Literal(_) | Expression::Identifier(_) => true,
        Expression::FunctionCall(call) => {
            dialect
                .builtin(&call.name)
                .map_or(false, |b| b.side_effect_free)
                && call
                    .args
                    .iter()
                    .all(|arg| is_side_effect_free(dialect, arg))
        }
    }
}

/// The expression neither writes state nor fails to return, although it may
/// read state.
pub fn is_state_reading(dialect: &Dialect, expr: &Expression) -> bool {
    is_side_effect_free(dialect, expr) && !is_movable(dialect, expr)
}

/// Whether evaluating the expression may write the given location.
pub fn may_write(
    dialect: &Dialect,
    expr: &Expression,
    location: Location,
) -> bool {
    match expr {
        Expression::Literal(_) | Expression::Identifier(_) => false,
        Expression::FunctionCall(call) => {
            let writes = match dialect.builtin(&call.name) {
                Some(builtin) => match builtin.access {
                    Some(Access::Store(loc)) => loc == location,
                    Some(Access::Load(_)) => false,
                    None => !builtin.side_effect_free && !builtin.terminates,
                },
                None => true,
            };

            writes
                || call
                    .args
                    .iter()
                    .any(|arg| may_write(dialect, arg, location))
        }
    }
}

/// Whether the statement may write the given location anywhere inside it.
pub fn statement_may_write(
    dialect: &Dialect,
    stmt: &Statement,
    location: Location,
) -> bool {
    let block = |block: &Block| {
        block
            .statements
            .iter()
            .any(|stmt| statement_may_write(dialect, stmt, location))
    };

    match stmt {
        Statement::Expression(expr) => may_write(dialect, expr, location),
        Statement::Assignment(assignment) => {
            may_write(dialect, &assignment.value, location)
        }
        Statement::VariableDeclaration(decl) => decl
            .value
            .as_ref()
            .map_or(false, |value| may_write(dialect, value, location)),
        Statement::FunctionDefinition(_) => false,
        Statement::If(stmt) => {
            may_write(dialect, &stmt.condition, location) || block(&stmt.body)
        }
        Statement::Switch(switch) => {
            may_write(dialect, &switch.expression, location)
                || switch.cases.iter().any(|case| block(&case.body))
        }
        Statement::ForLoop(for_loop) => {
            block(&for_loop.pre)
                || may_write(dialect, &for_loop.condition, location)
                || block(&for_loop.body)
                || block(&for_loop.post)
        }
        Statement::Break | Statement::Continue | Statement::Leave => false,
        Statement::Block(inner) => block(inner),
    }
}

/// Whether the expression calls a user-defined function.
pub fn contains_user_call(dialect: &Dialect, expr: &Expression) -> bool {
    match expr {
        Expression::Literal(_) | Expression::Identifier(_) => false,
        Expression::FunctionCall(call) => {
            !dialect.is_builtin(&call.name)
                || call.args.iter().any(|arg| contains_user_call(dialect, arg))
        }
    }
}

/// Control never flows from the statement to the next one in the block.
pub fn terminates_control_flow(dialect: &Dialect, stmt: &Statement) -> bool {
    match stmt {
        Statement::Break | Statement::Continue | Statement::Leave => true,
        Statement::Expression(Expression::FunctionCall(call)) => dialect
            .builtin(&call.name)
            .map_or(false, |builtin| builtin.terminates),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        let dialect = Dialect::evm();
        let x = || Expression::identifier("x");

        let sum = Expression::call("add", vec![x(), Expression::number(1u32)]);
        let load = Expression::call("sload", vec![x()]);
        let user = Expression::call("f", vec![x()]);

        assert!(is_movable(&dialect, &sum));
        assert!(!is_movable(&dialect, &load));
        assert!(is_side_effect_free(&dialect, &load));
        assert!(is_state_reading(&dialect, &load));
        assert!(!is_side_effect_free(&dialect, &user));
        assert!(!is_movable(
            &dialect,
            &Expression::call("add", vec![user.clone(), x()])
        ));

        assert!(may_write(&dialect, &user, Location::Storage));
        assert!(!may_write(&dialect, &load, Location::Storage));
        assert!(may_write(
            &dialect,
            &Expression::call("mstore", vec![x(), x()]),
            Location::Memory
        ));
        assert!(!may_write(
            &dialect,
            &Expression::call("mstore", vec![x(), x()]),
            Location::Storage
        ));
    }

    #[test]
    fn terminators() {
        let dialect = Dialect::evm();

        assert!(terminates_control_flow(&dialect, &Statement::Leave));
        assert!(terminates_control_flow(
            &dialect,
            &Statement::Expression(Expression::call(
                "revert",
                vec![Expression::number(0u32), Expression::number(0u32)]
            ))
        ));
        assert!(!terminates_control_flow(
            &dialect,
            &Statement::Expression(Expression::call("f", vec![]))
        ));
    }
}
