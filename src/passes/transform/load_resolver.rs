use std::collections::BTreeSet;

use crate::analysis::semantics::statement_may_write;
use crate::analysis::References;
use crate::dialect::{Access, Dialect, Location};
use crate::passes::{Pass, PassContext};
use crate::utils::rewrite::for_each_block_mut;
use crate::yul::ast::*;

const LOCATIONS: [Location; 2] = [Location::Memory, Location::Storage];

/// Replaces loads from a key by the value stored there earlier in the same
/// block, as long as nothing in between may have written the location.
pub struct LoadResolver;

impl Pass for LoadResolver {
    const NAME: &'static str = "LoadResolver";

    fn run(ctx: &mut PassContext, ast: &mut Block) {
        for_each_block_mut(ast, &mut |block| {
            let mut resolver = Resolver {
                dialect: ctx.dialect,
                stored: Vec::new(),
            };

            for stmt in &mut block.statements {
                resolver.visit(stmt);
            }
        });
    }
}

struct Resolver<'a> {
    dialect: &'a Dialect,
    stored: Vec<Fact>,
}

/// A value known to be stored under a key.
type Fact = (Location, Expression, Expression);

impl Resolver<'_> {
    fn visit(&mut self, stmt: &mut Statement) {
        let expr = match stmt {
            Statement::Expression(expr) => Some(expr),
            Statement::Assignment(assignment) => Some(&mut assignment.value),
            Statement::VariableDeclaration(decl) => decl.value.as_mut(),
            Statement::If(stmt) => Some(&mut stmt.condition),
            Statement::Switch(switch) => Some(&mut switch.expression),
            _ => None,
        };

        if let Some(expr) = expr {
            self.resolve(expr, &mut BTreeSet::new());
        }

        for location in LOCATIONS {
            if statement_may_write(self.dialect, stmt, location) {
                self.stored.retain(|(loc, _, _)| *loc != location);
            }
        }

        let refs = References::of_statement(stmt);

        self.stored.retain(|(_, key, value)| {
            [key, value].into_iter().all(|expr| match expr {
                Expression::Identifier(name) => !refs.is_assigned(name),
                _ => true,
            })
        });

        if let Some((location, key, value)) = self.store(stmt) {
            self.stored.push((location, key, value));
        }
    }

    /// The fact established by a store of an identifier or literal under an
    /// identifier or literal key.
    fn store(&self, stmt: &Statement) -> Option<Fact> {
        let Statement::Expression(Expression::FunctionCall(call)) = stmt else {
            return None;
        };

        let builtin = self.dialect.builtin(&call.name)?;

        let Some(Access::Store(location)) = builtin.access else {
            return None;
        };

        match &call.args[..] {
            [key, value] if key.is_atomic() && value.is_atomic() => {
                Some((location, key.clone(), value.clone()))
            }
            _ => None,
        }
    }

    /// Walks the expression in evaluation order, tracking the locations that
    /// may have been written so far.
    fn resolve(&self, expr: &mut Expression, dirty: &mut BTreeSet<Location>) {
        let Expression::FunctionCall(call) = expr else {
            return;
        };

        for arg in call.args.iter_mut().rev() {
            self.resolve(arg, dirty);
        }

        let builtin = self.dialect.builtin(&call.name);

        if let (Some(Access::Load(location)), [key]) =
            (builtin.and_then(|b| b.access), &call.args[..])
        {
            if !dirty.contains(&location) {
                let known = self.stored.iter().find(|(loc, stored, _)| {
                    *loc == location && stored == key
                });

                if let Some((_, _, value)) = known {
                    *expr = value.clone();
                }
            }

            return;
        }

        for location in LOCATIONS {
            let writes = match builtin {
                Some(builtin) => match builtin.access {
                    Some(Access::Store(loc)) => loc == location,
                    Some(Access::Load(_)) => false,
                    None => !builtin.side_effect_free,
                },
                None => true,
            };

            if writes {
                dirty.insert(location);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::testing::check;

    #[test]
    fn resolves_loads() {
        check::<LoadResolver>(
            "{
                let x := calldataload(0)
                sstore(x, 5)
                let y := sload(x)
                mstore(0, y)
                let z := add(sload(x), mload(0))
                f()
                let w := sload(x)
                function f() { }
            }",
            "{
                let x := calldataload(0)
                sstore(x, 5)
                let y := 5
                mstore(0, y)
                let z := add(5, y)
                f()
                let w := sload(x)
                function f() { }
            }",
        );
    }

    #[test]
    fn invalidation() {
        check::<LoadResolver>(
            "{
                let x := calldataload(0)
                let v := 1
                sstore(x, v)
                v := 2
                sstore(0, sload(x))
                mstore(x, 3)
                if v { mstore(1, 4) }
                pop(mload(x))
                mstore(x, 5)
                pop(add(mload(x), f()))
                function f() -> r { }
            }",
            "{
                let x := calldataload(0)
                let v := 1
                sstore(x, v)
                v := 2
                sstore(0, sload(x))
                mstore(x, 3)
                if v { mstore(1, 4) }
                pop(mload(x))
                mstore(x, 5)
                pop(add(mload(x), f()))
                function f() -> r { }
            }",
        );
    }
}
