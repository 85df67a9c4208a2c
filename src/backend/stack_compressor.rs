//! Reducing stack pressure below the dialect's slot limit.

use std::collections::BTreeSet;

use log::debug;

use crate::analysis::SyntacticallyEqual;
use crate::dialect::Dialect;
use crate::passes::{
    ExpressionJoiner, Pass, PassContext, Rematerialiser, UnusedPruner,
};
use crate::yul::ast::*;

/// Outcome of a compression run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Compression {
    /// Every scope fits into the dialect's stack after the run.
    pub fits: bool,
    pub iterations: usize,
}

pub struct StackCompressor;

impl StackCompressor {
    /// Rematerialises values and prunes the variables that held them until
    /// every scope fits, nothing changes any more, or `max_iterations` rounds
    /// have run.
    pub fn run(
        dialect: &Dialect,
        object: &mut Object,
        reserved: &BTreeSet<Name>,
        optimize_stack_allocation: bool,
        max_iterations: usize,
    ) -> Compression {
        let Some(limit) = dialect.stack_limit() else {
            return Compression {
                fits: true,
                iterations: 0,
            };
        };

        let mut ctx = PassContext::new(dialect, &object.code, reserved);

        for iterations in 0..max_iterations {
            let pressure = StackCompressor::pressure(&object.code);

            debug!("stack pressure {pressure} against a limit of {limit}");

            if pressure <= limit {
                return Compression {
                    fits: true,
                    iterations,
                };
            }

            let before = object.code.clone();

            Rematerialiser::run(&mut ctx, &mut object.code);

            if optimize_stack_allocation {
                ExpressionJoiner::run(&mut ctx, &mut object.code);
            }

            UnusedPruner::run(&mut ctx, &mut object.code);

            if SyntacticallyEqual::blocks(&before, &object.code) {
                return Compression {
                    fits: false,
                    iterations: iterations + 1,
                };
            }
        }

        Compression {
            fits: StackCompressor::pressure(&object.code) <= limit,
            iterations: max_iterations,
        }
    }

    /// Largest number of variables simultaneously in scope, over the
    /// top-level code and every function.
    pub fn pressure(code: &Block) -> usize {
        let mut functions = Vec::new();
        collect_functions(code, &mut functions);

        functions
            .into_iter()
            .map(|def| {
                let slots = def.params.len() + def.returns.len();

                block_pressure(&def.body, slots)
            })
            .fold(block_pressure(code, 0), usize::max)
    }
}

fn block_pressure(block: &Block, outer: usize) -> usize {
    let mut live = outer;
    let mut max = outer;

    for stmt in &block.statements {
        let inner = match stmt {
            Statement::VariableDeclaration(decl) => {
                live += decl.names.len();
                live
            }
            Statement::If(stmt) => block_pressure(&stmt.body, live),
            Statement::Switch(switch) => switch
                .cases
                .iter()
                .map(|case| block_pressure(&case.body, live))
                .fold(live, usize::max),
            Statement::ForLoop(for_loop) => {
                let pre = declared(&for_loop.pre) + live;

                block_pressure(&for_loop.pre, live)
                    .max(block_pressure(&for_loop.body, pre))
                    .max(block_pressure(&for_loop.post, pre))
            }
            Statement::Block(block) => block_pressure(block, live),
            _ => live,
        };

        max = max.max(inner);
    }

    max
}

fn declared(block: &Block) -> usize {
    block
        .statements
        .iter()
        .map(|stmt| match stmt {
            Statement::VariableDeclaration(decl) => decl.names.len(),
            _ => 0,
        })
        .sum()
}

fn collect_functions<'a>(
    block: &'a Block,
    functions: &mut Vec<&'a FunctionDefinition>,
) {
    for stmt in &block.statements {
        match stmt {
            Statement::FunctionDefinition(def) => {
                functions.push(def);
                collect_functions(&def.body, functions);
            }
            Statement::If(stmt) => collect_functions(&stmt.body, functions),
            Statement::Switch(switch) => {
                for case in &switch.cases {
                    collect_functions(&case.body, functions);
                }
            }
            Statement::ForLoop(for_loop) => {
                collect_functions(&for_loop.pre, functions);
                collect_functions(&for_loop.body, functions);
                collect_functions(&for_loop.post, functions);
            }
            Statement::Block(block) => collect_functions(block, functions),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::yul::YulParser;

    fn object(src: &str) -> Object {
        YulParser::parse_object(src).unwrap()
    }

    /// Twenty variables loaded from calldata and summed up at the end.
    fn crowded() -> String {
        let decls: String = (0..20)
            .map(|i| format!("let x{i} := calldataload({i}) "))
            .collect();
        let sum = (1..20).fold("x0".to_string(), |acc, i| {
            format!("add({acc}, x{i})")
        });

        format!("{{ {decls} sstore(0, {sum}) }}")
    }

    #[test]
    fn measures_scopes() {
        let code = object(
            "{
                let a := 1
                { let b, c := f(a) }
                function f(p) -> r, s {
                    let t := p
                    for { let i := 0 } lt(i, t) { } { let u := i }
                }
            }",
        )
        .code;

        // f: p, r, s, t, i and u.
        assert_eq!(StackCompressor::pressure(&code), 6);
        assert_eq!(StackCompressor::pressure(&Block::default()), 0);
    }

    #[test]
    fn compresses_crowded_code() {
        let mut object = object(&crowded());

        assert_eq!(StackCompressor::pressure(&object.code), 20);

        let compression = StackCompressor::run(
            &Dialect::evm(),
            &mut object,
            &BTreeSet::new(),
            false,
            16,
        );

        assert!(compression.fits);
        assert!(compression.iterations >= 1);
        assert!(StackCompressor::pressure(&object.code) <= 16);
    }

    #[test]
    fn unlimited_dialects_always_fit() {
        let mut object = object(&crowded());
        let original = object.clone();

        let compression = StackCompressor::run(
            &Dialect::generic(),
            &mut object,
            &BTreeSet::new(),
            true,
            16,
        );

        assert_eq!(
            compression,
            Compression {
                fits: true,
                iterations: 0
            }
        );
        assert_eq!(object, original);
    }

    #[test]
    fn gives_up_without_progress() {
        let decls: String = (0..20)
            .map(|i| format!("let x{i} := sload({i}) sstore({i}, 0) "))
            .collect();
        let reads: String =
            (0..20).map(|i| format!("sstore(x{i}, x{i}) ")).collect();
        let mut object = object(&format!("{{ {decls} {reads} }}"));

        let compression = StackCompressor::run(
            &Dialect::evm(),
            &mut object,
            &BTreeSet::new(),
            false,
            16,
        );

        assert!(!compression.fits);
        assert!(compression.iterations <= 16);
    }
}
