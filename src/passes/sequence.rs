//! Step sequences.
//!
//! A sequence is a string of pass abbreviations. Whitespace is ignored and a
//! parenthesised run of abbreviations is repeated until the code size stops
//! changing. Parentheses do not nest, and an empty pair is dropped.

use std::mem;

use log::{debug, info};
use strum_macros::{Display, EnumString};
use thiserror::Error;

use super::manager::{abbreviation_to_name, all_steps, PassContext};
use crate::analysis::{CodeSize, SyntacticallyEqual};
use crate::yul::ast::Block;
use crate::yul::printer::print;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SequenceError {
    #[error("invalid step abbreviation `{abbreviation}` at position {position}")]
    InvalidAbbreviation { abbreviation: char, position: usize },
    #[error("nested parentheses at position {position}")]
    NestedLoop { position: usize },
    #[error("unbalanced parenthesis at position {position}")]
    UnbalancedParenthesis { position: usize },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Element {
    /// Passes run once, in order.
    Steps(Vec<&'static str>),
    /// Passes repeated until the code size stops changing.
    Loop(Vec<&'static str>),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Sequence {
    elements: Vec<Element>,
}

impl Sequence {
    pub fn parse(text: &str) -> Result<Sequence, SequenceError> {
        let mut elements = Vec::new();
        let mut current = Vec::new();
        let mut open = None;

        for (position, c) in text.chars().enumerate() {
            match c {
                '(' => {
                    if open.is_some() {
                        return Err(SequenceError::NestedLoop { position });
                    }

                    if !current.is_empty() {
                        elements.push(Element::Steps(mem::take(&mut current)));
                    }

                    open = Some(position);
                }
                ')' => {
                    if open.take().is_none() {
                        return Err(SequenceError::UnbalancedParenthesis {
                            position,
                        });
                    }

                    if !current.is_empty() {
                        elements.push(Element::Loop(mem::take(&mut current)));
                    }
                }
                c if c.is_whitespace() => {}
                c => match abbreviation_to_name().get(&c) {
                    Some(name) => current.push(*name),
                    None => {
                        return Err(SequenceError::InvalidAbbreviation {
                            abbreviation: c,
                            position,
                        });
                    }
                },
            }
        }

        if let Some(position) = open {
            return Err(SequenceError::UnbalancedParenthesis { position });
        }

        if !current.is_empty() {
            elements.push(Element::Steps(current));
        }

        Ok(Sequence { elements })
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }
}

/// What gets reported while running passes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum DebugMode {
    #[default]
    None,
    /// Name every pass as it runs.
    Steps,
    /// Also report whether each pass changed the code, and print it if so.
    Changes,
}

/// Outcome of a stability loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Convergence {
    pub rounds: usize,
    /// The metric repeated before the round limit was hit.
    pub converged: bool,
}

/// Runs `round` until `metric` yields the same value twice in a row, or
/// `max_rounds` times.
pub fn run_until_stable<T, M, R>(
    state: &mut T,
    max_rounds: usize,
    mut metric: M,
    mut round: R,
) -> Convergence
where
    T: ?Sized,
    M: FnMut(&T) -> usize,
    R: FnMut(&mut T),
{
    let mut previous = None;

    for rounds in 0..max_rounds {
        let size = metric(state);

        if previous == Some(size) {
            return Convergence {
                rounds,
                converged: true,
            };
        }

        previous = Some(size);
        round(state);
    }

    Convergence {
        rounds: max_rounds,
        converged: false,
    }
}

/// Executes sequences, recording the outcome of every stability loop.
pub struct Runner {
    debug: DebugMode,
    max_rounds: usize,
    loops: Vec<Convergence>,
}

impl Runner {
    pub fn new(debug: DebugMode, max_rounds: usize) -> Runner {
        Runner {
            debug,
            max_rounds,
            loops: Vec::new(),
        }
    }

    pub fn loops(&self) -> &[Convergence] {
        &self.loops
    }

    pub fn into_loops(self) -> Vec<Convergence> {
        self.loops
    }

    /// Parses and runs a sequence. Nothing is run if the text is malformed.
    pub fn run_sequence(
        &mut self,
        text: &str,
        ctx: &mut PassContext,
        ast: &mut Block,
    ) -> Result<(), SequenceError> {
        let sequence = Sequence::parse(text)?;

        self.run(&sequence, ctx, ast);

        Ok(())
    }

    pub fn run(
        &mut self,
        sequence: &Sequence,
        ctx: &mut PassContext,
        ast: &mut Block,
    ) {
        for element in sequence.elements() {
            match element {
                Element::Steps(names) => self.run_steps(names, ctx, ast),
                Element::Loop(names) => {
                    let convergence = run_until_stable(
                        ast,
                        self.max_rounds,
                        CodeSize::code_size_including_functions,
                        |ast| self.run_steps(names, ctx, ast),
                    );

                    if convergence.converged {
                        debug!(
                            "loop converged after {} rounds",
                            convergence.rounds
                        );
                    } else {
                        debug!(
                            "loop stopped at the limit of {} rounds",
                            convergence.rounds
                        );
                    }

                    self.loops.push(convergence);
                }
            }
        }
    }

    fn run_steps(
        &self,
        names: &[&'static str],
        ctx: &mut PassContext,
        ast: &mut Block,
    ) {
        let mut snapshot =
            (self.debug == DebugMode::Changes).then(|| ast.clone());

        for name in names {
            let step = &all_steps()[name];

            debug!("running {}", step.name);

            if self.debug != DebugMode::None {
                info!("{}", step.name);
            }

            (step.run)(ctx, ast);

            if let Some(snapshot) = &mut snapshot {
                if SyntacticallyEqual::blocks(snapshot, ast) {
                    info!("{}: no changes", step.name);
                } else {
                    info!("{} changed the code:\n{}", step.name, print(ast));
                    *snapshot = ast.clone();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::dialect::Dialect;
    use crate::yul::YulParser;

    #[test]
    fn parsing() {
        let sequence = Sequence::parse("dh f (xa r) u").unwrap();

        assert_eq!(
            sequence.elements(),
            [
                Element::Steps(vec![
                    "VarDeclInitializer",
                    "FunctionHoister",
                    "BlockFlattener"
                ]),
                Element::Loop(vec![
                    "ExpressionSplitter",
                    "SSATransform",
                    "RedundantAssignEliminator"
                ]),
                Element::Steps(vec!["UnusedPruner"]),
            ]
        );
        assert_eq!(Sequence::parse("").unwrap(), Sequence::default());
        assert_eq!(Sequence::parse("( )").unwrap(), Sequence::default());
        assert_eq!(
            Sequence::parse("f()u").unwrap().elements(),
            [
                Element::Steps(vec!["BlockFlattener"]),
                Element::Steps(vec!["UnusedPruner"]),
            ]
        );
    }

    #[test]
    fn malformed() {
        assert_eq!(
            Sequence::parse("("),
            Err(SequenceError::UnbalancedParenthesis { position: 0 })
        );
        assert_eq!(
            Sequence::parse(")"),
            Err(SequenceError::UnbalancedParenthesis { position: 0 })
        );
        assert_eq!(
            Sequence::parse("(("),
            Err(SequenceError::NestedLoop { position: 1 })
        );
        assert_eq!(
            Sequence::parse("()("),
            Err(SequenceError::UnbalancedParenthesis { position: 2 })
        );
        assert_eq!(
            Sequence::parse("fd?"),
            Err(SequenceError::InvalidAbbreviation {
                abbreviation: '?',
                position: 2
            })
        );
    }

    #[test]
    fn empty_sequence_is_a_no_op() {
        let dialect = Dialect::evm();
        let reserved = BTreeSet::new();
        let mut ast =
            YulParser::parse_block("{ let x { let y } function f() { } }")
                .unwrap();
        let original = ast.clone();

        let mut ctx = PassContext::new(&dialect, &ast, &reserved);

        Runner::new(DebugMode::Changes, 12)
            .run_sequence("", &mut ctx, &mut ast)
            .unwrap();

        assert_eq!(ast, original);
    }

    #[test]
    fn malformed_sequences_leave_the_code_alone() {
        let dialect = Dialect::evm();
        let reserved = BTreeSet::new();
        let mut ast = YulParser::parse_block("{ { let y } }").unwrap();
        let original = ast.clone();

        let mut ctx = PassContext::new(&dialect, &ast, &reserved);
        let mut runner = Runner::new(DebugMode::None, 12);

        assert!(runner.run_sequence("f(", &mut ctx, &mut ast).is_err());
        assert_eq!(ast, original);
    }

    #[test]
    fn stops_at_the_first_repeated_metric() {
        let mut size = 10;

        let convergence = run_until_stable(
            &mut size,
            100,
            |size| *size,
            |size| *size = (*size - 1).max(3),
        );

        assert_eq!(
            convergence,
            Convergence {
                rounds: 8,
                converged: true
            }
        );
        assert_eq!(size, 3);
    }

    #[test]
    fn never_exceeds_the_round_limit() {
        let mut rounds = 0;

        let convergence =
            run_until_stable(&mut rounds, 12, |rounds| *rounds, |rounds| {
                *rounds += 1
            });

        assert_eq!(
            convergence,
            Convergence {
                rounds: 12,
                converged: false
            }
        );
        assert_eq!(rounds, 12);

        let convergence = run_until_stable(&mut 0, 0, |_| 0, |_| {});

        assert_eq!(convergence.rounds, 0);
    }

    #[test]
    fn loops_are_recorded() {
        let dialect = Dialect::evm();
        let reserved = BTreeSet::new();
        let mut ast = YulParser::parse_block("{ { { let y := 1 } } }").unwrap();

        let mut ctx = PassContext::new(&dialect, &ast, &reserved);
        let mut runner = Runner::new(DebugMode::Steps, 12);

        runner.run_sequence("(f)", &mut ctx, &mut ast).unwrap();

        assert_eq!(runner.loops().len(), 1);
        assert!(runner.loops()[0].converged);

        runner.run_sequence("( ) ()", &mut ctx, &mut ast).unwrap();

        assert_eq!(runner.loops().len(), 1);
    }
}
