//! Strict semantic analysis.

use std::collections::{BTreeMap, HashMap, HashSet};

use thiserror::Error;

use crate::dialect::Dialect;
use crate::yul::ast::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Signature {
    pub params: usize,
    pub returns: usize,
}

/// Facts recorded by a successful analysis.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AnalysisInfo {
    pub functions: BTreeMap<Name, Signature>,
    pub variables: usize,
    pub scopes: usize,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("undeclared identifier `{0}`")]
    Undeclared(Name),
    #[error("`{0}` is already visible in this scope")]
    Redeclared(Name),
    #[error("cannot declare `{0}`: name of a builtin function")]
    BuiltinName(Name),
    #[error("`{0}` is not a variable")]
    NotAVariable(Name),
    #[error("`{0}` is not a function")]
    NotAFunction(Name),
    #[error("`{name}` expects {expected} arguments, found {found}")]
    Arity {
        name: Name,
        expected: usize,
        found: usize,
    },
    #[error("expected {expected} values, found {found}")]
    ValueCount { expected: usize, found: usize },
    #[error("`{0}` outside of a for loop body")]
    OutsideLoop(&'static str),
    #[error("`leave` outside of a function")]
    LeaveOutsideFunction,
    #[error("switch statement without cases")]
    EmptySwitch,
    #[error("duplicate switch case `{0}`")]
    DuplicateCase(Literal),
    #[error("literal `{0}` does not fit into a word")]
    LiteralTooLarge(Literal),
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// Analyzes the code of an object, rejecting anything a code generator could
/// not accept.
pub fn analyze_strict(
    dialect: &Dialect,
    object: &Object,
) -> AnalysisResult<AnalysisInfo> {
    let mut analyzer = Analyzer {
        dialect,
        scopes: Vec::new(),
        info: AnalysisInfo::default(),
        loop_depth: 0,
        in_post: false,
        in_function: false,
    };

    analyzer.block(&object.code)?;

    Ok(analyzer.info)
}

#[derive(Clone, Copy)]
enum Binding {
    Variable,
    Function(Signature),
}

#[derive(Default)]
struct Scope {
    names: HashMap<Name, Binding>,
    /// Variables of enclosing scopes are invisible past a function boundary.
    function: bool,
}

struct Analyzer<'d> {
    dialect: &'d Dialect,
    scopes: Vec<Scope>,
    info: AnalysisInfo,
    loop_depth: usize,
    in_post: bool,
    in_function: bool,
}

impl Analyzer<'_> {
    fn find_name(&self, name: &str) -> Option<Binding> {
        let mut crossed_function = false;

        for scope in self.scopes.iter().rev() {
            match scope.names.get(name) {
                Some(Binding::Variable) if crossed_function => {}
                Some(binding) => return Some(*binding),
                None => {}
            }

            crossed_function |= scope.function;
        }

        None
    }

    fn declare(&mut self, name: &Name, binding: Binding) -> AnalysisResult<()> {
        if self.dialect.is_builtin(name) {
            return Err(AnalysisError::BuiltinName(name.clone()));
        }

        if self.find_name(name).is_some() {
            return Err(AnalysisError::Redeclared(name.clone()));
        }

        if let Binding::Function(signature) = binding {
            self.info.functions.insert(name.clone(), signature);
        } else {
            self.info.variables += 1;
        }

        self.scopes
            .last_mut()
            .expect("declaration outside of a scope")
            .names
            .insert(name.clone(), binding);

        Ok(())
    }

    fn enter(&mut self, function: bool) {
        self.info.scopes += 1;
        self.scopes.push(Scope {
            names: HashMap::new(),
            function,
        });
    }

    fn block(&mut self, block: &Block) -> AnalysisResult<()> {
        self.enter(false);
        self.statements(block)?;
        self.scopes.pop();

        Ok(())
    }

    /// Analyzes statements in the current scope.
    fn statements(&mut self, block: &Block) -> AnalysisResult<()> {
        for def in block.statements.iter().filter_map(Statement::as_function) {
            let signature = Signature {
                params: def.params.len(),
                returns: def.returns.len(),
            };

            self.declare(&def.name, Binding::Function(signature))?;
        }

        for stmt in &block.statements {
            self.statement(stmt)?;
        }

        Ok(())
    }

    fn statement(&mut self, stmt: &Statement) -> AnalysisResult<()> {
        match stmt {
            Statement::Expression(expr) => self.expect_values(expr, 0),
            Statement::Assignment(assignment) => {
                self.expect_values(&assignment.value, assignment.names.len())?;

                for name in &assignment.names {
                    match self.find_name(name) {
                        Some(Binding::Variable) => {}
                        Some(Binding::Function(_)) => {
                            return Err(AnalysisError::NotAVariable(
                                name.clone(),
                            ));
                        }
                        None if self.dialect.is_builtin(name) => {
                            return Err(AnalysisError::NotAVariable(
                                name.clone(),
                            ));
                        }
                        None => {
                            return Err(AnalysisError::Undeclared(
                                name.clone(),
                            ));
                        }
                    }
                }

                Ok(())
            }
            Statement::VariableDeclaration(decl) => {
                if let Some(value) = &decl.value {
                    self.expect_values(value, decl.names.len())?;
                }

                for name in &decl.names {
                    self.declare(name, Binding::Variable)?;
                }

                Ok(())
            }
            Statement::FunctionDefinition(def) => self.function(def),
            Statement::If(stmt) => {
                self.expect_values(&stmt.condition, 1)?;
                self.block(&stmt.body)
            }
            Statement::Switch(switch) => {
                self.expect_values(&switch.expression, 1)?;

                if switch.cases.is_empty() {
                    return Err(AnalysisError::EmptySwitch);
                }

                let mut seen = HashSet::new();

                for case in &switch.cases {
                    if let Some(value) = &case.value {
                        if !value.fits_word() {
                            return Err(AnalysisError::LiteralTooLarge(
                                value.clone(),
                            ));
                        }

                        if !seen.insert(&value.value) {
                            return Err(AnalysisError::DuplicateCase(
                                value.clone(),
                            ));
                        }
                    }

                    self.block(&case.body)?;
                }

                Ok(())
            }
            Statement::ForLoop(for_loop) => {
                let outer_post = self.in_post;

                self.enter(false);
                self.statements(&for_loop.pre)?;
                self.expect_values(&for_loop.condition, 1)?;

                self.loop_depth += 1;
                self.in_post = false;
                self.block(&for_loop.body)?;
                self.in_post = true;
                self.block(&for_loop.post)?;
                self.loop_depth -= 1;

                self.in_post = outer_post;
                self.scopes.pop();

                Ok(())
            }
            Statement::Break | Statement::Continue => {
                if self.loop_depth == 0 || self.in_post {
                    let keyword = if matches!(stmt, Statement::Break) {
                        "break"
                    } else {
                        "continue"
                    };

                    return Err(AnalysisError::OutsideLoop(keyword));
                }

                Ok(())
            }
            Statement::Leave => {
                if self.in_function {
                    Ok(())
                } else {
                    Err(AnalysisError::LeaveOutsideFunction)
                }
            }
            Statement::Block(block) => self.block(block),
        }
    }

    fn function(&mut self, def: &FunctionDefinition) -> AnalysisResult<()> {
        let saved = (self.loop_depth, self.in_post, self.in_function);

        self.loop_depth = 0;
        self.in_post = false;
        self.in_function = true;

        self.enter(true);

        for name in def.params.iter().chain(&def.returns) {
            self.declare(name, Binding::Variable)?;
        }

        self.block(&def.body)?;
        self.scopes.pop();

        (self.loop_depth, self.in_post, self.in_function) = saved;

        Ok(())
    }

    fn expect_values(
        &mut self,
        expr: &Expression,
        expected: usize,
    ) -> AnalysisResult<()> {
        let found = self.expression(expr)?;

        if found == expected {
            Ok(())
        } else {
            Err(AnalysisError::ValueCount { expected, found })
        }
    }

    /// Returns the number of values the expression evaluates to.
    fn expression(&mut self, expr: &Expression) -> AnalysisResult<usize> {
        match expr {
            Expression::Literal(lit) => {
                if lit.fits_word() {
                    Ok(1)
                } else {
                    Err(AnalysisError::LiteralTooLarge(lit.clone()))
                }
            }
            Expression::Identifier(name) => match self.find_name(name) {
                Some(Binding::Variable) => Ok(1),
                Some(Binding::Function(_)) => {
                    Err(AnalysisError::NotAVariable(name.clone()))
                }
                None if self.dialect.is_builtin(name) => {
                    Err(AnalysisError::NotAVariable(name.clone()))
                }
                None => Err(AnalysisError::Undeclared(name.clone())),
            },
            Expression::FunctionCall(call) => {
                let signature = if let Some(builtin) =
                    self.dialect.builtin(&call.name)
                {
                    Signature {
                        params: builtin.parameters,
                        returns: builtin.returns,
                    }
                } else {
                    match self.find_name(&call.name) {
                        Some(Binding::Function(signature)) => signature,
                        Some(Binding::Variable) => {
                            return Err(AnalysisError::NotAFunction(
                                call.name.clone(),
                            ));
                        }
                        None => {
                            return Err(AnalysisError::Undeclared(
                                call.name.clone(),
                            ));
                        }
                    }
                };

                if call.args.len() != signature.params {
                    return Err(AnalysisError::Arity {
                        name: call.name.clone(),
                        expected: signature.params,
                        found: call.args.len(),
                    });
                }

                for arg in call.args.iter().rev() {
                    self.expect_values(arg, 1)?;
                }

                Ok(signature.returns)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::yul::YulParser;

    fn analyze(src: &str) -> AnalysisResult<AnalysisInfo> {
        let object = YulParser::parse_object(src).unwrap();

        analyze_strict(&Dialect::evm(), &object)
    }

    #[test]
    fn valid_code() {
        let info = analyze(
            "{
                let x := f(1)
                function f(a) -> r { r := add(a, 1) if r { leave } }
                for { let i := 0 } lt(i, x) { i := add(i, 1) } {
                    if eq(i, 3) { continue }
                    sstore(i, x)
                }
                switch x case 0 { } case 1 { } default { pop(x) }
            }",
        )
        .unwrap();

        assert_eq!(
            info.functions["f"],
            Signature {
                params: 1,
                returns: 1
            }
        );
        assert_eq!(info.variables, 4);
    }

    #[test]
    fn scoping() {
        assert_eq!(
            analyze("{ { let x := 1 } pop(x) }"),
            Err(AnalysisError::Undeclared("x".into()))
        );
        assert_eq!(
            analyze("{ let x := 1 { let x := 2 } }"),
            Err(AnalysisError::Redeclared("x".into()))
        );
        assert_eq!(
            analyze("{ let x := 1 function f() -> r { r := x } }"),
            Err(AnalysisError::Undeclared("x".into()))
        );
        assert_eq!(
            analyze("{ let add := 1 }"),
            Err(AnalysisError::BuiltinName("add".into()))
        );
        assert!(analyze("{ let x := 1 function f() -> x { } }").is_ok());
    }

    #[test]
    fn value_counts() {
        assert_eq!(
            analyze("{ add(1, 2) }"),
            Err(AnalysisError::ValueCount {
                expected: 0,
                found: 1
            })
        );
        assert_eq!(
            analyze("{ let x := sstore(0, 0) }"),
            Err(AnalysisError::ValueCount {
                expected: 1,
                found: 0
            })
        );
        assert!(matches!(
            analyze("{ pop(add(1)) }"),
            Err(AnalysisError::Arity { .. })
        ));
    }

    #[test]
    fn control_flow() {
        assert_eq!(
            analyze("{ break }"),
            Err(AnalysisError::OutsideLoop("break"))
        );
        assert_eq!(
            analyze("{ for { } 1 { break } { } }"),
            Err(AnalysisError::OutsideLoop("break"))
        );
        assert_eq!(
            analyze("{ leave }"),
            Err(AnalysisError::LeaveOutsideFunction)
        );
        assert!(matches!(
            analyze("{ switch 1 case 1 { } case 1 { } }"),
            Err(AnalysisError::DuplicateCase(_))
        ));
    }
}
