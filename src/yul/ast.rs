//! Abstract syntax for Yul.

use std::fmt;

use malachite::num::basic::traits::{One, Zero};
use malachite::num::logic::traits::SignificantBits;
use malachite::Natural;

use crate::analysis::AnalysisInfo;

/// Identifier of a variable or function.
pub type Name = String;

/// Width of the machine word in bits.
pub const WORD_BITS: u64 = 256;

/// A named unit of code together with the result of its last analysis.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Object {
    pub name: String,
    pub code: Block,
    pub info: Option<AnalysisInfo>,
}

impl Object {
    pub fn new<S: Into<String>>(name: S, code: Block) -> Object {
        Object {
            name: name.into(),
            code,
            info: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Block {
    pub statements: Vec<Statement>,
}

impl Block {
    pub fn new(statements: Vec<Statement>) -> Block {
        Block { statements }
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Statement {
    Expression(Expression),
    Assignment(Assignment),
    VariableDeclaration(VariableDeclaration),
    FunctionDefinition(FunctionDefinition),
    If(If),
    Switch(Switch),
    ForLoop(ForLoop),
    Break,
    Continue,
    Leave,
    Block(Block),
}

impl Statement {
    /// `let name := value`.
    pub fn declare(name: Name, value: Expression) -> Statement {
        Statement::VariableDeclaration(VariableDeclaration {
            names: vec![name],
            value: Some(value),
        })
    }

    /// `name := value`.
    pub fn assign(name: Name, value: Expression) -> Statement {
        Statement::Assignment(Assignment {
            names: vec![name],
            value,
        })
    }

    pub fn as_function(&self) -> Option<&FunctionDefinition> {
        match self {
            Statement::FunctionDefinition(def) => Some(def),
            _ => None,
        }
    }

    pub fn is_function(&self) -> bool {
        matches!(self, Statement::FunctionDefinition(_))
    }
}

/// Assignment to one or more existing variables.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Assignment {
    pub names: Vec<Name>,
    pub value: Expression,
}

/// Declaration of one or more variables, zero-initialised without a value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VariableDeclaration {
    pub names: Vec<Name>,
    pub value: Option<Expression>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionDefinition {
    pub name: Name,
    pub params: Vec<Name>,
    pub returns: Vec<Name>,
    pub body: Block,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct If {
    pub condition: Expression,
    pub body: Block,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Switch {
    pub expression: Expression,
    pub cases: Vec<Case>,
}

/// A switch case; the default case has no value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Case {
    pub value: Option<Literal>,
    pub body: Block,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ForLoop {
    pub pre: Block,
    pub condition: Expression,
    pub post: Block,
    pub body: Block,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expression {
    Literal(Literal),
    Identifier(Name),
    FunctionCall(FunctionCall),
}

impl Expression {
    pub fn number<N: Into<Natural>>(value: N) -> Expression {
        Expression::Literal(Literal::number(value))
    }

    pub fn identifier<S: Into<Name>>(name: S) -> Expression {
        Expression::Identifier(name.into())
    }

    pub fn call<S: Into<Name>>(name: S, args: Vec<Expression>) -> Expression {
        Expression::FunctionCall(FunctionCall {
            name: name.into(),
            args,
        })
    }

    pub fn as_identifier(&self) -> Option<&Name> {
        match self {
            Expression::Identifier(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Expression::Literal(lit) => Some(lit),
            _ => None,
        }
    }

    pub fn as_call(&self) -> Option<&FunctionCall> {
        match self {
            Expression::FunctionCall(call) => Some(call),
            _ => None,
        }
    }

    /// Whether the expression is a literal or an identifier.
    pub fn is_atomic(&self) -> bool {
        !matches!(self, Expression::FunctionCall(_))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionCall {
    pub name: Name,
    pub args: Vec<Expression>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LiteralKind {
    Number,
    Boolean,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Literal {
    pub kind: LiteralKind,
    pub value: Natural,
}

impl Literal {
    pub fn number<N: Into<Natural>>(value: N) -> Literal {
        Literal {
            kind: LiteralKind::Number,
            value: value.into(),
        }
    }

    pub fn boolean(value: bool) -> Literal {
        Literal {
            kind: LiteralKind::Boolean,
            value: if value { Natural::ONE } else { Natural::ZERO },
        }
    }

    pub fn zero() -> Literal {
        Literal::number(Natural::ZERO)
    }

    pub fn is_zero(&self) -> bool {
        self.value == Natural::ZERO
    }

    /// Whether the value fits into a machine word.
    pub fn fits_word(&self) -> bool {
        self.value.significant_bits() <= WORD_BITS
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            LiteralKind::Boolean if self.is_zero() => f.write_str("false"),
            LiteralKind::Boolean => f.write_str("true"),
            LiteralKind::Number if self.value.significant_bits() <= 32 => {
                write!(f, "{}", self.value)
            }
            LiteralKind::Number => write!(f, "0x{:x}", self.value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_formatting() {
        assert_eq!(Literal::number(42u32).to_string(), "42");
        assert_eq!(Literal::boolean(true).to_string(), "true");
        assert_eq!(Literal::boolean(false).to_string(), "false");
        assert_eq!(
            Literal::number(1u64 << 40).to_string(),
            "0x10000000000"
        );
    }

    #[test]
    fn word_bounds() {
        use malachite::num::arithmetic::traits::PowerOf2;

        let max = Natural::power_of_2(WORD_BITS) - Natural::ONE;

        assert!(Literal::number(max.clone()).fits_word());
        assert!(!Literal::number(max + Natural::ONE).fits_word());
    }
}
