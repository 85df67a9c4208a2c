//! Parser for Yul.

use std::ops::Range;

use malachite::num::conversion::traits::FromStringBase;
use malachite::Natural;
use pest::error::{Error, InputLocation};
use pest_consume::{match_nodes, Parser};

use super::ast;

#[derive(Parser)]
#[grammar = "yul/syntax.pest"]
pub struct YulParser;

impl YulParser {
    /// Parses either a bare block, which is wrapped into an object named
    /// `object`, or a single `object "name" { code { ... } }`.
    pub fn parse_object(src: &str) -> Result<ast::Object, Box<Error<Rule>>> {
        let nodes = YulParser::parse(Rule::file, src)?;

        YulParser::file(nodes.single()?).map_err(Box::new)
    }

    pub fn parse_block(src: &str) -> Result<ast::Block, Box<Error<Rule>>> {
        Ok(YulParser::parse_object(src)?.code)
    }
}

/// Byte range covered by a syntax error.
pub fn error_span(err: &Error<Rule>) -> Range<usize> {
    match err.location {
        InputLocation::Pos(pos) => pos..pos,
        InputLocation::Span((start, end)) => start..end,
    }
}

type ParseResult<T> = Result<T, Error<Rule>>;
type Node<'i> = pest_consume::Node<'i, Rule, ()>;

#[pest_consume::parser]
impl YulParser {
    fn EOI(_input: Node) -> ParseResult<()> {
        Ok(())
    }

    fn file(input: Node) -> ParseResult<ast::Object> {
        Ok(match_nodes!(input.into_children();
            [object(o), EOI(_)] => o,
            [block(code), EOI(_)] => ast::Object::new("object", code),
        ))
    }

    fn object(input: Node) -> ParseResult<ast::Object> {
        Ok(match_nodes!(input.into_children();
            [object_kwd(_), string(name), code_kwd(_), block(code)] => {
                ast::Object::new(name, code)
            },
        ))
    }

    fn string(input: Node) -> ParseResult<String> {
        Ok(match_nodes!(input.into_children();
            [string_inner(s)] => s,
        ))
    }

    fn string_inner(input: Node) -> ParseResult<String> {
        Ok(input.as_str().to_owned())
    }

    fn block(input: Node) -> ParseResult<ast::Block> {
        Ok(match_nodes!(input.into_children();
            [statement(stmts)..] => ast::Block::new(stmts.collect()),
        ))
    }

    fn statement(input: Node) -> ParseResult<ast::Statement> {
        Ok(match_nodes!(input.into_children();
            [block(b)] => ast::Statement::Block(b),
            [function_definition(def)] => {
                ast::Statement::FunctionDefinition(def)
            },
            [variable_declaration(decl)] => {
                ast::Statement::VariableDeclaration(decl)
            },
            [if_statement(stmt)] => ast::Statement::If(stmt),
            [switch_statement(switch)] => ast::Statement::Switch(switch),
            [for_loop(l)] => ast::Statement::ForLoop(l),
            [break_kwd(_)] => ast::Statement::Break,
            [continue_kwd(_)] => ast::Statement::Continue,
            [leave_kwd(_)] => ast::Statement::Leave,
            [assignment(a)] => ast::Statement::Assignment(a),
            [expression(expr)] => ast::Statement::Expression(expr),
        ))
    }

    fn function_definition(input: Node) -> ParseResult<ast::FunctionDefinition> {
        Ok(match_nodes!(input.into_children();
            [function_kwd(_), identifier(name), parameters(params), returns(rets), block(body)] => {
                ast::FunctionDefinition {
                    name,
                    params,
                    returns: rets,
                    body,
                }
            },
        ))
    }

    fn parameters(input: Node) -> ParseResult<Vec<ast::Name>> {
        Ok(match_nodes!(input.into_children();
            [identifier(names)..] => names.collect(),
        ))
    }

    fn returns(input: Node) -> ParseResult<Vec<ast::Name>> {
        Ok(match_nodes!(input.into_children();
            [identifier(names)..] => names.collect(),
        ))
    }

    fn variable_declaration(input: Node) -> ParseResult<ast::VariableDeclaration> {
        Ok(match_nodes!(input.into_children();
            [let_kwd(_), identifier_list(names)] => {
                ast::VariableDeclaration { names, value: None }
            },
            [let_kwd(_), identifier_list(names), expression(value)] => {
                ast::VariableDeclaration {
                    names,
                    value: Some(value),
                }
            },
        ))
    }

    fn assignment(input: Node) -> ParseResult<ast::Assignment> {
        Ok(match_nodes!(input.into_children();
            [identifier_list(names), expression(value)] => {
                ast::Assignment { names, value }
            },
        ))
    }

    fn identifier_list(input: Node) -> ParseResult<Vec<ast::Name>> {
        Ok(match_nodes!(input.into_children();
            [identifier(names)..] => names.collect(),
        ))
    }

    fn if_statement(input: Node) -> ParseResult<ast::If> {
        Ok(match_nodes!(input.into_children();
            [if_kwd(_), expression(condition), block(body)] => {
                ast::If { condition, body }
            },
        ))
    }

    fn switch_statement(input: Node) -> ParseResult<ast::Switch> {
        Ok(match_nodes!(input.into_children();
            [switch_kwd(_), expression(expr), case_clause(cases).., default_clause(default)] => {
                let mut cases: Vec<_> = cases.collect();
                cases.push(default);

                ast::Switch {
                    expression: expr,
                    cases,
                }
            },
            [switch_kwd(_), expression(expr), case_clause(cases)..] => {
                ast::Switch {
                    expression: expr,
                    cases: cases.collect(),
                }
            },
        ))
    }

    fn case_clause(input: Node) -> ParseResult<ast::Case> {
        Ok(match_nodes!(input.into_children();
            [case_kwd(_), literal(value), block(body)] => ast::Case {
                value: Some(value),
                body,
            },
        ))
    }

    fn default_clause(input: Node) -> ParseResult<ast::Case> {
        Ok(match_nodes!(input.into_children();
            [default_kwd(_), block(body)] => ast::Case { value: None, body },
        ))
    }

    fn for_loop(input: Node) -> ParseResult<ast::ForLoop> {
        Ok(match_nodes!(input.into_children();
            [for_kwd(_), block(pre), expression(condition), block(post), block(body)] => {
                ast::ForLoop {
                    pre,
                    condition,
                    post,
                    body,
                }
            },
        ))
    }

    fn expression(input: Node) -> ParseResult<ast::Expression> {
        Ok(match_nodes!(input.into_children();
            [function_call(call)] => ast::Expression::FunctionCall(call),
            [literal(lit)] => ast::Expression::Literal(lit),
            [identifier(name)] => ast::Expression::Identifier(name),
        ))
    }

    fn function_call(input: Node) -> ParseResult<ast::FunctionCall> {
        Ok(match_nodes!(input.into_children();
            [identifier(name), expression(args)..] => ast::FunctionCall {
                name,
                args: args.collect(),
            },
        ))
    }

    fn literal(input: Node) -> ParseResult<ast::Literal> {
        let span = input.as_span();

        let lit = match_nodes!(input.into_children();
            [hex_number(value)] => ast::Literal::number(value),
            [dec_number(value)] => ast::Literal::number(value),
            [true_kwd(_)] => ast::Literal::boolean(true),
            [false_kwd(_)] => ast::Literal::boolean(false),
        );

        if !lit.fits_word() {
            return Err(Error::new_from_span(
                pest::error::ErrorVariant::CustomError {
                    message: String::from("number literal too large"),
                },
                span,
            ));
        }

        Ok(lit)
    }

    fn hex_number(input: Node) -> ParseResult<Natural> {
        Natural::from_string_base(16, &input.as_str()[2..])
            .ok_or_else(|| input.error("invalid hexadecimal literal"))
    }

    fn dec_number(input: Node) -> ParseResult<Natural> {
        Natural::from_string_base(10, input.as_str())
            .ok_or_else(|| input.error("invalid decimal literal"))
    }

    fn identifier(input: Node) -> ParseResult<ast::Name> {
        Ok(input.as_str().to_owned())
    }

    fn object_kwd(_input: Node) -> ParseResult<()> {
        Ok(())
    }

    fn code_kwd(_input: Node) -> ParseResult<()> {
        Ok(())
    }

    fn function_kwd(_input: Node) -> ParseResult<()> {
        Ok(())
    }

    fn let_kwd(_input: Node) -> ParseResult<()> {
        Ok(())
    }

    fn if_kwd(_input: Node) -> ParseResult<()> {
        Ok(())
    }

    fn switch_kwd(_input: Node) -> ParseResult<()> {
        Ok(())
    }

    fn case_kwd(_input: Node) -> ParseResult<()> {
        Ok(())
    }

    fn default_kwd(_input: Node) -> ParseResult<()> {
        Ok(())
    }

    fn for_kwd(_input: Node) -> ParseResult<()> {
        Ok(())
    }

    fn break_kwd(_input: Node) -> ParseResult<()> {
        Ok(())
    }

    fn continue_kwd(_input: Node) -> ParseResult<()> {
        Ok(())
    }

    fn leave_kwd(_input: Node) -> ParseResult<()> {
        Ok(())
    }

    fn true_kwd(_input: Node) -> ParseResult<()> {
        Ok(())
    }

    fn false_kwd(_input: Node) -> ParseResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::yul::ast::{Expression, Statement};

    #[test]
    fn statements() {
        let block = YulParser::parse_block(
            "{
                // comment
                let x, y := f(1, 0x20)
                x := add(x, y)
                function f(a, b) -> r, s { r := a leave }
                if lt(x, 2) { sstore(0, x) }
                switch x case 1 { } case 2 { } default { revert(0, 0) }
                for { let i := 0 } lt(i, 10) { i := add(i, 1) } { break }
                { /* nested */ }
            }",
        )
        .unwrap();

        assert_eq!(block.statements.len(), 7);
        assert!(matches!(
            block.statements[0],
            Statement::VariableDeclaration(ref decl) if decl.names == ["x", "y"]
        ));
        assert!(matches!(block.statements[1], Statement::Assignment(_)));
        assert!(matches!(
            block.statements[2],
            Statement::FunctionDefinition(ref def)
                if def.params == ["a", "b"] && def.returns == ["r", "s"]
        ));

        let Statement::Switch(switch) = &block.statements[4] else {
            panic!("expected switch");
        };

        assert_eq!(switch.cases.len(), 3);
        assert!(switch.cases[2].value.is_none());
    }

    #[test]
    fn literals() {
        let block = YulParser::parse_block("{ f(0xff, 10, true) }").unwrap();

        let Statement::Expression(Expression::FunctionCall(call)) =
            &block.statements[0]
        else {
            panic!("expected call");
        };

        assert_eq!(call.args[0], Expression::number(255u32));
        assert_eq!(call.args[1], Expression::number(10u32));
        assert_eq!(
            call.args[2],
            Expression::Literal(ast::Literal::boolean(true))
        );
    }

    #[test]
    fn objects() {
        let object =
            YulParser::parse_object("object \"Token\" { code { stop() } }")
                .unwrap();

        assert_eq!(object.name, "Token");
        assert_eq!(object.code.statements.len(), 1);
    }

    #[test]
    fn keywords_are_not_identifiers() {
        assert!(YulParser::parse_block("{ let let := 1 }").is_err());
        assert!(YulParser::parse_block("{ let lettuce := 1 }").is_ok());
        assert!(YulParser::parse_block("{ let x := 0x }").is_err());
    }

    #[test]
    fn oversized_literal() {
        let src = format!("{{ let x := 0x1{} }}", "0".repeat(64));

        assert!(YulParser::parse_block(&src).is_err());
    }
}
