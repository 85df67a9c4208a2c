use crate::passes::{Pass, PassContext};
use crate::utils::rewrite::{for_each_block_mut, rewrite_statements};
use crate::yul::ast::*;

/// Gives every variable declaration an explicit zero value.
pub struct VarDeclInitializer;

impl Pass for VarDeclInitializer {
    const NAME: &'static str = "VarDeclInitializer";

    fn run(_ctx: &mut PassContext, ast: &mut Block) {
        for_each_block_mut(ast, &mut |block| {
            rewrite_statements(&mut block.statements, |stmt| {
                let Statement::VariableDeclaration(decl) = stmt else {
                    return None;
                };

                if decl.value.is_some() {
                    return None;
                }

                if let [_] = decl.names[..] {
                    decl.value = Some(Expression::Literal(Literal::zero()));
                    return None;
                }

                Some(
                    decl.names
                        .iter()
                        .map(|name| {
                            Statement::declare(
                                name.clone(),
                                Expression::Literal(Literal::zero()),
                            )
                        })
                        .collect(),
                )
            })
        });
    }
}
