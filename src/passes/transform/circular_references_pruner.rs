use crate::analysis::CallGraph;
use crate::passes::{Pass, PassContext};
use crate::utils::rewrite::for_each_block_mut;
use crate::yul::ast::*;

/// Removes functions that are not reachable from the code outside of
/// functions, including groups that only call each other.
pub struct CircularReferencesPruner;

impl Pass for CircularReferencesPruner {
    const NAME: &'static str = "CircularReferencesPruner";

    fn run(ctx: &mut PassContext, ast: &mut Block) {
        let reachable = CallGraph::new(ast).reachable(ctx.reserved);

        for_each_block_mut(ast, &mut |block| {
            block.statements.retain(|stmt| match stmt {
                Statement::FunctionDefinition(def) => {
                    reachable.contains(&def.name) || ctx.is_reserved(&def.name)
                }
                _ => true,
            })
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::testing::{apply, check, parse};
    use crate::yul::printer::print;

    #[test]
    fn prunes_cycles() {
        check::<CircularReferencesPruner>(
            "{
                f()
                function f() { g() }
                function g() { f() }
                function h() { k() }
                function k() { h() }
            }",
            "{
                f()
                function f() { g() }
                function g() { f() }
            }",
        );
    }

    #[test]
    fn keeps_reserved() {
        let src = "{ function h() { k() } function k() { } }";

        assert_eq!(
            print(&apply::<CircularReferencesPruner>(src, &["h"])),
            print(&parse(src))
        );
    }
}
