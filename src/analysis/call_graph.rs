use std::collections::{BTreeMap, BTreeSet};

use crate::yul::ast::*;
use crate::yul::visitor::{self, Visitor};

/// Calls between user-defined functions.
#[derive(Debug, Default)]
pub struct CallGraph {
    /// Callees of every function, builtins excluded.
    pub calls: BTreeMap<Name, BTreeSet<Name>>,
    /// Functions called from code outside of any function.
    pub roots: BTreeSet<Name>,
}

impl CallGraph {
    pub fn new(block: &Block) -> CallGraph {
        let mut builder = Builder {
            graph: CallGraph::default(),
            stack: Vec::new(),
        };

        builder.visit_block(block);

        let mut graph = builder.graph;
        let defined: BTreeSet<_> = graph.calls.keys().cloned().collect();

        for callees in graph.calls.values_mut() {
            callees.retain(|callee| defined.contains(callee));
        }

        graph.roots.retain(|root| defined.contains(root));
        graph
    }

    /// Functions reachable from top-level code or the given extra roots.
    pub fn reachable<'a, I>(&self, extra: I) -> BTreeSet<Name>
    where
        I: IntoIterator<Item = &'a Name>,
    {
        let mut seen = BTreeSet::new();
        let mut stack: Vec<Name> = self
            .roots
            .iter()
            .cloned()
            .chain(
                extra
                    .into_iter()
                    .filter(|f| self.calls.contains_key(*f))
                    .cloned(),
            )
            .collect();

        while let Some(f) = stack.pop() {
            if !seen.contains(&f) {
                stack.extend(self.calls[&f].iter().cloned());
                seen.insert(f);
            }
        }

        seen
    }

    /// Functions that can call themselves, directly or indirectly.
    pub fn recursive_functions(&self) -> BTreeSet<Name> {
        self.calls
            .keys()
            .filter(|f| {
                let mut seen = BTreeSet::new();
                let mut stack: Vec<&Name> = self.calls[*f].iter().collect();

                while let Some(g) = stack.pop() {
                    if g == *f {
                        return true;
                    }

                    if seen.insert(g) {
                        stack.extend(&self.calls[g]);
                    }
                }

                false
            })
            .cloned()
            .collect()
    }
}

struct Builder {
    graph: CallGraph,
    stack: Vec<Name>,
}

impl<'ast> Visitor<'ast> for Builder {
    fn visit_function_definition(&mut self, def: &'ast FunctionDefinition) {
        self.graph.calls.entry(def.name.clone()).or_default();
        self.stack.push(def.name.clone());

        visitor::visit_function_definition(self, def);

        self.stack.pop();
    }

    fn visit_expression(&mut self, expr: &'ast Expression) {
        if let Expression::FunctionCall(call) = expr {
            match self.stack.last() {
                Some(caller) => {
                    self.graph
                        .calls
                        .entry(caller.clone())
                        .or_default()
                        .insert(call.name.clone());
                }
                None => {
                    self.graph.roots.insert(call.name.clone());
                }
            }
        }

        visitor::visit_expression(self, expr)
    }
}
