use std::collections::BTreeSet;

use crate::analysis::all_names;
use crate::dialect::Dialect;
use crate::yul::ast::{Block, Name};

/// Hands out names that do not occur anywhere in the tree, among the reserved
/// identifiers or among the builtins.
#[derive(Debug)]
pub struct NameDispenser {
    used: BTreeSet<Name>,
    counter: usize,
}

impl NameDispenser {
    pub fn new(
        dialect: &Dialect,
        ast: &Block,
        reserved: &BTreeSet<Name>,
    ) -> NameDispenser {
        let mut used = all_names(ast);

        used.extend(reserved.iter().cloned());
        used.extend(dialect.fixed_function_names());

        NameDispenser { used, counter: 0 }
    }

    /// A fresh name derived from `hint`. The counter only moves forward, so
    /// names are never handed out twice within a run.
    pub fn new_name(&mut self, hint: &str) -> Name {
        let base = strip_suffix(hint);

        loop {
            self.counter += 1;

            let candidate = format!("{base}_{}", self.counter);

            if self.used.insert(candidate.clone()) {
                return candidate;
            }
        }
    }

    pub fn mark_used(&mut self, name: Name) {
        self.used.insert(name);
    }

    pub fn is_used(&self, name: &str) -> bool {
        self.used.contains(name)
    }
}

/// Removes a trailing `_<digits>` suffix.
pub fn strip_suffix(name: &str) -> &str {
    match name.rsplit_once('_') {
        Some((base, digits))
            if !base.is_empty()
                && !digits.is_empty()
                && digits.bytes().all(|b| b.is_ascii_digit()) =>
        {
            base
        }
        _ => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::yul::YulParser;

    #[test]
    fn fresh_names() {
        let block =
            YulParser::parse_block("{ let x := 1 let x_1 := x }").unwrap();
        let reserved = BTreeSet::from(["x_2".to_owned()]);

        let mut names = NameDispenser::new(&Dialect::evm(), &block, &reserved);

        assert_eq!(names.new_name("x"), "x_3");
        assert_eq!(names.new_name("x_3"), "x_4");
        assert_eq!(names.new_name("y"), "y_5");
        assert_eq!(names.new_name(""), "_6");
        assert!(names.is_used("add"));
    }

    #[test]
    fn suffixes() {
        assert_eq!(strip_suffix("x_12"), "x");
        assert_eq!(strip_suffix("x_"), "x_");
        assert_eq!(strip_suffix("_1"), "_1");
        assert_eq!(strip_suffix("a_b"), "a_b");
    }
}
