use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

use super::names::NameDispenser;
use super::transform::*;
use crate::dialect::Dialect;
use crate::yul::ast::{Block, Name};

/// State shared by every pass of a single optimiser run.
pub struct PassContext<'pm> {
    pub dialect: &'pm Dialect,
    pub dispenser: NameDispenser,
    /// Identifiers no pass may rename or remove.
    pub reserved: &'pm BTreeSet<Name>,
}

impl<'pm> PassContext<'pm> {
    pub fn new(
        dialect: &'pm Dialect,
        ast: &Block,
        reserved: &'pm BTreeSet<Name>,
    ) -> PassContext<'pm> {
        PassContext {
            dialect,
            dispenser: NameDispenser::new(dialect, ast, reserved),
            reserved,
        }
    }

    pub fn is_reserved(&self, name: &str) -> bool {
        self.reserved.contains(name)
    }
}

pub trait Pass {
    const NAME: &'static str;

    fn run(ctx: &mut PassContext, ast: &mut Block);
}

/// A registered pass.
#[derive(Clone, Copy)]
pub struct Step {
    pub name: &'static str,
    pub run: fn(&mut PassContext, &mut Block),
}

impl Step {
    fn of<P: Pass>() -> Step {
        Step {
            name: P::NAME,
            run: P::run,
        }
    }
}

macro_rules! register_steps {
    ($( $pass:ty ),* $(,)?) => {
        fn build_steps() -> BTreeMap<&'static str, Step> {
            let mut steps = BTreeMap::new();

            $(
                let step = Step::of::<$pass>();

                assert!(
                    steps.insert(step.name, step).is_none(),
                    "pass `{}` registered twice",
                    step.name,
                );
            )*

            steps
        }
    };
}

register_steps!(
    BlockFlattener,
    CircularReferencesPruner,
    CommonSubexpressionEliminator,
    ConditionalSimplifier,
    ConditionalUnsimplifier,
    ControlFlowSimplifier,
    DeadCodeEliminator,
    EquivalentFunctionCombiner,
    ExpressionInliner,
    ExpressionJoiner,
    ExpressionSimplifier,
    ExpressionSplitter,
    ForLoopConditionIntoBody,
    ForLoopConditionOutOfBody,
    ForLoopInitRewriter,
    FullInliner,
    FunctionGrouper,
    FunctionHoister,
    LiteralRematerialiser,
    LoadResolver,
    LoopInvariantCodeMotion,
    RedundantAssignEliminator,
    Rematerialiser,
    SSAReverser,
    SSATransform,
    StructuralSimplifier,
    UnusedPruner,
    VarDeclInitializer,
);

/// Characters with a meaning of their own in step sequences.
pub const SYNTAX_CHARACTERS: [char; 3] = [' ', '(', ')'];

const ABBREVIATIONS: [(&str, char); 28] = [
    (BlockFlattener::NAME, 'f'),
    (CircularReferencesPruner::NAME, 'l'),
    (CommonSubexpressionEliminator::NAME, 'c'),
    (ConditionalSimplifier::NAME, 'C'),
    (ConditionalUnsimplifier::NAME, 'U'),
    (ControlFlowSimplifier::NAME, 'n'),
    (DeadCodeEliminator::NAME, 'D'),
    (EquivalentFunctionCombiner::NAME, 'v'),
    (ExpressionInliner::NAME, 'e'),
    (ExpressionJoiner::NAME, 'j'),
    (ExpressionSimplifier::NAME, 's'),
    (ExpressionSplitter::NAME, 'x'),
    (ForLoopConditionIntoBody::NAME, 'I'),
    (ForLoopConditionOutOfBody::NAME, 'O'),
    (ForLoopInitRewriter::NAME, 'o'),
    (FullInliner::NAME, 'i'),
    (FunctionGrouper::NAME, 'g'),
    (FunctionHoister::NAME, 'h'),
    (LiteralRematerialiser::NAME, 'T'),
    (LoadResolver::NAME, 'L'),
    (LoopInvariantCodeMotion::NAME, 'M'),
    (RedundantAssignEliminator::NAME, 'r'),
    (Rematerialiser::NAME, 'm'),
    (SSAReverser::NAME, 'V'),
    (SSATransform::NAME, 'a'),
    (StructuralSimplifier::NAME, 't'),
    (UnusedPruner::NAME, 'u'),
    (VarDeclInitializer::NAME, 'd'),
];

/// Every pass available to step sequences, by name.
pub fn all_steps() -> &'static BTreeMap<&'static str, Step> {
    static STEPS: OnceLock<BTreeMap<&'static str, Step>> = OnceLock::new();

    STEPS.get_or_init(build_steps)
}

pub fn name_to_abbreviation() -> &'static BTreeMap<&'static str, char> {
    static TABLE: OnceLock<BTreeMap<&'static str, char>> = OnceLock::new();

    TABLE.get_or_init(|| {
        let table: BTreeMap<_, _> = ABBREVIATIONS.into_iter().collect();

        assert_eq!(
            table.len(),
            all_steps().len(),
            "abbreviation table out of sync with the registered passes",
        );

        for (name, abbreviation) in &table {
            assert!(
                all_steps().contains_key(name),
                "abbreviation `{abbreviation}` names unknown pass `{name}`",
            );
            assert!(
                abbreviation.is_ascii_graphic()
                    && !SYNTAX_CHARACTERS.contains(abbreviation),
                "invalid abbreviation `{abbreviation}` for `{name}`",
            );
        }

        table
    })
}

pub fn abbreviation_to_name() -> &'static BTreeMap<char, &'static str> {
    static TABLE: OnceLock<BTreeMap<char, &'static str>> = OnceLock::new();

    TABLE.get_or_init(|| {
        let table: BTreeMap<_, _> = name_to_abbreviation()
            .iter()
            .map(|(&name, &abbreviation)| (abbreviation, name))
            .collect();

        assert_eq!(
            table.len(),
            name_to_abbreviation().len(),
            "abbreviation shared by several passes",
        );

        table
    })
}

/// Looks up the pass behind an abbreviation.
pub fn step_for(abbreviation: char) -> Option<&'static Step> {
    abbreviation_to_name()
        .get(&abbreviation)
        .map(|name| &all_steps()[name])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_is_consistent() {
        assert_eq!(all_steps().len(), 28);
        assert_eq!(name_to_abbreviation().len(), all_steps().len());
        assert_eq!(abbreviation_to_name().len(), all_steps().len());

        for (name, abbreviation) in name_to_abbreviation() {
            assert_eq!(abbreviation_to_name()[abbreviation], *name);
            assert_eq!(step_for(*abbreviation).map(|s| s.name), Some(*name));
        }
    }

    #[test]
    fn cleanup_is_not_registered() {
        assert!(!all_steps().contains_key(VarNameCleaner::NAME));
        assert!(!all_steps().contains_key(Disambiguator::NAME));
        assert!(step_for('(').is_none());
        assert!(step_for('?').is_none());
    }
}
