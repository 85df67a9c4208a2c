//! Tree-rewriting passes.

mod block_flattener;
mod circular_references_pruner;
mod common_subexpression_eliminator;
mod conditional_simplifier;
mod control_flow_simplifier;
mod dead_code_eliminator;
mod disambiguator;
mod equivalent_function_combiner;
mod expression_inliner;
mod expression_joiner;
mod expression_simplifier;
mod expression_splitter;
mod for_loop_condition;
mod for_loop_init_rewriter;
mod full_inliner;
mod function_grouper;
mod function_hoister;
mod load_resolver;
mod loop_invariant_code_motion;
mod redundant_assign_eliminator;
mod rematerialiser;
mod ssa_reverser;
mod ssa_transform;
mod structural_simplifier;
mod unused_pruner;
mod var_decl_initializer;
mod var_name_cleaner;

pub use block_flattener::BlockFlattener;
pub use circular_references_pruner::CircularReferencesPruner;
pub use common_subexpression_eliminator::CommonSubexpressionEliminator;
pub use conditional_simplifier::{
    ConditionalSimplifier, ConditionalUnsimplifier,
};
pub use control_flow_simplifier::ControlFlowSimplifier;
pub use dead_code_eliminator::DeadCodeEliminator;
pub use disambiguator::Disambiguator;
pub use equivalent_function_combiner::EquivalentFunctionCombiner;
pub use expression_inliner::ExpressionInliner;
pub use expression_joiner::ExpressionJoiner;
pub use expression_simplifier::ExpressionSimplifier;
pub use expression_splitter::ExpressionSplitter;
pub use for_loop_condition::{
    ForLoopConditionIntoBody, ForLoopConditionOutOfBody,
};
pub use for_loop_init_rewriter::ForLoopInitRewriter;
pub use full_inliner::FullInliner;
pub use function_grouper::FunctionGrouper;
pub use function_hoister::FunctionHoister;
pub use load_resolver::LoadResolver;
pub use loop_invariant_code_motion::LoopInvariantCodeMotion;
pub use redundant_assign_eliminator::RedundantAssignEliminator;
pub use rematerialiser::{LiteralRematerialiser, Rematerialiser};
pub use ssa_reverser::SSAReverser;
pub use ssa_transform::SSATransform;
pub use structural_simplifier::StructuralSimplifier;
pub use unused_pruner::UnusedPruner;
pub use var_decl_initializer::VarDeclInitializer;
pub use var_name_cleaner::VarNameCleaner;
