//! `SimplificationPass`/`FixedPointSimplificationPass` (spec §4.10 step 2 &
//! step 4/10): the named bundle of simplification passes, each interleaved
//! with DCE, exactly as `AddSimplificationPasses` builds them in
//! `xls/passes/optimization_pass_pipeline.cc`.

pub mod canonicalization;

use crate::passes::{
    arith_simplification::ArithSimplificationPass, array_simplification::ArraySimplificationPass,
    bit_slice_simplification::BitSliceSimplificationPass, boolean_simplification::BooleanSimplificationPass,
    comparison_simplification::ComparisonSimplificationPass, concat_simplification::ConcatSimplificationPass,
    constant_folding::ConstantFoldingPass, cse::CsePass, dce::DeadCodeEliminationPass, identity_removal::IdentityRemovalPass,
    narrowing::NarrowingAnalysis, narrowing::NarrowingPass, reassociation::ReassociationPass,
    select_simplification::SelectSimplificationPass, sparsify_select::SparsifySelectPass,
    strength_reduction::StrengthReductionPass, table_switch::TableSwitchPass, CompoundPass, FixedPointCompoundPass, Pass,
};
use canonicalization::CanonicalizationPass;

fn add_simplification_passes(opt_level: i64) -> Vec<Box<dyn Pass>> {
    vec![
        Box::new(IdentityRemovalPass),
        Box::new(ConstantFoldingPass),
        Box::new(DeadCodeEliminationPass),
        Box::new(CanonicalizationPass),
        Box::new(DeadCodeEliminationPass),
        Box::new(ArithSimplificationPass { opt_level }),
        Box::new(DeadCodeEliminationPass),
        Box::new(TableSwitchPass),
        Box::new(DeadCodeEliminationPass),
        Box::new(SelectSimplificationPass { opt_level }),
        Box::new(DeadCodeEliminationPass),
        Box::new(SparsifySelectPass),
        Box::new(DeadCodeEliminationPass),
        Box::new(ComparisonSimplificationPass),
        Box::new(DeadCodeEliminationPass),
        Box::new(ReassociationPass),
        Box::new(DeadCodeEliminationPass),
        Box::new(ConstantFoldingPass),
        Box::new(DeadCodeEliminationPass),
        Box::new(BitSliceSimplificationPass { opt_level }),
        Box::new(DeadCodeEliminationPass),
        Box::new(ConcatSimplificationPass { opt_level }),
        Box::new(DeadCodeEliminationPass),
        Box::new(StrengthReductionPass { opt_level }),
        Box::new(DeadCodeEliminationPass),
        Box::new(ArraySimplificationPass { opt_level }),
        Box::new(DeadCodeEliminationPass),
        Box::new(CsePass),
        Box::new(DeadCodeEliminationPass),
        Box::new(NarrowingPass { analysis: NarrowingAnalysis::Ternary, opt_level }),
        Box::new(DeadCodeEliminationPass),
        Box::new(BooleanSimplificationPass),
        Box::new(DeadCodeEliminationPass),
    ]
}

pub fn simplification_pass(opt_level: i64) -> CompoundPass {
    let mut pass = CompoundPass::new("simp");
    for child in add_simplification_passes(opt_level) {
        pass = pass.add(child);
    }
    pass
}

pub fn fixed_point_simplification_pass(opt_level: i64) -> FixedPointCompoundPass {
    let mut pass = FixedPointCompoundPass::new("fixedpoint_simp");
    for child in add_simplification_passes(opt_level) {
        pass = pass.add(child);
    }
    pass
}
