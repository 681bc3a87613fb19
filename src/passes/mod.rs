//! Pass manager (spec C10 / §4.10): `Pass`/`CompoundPass`/
//! `FixedPointCompoundPass`/`InvariantChecker` abstractions, plus the
//! individual passes and the registry/pipeline that compose them.
//!
//! Grounded on `xls/passes/pass_base.h` (`PassBase`, `CompoundPassBase`,
//! `FixedPointCompoundPassBase`, `InvariantChecker`) and
//! `xls/passes/optimization_pass_pipeline.cc` (`CreateOptimizationPassPipeline`).

pub mod arith_simplification;
pub mod array_simplification;
pub mod bdd;
pub mod bit_slice_simplification;
pub mod boolean_simplification;
pub mod channel_legalization;
pub mod comparison_simplification;
pub mod concat_simplification;
pub mod conditional_specialization;
pub mod constant_folding;
pub mod cse;
pub mod dataflow_simplification;
pub mod dce;
pub mod dfe;
pub mod identity_removal;
pub mod inlining;
pub mod label_recovery;
pub mod narrowing;
pub mod next_value_optimization;
pub mod pipeline;
pub mod proc_inlining;
pub mod proc_state;
pub mod ram_rewrite;
pub mod reassociation;
pub mod registry;
pub mod select_simplification;
pub mod simplify;
pub mod sparsify_select;
pub mod strength_reduction;
pub(crate) mod support;
pub mod table_switch;
pub mod token;
pub mod unroll;
pub mod useless_assert;
pub mod useless_io;
pub mod verifier_checker;

use crate::errors::Result;
use crate::ir::Package;

/// Per-run configuration threaded through every pass (spec §6 "the driver
/// provides opt_level"). `opt_level` is the ceiling the whole pipeline was
/// constructed with; individual passes additionally carry their own
/// construction-time level, capped at or below this one (spec §4.10 "capped
/// variants").
#[derive(Debug, Clone, Copy)]
pub struct PassOptions {
    pub opt_level: i64,
}

impl Default for PassOptions {
    fn default() -> PassOptions {
        PassOptions { opt_level: 3 }
    }
}

/// Accumulated statistics across a pipeline run (spec §4.10): which named
/// passes actually changed the package, in run order, plus a running
/// iteration count for fixed-point compounds (used to enforce the
/// divergence cap, spec §5).
#[derive(Debug, Clone, Default)]
pub struct PassResults {
    pub changed_passes: Vec<String>,
    pub invariant_checks_run: u64,
}

impl PassResults {
    pub fn new() -> PassResults {
        PassResults::default()
    }

    fn record(&mut self, name: &str, changed: bool) {
        if changed {
            self.changed_passes.push(name.to_string());
        }
    }
}

/// A single transformation over the whole package (spec §4.10 "Pass
/// abstractions"). `run` returns whether it changed anything; the compound
/// OR-folds this across its children to decide whether a fixed-point round
/// needs to repeat.
pub trait Pass {
    fn name(&self) -> &str;
    fn run(&self, package: &mut Package, options: &PassOptions, results: &mut PassResults) -> Result<bool>;
}

/// Fatal when it fails (spec "failure is fatal"); runs after every child of
/// the compound it's attached to.
pub trait InvariantChecker {
    fn check(&self, package: &Package) -> Result<()>;
}

/// Ordered sequence of child passes, with zero or more invariant checkers run
/// after each child (spec "`InvariantChecker` — runs after every child pass
/// of the compound it is attached to").
pub struct CompoundPass {
    name: String,
    children: Vec<Box<dyn Pass>>,
    invariant_checkers: Vec<Box<dyn InvariantChecker>>,
}

impl CompoundPass {
    pub fn new(name: impl Into<String>) -> CompoundPass {
        CompoundPass { name: name.into(), children: Vec::new(), invariant_checkers: Vec::new() }
    }

    pub fn add(mut self, pass: Box<dyn Pass>) -> CompoundPass {
        self.children.push(pass);
        self
    }

    pub fn add_invariant_checker(mut self, checker: Box<dyn InvariantChecker>) -> CompoundPass {
        self.invariant_checkers.push(checker);
        self
    }

    fn run_children(&self, package: &mut Package, options: &PassOptions, results: &mut PassResults) -> Result<bool> {
        let mut changed = false;
        for child in &self.children {
            let child_changed = child.run(package, options, results)?;
            results.record(child.name(), child_changed);
            changed |= child_changed;
            for checker in &self.invariant_checkers {
                results.invariant_checks_run += 1;
                checker.check(package)?;
            }
        }
        Ok(changed)
    }
}

impl Pass for CompoundPass {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, package: &mut Package, options: &PassOptions, results: &mut PassResults) -> Result<bool> {
        self.run_children(package, options, results)
    }
}

/// Repeats its body until a full sweep reports no change, bounded by
/// `max_iterations` to "fail on exceed to prevent divergence" (spec §5).
pub struct FixedPointCompoundPass {
    inner: CompoundPass,
    max_iterations: u32,
}

impl FixedPointCompoundPass {
    pub fn new(name: impl Into<String>) -> FixedPointCompoundPass {
        FixedPointCompoundPass { inner: CompoundPass::new(name), max_iterations: 64 }
    }

    pub fn add(mut self, pass: Box<dyn Pass>) -> FixedPointCompoundPass {
        self.inner = self.inner.add(pass);
        self
    }

    pub fn add_invariant_checker(mut self, checker: Box<dyn InvariantChecker>) -> FixedPointCompoundPass {
        self.inner = self.inner.add_invariant_checker(checker);
        self
    }

    pub fn with_max_iterations(mut self, n: u32) -> FixedPointCompoundPass {
        self.max_iterations = n;
        self
    }
}

impl Pass for FixedPointCompoundPass {
    fn name(&self) -> &str {
        &self.inner.name
    }

    fn run(&self, package: &mut Package, options: &PassOptions, results: &mut PassResults) -> Result<bool> {
        let mut any_changed = false;
        for iteration in 0..self.max_iterations {
            let changed = self.inner.run_children(package, options, results)?;
            any_changed |= changed;
            if !changed {
                return Ok(any_changed);
            }
            let _ = iteration;
        }
        Err(crate::errors::Error::internal(
            crate::source::Span::dummy(),
            format!("fixed-point pass `{}` did not converge within {} iterations", self.inner.name, self.max_iterations),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{IrType, NodeGraph, NodeOp};
    use crate::value::Value;
    use std::rc::Rc;

    struct AlwaysChanges;
    impl Pass for AlwaysChanges {
        fn name(&self) -> &str {
            "always_changes"
        }
        fn run(&self, _package: &mut Package, _options: &PassOptions, _results: &mut PassResults) -> Result<bool> {
            Ok(true)
        }
    }

    #[test]
    fn fixed_point_pass_errors_on_non_convergence() {
        let pass = FixedPointCompoundPass::new("fp").add(Box::new(AlwaysChanges)).with_max_iterations(4);
        let mut pkg = Package::new("p");
        let mut results = PassResults::new();
        let err = pass.run(&mut pkg, &PassOptions::default(), &mut results).unwrap_err();
        assert!(matches!(err, crate::errors::Error::Internal { .. }));
    }

    #[test]
    fn compound_pass_runs_invariant_checker_after_each_child() {
        struct CountingChecker(std::cell::RefCell<u32>);
        impl InvariantChecker for CountingChecker {
            fn check(&self, _package: &Package) -> Result<()> {
                *self.0.borrow_mut() += 1;
                Ok(())
            }
        }
        let mut nodes = NodeGraph::new();
        let lit = nodes.add(NodeOp::Literal(Value::u32(1)), IrType::Bits(32), None);
        let mut pkg = Package::new("p");
        pkg.functions.push(crate::ir::Function { name: Rc::from("f"), params: Vec::new(), nodes, ret: lit });

        let compound = CompoundPass::new("top")
            .add(Box::new(AlwaysChangesOnce::new()))
            .add(Box::new(AlwaysChangesOnce::new()))
            .add_invariant_checker(Box::new(CountingChecker(std::cell::RefCell::new(0))));
        let mut results = PassResults::new();
        compound.run(&mut pkg, &PassOptions::default(), &mut results).unwrap();
        assert_eq!(results.changed_passes.len(), 2);
    }

    struct AlwaysChangesOnce;
    impl AlwaysChangesOnce {
        fn new() -> AlwaysChangesOnce {
            AlwaysChangesOnce
        }
    }
    impl Pass for AlwaysChangesOnce {
        fn name(&self) -> &str {
            "once"
        }
        fn run(&self, _package: &mut Package, _options: &PassOptions, _results: &mut PassResults) -> Result<bool> {
            Ok(true)
        }
    }
}
