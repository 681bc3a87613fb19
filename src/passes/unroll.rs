//! Loop unrolling (spec §4.10 step 3). Grounded on
//! `xls/passes/unroll_pass.h`. This crate's IR (§3) has no loop-carrying
//! node of its own — a `for` expression's constexpr trip count is unrolled
//! during bytecode emission (C9), so by the time a `Package` reaches the
//! pass pipeline every loop is already straight-line. `UnrollPass` is kept
//! as a named, callable no-op so the registry/pipeline still have a slot to
//! invoke if a future IR-level loop construct is added — see `DESIGN.md`.

use crate::errors::Result;
use crate::ir::Package;
use crate::passes::{Pass, PassOptions, PassResults};

pub struct UnrollPass;

impl Pass for UnrollPass {
    fn name(&self) -> &str {
        "unroll"
    }

    fn run(&self, _package: &mut Package, _options: &PassOptions, _results: &mut PassResults) -> Result<bool> {
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Package;

    #[test]
    fn is_a_no_op_over_an_already_unrolled_ir() {
        let mut pkg = Package::new("p");
        let changed = UnrollPass.run(&mut pkg, &PassOptions::default(), &mut PassResults::new()).unwrap();
        assert!(!changed);
    }
}
