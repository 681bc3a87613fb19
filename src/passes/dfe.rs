//! Dead-function elimination (spec §4.10 step 1 & step 3). Grounded on
//! `xls/passes/dfe_pass.h`'s "remove functions unreachable from top".

use crate::errors::Result;
use crate::ir::Package;
use crate::passes::{Pass, PassOptions, PassResults};

pub struct DeadFunctionEliminationPass;

impl Pass for DeadFunctionEliminationPass {
    fn name(&self) -> &str {
        "dfe"
    }

    fn run(&self, package: &mut Package, _options: &PassOptions, _results: &mut PassResults) -> Result<bool> {
        let reachable = package.reachable_functions();
        let before = package.functions.len();
        package.functions.retain(|f| package.top.is_none() || reachable.contains_key(&f.name));
        Ok(package.functions.len() != before)
    }
}
