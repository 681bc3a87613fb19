//! Wires `ir::verifier::verify_package` in as an `InvariantChecker` (spec
//! §4.10 "runs after every child pass of the compound it is attached to,
//! fatal on failure"). Grounded on `xls/passes/verifier_checker.h`.

use crate::errors::Result;
use crate::ir::verifier::verify_package;
use crate::ir::Package;
use crate::passes::InvariantChecker;

pub struct VerifierChecker;

impl InvariantChecker for VerifierChecker {
    fn check(&self, package: &Package) -> Result<()> {
        verify_package(package)
    }
}
