//! Reproduces spec §8 seed scenario 6: given a trivial IR
//! `fn f(x: u32) -> u32 { x }`, the full pipeline reports no changes on the
//! second run, and the verifier passes after every pass both times.

use std::rc::Rc;

use dslc::ir::{Function, IrType, NodeGraph, NodeOp, Package};
use dslc::ir::verifier::verify_package;
use dslc::passes::pipeline::{run_pipeline, PassPipelineOptions};

fn identity_package() -> Package {
    let mut nodes = NodeGraph::new();
    let x = nodes.add(NodeOp::Param(Rc::from("x")), IrType::Bits(32), None);
    let mut pkg = Package::new("p");
    pkg.functions.push(Function { name: Rc::from("f"), params: vec![(Rc::from("x"), x)], nodes, ret: x });
    pkg.top = Some(Rc::from("f"));
    pkg
}

#[test]
fn pipeline_is_idempotent_on_an_already_optimal_package() {
    let mut pkg = identity_package();
    let options = PassPipelineOptions { opt_level: 3, pipeline_spec: None };

    run_pipeline(&mut pkg, &options).unwrap();
    verify_package(&pkg).unwrap();

    let second = run_pipeline(&mut pkg, &options).unwrap();
    verify_package(&pkg).unwrap();

    assert!(second.changed_passes.is_empty());
}

#[test]
fn pipeline_converges_from_a_redundant_expression() {
    let mut nodes = NodeGraph::new();
    let x = nodes.add(NodeOp::Param(Rc::from("x")), IrType::Bits(32), None);
    let identity = nodes.add(NodeOp::Unary(dslc::ir::UnOp::Identity, x), IrType::Bits(32), None);
    let mut pkg = Package::new("p");
    pkg.functions.push(Function { name: Rc::from("f"), params: vec![(Rc::from("x"), x)], nodes, ret: identity });
    pkg.top = Some(Rc::from("f"));

    let options = PassPipelineOptions { opt_level: 3, pipeline_spec: None };
    run_pipeline(&mut pkg, &options).unwrap();
    assert_eq!(pkg.functions[0].ret, x);

    let second = run_pipeline(&mut pkg, &options).unwrap();
    assert!(second.changed_passes.is_empty());
}
