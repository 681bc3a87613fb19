//! RAM rewrite (spec §4.10 step 7, alongside useless-assert/IO removal).
//! Grounded on `xls/passes/ram_rewrite_pass.h`, scoped down to what this
//! crate's IR can express: full read/write-port synthesis is a codegen
//! concern (out of scope per spec's Non-goals on physical memory mapping).
//! What's in scope: a `SingleValue` channel used by both a `Send` and a
//! `Receive` within the same proc is a self-contained register/RAM cell with
//! exactly one producer and one consumer by construction, so it never needs
//! the general multi-producer arbitration `channel_legalization` exists for
//! — this pass marks it `legalized` once and for all.

use std::collections::HashSet;

use crate::errors::Result;
use crate::ir::{ChannelKind, NodeOp, Package};
use crate::passes::{Pass, PassOptions, PassResults};
use crate::value::ChannelId;

pub struct RamRewritePass;

impl Pass for RamRewritePass {
    fn name(&self) -> &str {
        "ram_rewrite"
    }

    fn run(&self, package: &mut Package, _options: &PassOptions, _results: &mut PassResults) -> Result<bool> {
        let mut changed = false;
        for p in &package.procs {
            let mut sent: HashSet<ChannelId> = HashSet::new();
            let mut received: HashSet<ChannelId> = HashSet::new();
            for node in p.nodes.iter() {
                match &node.op {
                    NodeOp::Send { channel, .. } => {
                        sent.insert(*channel);
                    }
                    NodeOp::Receive { channel, .. } => {
                        received.insert(*channel);
                    }
                    _ => {}
                }
            }
            for channel in sent.intersection(&received) {
                if let Some(c) = package.channels.iter().find(|c| c.id == *channel) {
                    if c.kind == ChannelKind::SingleValue && !c.legalized {
                        changed = true;
                    }
                }
            }
        }
        if changed {
            for p in &package.procs {
                let mut sent: HashSet<ChannelId> = HashSet::new();
                let mut received: HashSet<ChannelId> = HashSet::new();
                for node in p.nodes.iter() {
                    match &node.op {
                        NodeOp::Send { channel, .. } => {
                            sent.insert(*channel);
                        }
                        NodeOp::Receive { channel, .. } => {
                            received.insert(*channel);
                        }
                        _ => {}
                    }
                }
                for channel in sent.intersection(&received).copied().collect::<Vec<_>>() {
                    if let Some(c) = package.channel_mut(channel) {
                        if c.kind == ChannelKind::SingleValue {
                            c.legalized = true;
                        }
                    }
                }
            }
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Channel, IrType, NodeGraph, Proc};
    use crate::value::Value;
    use std::rc::Rc;

    #[test]
    fn single_value_channel_used_both_ways_is_legalized() {
        let channel = ChannelId(0);
        let mut pkg = Package::new("p");
        pkg.channels.push(Channel { id: channel, name: Rc::from("reg"), ty: IrType::Bits(32), kind: ChannelKind::SingleValue, legalized: false });

        let mut nodes = NodeGraph::new();
        let token = nodes.add(NodeOp::AfterAll(Vec::new()), IrType::Token, None);
        let data = nodes.add(NodeOp::Literal(Value::u32(1)), IrType::Bits(32), None);
        let send = nodes.add(NodeOp::Send { channel, token, data, predicate: None }, IrType::Token, None);
        let recv = nodes.add(NodeOp::Receive { channel, token: send, predicate: None }, IrType::Token, None);
        pkg.procs.push(Proc { name: Rc::from("p"), state_param: data, token_param: token, nodes, next_state: data, next_token: recv });

        let changed = RamRewritePass.run(&mut pkg, &PassOptions::default(), &mut PassResults::new()).unwrap();
        assert!(changed);
        assert!(pkg.channel(channel).unwrap().legalized);
    }
}
