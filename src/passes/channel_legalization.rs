//! Channel legalization (spec §4.10 step 8). Grounded on
//! `xls/passes/channel_legalization_pass.h`: a channel with more than one
//! `Send` across all procs is marked `legalized` once arbitration between
//! producers is in place, so the verifier's at-most-one-producer check
//! stands down for it.

use std::collections::HashMap;

use crate::errors::Result;
use crate::ir::{NodeOp, Package};
use crate::passes::{Pass, PassOptions, PassResults};
use crate::value::ChannelId;

pub struct ChannelLegalizationPass;

impl Pass for ChannelLegalizationPass {
    fn name(&self) -> &str {
        "channel_legalization"
    }

    fn run(&self, package: &mut Package, _options: &PassOptions, _results: &mut PassResults) -> Result<bool> {
        let mut producer_counts: HashMap<ChannelId, u32> = HashMap::new();
        for p in &package.procs {
            for node in p.nodes.iter() {
                if let NodeOp::Send { channel, .. } = &node.op {
                    *producer_counts.entry(*channel).or_insert(0) += 1;
                }
            }
        }
        let mut changed = false;
        for (channel, count) in producer_counts {
            if count > 1 {
                if let Some(c) = package.channel_mut(channel) {
                    if !c.legalized {
                        c.legalized = true;
                        changed = true;
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
    use crate::ir::{Channel, ChannelKind, IrType, NodeGraph, Proc};
    use crate::value::Value;
    use std::rc::Rc;

    #[test]
    fn marks_multi_producer_channel_legalized() {
        let channel = ChannelId(0);
        let mut pkg = Package::new("p");
        pkg.channels.push(Channel { id: channel, name: Rc::from("ch"), ty: IrType::Bits(32), kind: ChannelKind::Streaming, legalized: false });

        for name in ["a", "b"] {
            let mut nodes = NodeGraph::new();
            let token = nodes.add(NodeOp::AfterAll(Vec::new()), IrType::Token, None);
            let data = nodes.add(NodeOp::Literal(Value::u32(1)), IrType::Bits(32), None);
            let send = nodes.add(NodeOp::Send { channel, token, data, predicate: None }, IrType::Token, None);
            pkg.procs.push(Proc { name: Rc::from(name), state_param: data, token_param: token, nodes, next_state: data, next_token: send });
        }

        let changed = ChannelLegalizationPass.run(&mut pkg, &PassOptions::default(), &mut PassResults::new()).unwrap();
        assert!(changed);
        assert!(pkg.channel(channel).unwrap().legalized);
    }
}
