//! Evaluation engine: memoized backward walk over a netlist for one tick.
//!
//! Each node is evaluated at most once per context. A link whose source is on the current walk
//! closes a feedback loop: it reads the source's outputs from the previous tick (false when there
//! is no previous tick), which gives feedback loops a one-tick propagation delay.

use crate::context::ComputeContext;
use crate::gate::{Gate, Scope};
use crate::netlist::{InputPin, Link, Netlist, NodeId, NodeKind};

pub struct Evaluator<'a> {
    netlist: &'a Netlist,
    current: &'a mut ComputeContext,
    previous: Option<&'a ComputeContext>,
}

#[derive(Debug)]
struct Frame {
    node: NodeId,
    inputs: Vec<bool>,
}

enum Step {
    Value(bool),
    Descend(NodeId),
}

impl<'a> Evaluator<'a> {
    pub fn new(
        netlist: &'a Netlist,
        current: &'a mut ComputeContext,
        previous: Option<&'a ComputeContext>,
    ) -> Self {
        Self {
            netlist,
            current,
            previous,
        }
    }

    /// Outputs of `node` for this tick.
    ///
    /// Output pins and removed nodes have no outputs.
    pub fn eval_node(&mut self, root: NodeId) -> Vec<bool> {
        if let Some(outputs) = self.current.cached(root) {
            return outputs.to_vec();
        }
        let netlist = self.netlist;
        match netlist.node(root).map(|node| &node.kind) {
            Some(NodeKind::Gate(_)) => {}
            Some(NodeKind::Input(pin)) => return vec![self.eval_input(root, pin)],
            Some(NodeKind::Output(_)) | None => return vec![],
        }
        let mut frames = vec![Frame::new(root)];
        self.current.processing.push(root);
        while let Some(frame) = frames.last_mut() {
            let Some(node) = netlist.node(frame.node) else {
                unreachable!("only live gate nodes are walked");
            };
            let NodeKind::Gate(gate) = &node.kind else {
                unreachable!("only live gate nodes are walked");
            };
            if let Some(link) = node.inputs.get(frame.inputs.len()) {
                match self.step(*link) {
                    Step::Value(value) => frame.inputs.push(value),
                    Step::Descend(source) => {
                        self.current.processing.push(source);
                        frames.push(Frame::new(source));
                    }
                }
            } else {
                let id = frame.node;
                let inputs = std::mem::take(&mut frame.inputs);
                frames.pop();
                let outputs = self.apply(id, gate, &inputs);
                self.current.cache(id, outputs);
                self.current.processing.pop();
            }
        }
        self.current
            .cached(root)
            .map(<[bool]>::to_vec)
            .unwrap_or_default()
    }

    pub fn eval_link(&mut self, link: Option<Link>) -> bool {
        match link {
            Some(link) if self.netlist.node(link.node).is_some() => self
                .eval_node(link.node)
                .get(link.output)
                .copied()
                .unwrap_or(false),
            _ => false,
        }
    }

    pub fn read_pin(&mut self, output_pin: NodeId) -> bool {
        let link = self.netlist.source(output_pin, 0);
        self.eval_link(link)
    }

    fn eval_input(&mut self, node: NodeId, pin: &InputPin) -> bool {
        let value = self.current.pin(node).unwrap_or(pin.state);
        self.current.cache(node, vec![value]);
        value
    }

    fn step(&mut self, link: Option<Link>) -> Step {
        let Some(link) = link else {
            return Step::Value(false);
        };
        let netlist = self.netlist;
        let Some(source) = netlist.node(link.node) else {
            return Step::Value(false);
        };
        if self.current.processing.contains(link.node) {
            let value = self
                .previous
                .and_then(|previous| previous.output(link))
                .unwrap_or(false);
            return Step::Value(value);
        }
        if let Some(value) = self.current.output(link) {
            return Step::Value(value);
        }
        match &source.kind {
            NodeKind::Gate(_) => Step::Descend(link.node),
            NodeKind::Input(pin) => Step::Value(self.eval_input(link.node, pin)),
            NodeKind::Output(_) => Step::Value(false),
        }
    }

    fn apply(&mut self, node: NodeId, gate: &Gate, inputs: &[bool]) -> Vec<bool> {
        if gate.is_hierarchical() {
            let previous = self.previous.and_then(|previous| previous.sub_context(node));
            gate.compute(inputs, Scope::new(self.current.sub_context_mut(node), previous))
        } else {
            gate.compute(inputs, Scope::new(&mut ComputeContext::new(), None))
        }
    }
}

impl Frame {
    fn new(node: NodeId) -> Self {
        Self {
            node,
            inputs: Vec::new(),
        }
    }
}
