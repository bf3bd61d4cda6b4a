//! Editable netlist: an arena of nodes addressed by stable handles.

use crate::gate::Gate;
use crate::type_utils::new_id;
use anyhow::{anyhow, bail, Result};
use std::sync::Arc;

new_id!(NodeId, NodeVec, NodeSlice);

/// Reference to output `output` of node `node`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Link {
    pub node: NodeId,
    pub output: usize,
}

impl Link {
    pub fn new(node: NodeId, output: usize) -> Self {
        Self { node, output }
    }
}

/// Boundary input of a netlist, driven from outside.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputPin {
    pub name: String,
    pub index: usize,
    pub state: bool,
}

/// Boundary output of a netlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPin {
    pub name: String,
    pub index: usize,
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Gate(Arc<Gate>),
    Input(InputPin),
    Output(OutputPin),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    /// One entry per input pin, `None` when disconnected.
    pub inputs: Vec<Option<Link>>,
}

impl Node {
    fn gate(gate: Arc<Gate>) -> Self {
        let inputs = vec![None; gate.inputs.len()];
        Self {
            kind: NodeKind::Gate(gate),
            inputs,
        }
    }
    pub fn n_outputs(&self) -> usize {
        match &self.kind {
            NodeKind::Gate(gate) => gate.outputs.len(),
            NodeKind::Input(_) => 1,
            NodeKind::Output(_) => 0,
        }
    }
    pub fn as_gate(&self) -> Option<&Arc<Gate>> {
        match &self.kind {
            NodeKind::Gate(gate) => Some(gate),
            _ => None,
        }
    }
    pub fn input_pin(&self) -> Option<&InputPin> {
        match &self.kind {
            NodeKind::Input(pin) => Some(pin),
            _ => None,
        }
    }
    pub fn output_pin(&self) -> Option<&OutputPin> {
        match &self.kind {
            NodeKind::Output(pin) => Some(pin),
            _ => None,
        }
    }
    pub fn is_pin(&self) -> bool {
        !matches!(self.kind, NodeKind::Gate(_))
    }
    /// Gate type name, or pin name.
    pub fn name(&self) -> &str {
        match &self.kind {
            NodeKind::Gate(gate) => &gate.name,
            NodeKind::Input(pin) => &pin.name,
            NodeKind::Output(pin) => &pin.name,
        }
    }
    /// Same node, all inputs disconnected.
    pub(crate) fn unlinked_copy(&self) -> Self {
        Self {
            kind: self.kind.clone(),
            inputs: vec![None; self.inputs.len()],
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Netlist {
    /// Removed nodes leave a `None`: handles are never reused.
    nodes: NodeVec<Option<Node>>,
    inputs: Vec<NodeId>,
    outputs: Vec<NodeId>,
}

impl Netlist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place an instance of `gate`, all inputs disconnected.
    pub fn place(&mut self, gate: Arc<Gate>) -> NodeId {
        self.nodes.push(Some(Node::gate(gate)))
    }

    pub fn add_input(&mut self, name: impl Into<String>) -> NodeId {
        let index = self.inputs.len();
        let id = self.nodes.push(Some(Node {
            kind: NodeKind::Input(InputPin {
                name: name.into(),
                index,
                state: false,
            }),
            inputs: vec![],
        }));
        self.inputs.push(id);
        id
    }

    pub fn add_output(&mut self, name: impl Into<String>) -> NodeId {
        let index = self.outputs.len();
        let id = self.nodes.push(Some(Node {
            kind: NodeKind::Output(OutputPin {
                name: name.into(),
                index,
            }),
            inputs: vec![None],
        }));
        self.outputs.push(id);
        id
    }

    /// Insert a node as-is, registering it as a boundary pin when it is one.
    pub(crate) fn insert(&mut self, mut node: Node) -> NodeId {
        let id = self.nodes.next_idx();
        match &mut node.kind {
            NodeKind::Input(pin) => {
                pin.index = self.inputs.len();
                self.inputs.push(id);
            }
            NodeKind::Output(pin) => {
                pin.index = self.outputs.len();
                self.outputs.push(id);
            }
            NodeKind::Gate(_) => {}
        }
        self.nodes.push(Some(node))
    }

    /// Live node behind a handle, `None` for removed or foreign handles.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes
            .get_mut(id)
            .and_then(Option::as_mut)
            .ok_or_else(|| anyhow!("Node {} does not exist.", id))
    }

    /// Live nodes, in handle order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> + '_ {
        self.nodes
            .iter_enumerated()
            .filter_map(|(id, node)| node.as_ref().map(|node| (id, node)))
    }

    /// Live gate instances, in handle order.
    pub fn gates(&self) -> impl Iterator<Item = (NodeId, &Arc<Gate>)> + '_ {
        self.nodes()
            .filter_map(|(id, node)| node.as_gate().map(|gate| (id, gate)))
    }

    pub fn len(&self) -> usize {
        self.nodes().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Boundary inputs, in pin order.
    pub fn inputs(&self) -> &[NodeId] {
        &self.inputs
    }

    /// Boundary outputs, in pin order.
    pub fn outputs(&self) -> &[NodeId] {
        &self.outputs
    }

    pub fn input_by_name(&self, name: &str) -> Option<NodeId> {
        self.inputs
            .iter()
            .copied()
            .find(|id| self.node(*id).is_some_and(|node| node.name() == name))
    }

    pub fn output_by_name(&self, name: &str) -> Option<NodeId> {
        self.outputs
            .iter()
            .copied()
            .find(|id| self.node(*id).is_some_and(|node| node.name() == name))
    }

    /// Connect input `in_index` of `to` to output `out_index` of `from`.
    ///
    /// Returns the link that was replaced, if any.
    pub fn link(
        &mut self,
        to: NodeId,
        in_index: usize,
        from: NodeId,
        out_index: usize,
    ) -> Result<Option<Link>> {
        let Some(source) = self.node(from) else {
            bail!("Cannot link from node {}: it does not exist.", from);
        };
        if out_index >= source.n_outputs() {
            bail!(
                "Node {} ({}) has {} outputs, cannot link from output {}.",
                from,
                source.name(),
                source.n_outputs(),
                out_index
            );
        }
        let dest = self.node_mut(to)?;
        let n_inputs = dest.inputs.len();
        let name = dest.name().to_owned();
        let Some(slot) = dest.inputs.get_mut(in_index) else {
            bail!(
                "Node {} ({}) has {} inputs, cannot link to input {}.",
                to,
                name,
                n_inputs,
                in_index
            );
        };
        Ok(slot.replace(Link::new(from, out_index)))
    }

    /// Disconnect input `in_index` of `to`, returning the previous link.
    pub fn unlink(&mut self, to: NodeId, in_index: usize) -> Result<Option<Link>> {
        let dest = self.node_mut(to)?;
        let n_inputs = dest.inputs.len();
        let Some(slot) = dest.inputs.get_mut(in_index) else {
            bail!(
                "Node {} has {} inputs, cannot unlink input {}.",
                to,
                n_inputs,
                in_index
            );
        };
        Ok(slot.take())
    }

    /// Link feeding input `in_index` of `to`. Links to removed nodes read as disconnected.
    pub fn source(&self, to: NodeId, in_index: usize) -> Option<Link> {
        self.node(to)
            .and_then(|node| node.inputs.get(in_index).copied().flatten())
            .filter(|link| self.node(link.node).is_some())
    }

    /// Remove a node and every link reading from it.
    pub fn remove(&mut self, id: NodeId) -> Result<Node> {
        let node = self
            .nodes
            .get_mut(id)
            .and_then(Option::take)
            .ok_or_else(|| anyhow!("Node {} does not exist.", id))?;
        for other in self.nodes.iter_mut().flatten() {
            for input in other.inputs.iter_mut() {
                if input.is_some_and(|link| link.node == id) {
                    *input = None;
                }
            }
        }
        match node.kind {
            NodeKind::Input(_) => {
                self.inputs.retain(|pin| *pin != id);
                self.reindex_pins();
            }
            NodeKind::Output(_) => {
                self.outputs.retain(|pin| *pin != id);
                self.reindex_pins();
            }
            NodeKind::Gate(_) => {}
        }
        Ok(node)
    }

    fn reindex_pins(&mut self) {
        for (index, id) in self.inputs.iter().enumerate() {
            if let Some(Some(Node {
                kind: NodeKind::Input(pin),
                ..
            })) = self.nodes.get_mut(*id)
            {
                pin.index = index;
            }
        }
        for (index, id) in self.outputs.iter().enumerate() {
            if let Some(Some(Node {
                kind: NodeKind::Output(pin),
                ..
            })) = self.nodes.get_mut(*id)
            {
                pin.index = index;
            }
        }
    }

    fn input_pin_mut(&mut self, id: NodeId) -> Result<&mut InputPin> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Input(pin) => Ok(pin),
            _ => bail!("Node {} is not an input pin.", id),
        }
    }

    /// Set the external state of an input pin.
    pub fn drive(&mut self, pin: NodeId, value: bool) -> Result<()> {
        self.input_pin_mut(pin)?.state = value;
        Ok(())
    }

    /// Flip the external state of an input pin, returning the new state.
    pub fn toggle(&mut self, pin: NodeId) -> Result<bool> {
        let pin = self.input_pin_mut(pin)?;
        pin.state = !pin.state;
        Ok(pin.state)
    }

    pub fn pin_state(&self, pin: NodeId) -> Result<bool> {
        self.node(pin)
            .and_then(Node::input_pin)
            .map(|pin| pin.state)
            .ok_or_else(|| anyhow!("Node {} is not an input pin.", pin))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::{CombBinary, CombUnitary, Primitive};

    fn and_gate() -> Arc<Gate> {
        Arc::new(Primitive::CombBinary(CombBinary::And).gate())
    }

    #[test]
    fn relink_replaces_previous_link() {
        let mut netlist = Netlist::new();
        let a = netlist.add_input("A");
        let b = netlist.add_input("B");
        let and = netlist.place(and_gate());
        assert_eq!(netlist.link(and, 0, a, 0).unwrap(), None);
        assert_eq!(
            netlist.link(and, 0, b, 0).unwrap(),
            Some(Link::new(a, 0))
        );
        assert_eq!(netlist.source(and, 0), Some(Link::new(b, 0)));
        assert_eq!(netlist.unlink(and, 0).unwrap(), Some(Link::new(b, 0)));
        assert_eq!(netlist.source(and, 0), None);
    }

    #[test]
    fn link_rejects_invalid_arity() {
        let mut netlist = Netlist::new();
        let a = netlist.add_input("A");
        let out = netlist.add_output("Q");
        let and = netlist.place(and_gate());
        assert!(netlist.link(and, 2, a, 0).is_err());
        assert!(netlist.link(and, 0, a, 1).is_err());
        // Output pins have no outputs to read from.
        assert!(netlist.link(and, 0, out, 0).is_err());
        assert!(netlist.link(out, 1, and, 0).is_err());
        assert!(netlist.link(out, 0, and, 0).is_ok());
    }

    #[test]
    fn remove_clears_links_and_reindexes_pins() {
        let mut netlist = Netlist::new();
        let a = netlist.add_input("A");
        let b = netlist.add_input("B");
        let not = netlist.place(Arc::new(Primitive::CombUnitary(CombUnitary::Not).gate()));
        netlist.link(not, 0, a, 0).unwrap();
        netlist.remove(a).unwrap();
        assert_eq!(netlist.source(not, 0), None);
        assert_eq!(netlist.inputs(), &[b]);
        assert_eq!(netlist.node(b).unwrap().input_pin().unwrap().index, 0);
        assert!(netlist.node(a).is_none());
        assert!(netlist.remove(a).is_err());
        // Handles are not reused.
        let c = netlist.add_input("C");
        assert_ne!(c, a);
    }

    #[test]
    fn drive_and_toggle_only_apply_to_input_pins() {
        let mut netlist = Netlist::new();
        let a = netlist.add_input("A");
        let and = netlist.place(and_gate());
        netlist.drive(a, true).unwrap();
        assert!(netlist.pin_state(a).unwrap());
        assert!(!netlist.toggle(a).unwrap());
        assert!(netlist.drive(and, true).is_err());
        assert!(netlist.toggle(and).is_err());
        assert_eq!(netlist.input_by_name("A"), Some(a));
    }
}
