//! Per-tick evaluation state.

use crate::netlist::{Link, NodeId};
use fnv::FnvHashMap as HashMap;

/// Stack of the nodes on the current walk, with constant-time membership test.
///
/// A node is on the stack at most once: pushing it again is refused.
#[derive(Debug, Clone, Default)]
pub struct ProcessingStack {
    stack: Vec<NodeId>,
    present: bit_set::BitSet,
}

impl ProcessingStack {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn push(&mut self, node: NodeId) -> bool {
        if !self.present.insert(node.index()) {
            return false;
        }
        self.stack.push(node);
        true
    }
    pub fn pop(&mut self) -> Option<NodeId> {
        let node = self.stack.pop()?;
        self.present.remove(node.index());
        Some(node)
    }
    pub fn contains(&self, node: NodeId) -> bool {
        self.present.contains(node.index())
    }
    pub fn len(&self) -> usize {
        self.stack.len()
    }
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }
}

/// Scope of one simulation tick of one netlist.
#[derive(Debug, Clone, Default)]
pub struct ComputeContext {
    cached: HashMap<NodeId, Vec<bool>>,
    pub(crate) processing: ProcessingStack,
    /// Nested contexts of the hierarchical gate instances, keyed by the calling node.
    sub_contexts: HashMap<NodeId, ComputeContext>,
    // Overrides the pin states stored in the netlist.
    pins: HashMap<NodeId, bool>,
}

impl ComputeContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pins(pins: impl IntoIterator<Item = (NodeId, bool)>) -> Self {
        Self {
            pins: pins.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn cached(&self, node: NodeId) -> Option<&[bool]> {
        self.cached.get(&node).map(Vec::as_slice)
    }

    pub fn output(&self, link: Link) -> Option<bool> {
        self.cached(link.node)
            .and_then(|outputs| outputs.get(link.output).copied())
    }

    pub fn is_cached(&self, node: NodeId) -> bool {
        self.cached.contains_key(&node)
    }

    pub fn n_cached(&self) -> usize {
        self.cached.len()
    }

    pub(crate) fn cache(&mut self, node: NodeId, outputs: Vec<bool>) {
        let previous = self.cached.insert(node, outputs);
        debug_assert!(previous.is_none(), "node {} evaluated twice", node);
    }

    pub fn sub_context(&self, node: NodeId) -> Option<&ComputeContext> {
        self.sub_contexts.get(&node)
    }

    pub(crate) fn sub_context_mut(&mut self, node: NodeId) -> &mut ComputeContext {
        self.sub_contexts.entry(node).or_default()
    }

    pub fn pin(&self, node: NodeId) -> Option<bool> {
        self.pins.get(&node).copied()
    }

    pub fn set_pin(&mut self, node: NodeId, value: bool) {
        self.pins.insert(node, value);
    }
}
