//! Deep copies of node sets, preserving the wiring inside the copied set.
//!
//! Copies are made in two passes (create every copy, then rewire) so that links between copied
//! nodes resolve regardless of the order of the set, including self-loops.

use crate::netlist::{Netlist, Node, NodeId};
use anyhow::{bail, Result};
use fnv::FnvHashMap as HashMap;
use indexmap::IndexSet;

/// Maps original nodes to their copies.
pub type CloneMap = HashMap<NodeId, NodeId>;

impl Netlist {
    fn clone_set(
        &self,
        nodes: impl IntoIterator<Item = NodeId>,
        include_pins: bool,
    ) -> Result<IndexSet<NodeId>> {
        let mut set = IndexSet::new();
        for id in nodes {
            let Some(node) = self.node(id) else {
                bail!("Cannot copy node {}: it does not exist.", id);
            };
            if include_pins || !node.is_pin() {
                set.insert(id);
            }
        }
        Ok(set)
    }

    /// Copy `nodes` within this netlist.
    ///
    /// Links between copied nodes point to the copies, links from outside the set keep pointing
    /// to the original sources. Boundary pins in `nodes` are copied only if `include_pins`, and
    /// their copies are appended to the boundary pins of the netlist.
    pub fn duplicate(
        &mut self,
        nodes: impl IntoIterator<Item = NodeId>,
        include_pins: bool,
    ) -> Result<CloneMap> {
        let originals = self.clone_set(nodes, include_pins)?;
        let mut clones = CloneMap::default();
        for id in &originals {
            if let Some(copy) = self.node(*id).map(Node::unlinked_copy) {
                clones.insert(*id, self.insert(copy));
            }
        }
        for id in &originals {
            let links = self
                .node(*id)
                .map(|node| node.inputs.clone())
                .unwrap_or_default();
            for (in_index, link) in links.into_iter().enumerate() {
                let Some(link) = link.filter(|link| self.node(link.node).is_some()) else {
                    continue;
                };
                let source = clones.get(&link.node).copied().unwrap_or(link.node);
                self.link(clones[id], in_index, source, link.output)?;
            }
        }
        Ok(clones)
    }

    /// Copy `nodes` (boundary pins included) into a new, isolated netlist.
    ///
    /// Links from outside the set are dropped. Boundary pins of the new netlist are ordered as
    /// they appear in `nodes`.
    pub fn extract(&self, nodes: impl IntoIterator<Item = NodeId>) -> Result<(Netlist, CloneMap)> {
        let originals = self.clone_set(nodes, true)?;
        let mut netlist = Netlist::new();
        let mut clones = CloneMap::default();
        for id in &originals {
            if let Some(copy) = self.node(*id).map(Node::unlinked_copy) {
                clones.insert(*id, netlist.insert(copy));
            }
        }
        for id in &originals {
            let Some(node) = self.node(*id) else {
                continue;
            };
            for (in_index, link) in node.inputs.iter().enumerate() {
                let Some(link) = link else {
                    continue;
                };
                if let Some(source) = clones.get(&link.node) {
                    netlist.link(clones[id], in_index, *source, link.output)?;
                }
            }
        }
        Ok((netlist, clones))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlist::Link;
    use crate::primitives::{CombBinary, Primitive};
    use std::sync::Arc;

    fn or_gate() -> Arc<crate::gate::Gate> {
        Arc::new(Primitive::CombBinary(CombBinary::Or).gate())
    }

    /// A -> or0 -> or1, with or1 feeding back into itself.
    fn chain() -> (Netlist, NodeId, NodeId, NodeId) {
        let mut netlist = Netlist::new();
        let a = netlist.add_input("A");
        let or0 = netlist.place(or_gate());
        let or1 = netlist.place(or_gate());
        netlist.link(or0, 0, a, 0).unwrap();
        netlist.link(or1, 0, or0, 0).unwrap();
        netlist.link(or1, 1, or1, 0).unwrap();
        (netlist, a, or0, or1)
    }

    #[test]
    fn duplicate_rewires_inside_and_keeps_outside_links() {
        let (mut netlist, a, or0, or1) = chain();
        // Reverse order: rewiring must not depend on it.
        let clones = netlist.duplicate([or1, or0, a], false).unwrap();
        assert_eq!(clones.len(), 2);
        let (c0, c1) = (clones[&or0], clones[&or1]);
        assert_eq!(netlist.source(c0, 0), Some(Link::new(a, 0)));
        assert_eq!(netlist.source(c1, 0), Some(Link::new(c0, 0)));
        assert_eq!(netlist.source(c1, 1), Some(Link::new(c1, 0)));
        // Originals untouched.
        assert_eq!(netlist.source(or1, 1), Some(Link::new(or1, 0)));
        assert_eq!(netlist.inputs().len(), 1);
    }

    #[test]
    fn duplicate_with_pins_appends_boundary_pins() {
        let (mut netlist, a, or0, _) = chain();
        let clones = netlist.duplicate([a, or0], true).unwrap();
        assert_eq!(netlist.inputs(), &[a, clones[&a]]);
        assert_eq!(netlist.source(clones[&or0], 0), Some(Link::new(clones[&a], 0)));
    }

    #[test]
    fn extract_isolates_the_set() {
        let (netlist, a, or0, or1) = chain();
        let (internals, clones) = netlist.extract([a, or1]).unwrap();
        assert_eq!(internals.len(), 2);
        assert_eq!(internals.inputs(), &[clones[&a]]);
        let c1 = clones[&or1];
        // The link from or0 left the set.
        assert_eq!(internals.source(c1, 0), None);
        assert_eq!(internals.source(c1, 1), Some(Link::new(c1, 0)));
        assert!(!clones.contains_key(&or0));
    }

    #[test]
    fn copying_missing_nodes_fails() {
        let (mut netlist, _, or0, _) = chain();
        netlist.remove(or0).unwrap();
        assert!(netlist.duplicate([or0], false).is_err());
        assert!(netlist.extract([or0]).is_err());
    }
}
