//! Persisted form of composite gates, and their rehydration.
//!
//! Only the netlists are stored. Loading rebuilds every netlist and compiles it again, in
//! dependency order.

use crate::gate::{Gate, Metadata};
use crate::netlist::{Netlist, NodeId};
use crate::registry::GateRegistry;
use anyhow::{anyhow, bail, Context, Result};
use fnv::FnvHashMap as HashMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub gates: Vec<GateDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GateDef {
    pub name: String,
    pub nodes: Vec<NodeDef>,
    pub links: Vec<LinkDef>,
    pub inputs: Vec<PinDef>,
    pub outputs: Vec<PinDef>,
    #[serde(default)]
    pub metadata: Metadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDef {
    pub gate_type_name: String,
    /// Editor data (position, ...), kept as-is.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Link from output `index` of `node` to input `in_index` of `to`.
///
/// A `None` node is the boundary input `index`, a `None` destination is the boundary output
/// `in_index`. Other values are positions in the node list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkDef {
    #[serde(default)]
    pub node: Option<usize>,
    pub index: usize,
    #[serde(default)]
    pub to: Option<usize>,
    pub in_index: usize,
    #[serde(default)]
    pub routing_points: Vec<[f64; 2]>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinDef {
    pub name: String,
}

impl GateDef {
    /// Rebuild the editing netlist, placing gate types from `registry`.
    pub fn to_netlist(&self, registry: &GateRegistry) -> Result<Netlist> {
        let mut netlist = Netlist::new();
        let inputs = self
            .inputs
            .iter()
            .map(|pin| netlist.add_input(pin.name.clone()))
            .collect::<Vec<_>>();
        let outputs = self
            .outputs
            .iter()
            .map(|pin| netlist.add_output(pin.name.clone()))
            .collect::<Vec<_>>();
        let nodes = self
            .nodes
            .iter()
            .map(|node| Ok(netlist.place(registry.resolve(&node.gate_type_name)?)))
            .collect::<Result<Vec<_>>>()?;
        let lookup = |ids: &[NodeId], position: usize, what: &str| {
            ids.get(position)
                .copied()
                .ok_or_else(|| anyhow!("Link refers to {} {}, which does not exist.", what, position))
        };
        for link in &self.links {
            let (from, out_index) = match link.node {
                Some(node) => (lookup(&nodes, node, "node")?, link.index),
                None => (lookup(&inputs, link.index, "input pin")?, 0),
            };
            let (to, in_index) = match link.to {
                Some(to) => (lookup(&nodes, to, "node")?, link.in_index),
                None => (lookup(&outputs, link.in_index, "output pin")?, 0),
            };
            netlist.link(to, in_index, from, out_index)?;
        }
        Ok(netlist)
    }

    /// Persisted form of the editing netlist `netlist`.
    pub fn from_netlist(name: impl Into<String>, netlist: &Netlist, metadata: Metadata) -> Self {
        let positions = netlist
            .gates()
            .enumerate()
            .map(|(position, (id, _))| (id, position))
            .collect::<HashMap<_, _>>();
        let nodes = netlist
            .gates()
            .map(|(_, gate)| NodeDef {
                gate_type_name: gate.name.clone(),
                extra: serde_json::Map::new(),
            })
            .collect();
        let input_position = |id: NodeId| netlist.inputs().iter().position(|pin| *pin == id);
        let mut links = vec![];
        let destinations = netlist
            .gates()
            .map(|(id, _)| (id, Some(positions[&id])))
            .chain(netlist.outputs().iter().map(|id| (*id, None)));
        for (id, to) in destinations {
            let Some(node) = netlist.node(id) else {
                continue;
            };
            for (in_index, link) in node.inputs.iter().enumerate() {
                let Some(link) = link else {
                    continue;
                };
                let source = if let Some(position) = positions.get(&link.node) {
                    Some((Some(*position), link.output))
                } else {
                    input_position(link.node).map(|pin| (None, pin))
                };
                let Some((node, index)) = source else {
                    continue;
                };
                let in_index = match to {
                    Some(_) => in_index,
                    None => netlist
                        .outputs()
                        .iter()
                        .position(|pin| *pin == id)
                        .unwrap_or_default(),
                };
                links.push(LinkDef {
                    node,
                    index,
                    to,
                    in_index,
                    routing_points: vec![],
                });
            }
        }
        let pins = |ids: &[NodeId]| {
            ids.iter()
                .filter_map(|id| netlist.node(*id))
                .map(|node| PinDef {
                    name: node.name().to_owned(),
                })
                .collect()
        };
        Self {
            name: name.into(),
            nodes,
            links,
            inputs: pins(netlist.inputs()),
            outputs: pins(netlist.outputs()),
            metadata,
        }
    }

    pub fn compile(&self, registry: &GateRegistry) -> Result<Gate> {
        self.to_netlist(registry)
            .with_context(|| format!("Rehydrating gate {}", self.name))?
            .compile(&self.name, self.metadata.clone())
    }

    /// Names of the gate types placed in this gate, without duplicates.
    pub fn dependencies(&self) -> Vec<&str> {
        self.nodes
            .iter()
            .map(|node| node.gate_type_name.as_str())
            .sorted_unstable()
            .dedup()
            .collect()
    }
}

impl Project {
    pub fn from_reader(reader: impl std::io::Read) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn to_writer(&self, writer: impl std::io::Write) -> Result<()> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    pub fn gate(&self, name: &str) -> Option<&GateDef> {
        self.gates.iter().find(|gate| gate.name == name)
    }

    /// Gate definitions, each one after the definitions it places.
    fn sorted_gates(&self) -> Result<Vec<&GateDef>> {
        let mut graph = petgraph::Graph::new();
        let mut name2id = HashMap::default();
        for gate in &self.gates {
            if name2id.insert(gate.name.as_str(), graph.add_node(gate)).is_some() {
                bail!("Gate {} is defined twice in the project.", gate.name);
            }
        }
        for gate in &self.gates {
            for dep in gate.dependencies() {
                if let Some(dep_id) = name2id.get(dep) {
                    graph.add_edge(*dep_id, name2id[gate.name.as_str()], ());
                }
            }
        }
        Ok(petgraph::algo::toposort(&graph, None)
            .map_err(|cycle| {
                anyhow!(
                    "Project contains recursive gate definitions: {}.",
                    graph[cycle.node_id()].name
                )
            })?
            .into_iter()
            .map(|node_id| graph[node_id])
            .collect())
    }

    /// Compile every gate of the project and register it.
    ///
    /// Returns the compiled gates in dependency order.
    pub fn load_into(&self, registry: &mut GateRegistry) -> Result<Vec<Arc<Gate>>> {
        self.sorted_gates()?
            .into_iter()
            .map(|def| {
                let gate = def.compile(registry)?;
                debug!(
                    "loaded gate {} ({} inputs, {} outputs, hierarchical: {})",
                    gate.name,
                    gate.inputs.len(),
                    gate.outputs.len(),
                    gate.is_hierarchical()
                );
                registry.register(gate)
            })
            .collect()
    }
}
