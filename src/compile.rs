//! Compilation of an edited netlist into a reusable gate type.
//!
//! The netlist is decomposed into maximal acyclic islands (node trees), each reachable backward
//! from one or more boundary outputs. Every island is turned into a truth table by exhaustive
//! enumeration of its inputs. If any walk finds a feedback loop (or reaches a placement of a
//! stateful gate), no table is built at all: the whole netlist becomes a hierarchical gate.

use crate::context::{ComputeContext, ProcessingStack};
use crate::eval::Evaluator;
use crate::gate::{metadata_key, Gate, Metadata};
use crate::hierarchical::HierarchicalLogic;
use crate::netlist::{Netlist, NodeId, NodeKind};
use crate::table::{GateTable, TableLogic};
use crate::type_utils::unpack_bits;
use anyhow::{bail, Context, Result};
use fnv::FnvHashMap as HashMap;
use indexmap::IndexSet;
use itertools::Itertools;
use std::collections::BTreeSet;

/// Islands with more inputs are not tabled.
pub const MAX_TABLE_INPUTS: usize = 16;

/// Maximal acyclic island of a netlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeTree {
    /// Boundary inputs read by the island, in pin order.
    pub inputs: Vec<NodeId>,
    /// Boundary outputs produced by the island, in pin order.
    pub outputs: Vec<NodeId>,
    pub nodes: IndexSet<NodeId>,
}

/// Reason for compiling a gate hierarchically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    /// A walk re-entered this node.
    Feedback(NodeId),
    /// This node is a placement of a hierarchical gate.
    StatefulGate(NodeId),
    /// An island has this many inputs.
    TableTooLarge(usize),
}

impl std::fmt::Display for Fallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Fallback::Feedback(node) => write!(f, "feedback loop through node {}", node),
            Fallback::StatefulGate(node) => write!(f, "node {} is a stateful gate", node),
            Fallback::TableTooLarge(n) => write!(
                f,
                "island with {} inputs (limit: {})",
                n, MAX_TABLE_INPUTS
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decomposition {
    Trees(Vec<NodeTree>),
    Hierarchical(Fallback),
}

#[derive(Debug, Clone, Copy)]
enum Source {
    Absent,
    Pin,
    Gate,
    Stateful,
}

type TreeId = usize;

struct Decomposer<'a> {
    netlist: &'a Netlist,
    input_pins: HashMap<NodeId, usize>,
    output_pins: HashMap<NodeId, usize>,
    walked: HashMap<NodeId, TreeId>,
    /// Merged trees are taken out.
    trees: Vec<Option<NodeTree>>,
}

impl<'a> Decomposer<'a> {
    fn new(netlist: &'a Netlist, inputs: &[NodeId], outputs: &[NodeId]) -> Result<Self> {
        let input_pins = pin_positions(netlist, inputs, true)?;
        let output_pins = pin_positions(netlist, outputs, false)?;
        Ok(Self {
            netlist,
            input_pins,
            output_pins,
            walked: HashMap::default(),
            trees: vec![],
        })
    }

    fn classify(&self, id: NodeId) -> Result<Source> {
        Ok(match self.netlist.node(id).map(|node| &node.kind) {
            None | Some(NodeKind::Output(_)) => Source::Absent,
            Some(NodeKind::Input(pin)) => {
                if !self.input_pins.contains_key(&id) {
                    bail!(
                        "Input pin '{}' (node {}) is used but is not an input of the gate.",
                        pin.name,
                        id
                    );
                }
                Source::Pin
            }
            Some(NodeKind::Gate(gate)) if gate.is_hierarchical() => Source::Stateful,
            Some(NodeKind::Gate(_)) => Source::Gate,
        })
    }

    /// Walk backward from `output`, and merge the new island with the islands it reaches.
    fn add_output(&mut self, output: NodeId) -> Result<Option<Fallback>> {
        let mut nodes = IndexSet::new();
        let mut inputs = IndexSet::new();
        let mut connected = BTreeSet::new();
        if let Some(link) = self.netlist.source(output, 0) {
            match self.classify(link.node)? {
                Source::Absent => {}
                Source::Pin => {
                    inputs.insert(link.node);
                }
                Source::Stateful => return Ok(Some(Fallback::StatefulGate(link.node))),
                Source::Gate => {
                    if let Some(tree) = self.walked.get(&link.node) {
                        connected.insert(*tree);
                    } else if let Some(fallback) =
                        self.walk(link.node, &mut nodes, &mut inputs, &mut connected)?
                    {
                        return Ok(Some(fallback));
                    }
                }
            }
        }
        let mut outputs = vec![output];
        for tree_id in connected {
            if let Some(other) = self.trees[tree_id].take() {
                nodes.extend(other.nodes);
                inputs.extend(other.inputs);
                outputs.extend(other.outputs);
            }
        }
        let mut inputs = inputs.into_iter().collect::<Vec<_>>();
        inputs.sort_by_key(|pin| self.input_pins[pin]);
        outputs.sort_by_key(|pin| self.output_pins[pin]);
        let tree_id = self.trees.len();
        for node in &nodes {
            self.walked.insert(*node, tree_id);
        }
        self.trees.push(Some(NodeTree {
            inputs,
            outputs,
            nodes,
        }));
        Ok(None)
    }

    /// Depth-first backward walk from `start`, collecting new nodes and boundary inputs.
    fn walk(
        &self,
        start: NodeId,
        nodes: &mut IndexSet<NodeId>,
        inputs: &mut IndexSet<NodeId>,
        connected: &mut BTreeSet<TreeId>,
    ) -> Result<Option<Fallback>> {
        let netlist = self.netlist;
        let mut path = ProcessingStack::new();
        let mut frames = vec![(start, 0)];
        path.push(start);
        nodes.insert(start);
        while let Some((node, next)) = frames.last_mut() {
            let links = netlist
                .node(*node)
                .map(|node| node.inputs.as_slice())
                .unwrap_or_default();
            let Some(link) = links.get(*next).copied() else {
                frames.pop();
                path.pop();
                continue;
            };
            *next += 1;
            let Some(link) = link else {
                continue;
            };
            match self.classify(link.node)? {
                Source::Absent => {}
                Source::Pin => {
                    inputs.insert(link.node);
                }
                Source::Stateful => return Ok(Some(Fallback::StatefulGate(link.node))),
                Source::Gate => {
                    if path.contains(link.node) {
                        return Ok(Some(Fallback::Feedback(link.node)));
                    } else if let Some(tree) = self.walked.get(&link.node) {
                        connected.insert(*tree);
                    } else if nodes.insert(link.node) {
                        path.push(link.node);
                        frames.push((link.node, 0));
                    }
                }
            }
        }
        Ok(None)
    }

    fn run(mut self, outputs: &[NodeId]) -> Result<Decomposition> {
        for output in outputs {
            if let Some(fallback) = self.add_output(*output)? {
                return Ok(Decomposition::Hierarchical(fallback));
            }
        }
        let trees = self.trees.into_iter().flatten().collect::<Vec<_>>();
        if let Some(tree) = trees.iter().find(|tree| tree.inputs.len() > MAX_TABLE_INPUTS) {
            return Ok(Decomposition::Hierarchical(Fallback::TableTooLarge(
                tree.inputs.len(),
            )));
        }
        Ok(Decomposition::Trees(trees))
    }
}

/// Position of each pin in `pins`, checking that they are boundary pins of the right kind.
fn pin_positions(netlist: &Netlist, pins: &[NodeId], input: bool) -> Result<HashMap<NodeId, usize>> {
    let mut positions = HashMap::default();
    for (position, pin) in pins.iter().enumerate() {
        let node = netlist.node(*pin);
        let right_kind = if input {
            node.and_then(|node| node.input_pin()).is_some()
        } else {
            node.and_then(|node| node.output_pin()).is_some()
        };
        if !right_kind {
            bail!(
                "Node {} is not an {} pin.",
                pin,
                if input { "input" } else { "output" }
            );
        }
        if positions.insert(*pin, position).is_some() {
            bail!("Pin {} is listed twice.", pin);
        }
    }
    Ok(positions)
}

/// Split the netlist reachable from `outputs` into maximal acyclic islands.
pub fn decompose(netlist: &Netlist, inputs: &[NodeId], outputs: &[NodeId]) -> Result<Decomposition> {
    Decomposer::new(netlist, inputs, outputs)?.run(outputs)
}

/// Truth table of an island, by evaluation of the netlist for every input combination.
pub fn build_table(
    netlist: &Netlist,
    tree: &NodeTree,
    inputs: &[NodeId],
    outputs: &[NodeId],
) -> GateTable {
    let input_index = |pin: &NodeId| inputs.iter().position(|input| input == pin);
    let output_index = |pin: &NodeId| outputs.iter().position(|output| output == pin);
    let table_inputs = tree.inputs.iter().filter_map(input_index).collect();
    let table_outputs = tree.outputs.iter().filter_map(output_index).collect();
    GateTable::from_fn(table_inputs, table_outputs, |key| {
        let pins = std::iter::zip(
            tree.inputs.iter().copied(),
            unpack_bits(key, tree.inputs.len()),
        );
        let mut context = ComputeContext::with_pins(pins);
        let mut evaluator = Evaluator::new(netlist, &mut context, None);
        tree.outputs
            .iter()
            .map(|output| evaluator.read_pin(*output))
            .collect()
    })
}

/// Nodes reachable backward from `outputs`, boundary pins first (in pin order).
fn reachable(netlist: &Netlist, inputs: &[NodeId], outputs: &[NodeId]) -> Result<IndexSet<NodeId>> {
    let mut set = inputs
        .iter()
        .chain(outputs)
        .copied()
        .collect::<IndexSet<_>>();
    let mut to_visit = outputs.to_vec();
    while let Some(id) = to_visit.pop() {
        let Some(node) = netlist.node(id) else {
            continue;
        };
        for link in node.inputs.iter().flatten() {
            let Some(source) = netlist.node(link.node) else {
                continue;
            };
            if let Some(pin) = source.input_pin() {
                if !set.contains(&link.node) {
                    bail!(
                        "Input pin '{}' (node {}) is used but is not an input of the gate.",
                        pin.name,
                        link.node
                    );
                }
            } else if set.insert(link.node) {
                to_visit.push(link.node);
            }
        }
    }
    Ok(set)
}

fn dependencies<'n>(netlist: &'n Netlist, nodes: impl Iterator<Item = &'n NodeId>) -> Vec<String> {
    nodes
        .filter_map(|id| netlist.node(*id).and_then(|node| node.as_gate()))
        .map(|gate| gate.name.clone())
        .sorted()
        .dedup()
        .collect()
}

fn pin_names(netlist: &Netlist, pins: &[NodeId]) -> Vec<String> {
    pins.iter()
        .map(|pin| {
            netlist
                .node(*pin)
                .map(|node| node.name().to_owned())
                .unwrap_or_default()
        })
        .collect()
}

/// Compile the part of `netlist` between the boundary pins `inputs` and `outputs` into a gate.
///
/// The gate input (resp. output) pins are in the order of `inputs` (resp. `outputs`).
pub fn compile(
    name: &str,
    netlist: &Netlist,
    inputs: &[NodeId],
    outputs: &[NodeId],
    metadata: Metadata,
) -> Result<Gate> {
    compile_inner(name, netlist, inputs, outputs, metadata)
        .with_context(|| format!("Compiling gate {}", name))
}

fn compile_inner(
    name: &str,
    netlist: &Netlist,
    inputs: &[NodeId],
    outputs: &[NodeId],
    mut metadata: Metadata,
) -> Result<Gate> {
    let input_names = pin_names(netlist, inputs);
    let output_names = pin_names(netlist, outputs);
    match decompose(netlist, inputs, outputs)? {
        Decomposition::Trees(trees) => {
            debug!("gate {}: {} acyclic islands", name, trees.len());
            let tables = trees
                .iter()
                .map(|tree| {
                    let table = build_table(netlist, tree, inputs, outputs);
                    debug!(
                        "gate {}: island with {} nodes, {} inputs, {} outputs: {} entries",
                        name,
                        tree.nodes.len(),
                        tree.inputs.len(),
                        tree.outputs.len(),
                        table.len()
                    );
                    table
                })
                .collect();
            let deps = dependencies(netlist, trees.iter().flat_map(|tree| tree.nodes.iter()));
            metadata.insert(metadata_key::HIERARCHICAL.to_owned(), false.into());
            metadata.insert(metadata_key::DEPENDENCIES.to_owned(), deps.into());
            Ok(Gate::new(
                name,
                input_names,
                output_names,
                TableLogic::new(tables, outputs.len()).into(),
                metadata,
            ))
        }
        Decomposition::Hierarchical(fallback) => {
            if let Fallback::TableTooLarge(_) = fallback {
                warn!("gate {}: not tabled, {}", name, fallback);
            } else {
                debug!("gate {}: compiled hierarchically, {}", name, fallback);
            }
            let nodes = reachable(netlist, inputs, outputs)?;
            let deps = dependencies(netlist, nodes.iter());
            let (internals, _) = netlist.extract(nodes)?;
            metadata.insert(metadata_key::HIERARCHICAL.to_owned(), true.into());
            metadata.insert(metadata_key::DEPENDENCIES.to_owned(), deps.into());
            metadata.insert(
                metadata_key::INTERNAL_NODES.to_owned(),
                internals.len().into(),
            );
            Ok(Gate::new(
                name,
                input_names,
                output_names,
                HierarchicalLogic::new(internals).into(),
                metadata,
            ))
        }
    }
}

impl Netlist {
    /// Compile this netlist between its own boundary pins.
    pub fn compile(&self, name: &str, metadata: Metadata) -> Result<Gate> {
        compile(name, self, self.inputs(), self.outputs(), metadata)
    }
}
