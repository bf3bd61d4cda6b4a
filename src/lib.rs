//! Digital-logic netlists: editing, compilation into reusable gate types (truth tables, or
//! hierarchical gates when the netlist holds state), and tick-based simulation.

#[macro_use]
extern crate log;

#[macro_use]
mod type_utils;

pub mod compile;
pub mod context;
pub mod eval;
pub mod gate;
pub mod hierarchical;
pub mod instancing;
pub mod netlist;
pub mod primitives;
pub mod project;
pub mod registry;
pub mod simulator;
pub mod table;
pub mod vcd_writer;

pub use compile::{compile, decompose, Decomposition, Fallback, NodeTree};
pub use context::ComputeContext;
pub use eval::Evaluator;
pub use gate::{metadata_key, Gate, GateLogic, Metadata};
pub use instancing::CloneMap;
pub use netlist::{Link, Netlist, Node, NodeId, NodeKind};
pub use primitives::Primitive;
pub use project::{GateDef, Project};
pub use registry::{ConflictPolicy, GateRegistry};
pub use simulator::Simulator;
pub use table::{GateTable, TableLogic};
pub use type_utils::{pack_bits, unpack_bits};
pub use vcd_writer::VcdWriter;
