//! Gates simulated by interpreting their internal netlist, used whenever a compiled netlist
//! holds state (feedback loops, or placements of other stateful gates).

use crate::gate::{Compute, Scope};
use crate::netlist::Netlist;
use crate::eval::Evaluator;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct HierarchicalLogic {
    /// Isolated copy of the compiled netlist. Boundary pins are in gate pin order.
    internals: Arc<Netlist>,
}

impl HierarchicalLogic {
    pub fn new(internals: Netlist) -> Self {
        Self {
            internals: Arc::new(internals),
        }
    }

    pub fn internals(&self) -> &Netlist {
        &self.internals
    }
}

impl Compute for HierarchicalLogic {
    /// Evaluate the internals in the nested scope of the calling instance.
    ///
    /// Input values are driven as pin overrides of the nested context: the internals themselves
    /// are shared by every placement and never mutated.
    fn compute(&self, inputs: &[bool], scope: Scope<'_>) -> Vec<bool> {
        let Scope { current, previous } = scope;
        for (pin, value) in std::iter::zip(self.internals.inputs(), inputs) {
            current.set_pin(*pin, *value);
        }
        let mut evaluator = Evaluator::new(&self.internals, current, previous);
        self.internals
            .outputs()
            .iter()
            .map(|pin| evaluator.read_pin(*pin))
            .collect()
    }
}
