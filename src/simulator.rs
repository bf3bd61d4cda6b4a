//! Tick-driven simulation of a live top-level netlist.

use crate::context::ComputeContext;
use crate::eval::Evaluator;
use crate::netlist::{Link, Netlist, NodeId};
use anyhow::Result;

#[derive(Debug, Default)]
pub struct Simulator {
    netlist: Netlist,
    current: ComputeContext,
    previous: Option<ComputeContext>,
    ticks: u64,
}

impl Simulator {
    pub fn new(netlist: Netlist) -> Self {
        Self {
            netlist,
            ..Self::default()
        }
    }

    pub fn netlist(&self) -> &Netlist {
        &self.netlist
    }

    /// Edits take effect at the next tick.
    pub fn netlist_mut(&mut self) -> &mut Netlist {
        &mut self.netlist
    }

    pub fn drive(&mut self, pin: NodeId, value: bool) -> Result<()> {
        self.netlist.drive(pin, value)
    }

    pub fn toggle(&mut self, pin: NodeId) -> Result<bool> {
        self.netlist.toggle(pin)
    }

    /// Advance one tick: every boundary output, then every other node, is evaluated in a fresh
    /// context, and the context of the last tick becomes the previous one.
    pub fn tick(&mut self) {
        let last = std::mem::take(&mut self.current);
        if self.ticks > 0 {
            self.previous = Some(last);
        }
        self.ticks += 1;
        let mut evaluator = Evaluator::new(&self.netlist, &mut self.current, self.previous.as_ref());
        for pin in self.netlist.outputs() {
            evaluator.read_pin(*pin);
        }
        for (id, _) in self.netlist.nodes() {
            evaluator.eval_node(id);
        }
        trace!(
            "tick {}: {} nodes evaluated",
            self.ticks,
            self.current.n_cached()
        );
    }

    /// Value of output `output` of `node` at the last tick (false before the first tick).
    pub fn read_output(&self, node: NodeId, output: usize) -> bool {
        self.current
            .output(Link::new(node, output))
            .unwrap_or(false)
    }

    /// Value asserted on a boundary output pin at the last tick.
    pub fn read_pin(&self, pin: NodeId) -> bool {
        self.netlist
            .source(pin, 0)
            .map(|link| self.read_output(link.node, link.output))
            .unwrap_or(false)
    }

    pub fn current(&self) -> &ComputeContext {
        &self.current
    }

    pub fn previous(&self) -> Option<&ComputeContext> {
        self.previous.as_ref()
    }

    pub fn tick_count(&self) -> u64 {
        self.ticks
    }
}
