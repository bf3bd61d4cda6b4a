//! Waveform dump of the boundary pins of a simulated netlist, one clock period per tick.

use crate::netlist::NodeId;
use crate::simulator::Simulator;
use anyhow::Result;

#[derive(Debug, Clone, Copy)]
enum Signal {
    Input(NodeId),
    Output(NodeId),
}

pub struct VcdWriter<'w> {
    writer: vcd::Writer<&'w mut dyn std::io::Write>,
    signals: Vec<(vcd::IdCode, Signal)>,
    timestamp: u64,
    clock: vcd::IdCode,
}

fn vcd_value(value: bool) -> vcd::Value {
    if value {
        vcd::Value::V1
    } else {
        vcd::Value::V0
    }
}

impl<'w> VcdWriter<'w> {
    /// Declare a wire for every boundary pin of the simulated netlist, in scope `top_scope`.
    pub fn new(
        writer: &'w mut dyn std::io::Write,
        top_scope: &str,
        simulator: &Simulator,
    ) -> Result<Self> {
        let netlist = simulator.netlist();
        let mut writer = vcd::Writer::new(writer);
        writer.timescale(1, vcd::TimescaleUnit::NS)?;
        writer.add_module(top_scope)?;
        let mut signals = vec![];
        for pin in netlist.inputs() {
            if let Some(node) = netlist.node(*pin) {
                signals.push((writer.add_wire(1, node.name())?, Signal::Input(*pin)));
            }
        }
        for pin in netlist.outputs() {
            if let Some(node) = netlist.node(*pin) {
                signals.push((writer.add_wire(1, node.name())?, Signal::Output(*pin)));
            }
        }
        let clock = writer.add_wire(1, "clock")?;
        writer.upscope()?;
        writer.enddefinitions()?;
        writer.timestamp(0)?;
        Ok(Self {
            writer,
            signals,
            timestamp: 0,
            clock,
        })
    }

    /// Record the pin values of the last tick.
    pub fn new_state(&mut self, simulator: &Simulator) -> Result<()> {
        for (idcode, signal) in &self.signals {
            let value = match signal {
                Signal::Input(pin) => simulator.read_output(*pin, 0),
                Signal::Output(pin) => simulator.read_pin(*pin),
            };
            self.writer.change_scalar(*idcode, vcd_value(value))?;
        }
        self.writer.change_scalar(self.clock, vcd::Value::V1)?;
        self.writer.timestamp(self.timestamp + 5)?;
        self.writer.change_scalar(self.clock, vcd::Value::V0)?;
        self.writer.timestamp(self.timestamp + 10)?;
        self.timestamp += 10;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlist::Netlist;
    use crate::primitives::Primitive;
    use std::sync::Arc;

    #[test]
    fn dumps_pins_and_clock() {
        let mut netlist = Netlist::new();
        let a = netlist.add_input("A");
        let q = netlist.add_output("Q");
        let not = netlist.place(Arc::new("NOT".parse::<Primitive>().unwrap().gate()));
        netlist.link(not, 0, a, 0).unwrap();
        netlist.link(q, 0, not, 0).unwrap();
        let mut sim = Simulator::new(netlist);
        let mut buf: Vec<u8> = vec![];
        {
            let mut writer = VcdWriter::new(&mut buf, "INV", &sim).unwrap();
            for _ in 0..2 {
                sim.tick();
                writer.new_state(&sim).unwrap();
                sim.toggle(a).unwrap();
            }
        }
        let dump = String::from_utf8(buf).unwrap();
        assert!(dump.contains("$scope module INV $end"));
        assert!(dump.contains(" A $end"));
        assert!(dump.contains(" Q $end"));
        assert!(dump.contains(" clock $end"));
        assert!(dump.contains("#20"));
    }

    #[test]
    fn inputs_are_dumped_as_seen_by_the_tick() {
        let mut netlist = Netlist::new();
        let a = netlist.add_input("A");
        let mut sim = Simulator::new(netlist);
        let mut buf: Vec<u8> = vec![];
        {
            let mut writer = VcdWriter::new(&mut buf, "TOP", &sim).unwrap();
            sim.tick();
            // Driven after the tick: not part of this state.
            sim.drive(a, true).unwrap();
            writer.new_state(&sim).unwrap();
        }
        let dump = String::from_utf8(buf).unwrap();
        let idcode = dump
            .lines()
            .find(|line| line.ends_with(" A $end"))
            .and_then(|line| line.split_whitespace().nth(3))
            .unwrap()
            .to_owned();
        assert!(dump.lines().any(|line| line == format!("0{}", idcode)));
        assert!(!dump.lines().any(|line| line == format!("1{}", idcode)));
    }
}
