use anyhow::{anyhow, Context, Result};

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::sync::Arc;

use gatenet::{ConflictPolicy, Gate, GateRegistry, Netlist, Project, Simulator, VcdWriter};

#[macro_use]
extern crate log;

mod config;

fn load_gate(config: &config::Config) -> Result<Arc<Gate>> {
    let file = File::open(&config.project)
        .with_context(|| format!("Could not open project {}", config.project))?;
    let project = Project::from_reader(BufReader::new(file))
        .with_context(|| format!("Could not parse project {}", config.project))?;
    let mut registry = GateRegistry::with_primitives();
    if config.replace {
        registry.set_policy(ConflictPolicy::Replace);
    }
    let loaded = project.load_into(&mut registry)?;
    info!("{} gates loaded.", loaded.len());
    match &config.gate {
        Some(name) => registry.resolve(name),
        None => loaded
            .last()
            .cloned()
            .ok_or_else(|| anyhow!("Project {} contains no gate.", config.project)),
    }
}

fn print_truth_table(gate: &Gate) -> Result<()> {
    println!("{} | {}", gate.inputs.join(" "), gate.outputs.join(" "));
    for (key, outputs) in gate.truth_table()?.into_iter().enumerate() {
        let inputs = bit_string(gatenet::unpack_bits(key, gate.inputs.len()));
        println!("{} | {}", inputs, bit_string(outputs));
    }
    Ok(())
}

fn bit_string(bits: impl IntoIterator<Item = bool>) -> String {
    bits.into_iter()
        .map(|bit| if bit { "1" } else { "0" })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Simulate one placement of `gate`, with one boundary pin per gate pin.
fn simulate(gate: Arc<Gate>, config: &config::Config) -> Result<()> {
    let mut netlist = Netlist::new();
    let inputs = gate
        .inputs
        .iter()
        .map(|name| netlist.add_input(name.clone()))
        .collect::<Vec<_>>();
    let outputs = gate
        .outputs
        .iter()
        .map(|name| netlist.add_output(name.clone()))
        .collect::<Vec<_>>();
    let node = netlist.place(gate.clone());
    for (in_index, pin) in inputs.iter().enumerate() {
        netlist.link(node, in_index, *pin, 0)?;
    }
    for (out_index, pin) in outputs.iter().enumerate() {
        netlist.link(*pin, 0, node, out_index)?;
    }
    for (name, value) in &config.drives {
        let pin = netlist
            .input_by_name(name)
            .ok_or_else(|| anyhow!("Gate {} has no input {}.", gate.name, name))?;
        netlist.drive(pin, *value)?;
    }
    let mut simulator = Simulator::new(netlist);
    let mut vcd_file = config
        .output_vcd
        .as_ref()
        .map(|fname| -> Result<_> { Ok(BufWriter::new(File::create(fname)?)) })
        .transpose()?;
    let mut vcd_writer = vcd_file
        .as_mut()
        .map(|file| VcdWriter::new(file, &gate.name, &simulator))
        .transpose()?;
    for _ in 0..config.ticks {
        simulator.tick();
        vcd_writer
            .as_mut()
            .map(|w| w.new_state(&simulator))
            .transpose()?;
        let values = bit_string(outputs.iter().map(|pin| simulator.read_pin(*pin)));
        println!("tick {}: {}", simulator.tick_count(), values);
    }
    Ok(())
}

fn main() -> Result<()> {
    let config = config::parse_cmd_line();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(
        if config.verbose { "debug" } else { "warn" },
    ))
    .init();
    let gate = load_gate(&config)?;
    println!(
        "Gate {}: {} inputs, {} outputs, {}.",
        gate.name,
        gate.inputs.len(),
        gate.outputs.len(),
        if gate.is_hierarchical() {
            "hierarchical"
        } else {
            "table-driven"
        }
    );
    if config.truth_table {
        print_truth_table(&gate)?;
    }
    if config.ticks > 0 {
        simulate(gate, &config)?;
    }
    Ok(())
}
