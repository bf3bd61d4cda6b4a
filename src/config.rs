//! Command-line parsing for the app.

use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    #[arg(long)]
    /// Path to the project json file.
    pub project: String,
    #[arg(long)]
    /// Gate to inspect (default: last gate of the project).
    pub gate: Option<String>,
    #[arg(long)]
    /// Print the truth table of the gate.
    pub truth_table: bool,
    #[arg(long, default_value_t = 0)]
    /// Number of ticks to simulate a single placement of the gate for.
    pub ticks: u64,
    #[arg(long("set"), value_parser = parse_drive)]
    /// Drive an input of the simulated gate, as PIN=0 or PIN=1.
    pub drives: Vec<(String, bool)>,
    #[arg(long)]
    /// Write the simulated waveforms to this vcd file.
    pub output_vcd: Option<String>,
    #[arg(long)]
    /// Let project gates replace already registered gates with the same name.
    pub replace: bool,
    #[arg(short, long)]
    /// More verbose output.
    pub verbose: bool,
}

fn parse_drive(s: &str) -> Result<(String, bool), String> {
    let (pin, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected PIN=0 or PIN=1, got '{}'", s))?;
    let value = match value {
        "0" => false,
        "1" => true,
        _ => return Err(format!("pin value must be 0 or 1, got '{}'", value)),
    };
    Ok((pin.to_owned(), value))
}

pub fn parse_cmd_line() -> Config {
    Config::parse()
}
