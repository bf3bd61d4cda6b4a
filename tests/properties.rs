//! Property tests: compiled gates agree with direct simulation of their netlist.

use gatenet::{
    unpack_bits, ComputeContext, Evaluator, GateLogic, Metadata, Netlist, NodeId, Primitive,
};
use proptest::prelude::*;
use std::sync::Arc;

#[derive(Debug, Clone)]
struct Recipe {
    n_inputs: usize,
    /// (primitive, first source, second source), sources taken modulo the signals built so far.
    gates: Vec<(usize, usize, usize)>,
    outputs: Vec<usize>,
}

fn recipe() -> impl Strategy<Value = Recipe> {
    (
        1usize..=5,
        prop::collection::vec((0usize..8, 0usize..1000, 0usize..1000), 0..12),
        prop::collection::vec(0usize..1000, 1..4),
    )
        .prop_map(|(n_inputs, gates, outputs)| Recipe {
            n_inputs,
            gates,
            outputs,
        })
}

/// Acyclic netlist: every gate reads only pins or earlier gates.
fn build(recipe: &Recipe) -> Netlist {
    let mut netlist = Netlist::new();
    let mut signals: Vec<NodeId> = (0..recipe.n_inputs)
        .map(|i| netlist.add_input(format!("I{}", i)))
        .collect();
    for (prim, src0, src1) in &recipe.gates {
        let prim = Primitive::ALL[*prim];
        let node = netlist.place(Arc::new(prim.gate()));
        for (in_index, src) in [*src0, *src1]
            .into_iter()
            .take(prim.input_names().len())
            .enumerate()
        {
            netlist
                .link(node, in_index, signals[src % signals.len()], 0)
                .unwrap();
        }
        signals.push(node);
    }
    for (i, src) in recipe.outputs.iter().enumerate() {
        let pin = netlist.add_output(format!("O{}", i));
        netlist.link(pin, 0, signals[src % signals.len()], 0).unwrap();
    }
    netlist
}

fn simulate(netlist: &Netlist, inputs: &[bool]) -> Vec<bool> {
    let pins = netlist.inputs().iter().copied().zip(inputs.iter().copied());
    let mut context = ComputeContext::with_pins(pins);
    let mut evaluator = Evaluator::new(netlist, &mut context, None);
    netlist
        .outputs()
        .iter()
        .map(|pin| evaluator.read_pin(*pin))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Every table entry of a compiled acyclic gate matches direct simulation.
    #[test]
    fn prop_tables_match_simulation(recipe in recipe()) {
        let netlist = build(&recipe);
        let gate = netlist.compile("RANDOM", Metadata::new()).unwrap();
        let GateLogic::TableDriven(logic) = &gate.logic else {
            panic!("acyclic netlists compile to tables");
        };
        for table in logic.tables() {
            prop_assert_eq!(table.len(), 1 << table.inputs().len());
        }
        for key in 0..1usize << recipe.n_inputs {
            let inputs = unpack_bits(key, recipe.n_inputs).collect::<Vec<_>>();
            prop_assert_eq!(gate.evaluate(&inputs).unwrap(), simulate(&netlist, &inputs));
        }
    }

    /// Compiling the same netlist twice gives the same tables.
    #[test]
    fn prop_compilation_is_deterministic(recipe in recipe()) {
        let netlist = build(&recipe);
        let first = netlist.compile("RANDOM", Metadata::new()).unwrap();
        let second = netlist.compile("RANDOM", Metadata::new()).unwrap();
        let (GateLogic::TableDriven(first), GateLogic::TableDriven(second)) =
            (&first.logic, &second.logic)
        else {
            panic!("acyclic netlists compile to tables");
        };
        prop_assert_eq!(first.tables(), second.tables());
    }
}
