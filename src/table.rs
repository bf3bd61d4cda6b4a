//! Truth tables of the acyclic islands of a compiled gate.

use crate::gate::{Compute, Scope};
use crate::type_utils::pack_bits;

/// Truth table of one island (node tree).
///
/// Entry `k` holds the island outputs when the `j`-th island input has the value of bit `j` of
/// `k`. Island inputs are sorted by gate input pin index, so keys are stable across recompiles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateTable {
    /// Gate input pin indices read by the island, ascending.
    inputs: Vec<usize>,
    /// Gate output pin indices produced by the island, ascending.
    outputs: Vec<usize>,
    mapping: Vec<Vec<bool>>,
}

impl GateTable {
    /// Build the table by calling `entry` for every key in `0..2^inputs.len()`.
    pub fn from_fn(
        inputs: Vec<usize>,
        outputs: Vec<usize>,
        entry: impl FnMut(usize) -> Vec<bool>,
    ) -> Self {
        let mapping = (0..1usize << inputs.len()).map(entry).collect::<Vec<_>>();
        debug_assert!(mapping.iter().all(|row| row.len() == outputs.len()));
        Self {
            inputs,
            outputs,
            mapping,
        }
    }

    pub fn inputs(&self) -> &[usize] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[usize] {
        &self.outputs
    }

    /// Number of entries, always `2^inputs().len()`.
    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }

    pub fn entry(&self, key: usize) -> &[bool] {
        &self.mapping[key]
    }

    pub fn key(&self, gate_inputs: &[bool]) -> usize {
        pack_bits(self.inputs.iter().map(|input| gate_inputs[*input]))
    }

    /// Island outputs for the given gate input values.
    pub fn lookup(&self, gate_inputs: &[bool]) -> &[bool] {
        self.entry(self.key(gate_inputs))
    }
}

/// Logic of an acyclic compiled gate: one table per island.
#[derive(Debug, Clone)]
pub struct TableLogic {
    tables: Vec<GateTable>,
    /// For each gate output: (table, position in the table outputs).
    routes: Vec<(usize, usize)>,
}

impl TableLogic {
    /// Route every gate output to the table producing it.
    pub fn new(tables: Vec<GateTable>, n_outputs: usize) -> Self {
        let mut routes = vec![None; n_outputs];
        for (table_id, table) in tables.iter().enumerate() {
            for (position, output) in table.outputs.iter().enumerate() {
                routes[*output] = Some((table_id, position));
            }
        }
        let routes = routes
            .into_iter()
            .enumerate()
            .map(|(output, route)| {
                route.unwrap_or_else(|| panic!("output {} is produced by no table", output))
            })
            .collect();
        Self { tables, routes }
    }

    pub fn tables(&self) -> &[GateTable] {
        &self.tables
    }

    pub fn table_for_output(&self, output: usize) -> Option<&GateTable> {
        self.routes
            .get(output)
            .map(|(table_id, _)| &self.tables[*table_id])
    }
}

impl Compute for TableLogic {
    fn compute(&self, inputs: &[bool], _scope: Scope<'_>) -> Vec<bool> {
        let results = self
            .tables
            .iter()
            .map(|table| table.lookup(inputs))
            .collect::<Vec<_>>();
        self.routes
            .iter()
            .map(|(table_id, position)| results[*table_id][*position])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ComputeContext;

    #[test]
    fn table_is_keyed_by_sorted_inputs() {
        // Island reading gate inputs 1 and 3: output = in1 & !in3.
        let table = GateTable::from_fn(vec![1, 3], vec![0], |key| {
            vec![key & 1 == 1 && key & 2 == 0]
        });
        assert_eq!(table.len(), 4);
        assert_eq!(table.key(&[false, true, false, false]), 0b01);
        assert_eq!(table.lookup(&[false, true, false, false]), &[true]);
        assert_eq!(table.lookup(&[true, true, true, true]), &[false]);
    }

    #[test]
    fn zero_input_table_has_one_entry() {
        let table = GateTable::from_fn(vec![], vec![0], |_| vec![false]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.lookup(&[true]), &[false]);
    }

    #[test]
    fn outputs_are_scattered_from_their_tables() {
        let not0 = GateTable::from_fn(vec![0], vec![1], |key| vec![key == 0]);
        let pass1 = GateTable::from_fn(vec![1], vec![0, 2], |key| vec![key == 1, key == 1]);
        let logic = TableLogic::new(vec![not0, pass1], 3);
        let mut context = ComputeContext::new();
        let outputs = logic.compute(&[false, true], Scope::new(&mut context, None));
        assert_eq!(outputs, vec![true, true, true]);
        let outputs = logic.compute(&[true, false], Scope::new(&mut context, None));
        assert_eq!(outputs, vec![false, false, false]);
        assert_eq!(logic.table_for_output(1).unwrap().inputs(), &[0]);
        assert!(logic.table_for_output(3).is_none());
    }
}
