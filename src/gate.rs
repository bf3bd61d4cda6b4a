//! Gate types: immutable descriptors shared by every placement.

use crate::context::ComputeContext;
use crate::hierarchical::HierarchicalLogic;
use crate::table::TableLogic;
use crate::type_utils::unpack_bits;
use anyhow::{bail, Result};
use std::sync::Arc;

/// Open, ordered metadata of a gate type (editor color, compilation flags, ...).
pub type Metadata = indexmap::IndexMap<String, serde_json::Value>;

pub mod metadata_key {
    pub const COLOR: &str = "color";
    pub const HIERARCHICAL: &str = "hierarchical";
    pub const DEPENDENCIES: &str = "dependencies";
    pub const INTERNAL_NODES: &str = "internalNodes";
}

/// Largest gate for which `truth_table` enumerates its inputs.
pub const MAX_TRUTH_TABLE_INPUTS: usize = 16;

/// Evaluation scope handed to gate logic.
///
/// Only hierarchical logic uses it: `current` is the nested context of the calling instance for
/// this tick, `previous` the nested context of the same instance at the previous tick.
#[derive(Debug)]
pub struct Scope<'a> {
    pub current: &'a mut ComputeContext,
    pub previous: Option<&'a ComputeContext>,
}

impl<'a> Scope<'a> {
    pub fn new(current: &'a mut ComputeContext, previous: Option<&'a ComputeContext>) -> Self {
        Self { current, previous }
    }
}

#[enum_dispatch::enum_dispatch]
pub trait Compute {
    // `inputs` has exactly one value per input pin.
    fn compute(&self, inputs: &[bool], scope: Scope<'_>) -> Vec<bool>;
}

#[enum_dispatch::enum_dispatch(Compute)]
#[derive(Debug, Clone)]
pub enum GateLogic {
    Primitive(PrimitiveLogic),
    TableDriven(TableLogic),
    Hierarchical(HierarchicalLogic),
}

type PrimitiveFn = dyn Fn(&[bool]) -> Vec<bool> + Send + Sync;

#[derive(Clone)]
pub struct PrimitiveLogic {
    func: Arc<PrimitiveFn>,
}

impl PrimitiveLogic {
    pub fn new(func: impl Fn(&[bool]) -> Vec<bool> + Send + Sync + 'static) -> Self {
        Self {
            func: Arc::new(func),
        }
    }
}

impl std::fmt::Debug for PrimitiveLogic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PrimitiveLogic")
    }
}

impl Compute for PrimitiveLogic {
    fn compute(&self, inputs: &[bool], _scope: Scope<'_>) -> Vec<bool> {
        (self.func)(inputs)
    }
}

#[derive(Debug, Clone)]
pub struct Gate {
    pub name: String,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub logic: GateLogic,
    pub metadata: Metadata,
}

impl Gate {
    pub fn new(
        name: impl Into<String>,
        inputs: Vec<String>,
        outputs: Vec<String>,
        logic: GateLogic,
        metadata: Metadata,
    ) -> Self {
        Self {
            name: name.into(),
            inputs,
            outputs,
            logic,
            metadata,
        }
    }

    /// Gate computed by an arbitrary function of its inputs.
    pub fn primitive<I, O>(
        name: impl Into<String>,
        inputs: I,
        outputs: O,
        func: impl Fn(&[bool]) -> Vec<bool> + Send + Sync + 'static,
    ) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
        O: IntoIterator,
        O::Item: Into<String>,
    {
        Self::new(
            name,
            inputs.into_iter().map(Into::into).collect(),
            outputs.into_iter().map(Into::into).collect(),
            PrimitiveLogic::new(func).into(),
            Metadata::new(),
        )
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata.extend(metadata);
        self
    }

    pub fn color(&self) -> Option<&str> {
        self.metadata
            .get(metadata_key::COLOR)
            .and_then(serde_json::Value::as_str)
    }

    pub fn is_hierarchical(&self) -> bool {
        matches!(self.logic, GateLogic::Hierarchical(_))
    }

    pub fn dependencies(&self) -> Vec<&str> {
        self.metadata
            .get(metadata_key::DEPENDENCIES)
            .and_then(serde_json::Value::as_array)
            .map(|deps| deps.iter().filter_map(serde_json::Value::as_str).collect())
            .unwrap_or_default()
    }

    pub fn input_index(&self, name: &str) -> Option<usize> {
        self.inputs.iter().position(|input| input == name)
    }

    pub fn output_index(&self, name: &str) -> Option<usize> {
        self.outputs.iter().position(|output| output == name)
    }

    /// Engine entry point. Callers guarantee one value per input pin.
    pub fn compute(&self, inputs: &[bool], scope: Scope<'_>) -> Vec<bool> {
        debug_assert_eq!(inputs.len(), self.inputs.len(), "gate {}", self.name);
        let outputs = self.logic.compute(inputs, scope);
        debug_assert_eq!(outputs.len(), self.outputs.len(), "gate {}", self.name);
        outputs
    }

    /// Evaluate the gate alone, as on the first tick of a fresh placement.
    pub fn evaluate(&self, inputs: &[bool]) -> Result<Vec<bool>> {
        if inputs.len() != self.inputs.len() {
            bail!(
                "Gate {} has {} inputs, but {} values were given.",
                self.name,
                self.inputs.len(),
                inputs.len()
            );
        }
        let mut context = ComputeContext::new();
        Ok(self.compute(inputs, Scope::new(&mut context, None)))
    }

    /// Outputs for every input combination, indexed by the packed inputs (input 0 is bit 0).
    pub fn truth_table(&self) -> Result<Vec<Vec<bool>>> {
        let n_inputs = self.inputs.len();
        if n_inputs > MAX_TRUTH_TABLE_INPUTS {
            bail!(
                "Gate {} has {} inputs, truth tables are limited to {} inputs.",
                self.name,
                n_inputs,
                MAX_TRUTH_TABLE_INPUTS
            );
        }
        (0..1usize << n_inputs)
            .map(|key| self.evaluate(&unpack_bits(key, n_inputs).collect::<Vec<_>>()))
            .collect()
    }
}
