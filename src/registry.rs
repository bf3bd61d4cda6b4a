//! Named gate types available for placement.

use crate::gate::Gate;
use crate::primitives::Primitive;
use anyhow::{anyhow, bail, Result};
use indexmap::IndexMap;
use std::sync::Arc;

/// Behavior when a gate type is registered under a name already in use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConflictPolicy {
    #[default]
    Reject,
    /// The new gate type shadows the old one. Existing placements keep the old one.
    Replace,
}

#[derive(Debug, Clone, Default)]
pub struct GateRegistry {
    gates: IndexMap<String, Arc<Gate>>,
    policy: ConflictPolicy,
}

impl GateRegistry {
    pub fn new(policy: ConflictPolicy) -> Self {
        Self {
            gates: IndexMap::new(),
            policy,
        }
    }

    /// Registry holding every primitive gate.
    pub fn with_primitives() -> Self {
        let mut registry = Self::default();
        for prim in Primitive::ALL {
            registry.gates.insert(prim.name().to_owned(), Arc::new(prim.gate()));
        }
        registry
    }

    pub fn policy(&self) -> ConflictPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: ConflictPolicy) {
        self.policy = policy;
    }

    pub fn register(&mut self, gate: impl Into<Arc<Gate>>) -> Result<Arc<Gate>> {
        let gate = gate.into();
        if let Some(existing) = self.gates.get(&gate.name) {
            if !Arc::ptr_eq(existing, &gate) {
                match self.policy {
                    ConflictPolicy::Reject => {
                        bail!("A gate named {} is already registered.", gate.name)
                    }
                    ConflictPolicy::Replace => {
                        warn!("Replacing gate type {}.", gate.name);
                    }
                }
            }
        }
        self.gates.insert(gate.name.clone(), gate.clone());
        Ok(gate)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Gate>> {
        self.gates.get(name)
    }

    pub fn resolve(&self, name: &str) -> Result<Arc<Gate>> {
        self.get(name)
            .cloned()
            .ok_or_else(|| anyhow!("Unknown gate type {}.", name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.gates.contains_key(name)
    }

    /// Gate types, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Gate>> + '_ {
        self.gates.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.gates.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.gates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buf(name: &str) -> Gate {
        Gate::primitive(name, ["A"], ["X"], |inputs| vec![inputs[0]])
    }

    #[test]
    fn collisions_follow_the_policy() {
        let mut registry = GateRegistry::with_primitives();
        assert_eq!(registry.len(), 8);
        assert!(registry.register(buf("AND")).is_err());
        assert_eq!(registry.resolve("AND").unwrap().inputs.len(), 2);

        registry.set_policy(ConflictPolicy::Replace);
        registry.register(buf("AND")).unwrap();
        assert_eq!(registry.resolve("AND").unwrap().inputs.len(), 1);
        assert_eq!(registry.len(), 8);
    }

    #[test]
    fn registering_the_same_gate_twice_is_allowed() {
        let mut registry = GateRegistry::new(ConflictPolicy::Reject);
        let gate = registry.register(buf("G")).unwrap();
        registry.register(gate.clone()).unwrap();
        assert!(Arc::ptr_eq(&registry.resolve("G").unwrap(), &gate));
        assert!(registry.resolve("H").is_err());
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["G"]);
    }
}
