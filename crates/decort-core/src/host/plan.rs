// Plan-time checks over a whole set of declarations.

use std::collections::BTreeMap;

use serde::Deserialize;

use super::data::AttrMap;
use super::registry::Registry;
use crate::error::CoreError;

/// One declared resource instance in a plan.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlannedResource {
    #[serde(rename = "type")]
    pub type_name: String,
    /// Host-side address, used only in diagnostics.
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub config: AttrMap,
}

impl PlannedResource {
    pub fn new(type_name: impl Into<String>, config: AttrMap) -> Self {
        Self {
            type_name: type_name.into(),
            address: None,
            config,
        }
    }

    fn label(&self, index: usize) -> String {
        self.address
            .clone()
            .unwrap_or_else(|| format!("{}[{index}]", self.type_name))
    }
}

/// Reject two declarations of the same type that share a natural key.
pub fn check_unique_keys(registry: &Registry, planned: &[PlannedResource]) -> Result<(), CoreError> {
    let mut seen: BTreeMap<(&str, String), String> = BTreeMap::new();

    for (index, entry) in planned.iter().enumerate() {
        let resource = registry.resource(&entry.type_name)?;
        let Some(key) = resource.natural_key(&entry.config) else {
            continue;
        };
        let label = entry.label(index);
        if let Some(first) = seen.get(&(resource.type_name(), key.clone())) {
            return Err(CoreError::conflict(format!(
                "{label} duplicates {first}: {} with key {key:?} is already declared",
                resource.type_name()
            )));
        }
        seen.insert((resource.type_name(), key), label);
    }
    Ok(())
}

/// Schema validation for every entry, then key uniqueness.
pub fn check_plan(registry: &Registry, planned: &[PlannedResource]) -> Result<(), CoreError> {
    for entry in planned {
        let schema = registry.resource(&entry.type_name)?.schema();
        let mut config = entry.config.clone();
        schema.apply_defaults(&mut config);
        schema.validate(&config)?;
    }
    check_unique_keys(registry, planned)
}
