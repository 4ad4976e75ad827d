// Static table of resource and data-source types.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::resource::{DataSource, Resource};
use crate::error::CoreError;

#[derive(Default, Clone)]
pub struct Registry {
    resources: BTreeMap<&'static str, Arc<dyn Resource>>,
    data_sources: BTreeMap<&'static str, Arc<dyn DataSource>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, resource: Arc<dyn Resource>) -> &mut Self {
        self.resources.insert(resource.type_name(), resource);
        self
    }

    pub fn register_data_source(&mut self, source: Arc<dyn DataSource>) -> &mut Self {
        self.data_sources.insert(source.type_name(), source);
        self
    }

    pub fn resource(&self, name: &str) -> Result<&Arc<dyn Resource>, CoreError> {
        self.resources
            .get(name)
            .ok_or_else(|| CoreError::UnknownResourceType {
                name: name.to_owned(),
            })
    }

    pub fn data_source(&self, name: &str) -> Result<&Arc<dyn DataSource>, CoreError> {
        self.data_sources
            .get(name)
            .ok_or_else(|| CoreError::UnknownResourceType {
                name: name.to_owned(),
            })
    }

    /// Resource types in name order.
    pub fn resources(&self) -> impl Iterator<Item = &Arc<dyn Resource>> {
        self.resources.values()
    }

    pub fn data_sources(&self) -> impl Iterator<Item = &Arc<dyn DataSource>> {
        self.data_sources.values()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("resources", &self.resources.keys().collect::<Vec<_>>())
            .field("data_sources", &self.data_sources.keys().collect::<Vec<_>>())
            .finish()
    }
}
