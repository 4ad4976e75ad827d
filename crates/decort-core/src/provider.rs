// ── Provider ──
//
// Owns the shared client and the registry, and runs every CRUD callback
// under its per-operation budget. Expiry cancels the child scope so
// in-flight requests abort; nothing is rolled back.

use std::sync::Arc;
use std::time::Duration;

use decort_api::{DecortClient, Scope};
use tracing::{Instrument, debug, info, info_span, warn};

use crate::error::CoreError;
use crate::host::data::{AttrMap, ResourceData};
use crate::host::plan::{PlannedResource, check_plan};
use crate::host::registry::Registry;
use crate::host::timeouts::Operation;
use crate::resources::{self, OnDestroyed, Platform};

/// Provider-level behaviour switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProviderOptions {
    /// Re-create destroyed disks from within Read instead of clearing the id.
    pub recreate_destroyed_disks: bool,
}

impl ProviderOptions {
    fn on_destroyed(self) -> OnDestroyed {
        if self.recreate_destroyed_disks {
            OnDestroyed::Recreate
        } else {
            OnDestroyed::ClearId
        }
    }
}

/// What [`Provider::apply`] decided to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ApplyAction {
    Create,
    Update,
    Replace,
}

pub struct Provider {
    client: Arc<DecortClient>,
    registry: Registry,
    root: Scope,
}

impl Provider {
    pub fn new(client: Arc<DecortClient>, options: ProviderOptions) -> Self {
        let platform = Platform::new(Arc::clone(&client));
        let registry = resources::registry(&platform, options.on_destroyed());
        Self::with_registry(client, registry)
    }

    /// A provider over a caller-built registry.
    pub fn with_registry(client: Arc<DecortClient>, registry: Registry) -> Self {
        Self {
            client,
            registry,
            root: Scope::unbounded(),
        }
    }

    pub fn client(&self) -> &DecortClient {
        &self.client
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Run one CRUD callback under its timeout.
    pub async fn invoke(
        &self,
        type_name: &str,
        op: Operation,
        d: &mut ResourceData,
    ) -> Result<(), CoreError> {
        let resource = self.registry.resource(type_name)?;
        let budget = resource.timeouts().for_operation(op);
        let scope = self.root.child(budget);

        let span = info_span!("invoke", resource = type_name, operation = %op, id = d.id().unwrap_or_default());
        let callback = match op {
            Operation::Create => resource.create(&scope, d),
            Operation::Read => resource.read(&scope, d),
            Operation::Update => resource.update(&scope, d),
            Operation::Delete => resource.delete(&scope, d),
        };
        bounded(&scope, budget, callback.instrument(span)).await
    }

    /// Validate a declaration, then create, update, or replace the resource.
    pub async fn apply(
        &self,
        type_name: &str,
        prior: Option<(String, AttrMap)>,
        mut config: AttrMap,
    ) -> Result<(ApplyAction, ResourceData), CoreError> {
        let schema = self.registry.resource(type_name)?.schema();
        schema.apply_defaults(&mut config);
        schema.validate(&config)?;

        let Some((id, state)) = prior else {
            let mut d = ResourceData::from_config(config);
            self.invoke(type_name, Operation::Create, &mut d).await?;
            return Ok((ApplyAction::Create, d));
        };

        let triggers = schema.replacement_triggers(&state, &config);
        if triggers.is_empty() {
            let mut d = ResourceData::with_change(id, state, config);
            self.invoke(type_name, Operation::Update, &mut d).await?;
            return Ok((ApplyAction::Update, d));
        }

        info!(resource = type_name, id = %id, attributes = ?triggers, "replacing resource");
        let mut old = ResourceData::from_state(id, state);
        self.invoke(type_name, Operation::Delete, &mut old).await?;
        let mut d = ResourceData::from_config(config);
        self.invoke(type_name, Operation::Create, &mut d).await?;
        Ok((ApplyAction::Replace, d))
    }

    /// Look up an existing entity through a data source.
    pub async fn read_data_source(
        &self,
        type_name: &str,
        config: AttrMap,
    ) -> Result<ResourceData, CoreError> {
        let source = self.registry.data_source(type_name)?;
        source.schema().validate(&config)?;

        let budget = crate::host::timeouts::READ;
        let scope = self.root.child(budget);
        let mut d = ResourceData::from_config(config);
        let span = info_span!("data_source", source = type_name);
        bounded(&scope, budget, source.read(&scope, &mut d).instrument(span)).await?;
        Ok(d)
    }

    /// Schema validation and natural-key uniqueness over a whole plan.
    pub fn check_plan(&self, planned: &[PlannedResource]) -> Result<(), CoreError> {
        check_plan(&self.registry, planned)
    }
}

impl std::fmt::Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("controller_url", &self.client.controller_url().as_str())
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

async fn bounded<F>(scope: &Scope, budget: Duration, callback: F) -> Result<(), CoreError>
where
    F: Future<Output = Result<(), CoreError>>,
{
    if let Ok(result) = tokio::time::timeout(budget, callback).await {
        if let Err(e) = &result {
            debug!(error = %e, kind = %e.kind(), "callback failed");
        }
        return result;
    }
    scope.cancel();
    warn!(timeout_secs = budget.as_secs(), "callback timed out");
    Err(CoreError::Timeout {
        timeout_secs: budget.as_secs(),
    })
}
