// ── decort_lb_backend ──

use decort_api::{FormParams, Scope};
use strum::VariantNames;
use tracing::{info, warn};

use super::endpoints::lb as api;
use super::ids::ChildId;
use super::lb::{declared_settings_schema, server_schema, server_settings_schema};
use super::{Platform, require_str, require_u64, to_i64};
use crate::error::CoreError;
use crate::flatten::flatten_backend;
use crate::host::data::{AttrMap, ResourceData, as_i64};
use crate::host::resource::{BoxFuture, Resource};
use crate::host::schema::{AttrType, Attribute, Schema};
use crate::host::timeouts::Timeouts;
use crate::model::{Algorithm, Backend, ServerSettings};

pub const TYPE_NAME: &str = "decort_lb_backend";

#[derive(Debug, Clone)]
pub struct LbBackendResource {
    platform: Platform,
}

impl LbBackendResource {
    pub fn new(platform: Platform) -> Self {
        Self { platform }
    }

    async fn do_create(&self, scope: &Scope, d: &mut ResourceData) -> Result<(), CoreError> {
        let key = ChildId::new(require_u64(d, "lb_id")?, require_str(d, "name")?);

        let mut params = backend_params(&key);
        params.push_opt("algorithm", d.get_str("algorithm"));
        for field in ServerSettings::FIELDS {
            if d.is_declared(field) {
                params.push_int_opt(field, d.get_i64(field));
            }
        }
        self.platform
            .call(scope, api::BACKEND_CREATE, &params)
            .await?;
        info!(lb_id = key.parent, backend = %key.name, "backend created");

        d.set_id(key.to_string());
        self.do_read(scope, d).await
    }

    async fn do_read(&self, scope: &Scope, d: &mut ResourceData) -> Result<(), CoreError> {
        let Some(key) = locate(d)? else {
            return Ok(());
        };
        let lb = match self.platform.get_lb(scope, key.parent).await {
            Ok(lb) => lb,
            Err(e) if e.is_not_found() => {
                warn!(lb_id = key.parent, "parent load balancer not found, clearing backend id");
                d.clear_id();
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        let Some(backend) = lb.backend(&key.name) else {
            warn!(lb_id = key.parent, backend = %key.name, "backend not found, clearing id");
            d.clear_id();
            return Ok(());
        };
        store(d, key.parent, backend);
        Ok(())
    }

    async fn do_update(&self, scope: &Scope, d: &mut ResourceData) -> Result<(), CoreError> {
        let Some(key) = locate(d)? else {
            return Err(CoreError::validation("backend has no id"));
        };

        let changed: Vec<&str> = ServerSettings::FIELDS
            .into_iter()
            .filter(|field| d.has_change(field))
            .collect();

        if d.has_change("algorithm") || !changed.is_empty() {
            let mut params = backend_params(&key);
            params.push_opt("algorithm", d.get_str("algorithm"));
            for field in changed {
                params.push_int_opt(field, d.get_i64(field));
            }
            self.platform
                .call(scope, api::BACKEND_UPDATE, &params)
                .await?;
            info!(lb_id = key.parent, backend = %key.name, "backend updated");
        }

        d.reset_computed();
        self.do_read(scope, d).await
    }

    async fn do_delete(&self, scope: &Scope, d: &mut ResourceData) -> Result<(), CoreError> {
        let Some(key) = locate(d)? else {
            return Ok(());
        };
        let lb = match self.platform.get_lb(scope, key.parent).await {
            Ok(lb) => lb,
            Err(e) if e.is_not_found() => {
                d.clear_id();
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        if lb.backend(&key.name).is_none() {
            d.clear_id();
            return Ok(());
        }

        let users: Vec<&str> = lb
            .frontends_using(&key.name)
            .map(|f| f.name.as_str())
            .collect();
        if !users.is_empty() {
            return Err(CoreError::conflict(format!(
                "backend \"{}\" on load balancer {} is used by frontend(s) {}; delete them first",
                key.name,
                key.parent,
                users.join(", ")
            )));
        }

        self.platform
            .call(scope, api::BACKEND_DELETE, &backend_params(&key))
            .await?;
        info!(lb_id = key.parent, backend = %key.name, "backend deleted");
        d.clear_id();
        Ok(())
    }
}

fn backend_params(key: &ChildId) -> FormParams {
    let mut params = FormParams::new();
    params
        .push_int("lbId", to_i64(key.parent))
        .push("backendName", key.name.as_str());
    params
}

/// Parent and name from stored attributes, else from the id.
fn locate(d: &ResourceData) -> Result<Option<ChildId>, CoreError> {
    let Some(id) = d.id() else {
        return Ok(None);
    };
    match (d.get_u64("lb_id"), d.get_str("name")) {
        (Some(lb_id), Some(name)) => Ok(Some(ChildId::new(lb_id, name))),
        _ => id.parse().map(Some),
    }
}

fn store(d: &mut ResourceData, lb_id: u64, backend: &Backend) {
    d.set_all(flatten_backend(backend));
    d.set("lb_id", lb_id);
    for field in ServerSettings::FIELDS {
        d.set(field, backend.server_default_settings.value(field));
    }
}

impl Resource for LbBackendResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        declared_settings_schema()
            .with("lb_id", Attribute::required(AttrType::Int).force_new())
            .with("name", Attribute::required(AttrType::String).force_new())
            .with(
                "algorithm",
                Attribute::optional_computed(AttrType::String).one_of(Algorithm::VARIANTS),
            )
            .with("guid", Attribute::computed(AttrType::String))
            .with(
                "server_default_settings",
                Attribute::computed(AttrType::Block(server_settings_schema())),
            )
            .with("servers", Attribute::computed(AttrType::Block(server_schema())))
    }

    fn timeouts(&self) -> Timeouts {
        Timeouts::default()
    }

    fn natural_key(&self, config: &AttrMap) -> Option<String> {
        let lb_id = config.get("lb_id").and_then(as_i64)?;
        let name = config.get("name")?.as_str()?;
        Some(format!("{lb_id}#{name}"))
    }

    fn create<'a>(
        &'a self,
        scope: &'a Scope,
        d: &'a mut ResourceData,
    ) -> BoxFuture<'a, Result<(), CoreError>> {
        Box::pin(self.do_create(scope, d))
    }

    fn read<'a>(
        &'a self,
        scope: &'a Scope,
        d: &'a mut ResourceData,
    ) -> BoxFuture<'a, Result<(), CoreError>> {
        Box::pin(self.do_read(scope, d))
    }

    fn update<'a>(
        &'a self,
        scope: &'a Scope,
        d: &'a mut ResourceData,
    ) -> BoxFuture<'a, Result<(), CoreError>> {
        Box::pin(self.do_update(scope, d))
    }

    fn delete<'a>(
        &'a self,
        scope: &'a Scope,
        d: &'a mut ResourceData,
    ) -> BoxFuture<'a, Result<(), CoreError>> {
        Box::pin(self.do_delete(scope, d))
    }
}
