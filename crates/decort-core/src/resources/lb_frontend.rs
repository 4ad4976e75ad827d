// ── decort_lb_frontend ──
//
// Every declared attribute forces replacement, so update only refreshes.

use decort_api::{FormParams, Scope};
use tracing::{info, warn};

use super::endpoints::lb as api;
use super::ids::ChildId;
use super::lb::binding_schema;
use super::{Platform, require_str, require_u64, to_i64};
use crate::error::CoreError;
use crate::flatten::flatten_frontend;
use crate::host::data::{AttrMap, ResourceData, as_i64};
use crate::host::resource::{BoxFuture, Resource};
use crate::host::schema::{AttrType, Attribute, Schema};
use crate::host::timeouts::Timeouts;
use crate::model::Frontend;

pub const TYPE_NAME: &str = "decort_lb_frontend";

#[derive(Debug, Clone)]
pub struct LbFrontendResource {
    platform: Platform,
}

impl LbFrontendResource {
    pub fn new(platform: Platform) -> Self {
        Self { platform }
    }

    async fn do_create(&self, scope: &Scope, d: &mut ResourceData) -> Result<(), CoreError> {
        let key = ChildId::new(require_u64(d, "lb_id")?, require_str(d, "name")?);
        let backend = require_str(d, "backend_name")?.to_owned();

        let lb = self.platform.get_lb(scope, key.parent).await?;
        if lb.backend(&backend).is_none() {
            return Err(CoreError::validation(format!(
                "backend \"{backend}\" does not exist on load balancer {}",
                key.parent
            )));
        }

        let mut params = frontend_params(&key);
        params.push("backendName", backend.as_str());
        self.platform
            .call(scope, api::FRONTEND_CREATE, &params)
            .await?;
        info!(lb_id = key.parent, frontend = %key.name, backend = %backend, "frontend created");

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
                warn!(lb_id = key.parent, "parent load balancer not found, clearing frontend id");
                d.clear_id();
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        let Some(frontend) = lb.frontend(&key.name) else {
            warn!(lb_id = key.parent, frontend = %key.name, "frontend not found, clearing id");
            d.clear_id();
            return Ok(());
        };
        store(d, key.parent, frontend);
        Ok(())
    }

    async fn do_update(&self, scope: &Scope, d: &mut ResourceData) -> Result<(), CoreError> {
        d.reset_computed();
        self.do_read(scope, d).await
    }

    async fn do_delete(&self, scope: &Scope, d: &mut ResourceData) -> Result<(), CoreError> {
        let Some(key) = locate(d)? else {
            return Ok(());
        };
        match self
            .platform
            .call(scope, api::FRONTEND_DELETE, &frontend_params(&key))
            .await
        {
            Ok(_) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }
        info!(lb_id = key.parent, frontend = %key.name, "frontend deleted");
        d.clear_id();
        Ok(())
    }
}

fn frontend_params(key: &ChildId) -> FormParams {
    let mut params = FormParams::new();
    params
        .push_int("lbId", to_i64(key.parent))
        .push("frontendName", key.name.as_str());
    params
}

fn locate(d: &ResourceData) -> Result<Option<ChildId>, CoreError> {
    let Some(id) = d.id() else {
        return Ok(None);
    };
    match (d.get_u64("lb_id"), d.get_str("name")) {
        (Some(lb_id), Some(name)) => Ok(Some(ChildId::new(lb_id, name))),
        _ => id.parse().map(Some),
    }
}

fn store(d: &mut ResourceData, lb_id: u64, frontend: &Frontend) {
    d.set_all(flatten_frontend(frontend));
    d.set("lb_id", lb_id);
    d.set("backend_name", frontend.backend.as_str());
}

impl Resource for LbFrontendResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .with("lb_id", Attribute::required(AttrType::Int).force_new())
            .with("name", Attribute::required(AttrType::String).force_new())
            .with(
                "backend_name",
                Attribute::required(AttrType::String)
                    .force_new()
                    .describe("Backend on the same load balancer"),
            )
            .with("backend", Attribute::computed(AttrType::String))
            .with("guid", Attribute::computed(AttrType::String))
            .with("bindings", Attribute::computed(AttrType::Block(binding_schema())))
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
