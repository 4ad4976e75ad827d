// ── decort_lb_frontend_bind ──

use decort_api::{FormParams, Scope};
use tracing::{info, warn};

use super::endpoints::lb as api;
use super::ids::BindingId;
use super::{Platform, require_str, require_u64, to_i64};
use crate::error::CoreError;
use crate::flatten::flatten_binding;
use crate::host::data::{AttrMap, ResourceData, as_i64};
use crate::host::resource::{BoxFuture, Resource};
use crate::host::schema::{AttrType, Attribute, Schema};
use crate::host::timeouts::Timeouts;
use crate::model::Binding;

pub const TYPE_NAME: &str = "decort_lb_frontend_bind";

#[derive(Debug, Clone)]
pub struct LbFrontendBindResource {
    platform: Platform,
}

impl LbFrontendBindResource {
    pub fn new(platform: Platform) -> Self {
        Self { platform }
    }

    async fn do_create(&self, scope: &Scope, d: &mut ResourceData) -> Result<(), CoreError> {
        let key = BindingId {
            lb_id: require_u64(d, "lb_id")?,
            frontend: require_str(d, "frontend_name")?.to_owned(),
            name: require_str(d, "name")?.to_owned(),
        };
        let params = binding_params(d, &key)?;
        self.platform.call(scope, api::BIND, &params).await?;
        info!(lb_id = key.lb_id, frontend = %key.frontend, binding = %key.name, "frontend binding created");

        d.set_id(key.to_string());
        self.do_read(scope, d).await
    }

    async fn do_read(&self, scope: &Scope, d: &mut ResourceData) -> Result<(), CoreError> {
        let Some(key) = locate(d)? else {
            return Ok(());
        };
        let lb = match self.platform.get_lb(scope, key.lb_id).await {
            Ok(lb) => lb,
            Err(e) if e.is_not_found() => {
                warn!(lb_id = key.lb_id, "parent load balancer not found, clearing binding id");
                d.clear_id();
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        let Some(binding) = lb
            .frontend(&key.frontend)
            .and_then(|frontend| frontend.binding(&key.name))
        else {
            warn!(lb_id = key.lb_id, frontend = %key.frontend, binding = %key.name, "binding not found, clearing id");
            d.clear_id();
            return Ok(());
        };
        store(d, &key, binding);
        Ok(())
    }

    async fn do_update(&self, scope: &Scope, d: &mut ResourceData) -> Result<(), CoreError> {
        let Some(key) = locate(d)? else {
            return Err(CoreError::validation("frontend binding has no id"));
        };
        if d.has_change("address") || d.has_change("port") {
            let params = binding_params(d, &key)?;
            self.platform.call(scope, api::BIND_UPDATE, &params).await?;
            info!(lb_id = key.lb_id, frontend = %key.frontend, binding = %key.name, "frontend binding updated");
        }
        d.reset_computed();
        self.do_read(scope, d).await
    }

    async fn do_delete(&self, scope: &Scope, d: &mut ResourceData) -> Result<(), CoreError> {
        let Some(key) = locate(d)? else {
            return Ok(());
        };
        let mut params = FormParams::new();
        params
            .push_int("lbId", to_i64(key.lb_id))
            .push("frontendName", key.frontend.as_str())
            .push("bindingName", key.name.as_str());
        match self.platform.call(scope, api::BIND_DELETE, &params).await {
            Ok(_) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }
        info!(lb_id = key.lb_id, frontend = %key.frontend, binding = %key.name, "frontend binding deleted");
        d.clear_id();
        Ok(())
    }
}

fn binding_params(d: &ResourceData, key: &BindingId) -> Result<FormParams, CoreError> {
    let port = require_u64(d, "port")?;
    let mut params = FormParams::new();
    params
        .push_int("lbId", to_i64(key.lb_id))
        .push("frontendName", key.frontend.as_str())
        .push("bindingName", key.name.as_str())
        .push("bindingAddress", require_str(d, "address")?)
        .push_int("bindingPort", to_i64(port));
    Ok(params)
}

fn locate(d: &ResourceData) -> Result<Option<BindingId>, CoreError> {
    let Some(id) = d.id() else {
        return Ok(None);
    };
    match (d.get_u64("lb_id"), d.get_str("frontend_name"), d.get_str("name")) {
        (Some(lb_id), Some(frontend), Some(name)) => Ok(Some(BindingId {
            lb_id,
            frontend: frontend.to_owned(),
            name: name.to_owned(),
        })),
        _ => id.parse().map(Some),
    }
}

fn store(d: &mut ResourceData, key: &BindingId, binding: &Binding) {
    d.set_all(flatten_binding(binding));
    d.set("lb_id", key.lb_id);
    d.set("frontend_name", key.frontend.as_str());
}

impl Resource for LbFrontendBindResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .with("lb_id", Attribute::required(AttrType::Int).force_new())
            .with("frontend_name", Attribute::required(AttrType::String).force_new())
            .with("name", Attribute::required(AttrType::String).force_new())
            .with("address", Attribute::required(AttrType::String))
            .with("port", Attribute::required(AttrType::Int))
            .with("guid", Attribute::computed(AttrType::String))
    }

    fn timeouts(&self) -> Timeouts {
        Timeouts::default()
    }

    fn natural_key(&self, config: &AttrMap) -> Option<String> {
        let lb_id = config.get("lb_id").and_then(as_i64)?;
        let frontend = config.get("frontend_name")?.as_str()?;
        let name = config.get("name")?.as_str()?;
        Some(format!("{lb_id}#{frontend}#{name}"))
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
