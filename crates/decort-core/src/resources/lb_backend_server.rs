// ── decort_lb_backend_server ──

use decort_api::{FormParams, Scope};
use strum::VariantNames;
use tracing::{info, warn};

use super::endpoints::lb as api;
use super::ids::ServerId;
use super::lb::{declared_settings_schema, server_settings_schema};
use super::{Platform, require_str, require_u64, to_i64};
use crate::error::CoreError;
use crate::flatten::flatten_server;
use crate::host::data::{AttrMap, ResourceData, as_i64};
use crate::host::resource::{BoxFuture, Resource};
use crate::host::schema::{AttrType, Attribute, Schema};
use crate::host::timeouts::Timeouts;
use crate::model::{Check, Server, ServerSettings};

pub const TYPE_NAME: &str = "decort_lb_backend_server";

#[derive(Debug, Clone)]
pub struct LbBackendServerResource {
    platform: Platform,
}

impl LbBackendServerResource {
    pub fn new(platform: Platform) -> Self {
        Self { platform }
    }

    async fn do_create(&self, scope: &Scope, d: &mut ResourceData) -> Result<(), CoreError> {
        let key = ServerId {
            lb_id: require_u64(d, "lb_id")?,
            backend: require_str(d, "backend_name")?.to_owned(),
            name: require_str(d, "name")?.to_owned(),
        };

        let mut params = endpoint_params(d, &key)?;
        params.push_opt("check", d.get_str("check"));
        for field in ServerSettings::FIELDS {
            if d.is_declared(field) {
                params.push_int_opt(field, d.get_i64(field));
            }
        }
        self.platform.call(scope, api::SERVER_ADD, &params).await?;
        info!(lb_id = key.lb_id, backend = %key.backend, server = %key.name, "backend server added");

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
                warn!(lb_id = key.lb_id, "parent load balancer not found, clearing server id");
                d.clear_id();
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        let Some(server) = lb
            .backend(&key.backend)
            .and_then(|backend| backend.server(&key.name))
        else {
            warn!(lb_id = key.lb_id, backend = %key.backend, server = %key.name, "backend server not found, clearing id");
            d.clear_id();
            return Ok(());
        };
        store(d, &key, server);
        Ok(())
    }

    async fn do_update(&self, scope: &Scope, d: &mut ResourceData) -> Result<(), CoreError> {
        let Some(key) = locate(d)? else {
            return Err(CoreError::validation("backend server has no id"));
        };

        let changed: Vec<&str> = ServerSettings::FIELDS
            .into_iter()
            .filter(|field| d.has_change(field))
            .collect();
        let endpoint_changed = d.has_change("address") || d.has_change("port");

        if endpoint_changed || d.has_change("check") || !changed.is_empty() {
            let mut params = endpoint_params(d, &key)?;
            if d.has_change("check") {
                params.push_opt("check", d.get_str("check"));
            }
            for field in changed {
                params.push_int_opt(field, d.get_i64(field));
            }
            self.platform
                .call(scope, api::SERVER_UPDATE, &params)
                .await?;
            info!(lb_id = key.lb_id, backend = %key.backend, server = %key.name, "backend server updated");
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
            .push("backendName", key.backend.as_str())
            .push("serverName", key.name.as_str());
        match self.platform.call(scope, api::SERVER_DELETE, &params).await {
            Ok(_) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }
        info!(lb_id = key.lb_id, backend = %key.backend, server = %key.name, "backend server deleted");
        d.clear_id();
        Ok(())
    }
}

/// `lbId`, `backendName`, `serverName`, `address`, `port`.
fn endpoint_params(d: &ResourceData, key: &ServerId) -> Result<FormParams, CoreError> {
    let port = require_u64(d, "port")?;
    let mut params = FormParams::new();
    params
        .push_int("lbId", to_i64(key.lb_id))
        .push("backendName", key.backend.as_str())
        .push("serverName", key.name.as_str())
        .push("address", require_str(d, "address")?)
        .push_int("port", to_i64(port));
    Ok(params)
}

fn locate(d: &ResourceData) -> Result<Option<ServerId>, CoreError> {
    let Some(id) = d.id() else {
        return Ok(None);
    };
    match (d.get_u64("lb_id"), d.get_str("backend_name"), d.get_str("name")) {
        (Some(lb_id), Some(backend), Some(name)) => Ok(Some(ServerId {
            lb_id,
            backend: backend.to_owned(),
            name: name.to_owned(),
        })),
        _ => id.parse().map(Some),
    }
}

fn store(d: &mut ResourceData, key: &ServerId, server: &Server) {
    d.set_all(flatten_server(server));
    d.set("lb_id", key.lb_id);
    d.set("backend_name", key.backend.as_str());
    for field in ServerSettings::FIELDS {
        d.set(field, server.server_settings.value(field));
    }
}

impl Resource for LbBackendServerResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        declared_settings_schema()
            .with("lb_id", Attribute::required(AttrType::Int).force_new())
            .with("backend_name", Attribute::required(AttrType::String).force_new())
            .with("name", Attribute::required(AttrType::String).force_new())
            .with("address", Attribute::required(AttrType::String))
            .with("port", Attribute::required(AttrType::Int))
            .with(
                "check",
                Attribute::optional_computed(AttrType::String).one_of(Check::VARIANTS),
            )
            .with("guid", Attribute::computed(AttrType::String))
            .with(
                "server_settings",
                Attribute::computed(AttrType::Block(server_settings_schema())),
            )
    }

    fn timeouts(&self) -> Timeouts {
        Timeouts::default()
    }

    fn natural_key(&self, config: &AttrMap) -> Option<String> {
        let lb_id = config.get("lb_id").and_then(as_i64)?;
        let backend = config.get("backend_name")?.as_str()?;
        let name = config.get("name")?.as_str()?;
        // Names may contain `-`, so the key is a JSON tuple rather than the id.
        Some(serde_json::json!([lb_id, backend, name]).to_string())
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
