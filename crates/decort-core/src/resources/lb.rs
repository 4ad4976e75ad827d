// ── decort_lb ──
//
// Load balancer lifecycle. Create posts the declaration, stores the id,
// reads back, then applies `enable`. Update issues one setter per changed
// field, restore first since a soft-deleted balancer rejects the rest.

use decort_api::{FormParams, Scope};
use strum::VariantNames;
use tracing::{debug, info, warn};

use super::endpoints::lb as api;
use super::{Platform, flipped_on, numeric_id, require_str, require_u64, to_i64};
use crate::error::CoreError;
use crate::flatten::flatten_load_balancer;
use crate::host::data::ResourceData;
use crate::host::resource::{BoxFuture, DataSource, Resource};
use crate::host::schema::{AttrType, Attribute, Schema};
use crate::host::timeouts::{self, Timeouts};
use crate::model::status;
use crate::model::{Algorithm, Check, LoadBalancer, ServerSettings};

pub const TYPE_NAME: &str = "decort_lb";

#[derive(Debug, Clone)]
pub struct LbResource {
    platform: Platform,
}

impl LbResource {
    pub fn new(platform: Platform) -> Self {
        Self { platform }
    }

    fn lb_params(lb_id: u64) -> FormParams {
        let mut params = FormParams::new();
        params.push_int("lbId", to_i64(lb_id));
        params
    }

    async fn action(&self, scope: &Scope, lb_id: u64, path: &str) -> Result<(), CoreError> {
        debug!(lb_id, path, "load balancer action");
        self.platform
            .call(scope, path, &Self::lb_params(lb_id))
            .await?;
        Ok(())
    }

    async fn set_enabled(&self, scope: &Scope, lb_id: u64, enable: bool) -> Result<(), CoreError> {
        let path = if enable { api::ENABLE } else { api::DISABLE };
        self.action(scope, lb_id, path).await
    }

    async fn do_create(&self, scope: &Scope, d: &mut ResourceData) -> Result<(), CoreError> {
        let name = require_str(d, "name")?.to_owned();
        let mut params = FormParams::new();
        params
            .push_int("rgId", to_i64(require_u64(d, "rg_id")?))
            .push("name", name.as_str())
            .push_int("extnetId", to_i64(require_u64(d, "extnet_id")?))
            .push_int("vinsId", to_i64(require_u64(d, "vins_id")?))
            .push_bool("start", d.get_bool("start").unwrap_or(false))
            .push_opt("desc", d.get_str("desc").filter(|s| !s.is_empty()));

        let lb_id = self.platform.create(scope, api::CREATE, &params).await?;
        d.set_id(lb_id.to_string());
        info!(lb_id, name = %name, "load balancer created");

        self.do_read(scope, d).await?;

        if let Some(enable) = d.config().get("enable").and_then(serde_json::Value::as_bool) {
            self.set_enabled(scope, lb_id, enable).await?;
        }
        Ok(())
    }

    async fn do_read(&self, scope: &Scope, d: &mut ResourceData) -> Result<(), CoreError> {
        let Some(lb_id) = numeric_id(d)? else {
            return Ok(());
        };
        let lb = match self.platform.get_lb(scope, lb_id).await {
            Ok(lb) => lb,
            Err(e) if e.is_not_found() => {
                warn!(lb_id, "load balancer not found, clearing id");
                d.clear_id();
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        if status::is_gone(&lb.status) {
            warn!(lb_id, status = %lb.status, "load balancer destroyed, clearing id");
            d.clear_id();
            return Ok(());
        }
        store(d, &lb);
        Ok(())
    }

    async fn do_update(&self, scope: &Scope, d: &mut ResourceData) -> Result<(), CoreError> {
        let Some(lb_id) = numeric_id(d)? else {
            return Err(CoreError::validation("load balancer has no id"));
        };

        if flipped_on(d, "restore") {
            self.action(scope, lb_id, api::RESTORE).await?;
        }
        if let Some(enable) = d.get_bool("enable").filter(|_| d.has_change("enable")) {
            self.set_enabled(scope, lb_id, enable).await?;
        }
        if d.has_change("start") {
            let path = if d.get_bool("start") == Some(true) {
                api::START
            } else {
                api::STOP
            };
            self.action(scope, lb_id, path).await?;
        }
        if d.has_change("desc") {
            let mut params = Self::lb_params(lb_id);
            params.push("desc", d.get_str("desc").unwrap_or_default());
            self.platform.call(scope, api::UPDATE, &params).await?;
        }
        if flipped_on(d, "config_reset") {
            self.action(scope, lb_id, api::CONFIG_RESET).await?;
        }
        if flipped_on(d, "restart") {
            self.action(scope, lb_id, api::RESTART).await?;
        }

        d.reset_computed();
        self.do_read(scope, d).await
    }

    async fn do_delete(&self, scope: &Scope, d: &mut ResourceData) -> Result<(), CoreError> {
        let Some(lb_id) = numeric_id(d)? else {
            return Ok(());
        };
        let mut params = Self::lb_params(lb_id);
        params.push_bool("permanently", d.get_bool("permanently").unwrap_or(false));
        self.platform.call(scope, api::DELETE, &params).await?;
        info!(lb_id, "load balancer deleted");
        d.clear_id();
        Ok(())
    }
}

/// Flatten a fetched balancer into the store, with the derived `started`.
fn store(d: &mut ResourceData, lb: &LoadBalancer) {
    d.set_all(flatten_load_balancer(lb));
    d.set("started", lb.is_started());
}

impl Resource for LbResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        resource_schema()
    }

    fn timeouts(&self) -> Timeouts {
        Timeouts::uniform(timeouts::LIFECYCLE)
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

// ── Data source ──────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct LbDataSource {
    platform: Platform,
}

impl LbDataSource {
    pub fn new(platform: Platform) -> Self {
        Self { platform }
    }

    async fn do_read(&self, scope: &Scope, d: &mut ResourceData) -> Result<(), CoreError> {
        let lb_id = require_u64(d, "lb_id")?;
        let lb = self.platform.get_lb(scope, lb_id).await?;
        d.set_id(lb_id.to_string());
        store(d, &lb);
        Ok(())
    }
}

impl DataSource for LbDataSource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        computed_schema()
            .with("lb_id", Attribute::required(AttrType::Int))
            .with("name", Attribute::computed(AttrType::String))
            .with("rg_id", Attribute::computed(AttrType::Int))
            .with("extnet_id", Attribute::computed(AttrType::Int))
            .with("vins_id", Attribute::computed(AttrType::Int))
            .with("desc", Attribute::computed(AttrType::String))
    }

    fn read<'a>(
        &'a self,
        scope: &'a Scope,
        d: &'a mut ResourceData,
    ) -> BoxFuture<'a, Result<(), CoreError>> {
        Box::pin(self.do_read(scope, d))
    }
}

// ── Shared schemas ───────────────────────────────────────────────────

fn resource_schema() -> Schema {
    computed_schema()
        .with(
            "name",
            Attribute::required(AttrType::String).force_new().describe("Load balancer name"),
        )
        .with("rg_id", Attribute::required(AttrType::Int).force_new())
        .with("extnet_id", Attribute::required(AttrType::Int).force_new())
        .with("vins_id", Attribute::required(AttrType::Int).force_new())
        .with(
            "start",
            Attribute::required(AttrType::Bool).describe("Run the balancer nodes"),
        )
        .with("desc", Attribute::optional_computed(AttrType::String))
        .with("enable", Attribute::optional(AttrType::Bool))
        .with(
            "restart",
            Attribute::optional(AttrType::Bool).describe("One-shot: restart when set to true"),
        )
        .with(
            "restore",
            Attribute::optional(AttrType::Bool)
                .describe("One-shot: restore from the recycle bin when set to true"),
        )
        .with(
            "config_reset",
            Attribute::optional(AttrType::Bool).describe("One-shot: reset configuration"),
        )
        .with("permanently", Attribute::optional(AttrType::Bool).default_value(false))
}

/// Read-only attributes of a balancer, shared by the resource and data source.
fn computed_schema() -> Schema {
    let computed = Attribute::computed;
    Schema::new()
        .with("lb_id", computed(AttrType::Int))
        .with("rg_name", computed(AttrType::String))
        .with("image_id", computed(AttrType::Int))
        .with("ha_mode", computed(AttrType::Bool))
        .with("primary_node", computed(AttrType::Block(node_schema())))
        .with("secondary_node", computed(AttrType::Block(node_schema())))
        .with("status", computed(AttrType::String))
        .with("tech_status", computed(AttrType::String))
        .with("started", computed(AttrType::Bool))
        .with("dp_api_user", computed(AttrType::String))
        .with("gid", computed(AttrType::Int))
        .with("guid", computed(AttrType::Int))
        .with("milestones", computed(AttrType::Int))
        .with(
            "acl",
            computed(AttrType::String).describe("Access control list as JSON text"),
        )
        .with("created_by", computed(AttrType::String))
        .with("created_time", computed(AttrType::Int))
        .with("updated_by", computed(AttrType::String))
        .with("updated_time", computed(AttrType::Int))
        .with("deleted_by", computed(AttrType::String))
        .with("deleted_time", computed(AttrType::Int))
        .with("backends", computed(AttrType::Block(backend_schema())))
        .with("frontends", computed(AttrType::Block(frontend_schema())))
}

fn node_schema() -> Schema {
    let computed = Attribute::computed;
    Schema::new()
        .with("backend_ip", computed(AttrType::String))
        .with("compute_id", computed(AttrType::Int))
        .with("frontend_ip", computed(AttrType::String))
        .with("guid", computed(AttrType::String))
        .with("mgmt_ip", computed(AttrType::String))
        .with("network_id", computed(AttrType::Int))
}

pub(crate) fn server_settings_schema() -> Schema {
    ServerSettings::FIELDS
        .into_iter()
        .fold(Schema::new(), |schema, name| {
            schema.with(name, Attribute::computed(AttrType::Int))
        })
        .with("guid", Attribute::computed(AttrType::String))
}

/// Declarable copies of the server settings for backend / server resources.
pub(crate) fn declared_settings_schema() -> Schema {
    ServerSettings::FIELDS
        .into_iter()
        .fold(Schema::new(), |schema, name| {
            schema.with(name, Attribute::optional_computed(AttrType::Int))
        })
}

pub(crate) fn server_schema() -> Schema {
    let computed = Attribute::computed;
    Schema::new()
        .with("name", computed(AttrType::String))
        .with("address", computed(AttrType::String))
        .with("port", computed(AttrType::Int))
        .with("check", computed(AttrType::String).one_of(Check::VARIANTS))
        .with("guid", computed(AttrType::String))
        .with("server_settings", computed(AttrType::Block(server_settings_schema())))
}

fn backend_schema() -> Schema {
    let computed = Attribute::computed;
    Schema::new()
        .with("name", computed(AttrType::String))
        .with("algorithm", computed(AttrType::String).one_of(Algorithm::VARIANTS))
        .with("guid", computed(AttrType::String))
        .with(
            "server_default_settings",
            computed(AttrType::Block(server_settings_schema())),
        )
        .with("servers", computed(AttrType::Block(server_schema())))
}

pub(crate) fn binding_schema() -> Schema {
    let computed = Attribute::computed;
    Schema::new()
        .with("name", computed(AttrType::String))
        .with("address", computed(AttrType::String))
        .with("port", computed(AttrType::Int))
        .with("guid", computed(AttrType::String))
}

fn frontend_schema() -> Schema {
    let computed = Attribute::computed;
    Schema::new()
        .with("name", computed(AttrType::String))
        .with("backend", computed(AttrType::String))
        .with("guid", computed(AttrType::String))
        .with("bindings", computed(AttrType::Block(binding_schema())))
}
