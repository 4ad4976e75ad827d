// ── decort_disk ──
//
// Disk lifecycle with status-driven transitions. Read restores a
// soft-deleted disk from the recycle bin; a destroyed or purged disk is
// handled per [`OnDestroyed`].

use decort_api::{FormParams, Scope};
use strum::VariantNames;
use tracing::{debug, info, warn};

use super::endpoints::disks as api;
use super::{Platform, numeric_id, require_str, require_u64, to_i64};
use crate::error::CoreError;
use crate::flatten::{expand_iotune, flatten_disk};
use crate::host::data::{ResourceData, as_i64, block};
use crate::host::resource::{BoxFuture, DataSource, Resource};
use crate::host::schema::{AttrType, Attribute, Schema};
use crate::host::timeouts::{self, Timeouts};
use crate::model::status;
use crate::model::{DiskType, IoTune};

pub const TYPE_NAME: &str = "decort_disk";

/// What Read does when the platform reports the disk `DESTROYED` or `PURGED`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OnDestroyed {
    /// Clear the id; the host plans a fresh Create.
    #[default]
    ClearId,
    /// Re-create the disk from within Read.
    Recreate,
}

#[derive(Debug, Clone)]
pub struct DiskResource {
    platform: Platform,
    on_destroyed: OnDestroyed,
}

impl DiskResource {
    pub fn new(platform: Platform, on_destroyed: OnDestroyed) -> Self {
        Self {
            platform,
            on_destroyed,
        }
    }

    async fn do_create(&self, scope: &Scope, d: &mut ResourceData) -> Result<(), CoreError> {
        let name = require_str(d, "disk_name")?.to_owned();
        let mut params = FormParams::new();
        params
            .push_int("accountId", to_i64(require_u64(d, "account_id")?))
            .push_int("gid", to_i64(require_u64(d, "gid")?))
            .push("name", name.as_str())
            .push_int("size", to_i64(require_u64(d, "size_max")?))
            .push("type", d.get_str("type").unwrap_or("D"))
            .push_int_opt("sep_id", d.get_i64("sep_id"))
            .push_opt("pool", d.get_str("pool").filter(|s| !s.is_empty()))
            .push_opt("desc", d.get_str("desc").filter(|s| !s.is_empty()));

        let disk_id = self.platform.create(scope, api::CREATE, &params).await?;
        d.set_id(disk_id.to_string());
        info!(disk_id, name = %name, "disk created");

        if let Some(tune) = d.get_block("iotune") {
            let iotune = expand_iotune(tune)?;
            self.limit_io(scope, disk_id, &iotune).await?;
        }
        if d.get_bool("shareable") == Some(true) {
            self.simple(scope, disk_id, api::SHARE).await?;
        }

        // A disk that is already gone again is not re-created a second time.
        d.reset_computed();
        self.read_with(scope, d, OnDestroyed::ClearId).await?;
        if d.id().is_none() {
            return Err(CoreError::not_found("disk", disk_id));
        }
        Ok(())
    }

    async fn do_read(&self, scope: &Scope, d: &mut ResourceData) -> Result<(), CoreError> {
        self.read_with(scope, d, self.on_destroyed).await
    }

    fn read_with<'a>(
        &'a self,
        scope: &'a Scope,
        d: &'a mut ResourceData,
        on_destroyed: OnDestroyed,
    ) -> BoxFuture<'a, Result<(), CoreError>> {
        Box::pin(async move {
            let Some(disk_id) = numeric_id(d)? else {
                return Ok(());
            };
            let mut disk = match self.platform.get_disk(scope, disk_id).await {
                Ok(disk) => disk,
                Err(e) if e.is_not_found() => {
                    warn!(disk_id, "disk not found, clearing id");
                    d.clear_id();
                    return Ok(());
                }
                Err(e) => return Err(e),
            };

            if status::is_gone(&disk.status) {
                warn!(disk_id, status = %disk.status, policy = ?on_destroyed, "disk no longer exists");
                d.clear_id();
                return match on_destroyed {
                    OnDestroyed::ClearId => Ok(()),
                    OnDestroyed::Recreate => {
                        let recreate: BoxFuture<'_, Result<(), CoreError>> =
                            Box::pin(self.do_create(scope, d));
                        recreate.await
                    }
                };
            }

            if status::is_soft_deleted(&disk.status) {
                let mut params = disk_params(disk_id);
                params.push("reason", d.get_str("reason").unwrap_or_default());
                self.platform.confirm(scope, api::RESTORE, &params).await?;
                info!(disk_id, "soft-deleted disk restored");
                disk = self.platform.get_disk(scope, disk_id).await?;
            }

            d.set_all(flatten_disk(&disk));
            Ok(())
        })
    }

    async fn do_update(&self, scope: &Scope, d: &mut ResourceData) -> Result<(), CoreError> {
        let Some(disk_id) = numeric_id(d)? else {
            return Err(CoreError::validation("disk has no id"));
        };

        let (old, new) = d.get_change("size_max");
        match (old.and_then(as_i64), new.and_then(as_i64)) {
            (Some(old), Some(new)) if new < old => {
                return Err(CoreError::validation("reducing disk size is not allowed"));
            }
            (Some(old), Some(new)) if new > old => {
                let mut params = disk_params(disk_id);
                params.push_int("size", new);
                self.platform.call(scope, api::RESIZE, &params).await?;
                info!(disk_id, from = old, to = new, "disk resized");
            }
            _ => {}
        }

        if d.has_change("disk_name") {
            let mut params = disk_params(disk_id);
            params.push("name", require_str(d, "disk_name")?);
            self.platform.call(scope, api::RENAME, &params).await?;
        }

        if let Some(declared) = d.config().get("iotune").and_then(block) {
            let declared = expand_iotune(declared)?;
            let current = match d.prior().get("iotune").and_then(block) {
                Some(tune) => expand_iotune(tune)?,
                None => IoTune::default(),
            };
            if declared.differs_from(&current) {
                let outbound = declared.preserve_unlimited(&current);
                self.limit_io(scope, disk_id, &outbound).await?;
            }
        }

        if d.has_change("shareable") {
            let path = if d.get_bool("shareable") == Some(true) {
                api::SHARE
            } else {
                api::UNSHARE
            };
            self.simple(scope, disk_id, path).await?;
        }

        d.reset_computed();
        self.do_read(scope, d).await
    }

    async fn do_delete(&self, scope: &Scope, d: &mut ResourceData) -> Result<(), CoreError> {
        let Some(disk_id) = numeric_id(d)? else {
            return Ok(());
        };
        if d.get_str("status").is_some_and(status::is_gone) {
            debug!(disk_id, "disk already destroyed, nothing to delete");
            d.clear_id();
            return Ok(());
        }

        let mut params = disk_params(disk_id);
        params
            .push_bool("detach", d.get_bool("detach").unwrap_or(false))
            .push_bool("permanently", d.get_bool("permanently").unwrap_or(false))
            .push("reason", d.get_str("reason").unwrap_or_default());
        match self.platform.call(scope, api::DELETE, &params).await {
            Ok(_) => info!(disk_id, "disk deleted"),
            Err(e) if e.is_not_found() => debug!(disk_id, "disk already gone"),
            Err(e) => return Err(e),
        }
        d.clear_id();
        Ok(())
    }

    async fn simple(&self, scope: &Scope, disk_id: u64, path: &str) -> Result<(), CoreError> {
        self.platform
            .call(scope, path, &disk_params(disk_id))
            .await?;
        Ok(())
    }

    async fn limit_io(&self, scope: &Scope, disk_id: u64, iotune: &IoTune) -> Result<(), CoreError> {
        let mut params = disk_params(disk_id);
        for (name, value) in iotune.fields() {
            params.push_int(name, value);
        }
        self.platform.call(scope, api::LIMIT_IO, &params).await?;
        debug!(disk_id, "disk io limits applied");
        Ok(())
    }
}

fn disk_params(disk_id: u64) -> FormParams {
    let mut params = FormParams::new();
    params.push_int("diskId", to_i64(disk_id));
    params
}

impl Resource for DiskResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        resource_schema()
    }

    fn timeouts(&self) -> Timeouts {
        let base = Timeouts::uniform(timeouts::DISK);
        match self.on_destroyed {
            OnDestroyed::ClearId => base,
            OnDestroyed::Recreate => base.with_read(timeouts::DISK),
        }
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
pub struct DiskDataSource {
    platform: Platform,
}

impl DiskDataSource {
    pub fn new(platform: Platform) -> Self {
        Self { platform }
    }

    async fn do_read(&self, scope: &Scope, d: &mut ResourceData) -> Result<(), CoreError> {
        let disk_id = require_u64(d, "disk_id")?;
        let disk = self.platform.get_disk(scope, disk_id).await?;
        d.set_id(disk_id.to_string());
        d.set_all(flatten_disk(&disk));
        Ok(())
    }
}

impl DataSource for DiskDataSource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        let computed = Attribute::computed;
        computed_schema()
            .with("disk_id", Attribute::required(AttrType::Int))
            .with("account_id", computed(AttrType::Int))
            .with("gid", computed(AttrType::Int))
            .with("disk_name", computed(AttrType::String))
            .with("size_max", computed(AttrType::Int))
            .with("type", computed(AttrType::String))
            .with("sep_id", computed(AttrType::Int))
            .with("pool", computed(AttrType::String))
            .with("desc", computed(AttrType::String))
            .with("shareable", computed(AttrType::Bool))
            .with("iotune", computed(AttrType::Block(iotune_schema())))
    }

    fn read<'a>(
        &'a self,
        scope: &'a Scope,
        d: &'a mut ResourceData,
    ) -> BoxFuture<'a, Result<(), CoreError>> {
        Box::pin(self.do_read(scope, d))
    }
}

// ── Schemas ──────────────────────────────────────────────────────────

fn resource_schema() -> Schema {
    computed_schema()
        .with("account_id", Attribute::required(AttrType::Int).force_new())
        .with("gid", Attribute::required(AttrType::Int).force_new())
        .with("disk_name", Attribute::required(AttrType::String))
        .with(
            "size_max",
            Attribute::required(AttrType::Int).describe("Size in GB; may only grow"),
        )
        .with(
            "type",
            Attribute::optional(AttrType::String)
                .one_of(DiskType::VARIANTS)
                .default_value("D")
                .force_new()
                .describe("B (boot), D (data) or T (temporary)"),
        )
        .with("sep_id", Attribute::optional_computed(AttrType::Int).force_new())
        .with("pool", Attribute::optional_computed(AttrType::String).force_new())
        .with("desc", Attribute::optional_computed(AttrType::String).force_new())
        .with(
            "iotune",
            Attribute::optional_computed(AttrType::Block(declared_iotune_schema())).max_items(1),
        )
        .with("shareable", Attribute::optional_computed(AttrType::Bool))
        .with("detach", Attribute::optional(AttrType::Bool).default_value(false))
        .with("permanently", Attribute::optional(AttrType::Bool).default_value(false))
        .with("reason", Attribute::optional(AttrType::String))
}

fn computed_schema() -> Schema {
    let computed = Attribute::computed;
    Schema::new()
        .with("disk_id", computed(AttrType::Int))
        .with("account_name", computed(AttrType::String))
        .with("size_used", computed(AttrType::Float))
        .with("sep_type", computed(AttrType::String))
        .with("image_id", computed(AttrType::Int))
        .with("parent_id", computed(AttrType::Int))
        .with("res_id", computed(AttrType::String))
        .with("res_name", computed(AttrType::String))
        .with("role", computed(AttrType::String))
        .with("order", computed(AttrType::Int))
        .with("params", computed(AttrType::String))
        .with("acl", computed(AttrType::String).describe("Access control list as JSON text"))
        .with("status", computed(AttrType::String))
        .with("tech_status", computed(AttrType::String))
        .with("created_time", computed(AttrType::Int))
        .with("deleted_time", computed(AttrType::Int))
        .with("destruction_time", computed(AttrType::Int))
        .with("purge_time", computed(AttrType::Int))
        .with("snapshots", computed(AttrType::Block(snapshot_schema())))
}

fn iotune_schema() -> Schema {
    IoTune::FIELDS.into_iter().fold(Schema::new(), |schema, name| {
        schema.with(name, Attribute::computed(AttrType::Int))
    })
}

fn declared_iotune_schema() -> Schema {
    IoTune::FIELDS.into_iter().fold(Schema::new(), |schema, name| {
        schema.with(name, Attribute::optional_computed(AttrType::Int))
    })
}

fn snapshot_schema() -> Schema {
    let computed = Attribute::computed;
    Schema::new()
        .with("label", computed(AttrType::String))
        .with("guid", computed(AttrType::String))
        .with("res_id", computed(AttrType::String))
        .with("snap_set_guid", computed(AttrType::String))
        .with("snap_set_time", computed(AttrType::Int))
        .with("timestamp", computed(AttrType::Int))
}
