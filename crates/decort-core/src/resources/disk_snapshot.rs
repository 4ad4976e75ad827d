// ── decort_disk_snapshot ──
//
// Snapshots are created by the platform as a side effect of other actions;
// this resource adopts one by label and can roll the disk back to it.

use decort_api::{FormParams, Scope};
use tracing::{info, warn};

use super::endpoints::disks as api;
use super::ids::ChildId;
use super::{Platform, flipped_on, require_str, require_u64, to_i64};
use crate::error::CoreError;
use crate::flatten::flatten_snapshot;
use crate::host::data::{AttrMap, ResourceData, as_i64};
use crate::host::resource::{BoxFuture, Resource};
use crate::host::schema::{AttrType, Attribute, Schema};
use crate::host::timeouts::Timeouts;
use crate::model::{Disk, Snapshot, status};

pub const TYPE_NAME: &str = "decort_disk_snapshot";

#[derive(Debug, Clone)]
pub struct DiskSnapshotResource {
    platform: Platform,
}

impl DiskSnapshotResource {
    pub fn new(platform: Platform) -> Self {
        Self { platform }
    }

    /// The parent disk, or `None` when it no longer exists.
    async fn parent(&self, scope: &Scope, disk_id: u64) -> Result<Option<Disk>, CoreError> {
        match self.platform.get_disk(scope, disk_id).await {
            Ok(disk) if status::is_gone(&disk.status) => Ok(None),
            Ok(disk) => Ok(Some(disk)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn rollback(
        &self,
        scope: &Scope,
        key: &ChildId,
        timestamp: u64,
    ) -> Result<(), CoreError> {
        let mut params = snapshot_params(key);
        params.push_int("timestamp", to_i64(timestamp));
        self.platform
            .confirm(scope, api::SNAPSHOT_ROLLBACK, &params)
            .await?;
        info!(disk_id = key.parent, label = %key.name, timestamp, "disk rolled back to snapshot");
        Ok(())
    }

    async fn do_create(&self, scope: &Scope, d: &mut ResourceData) -> Result<(), CoreError> {
        let key = ChildId::new(require_u64(d, "disk_id")?, require_str(d, "label")?);

        let disk = self
            .parent(scope, key.parent)
            .await?
            .ok_or_else(|| CoreError::not_found("disk", key.parent))?;
        let snapshot = disk
            .snapshot(&key.name)
            .ok_or_else(|| CoreError::not_found("snapshot", &key))?;

        if d.get_bool("rollback") == Some(true) {
            let timestamp = d.get_u64("timestamp").unwrap_or(snapshot.timestamp);
            self.rollback(scope, &key, timestamp).await?;
        }

        d.set_id(key.to_string());
        self.do_read(scope, d).await
    }

    async fn do_read(&self, scope: &Scope, d: &mut ResourceData) -> Result<(), CoreError> {
        let Some(key) = locate(d)? else {
            return Ok(());
        };
        let Some(disk) = self.parent(scope, key.parent).await? else {
            warn!(disk_id = key.parent, "parent disk gone, clearing snapshot id");
            d.clear_id();
            return Ok(());
        };
        let Some(snapshot) = disk.snapshot(&key.name) else {
            warn!(disk_id = key.parent, label = %key.name, "snapshot not found, clearing id");
            d.clear_id();
            return Ok(());
        };
        store(d, key.parent, snapshot);
        Ok(())
    }

    async fn do_update(&self, scope: &Scope, d: &mut ResourceData) -> Result<(), CoreError> {
        let Some(key) = locate(d)? else {
            return Err(CoreError::validation("snapshot has no id"));
        };
        if flipped_on(d, "rollback") {
            let Some(timestamp) = d.get_u64("timestamp") else {
                return Err(CoreError::validation(format!(
                    "snapshot {key} has no timestamp to roll back to"
                )));
            };
            self.rollback(scope, &key, timestamp).await?;
        }
        d.reset_computed();
        self.do_read(scope, d).await
    }

    async fn do_delete(&self, scope: &Scope, d: &mut ResourceData) -> Result<(), CoreError> {
        let Some(key) = locate(d)? else {
            return Ok(());
        };
        let exists = self
            .parent(scope, key.parent)
            .await?
            .is_some_and(|disk| disk.snapshot(&key.name).is_some());
        if exists {
            self.platform
                .call(scope, api::SNAPSHOT_DELETE, &snapshot_params(&key))
                .await?;
            info!(disk_id = key.parent, label = %key.name, "snapshot deleted");
        }
        d.clear_id();
        Ok(())
    }
}

fn snapshot_params(key: &ChildId) -> FormParams {
    let mut params = FormParams::new();
    params
        .push_int("diskId", to_i64(key.parent))
        .push("label", key.name.as_str());
    params
}

fn locate(d: &ResourceData) -> Result<Option<ChildId>, CoreError> {
    let Some(id) = d.id() else {
        return Ok(None);
    };
    match (d.get_u64("disk_id"), d.get_str("label")) {
        (Some(disk_id), Some(label)) => Ok(Some(ChildId::new(disk_id, label))),
        _ => id.parse().map(Some),
    }
}

fn store(d: &mut ResourceData, disk_id: u64, snapshot: &Snapshot) {
    d.set_all(flatten_snapshot(snapshot));
    d.set("disk_id", disk_id);
}

impl Resource for DiskSnapshotResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        let computed = Attribute::computed;
        Schema::new()
            .with("disk_id", Attribute::required(AttrType::Int).force_new())
            .with(
                "label",
                Attribute::required(AttrType::String)
                    .force_new()
                    .describe("Snapshot label, unique within the disk"),
            )
            .with(
                "rollback",
                Attribute::optional(AttrType::Bool)
                    .default_value(false)
                    .describe("Roll the disk back to this snapshot when set to true"),
            )
            .with("timestamp", Attribute::optional_computed(AttrType::Int))
            .with("guid", computed(AttrType::String))
            .with("res_id", computed(AttrType::String))
            .with("snap_set_guid", computed(AttrType::String))
            .with("snap_set_time", computed(AttrType::Int))
    }

    fn timeouts(&self) -> Timeouts {
        Timeouts::default()
    }

    fn natural_key(&self, config: &AttrMap) -> Option<String> {
        let disk_id = config.get("disk_id").and_then(as_i64)?;
        let label = config.get("label")?.as_str()?;
        Some(format!("{disk_id}#{label}"))
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
