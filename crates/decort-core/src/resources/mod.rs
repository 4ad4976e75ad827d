// ── Resource reconcilers ──
//
// One module per resource type. Every reconciler talks to the platform
// through the shared [`Platform`] handle, which owns the `Arc<DecortClient>`
// and folds transport errors into `CoreError`.

pub mod disk;
pub mod disk_snapshot;
mod endpoints;
pub mod ids;
pub mod lb;
pub mod lb_backend;
pub mod lb_backend_server;
pub mod lb_frontend;
pub mod lb_frontend_bind;

use std::sync::Arc;

use decort_api::{DecortClient, FormParams, Scope, parse_bool, parse_id};

use crate::error::CoreError;
use crate::host::data::ResourceData;
use crate::host::registry::Registry;
use crate::model::{Disk, LoadBalancer};

pub use disk::{DiskDataSource, DiskResource, OnDestroyed};
pub use disk_snapshot::DiskSnapshotResource;
pub use lb::{LbDataSource, LbResource};
pub use lb_backend::LbBackendResource;
pub use lb_backend_server::LbBackendServerResource;
pub use lb_frontend::LbFrontendResource;
pub use lb_frontend_bind::LbFrontendBindResource;

/// Shared access to the platform for every reconciler.
#[derive(Clone)]
pub struct Platform {
    client: Arc<DecortClient>,
}

impl Platform {
    pub fn new(client: Arc<DecortClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &DecortClient {
        &self.client
    }

    pub(crate) async fn call(
        &self,
        scope: &Scope,
        path: &str,
        params: &FormParams,
    ) -> Result<String, CoreError> {
        Ok(self.client.post(scope, path, params).await?)
    }

    /// Call an action endpoint that answers `true` on success. A `false`
    /// reply means the platform refused the action.
    pub(crate) async fn confirm(
        &self,
        scope: &Scope,
        path: &str,
        params: &FormParams,
    ) -> Result<(), CoreError> {
        let body = self.call(scope, path, params).await?;
        if parse_bool(&body)? {
            Ok(())
        } else {
            Err(CoreError::Api {
                status: 200,
                body: format!("{path} was refused by the platform"),
            })
        }
    }

    /// Call an endpoint that answers with the new entity's numeric id.
    pub(crate) async fn create(
        &self,
        scope: &Scope,
        path: &str,
        params: &FormParams,
    ) -> Result<u64, CoreError> {
        let body = self.call(scope, path, params).await?;
        Ok(parse_id(&body)?)
    }

    pub(crate) async fn get_lb(&self, scope: &Scope, lb_id: u64) -> Result<LoadBalancer, CoreError> {
        let mut params = FormParams::new();
        params.push_int("lbId", to_i64(lb_id));
        self.client
            .post_json(scope, endpoints::lb::GET, &params)
            .await
            .map_err(|e| rename_not_found(e.into(), "load balancer", lb_id))
    }

    pub(crate) async fn get_disk(&self, scope: &Scope, disk_id: u64) -> Result<Disk, CoreError> {
        let mut params = FormParams::new();
        params.push_int("diskId", to_i64(disk_id));
        self.client
            .post_json(scope, endpoints::disks::GET, &params)
            .await
            .map_err(|e| rename_not_found(e.into(), "disk", disk_id))
    }
}

impl std::fmt::Debug for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Platform")
            .field("controller_url", &self.client.controller_url().as_str())
            .finish_non_exhaustive()
    }
}

/// Build the registry of every resource and data-source type.
pub fn registry(platform: &Platform, on_destroyed: OnDestroyed) -> Registry {
    let mut registry = Registry::new();
    registry
        .register(Arc::new(LbResource::new(platform.clone())))
        .register(Arc::new(LbBackendResource::new(platform.clone())))
        .register(Arc::new(LbBackendServerResource::new(platform.clone())))
        .register(Arc::new(LbFrontendResource::new(platform.clone())))
        .register(Arc::new(LbFrontendBindResource::new(platform.clone())))
        .register(Arc::new(DiskResource::new(platform.clone(), on_destroyed)))
        .register(Arc::new(DiskSnapshotResource::new(platform.clone())))
        .register_data_source(Arc::new(LbDataSource::new(platform.clone())))
        .register_data_source(Arc::new(DiskDataSource::new(platform.clone())));
    registry
}

fn rename_not_found(err: CoreError, entity: &str, id: u64) -> CoreError {
    if err.is_not_found() {
        CoreError::not_found(entity, id)
    } else {
        err
    }
}

/// Platform ids are unsigned; the form encoder takes `i64`.
pub(crate) fn to_i64(id: u64) -> i64 {
    i64::try_from(id).unwrap_or(i64::MAX)
}

/// Required integer attribute, declared or from state.
pub(crate) fn require_u64(d: &ResourceData, key: &str) -> Result<u64, CoreError> {
    d.get_u64(key)
        .ok_or_else(|| CoreError::validation(format!("\"{key}\" must be a non-negative integer")))
}

pub(crate) fn require_str<'a>(d: &'a ResourceData, key: &str) -> Result<&'a str, CoreError> {
    d.get_str(key)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| CoreError::validation(format!("missing required argument \"{key}\"")))
}

/// The resource's numeric id.
pub(crate) fn numeric_id(d: &ResourceData) -> Result<Option<u64>, CoreError> {
    d.id()
        .map(|id| {
            id.parse()
                .map_err(|_| CoreError::validation(format!("malformed id {id:?}")))
        })
        .transpose()
}

/// Whether a declared one-shot flag moved to `true` since the last apply.
pub(crate) fn flipped_on(d: &ResourceData, key: &str) -> bool {
    d.has_change(key) && d.get_bool(key) == Some(true)
}
