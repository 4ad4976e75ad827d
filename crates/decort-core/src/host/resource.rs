use std::future::Future;
use std::pin::Pin;

use decort_api::Scope;

use super::data::{AttrMap, ResourceData};
use super::schema::Schema;
use super::timeouts::Timeouts;
use crate::error::CoreError;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// One impl per managed resource type.
///
/// Callbacks for a single instance are invoked serially; callbacks for
/// different instances may run concurrently.
pub trait Resource: Send + Sync {
    fn type_name(&self) -> &'static str;

    fn schema(&self) -> Schema;

    fn timeouts(&self) -> Timeouts;

    /// Realise the declaration, set the id, and read canonical state back.
    fn create<'a>(
        &'a self,
        scope: &'a Scope,
        d: &'a mut ResourceData,
    ) -> BoxFuture<'a, Result<(), CoreError>>;

    /// Refresh state from the platform. Clears the id when the resource is gone.
    fn read<'a>(
        &'a self,
        scope: &'a Scope,
        d: &'a mut ResourceData,
    ) -> BoxFuture<'a, Result<(), CoreError>>;

    /// Issue the minimal set of calls for changed attributes.
    fn update<'a>(
        &'a self,
        scope: &'a Scope,
        d: &'a mut ResourceData,
    ) -> BoxFuture<'a, Result<(), CoreError>>;

    fn delete<'a>(
        &'a self,
        scope: &'a Scope,
        d: &'a mut ResourceData,
    ) -> BoxFuture<'a, Result<(), CoreError>>;

    /// Identity of the instance among its siblings, used to reject duplicate
    /// declarations before anything is applied.
    fn natural_key(&self, _config: &AttrMap) -> Option<String> {
        None
    }
}

/// Read-only lookup of an existing platform entity.
pub trait DataSource: Send + Sync {
    fn type_name(&self) -> &'static str;

    fn schema(&self) -> Schema;

    fn read<'a>(
        &'a self,
        scope: &'a Scope,
        d: &'a mut ResourceData,
    ) -> BoxFuture<'a, Result<(), CoreError>>;
}
