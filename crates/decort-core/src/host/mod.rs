// ── Host contract ──
//
// The surface a configuration-management host drives: schemas, the
// per-instance attribute store, CRUD traits, per-operation timeouts, and
// plan-time checks.

pub mod data;
pub mod plan;
pub mod registry;
pub mod resource;
pub mod schema;
pub mod timeouts;

pub use data::{AttrMap, ResourceData};
pub use plan::{PlannedResource, check_plan, check_unique_keys};
pub use registry::Registry;
pub use resource::{BoxFuture, DataSource, Resource};
pub use schema::{AttrType, Attribute, Schema};
pub use timeouts::{Operation, Timeouts};
