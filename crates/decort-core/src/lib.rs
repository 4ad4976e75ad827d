// decort-core: reconciliation of DECORT load balancers, disks and snapshots
//
// The host drives CRUD callbacks through [`Provider`]; each resource module
// translates declared attributes into platform calls and flattens the
// canonical state back into the attribute store.

pub mod error;
pub mod flatten;
pub mod host;
pub mod model;
pub mod provider;
pub mod resources;

pub use error::{CoreError, ErrorKind};
pub use host::{
    AttrMap, AttrType, Attribute, DataSource, Operation, PlannedResource, Registry, Resource,
    ResourceData, Schema, Timeouts,
};
pub use provider::{ApplyAction, Provider, ProviderOptions};
pub use resources::{OnDestroyed, Platform};
