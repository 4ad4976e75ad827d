// Per-operation time budgets
//
// Each CRUD callback runs under a deadline drawn from this small table.

use std::time::Duration;

use serde::Serialize;
use strum::{Display, EnumString};

/// Reads of a single entity.
pub const READ: Duration = Duration::from_secs(30);
/// Short mutations (sub-resource setters, snapshot actions).
pub const MUTATION: Duration = Duration::from_secs(60);
/// Disk lifecycle calls.
pub const DISK: Duration = Duration::from_secs(180);
/// Account / load balancer full-lifecycle calls.
pub const LIFECYCLE: Duration = Duration::from_secs(300);
/// Heavy creates (computes, clusters).
pub const HEAVY_CREATE: Duration = Duration::from_secs(600);
/// Kubernetes worker-group churn.
pub const K8S_WORKER_GROUP: Duration = Duration::from_secs(20 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Timeouts {
    #[serde(with = "secs")]
    pub create: Duration,
    #[serde(with = "secs")]
    pub read: Duration,
    #[serde(with = "secs")]
    pub update: Duration,
    #[serde(with = "secs")]
    pub delete: Duration,
}

impl Timeouts {
    /// Same budget for every mutation, [`READ`] for reads.
    pub const fn uniform(mutation: Duration) -> Self {
        Self {
            create: mutation,
            read: READ,
            update: mutation,
            delete: mutation,
        }
    }

    pub const fn with_read(mut self, read: Duration) -> Self {
        self.read = read;
        self
    }

    pub fn for_operation(&self, op: Operation) -> Duration {
        match op {
            Operation::Create => self.create,
            Operation::Read => self.read,
            Operation::Update => self.update,
            Operation::Delete => self.delete,
        }
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self::uniform(MUTATION)
    }
}

mod secs {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }
}
