// ── Platform entity status ──

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Lifecycle status reported in an entity's `status` field.
///
/// Unknown strings are kept verbatim so a newer platform does not break reads.
#[derive(Debug, Clone, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Modeled,
    Creating,
    Created,
    Enabled,
    Disabled,
    Assigned,
    Deleting,
    /// Soft-deleted: recoverable from the platform's recycle bin.
    Deleted,
    Destroying,
    /// Permanently removed.
    Destroyed,
    Purged,
    #[strum(default)]
    #[serde(untagged)]
    Other(String),
}

impl Status {
    pub fn parse(text: &str) -> Self {
        text.parse().unwrap_or_else(|_| Self::Other(text.to_owned()))
    }

    pub fn is_soft_deleted(&self) -> bool {
        matches!(self, Self::Deleted)
    }

    /// The entity no longer exists server-side.
    pub fn is_gone(&self) -> bool {
        matches!(self, Self::Destroyed | Self::Purged)
    }
}

/// Convenience for wire structs that keep `status` as a plain string.
pub fn is_gone(status: &str) -> bool {
    Status::parse(status).is_gone()
}

pub fn is_soft_deleted(status: &str) -> bool {
    Status::parse(status).is_soft_deleted()
}
