// ── Disk wire types ──

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString, VariantNames};

/// Disk role on the platform.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, VariantNames, Serialize, Deserialize,
)]
pub enum DiskType {
    /// Boot disk.
    B,
    /// Data disk.
    #[default]
    D,
    /// Temporary disk.
    T,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Disk {
    pub id: u64,
    pub account_id: u64,
    pub account_name: String,
    pub gid: u64,
    pub name: String,
    pub desc: String,
    #[serde(rename = "type")]
    pub disk_type: DiskType,
    pub size_max: u64,
    pub size_used: f64,
    pub sep_id: u64,
    pub sep_type: String,
    pub pool: String,
    pub image_id: u64,
    pub parent_id: u64,
    pub res_id: String,
    pub res_name: String,
    pub role: String,
    pub order: u64,
    pub params: String,
    pub shareable: bool,
    pub iotune: IoTune,
    /// Shape varies between platform releases.
    pub acl: Value,
    pub status: String,
    pub tech_status: String,
    pub created_time: u64,
    pub deleted_time: u64,
    pub destruction_time: u64,
    pub purge_time: u64,
    pub snapshots: Vec<Snapshot>,
}

impl Disk {
    pub fn snapshot(&self, label: &str) -> Option<&Snapshot> {
        self.snapshots.iter().find(|s| s.label == label)
    }
}

/// I/O throttles. `-1` on a field means the platform applies no limit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IoTune {
    pub read_bytes_sec: i64,
    pub read_bytes_sec_max: i64,
    pub read_iops_sec: i64,
    pub read_iops_sec_max: i64,
    pub size_iops_sec: i64,
    pub total_bytes_sec: i64,
    pub total_bytes_sec_max: i64,
    pub total_iops_sec: i64,
    pub total_iops_sec_max: i64,
    pub write_bytes_sec: i64,
    pub write_bytes_sec_max: i64,
    pub write_iops_sec: i64,
    pub write_iops_sec_max: i64,
}

/// Sentinel for "no limit".
pub const UNLIMITED: i64 = -1;

impl IoTune {
    pub const FIELDS: [&'static str; 13] = [
        "read_bytes_sec",
        "read_bytes_sec_max",
        "read_iops_sec",
        "read_iops_sec_max",
        "size_iops_sec",
        "total_bytes_sec",
        "total_bytes_sec_max",
        "total_iops_sec",
        "total_iops_sec_max",
        "write_bytes_sec",
        "write_bytes_sec_max",
        "write_iops_sec",
        "write_iops_sec_max",
    ];

    pub fn get(&self, field: &str) -> Option<i64> {
        self.fields().find(|(name, _)| *name == field).map(|(_, v)| v)
    }

    pub fn set(&mut self, field: &str, value: i64) -> bool {
        let slot = match field {
            "read_bytes_sec" => &mut self.read_bytes_sec,
            "read_bytes_sec_max" => &mut self.read_bytes_sec_max,
            "read_iops_sec" => &mut self.read_iops_sec,
            "read_iops_sec_max" => &mut self.read_iops_sec_max,
            "size_iops_sec" => &mut self.size_iops_sec,
            "total_bytes_sec" => &mut self.total_bytes_sec,
            "total_bytes_sec_max" => &mut self.total_bytes_sec_max,
            "total_iops_sec" => &mut self.total_iops_sec,
            "total_iops_sec_max" => &mut self.total_iops_sec_max,
            "write_bytes_sec" => &mut self.write_bytes_sec,
            "write_bytes_sec_max" => &mut self.write_bytes_sec_max,
            "write_iops_sec" => &mut self.write_iops_sec,
            "write_iops_sec_max" => &mut self.write_iops_sec_max,
            _ => return false,
        };
        *slot = value;
        true
    }

    /// `(name, value)` pairs in wire order.
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, i64)> {
        let values = [
            self.read_bytes_sec,
            self.read_bytes_sec_max,
            self.read_iops_sec,
            self.read_iops_sec_max,
            self.size_iops_sec,
            self.total_bytes_sec,
            self.total_bytes_sec_max,
            self.total_iops_sec,
            self.total_iops_sec_max,
            self.write_bytes_sec,
            self.write_bytes_sec_max,
            self.write_iops_sec,
            self.write_iops_sec_max,
        ];
        Self::FIELDS.into_iter().zip(values)
    }

    /// Adjust a declaration against the platform's current throttles: a
    /// declared `0` where the platform reports [`UNLIMITED`] keeps `-1`.
    pub fn preserve_unlimited(&self, current: &IoTune) -> IoTune {
        let mut out = self.clone();
        for (name, value) in self.fields() {
            if value == 0 && current.get(name) == Some(UNLIMITED) {
                out.set(name, UNLIMITED);
            }
        }
        out
    }

    /// Whether the declaration differs from the platform, with `0` and `-1`
    /// treated as the same "no limit".
    pub fn differs_from(&self, current: &IoTune) -> bool {
        self.preserve_unlimited(current) != *current
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Snapshot {
    pub label: String,
    pub guid: String,
    pub res_id: String,
    pub snap_set_guid: String,
    pub snap_set_time: u64,
    pub timestamp: u64,
}
