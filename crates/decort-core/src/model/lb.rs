// ── Load balancer wire types ──
//
// Shapes returned by `/cloudapi/lb/get`. Field names follow the platform's
// camelCase; absent fields default so partial documents still parse.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString, VariantNames};

/// Backend balancing algorithm.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, VariantNames, Serialize, Deserialize,
)]
pub enum Algorithm {
    #[default]
    #[strum(serialize = "roundrobin")]
    #[serde(rename = "roundrobin")]
    RoundRobin,
    #[strum(serialize = "static-rr")]
    #[serde(rename = "static-rr")]
    StaticRoundRobin,
    #[strum(serialize = "leastconn")]
    #[serde(rename = "leastconn")]
    LeastConn,
}

/// Health-check switch on a backend server.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, VariantNames, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Check {
    #[default]
    Enabled,
    Disabled,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoadBalancer {
    pub id: u64,
    pub name: String,
    pub rg_id: u64,
    pub rg_name: String,
    pub extnet_id: u64,
    pub vins_id: u64,
    pub image_id: u64,
    pub desc: String,
    #[serde(rename = "HAmode")]
    pub ha_mode: bool,
    pub primary_node: Node,
    pub secondary_node: Node,
    pub status: String,
    pub tech_status: String,
    pub dp_api_user: String,
    pub gid: u64,
    pub guid: u64,
    pub milestones: u64,
    /// Shape varies between platform releases.
    pub acl: Value,
    pub created_by: String,
    pub created_time: u64,
    pub updated_by: String,
    pub updated_time: u64,
    pub deleted_by: String,
    pub deleted_time: u64,
    pub backends: Vec<Backend>,
    pub frontends: Vec<Frontend>,
}

impl LoadBalancer {
    pub fn is_started(&self) -> bool {
        self.tech_status == "STARTED"
    }

    pub fn backend(&self, name: &str) -> Option<&Backend> {
        self.backends.iter().find(|b| b.name == name)
    }

    pub fn frontend(&self, name: &str) -> Option<&Frontend> {
        self.frontends.iter().find(|f| f.name == name)
    }

    /// Frontends routing traffic to `backend`.
    pub fn frontends_using<'a>(&'a self, backend: &'a str) -> impl Iterator<Item = &'a Frontend> {
        self.frontends.iter().filter(move |f| f.backend == backend)
    }
}

/// One HA node of a load balancer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Node {
    pub backend_ip: String,
    pub compute_id: u64,
    pub frontend_ip: String,
    pub guid: String,
    pub mgmt_ip: String,
    pub network_id: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Backend {
    pub name: String,
    pub algorithm: Algorithm,
    pub guid: String,
    pub server_default_settings: ServerSettings,
    pub servers: Vec<Server>,
}

impl Backend {
    pub fn server(&self, name: &str) -> Option<&Server> {
        self.servers.iter().find(|s| s.name == name)
    }
}

/// Health-check and queueing knobs, shared by backend defaults and servers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub guid: String,
    pub inter: i64,
    pub downinter: i64,
    pub rise: i64,
    pub fall: i64,
    pub slowstart: i64,
    pub maxconn: i64,
    pub maxqueue: i64,
    pub weight: i64,
}

impl ServerSettings {
    /// Attribute names of the tunable settings, in wire order.
    pub const FIELDS: [&'static str; 8] = [
        "inter",
        "downinter",
        "rise",
        "fall",
        "slowstart",
        "maxconn",
        "maxqueue",
        "weight",
    ];

    pub fn value(&self, field: &str) -> Option<i64> {
        let value = match field {
            "inter" => self.inter,
            "downinter" => self.downinter,
            "rise" => self.rise,
            "fall" => self.fall,
            "slowstart" => self.slowstart,
            "maxconn" => self.maxconn,
            "maxqueue" => self.maxqueue,
            "weight" => self.weight,
            _ => return None,
        };
        Some(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Server {
    pub name: String,
    pub address: String,
    pub port: u16,
    pub check: Check,
    pub guid: String,
    pub server_settings: ServerSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Frontend {
    pub name: String,
    /// Name of the backend on the same load balancer.
    pub backend: String,
    pub guid: String,
    pub bindings: Vec<Binding>,
}

impl Frontend {
    pub fn binding(&self, name: &str) -> Option<&Binding> {
        self.bindings.iter().find(|b| b.name == name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Binding {
    pub name: String,
    pub address: String,
    pub port: u16,
    pub guid: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_platform_document() {
        let lb: LoadBalancer = serde_json::from_value(json!({
            "id": 10,
            "name": "lb1",
            "rgId": 17,
            "HAmode": true,
            "techStatus": "STARTED",
            "primaryNode": {"backendIp": "10.0.0.2", "computeId": 900},
            "backends": [{
                "name": "b1",
                "algorithm": "leastconn",
                "serverDefaultSettings": {"inter": 5000, "rise": 2},
                "servers": [{"name": "s1", "address": "10.0.0.10", "port": 8080, "check": "disabled"}]
            }],
            "frontends": [{"name": "f1", "backend": "b1", "bindings": [{"name": "http", "port": 80}]}]
        }))
        .unwrap_or_default();

        assert!(lb.ha_mode);
        assert!(lb.is_started());
        assert_eq!(lb.primary_node.compute_id, 900);
        let backend = lb.backend("b1").cloned().unwrap_or_default();
        assert_eq!(backend.algorithm, Algorithm::LeastConn);
        assert_eq!(backend.server_default_settings.inter, 5000);
        assert_eq!(backend.server("s1").map(|s| s.check), Some(Check::Disabled));
        assert_eq!(lb.frontends_using("b1").count(), 1);
    }

    #[test]
    fn algorithm_names_match_platform() {
        assert_eq!(Algorithm::VARIANTS, &["roundrobin", "static-rr", "leastconn"]);
        assert_eq!("static-rr".parse::<Algorithm>().ok(), Some(Algorithm::StaticRoundRobin));
    }
}
