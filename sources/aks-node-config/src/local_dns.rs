//! Per-node DNS forwarder profile.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

wire_enum! {
    pub enum LocalDnsQueryLogging {
        Unspecified = (0, "LOCAL_DNS_QUERY_LOGGING_UNSPECIFIED"),
        Error = (1, "LOCAL_DNS_QUERY_LOGGING_ERROR"),
        Log = (2, "LOCAL_DNS_QUERY_LOGGING_LOG"),
    }
}

wire_enum! {
    pub enum LocalDnsProtocol {
        Unspecified = (0, "LOCAL_DNS_PROTOCOL_UNSPECIFIED"),
        PreferUdp = (1, "LOCAL_DNS_PROTOCOL_PREFER_UDP"),
        ForceTcp = (2, "LOCAL_DNS_PROTOCOL_FORCE_TCP"),
    }
}

wire_enum! {
    pub enum LocalDnsForwardDestination {
        Unspecified = (0, "LOCAL_DNS_FORWARD_DESTINATION_UNSPECIFIED"),
        ClusterCoreDns = (1, "LOCAL_DNS_FORWARD_DESTINATION_CLUSTER_CORE_DNS"),
        VnetDns = (2, "LOCAL_DNS_FORWARD_DESTINATION_VNET_DNS"),
    }
}

wire_enum! {
    pub enum LocalDnsForwardPolicy {
        Unspecified = (0, "LOCAL_DNS_FORWARD_POLICY_UNSPECIFIED"),
        Sequential = (1, "LOCAL_DNS_FORWARD_POLICY_SEQUENTIAL"),
        RoundRobin = (2, "LOCAL_DNS_FORWARD_POLICY_ROUND_ROBIN"),
        Random = (3, "LOCAL_DNS_FORWARD_POLICY_RANDOM"),
    }
}

wire_enum! {
    pub enum LocalDnsServeStale {
        Unspecified = (0, "LOCAL_DNS_SERVE_STALE_UNSPECIFIED"),
        Verify = (1, "LOCAL_DNS_SERVE_STALE_VERIFY"),
        Immediate = (2, "LOCAL_DNS_SERVE_STALE_IMMEDIATE"),
        Disable = (3, "LOCAL_DNS_SERVE_STALE_DISABLE"),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalDnsProfile {
    pub enable_local_dns: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_limit_in_milli_cores: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_limit_in_mb: Option<i32>,
    /// Overrides for traffic arriving on the node listener, keyed by DNS zone.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub vnet_dns_overrides: BTreeMap<String, LocalDnsOverrides>,
    /// Overrides for traffic arriving on the cluster listener, keyed by DNS zone.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub kube_dns_overrides: BTreeMap<String, LocalDnsOverrides>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalDnsOverrides {
    pub query_logging: LocalDnsQueryLogging,
    pub protocol: LocalDnsProtocol,
    pub forward_destination: LocalDnsForwardDestination,
    pub forward_policy: LocalDnsForwardPolicy,
    pub max_concurrent: i32,
    pub cache_duration_in_seconds: i32,
    pub serve_stale_duration_in_seconds: i32,
    pub serve_stale: LocalDnsServeStale,
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn overrides_are_ordered_by_zone() {
        let profile: LocalDnsProfile = serde_json::from_value(json!({
            "enable_local_dns": true,
            "vnet_dns_overrides": {
                "cluster.local": {"forward_destination": "LOCAL_DNS_FORWARD_DESTINATION_CLUSTER_CORE_DNS"},
                ".": {"forward_policy": "LOCAL_DNS_FORWARD_POLICY_RANDOM", "max_concurrent": 1000},
            }
        }))
        .unwrap();
        let zones: Vec<_> = profile.vnet_dns_overrides.keys().cloned().collect();
        assert_eq!(zones, vec![".".to_string(), "cluster.local".to_string()]);
        assert_eq!(
            profile.vnet_dns_overrides["."].forward_policy,
            LocalDnsForwardPolicy::Random
        );
        assert_eq!(profile.cpu_limit_in_milli_cores, None);
    }
}
