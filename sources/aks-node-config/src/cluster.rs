//! Cluster identity, placement and networking records.

use serde::{Deserialize, Serialize};

wire_enum! {
    /// Kind of compute backing the node pool.
    pub enum VmType {
        Unspecified = (0, "VM_TYPE_UNSPECIFIED"),
        Standard = (1, "VM_TYPE_STANDARD"),
        Vmss = (2, "VM_TYPE_VMSS"),
    }
}

wire_enum! {
    pub enum NetworkPlugin {
        Unspecified = (0, "NETWORK_PLUGIN_UNSPECIFIED"),
        None = (1, "NETWORK_PLUGIN_NONE"),
        Azure = (2, "NETWORK_PLUGIN_AZURE"),
        Kubenet = (3, "NETWORK_PLUGIN_KUBENET"),
    }
}

wire_enum! {
    pub enum NetworkPolicy {
        Unspecified = (0, "NETWORK_POLICY_UNSPECIFIED"),
        None = (1, "NETWORK_POLICY_NONE"),
        Azure = (2, "NETWORK_POLICY_AZURE"),
        Calico = (3, "NETWORK_POLICY_CALICO"),
    }
}

wire_enum! {
    pub enum LoadBalancerSku {
        Unspecified = (0, "LOAD_BALANCER_SKU_UNSPECIFIED"),
        Basic = (1, "LOAD_BALANCER_SKU_BASIC"),
        Standard = (2, "LOAD_BALANCER_SKU_STANDARD"),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    pub location: String,
    pub resource_group: String,
    pub vm_type: VmType,
    pub primary_availability_set: String,
    pub primary_scale_set: String,
    pub use_instance_metadata: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_network_config: Option<ClusterNetworkConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_balancer_config: Option<LoadBalancerConfig>,
}

record_accessors! {
    ClusterConfig {
        network => cluster_network_config: ClusterNetworkConfig,
        load_balancer => load_balancer_config: LoadBalancerConfig,
    }
}

/// Names of the virtual network resources the node attaches to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterNetworkConfig {
    pub vnet_name: String,
    pub vnet_resource_group: String,
    pub subnet: String,
    pub security_group_name: String,
    pub route_table: String,
    /// Cluster IP of the in-cluster DNS service; local DNS forwards cluster traffic here.
    pub core_dns_service_ip: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadBalancerConfig {
    pub load_balancer_sku: LoadBalancerSku,
    pub disable_outbound_snat: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_master_from_standard_load_balancer: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_load_balancer_rule_count: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub network_plugin: NetworkPlugin,
    pub network_policy: NetworkPolicy,
    pub vnet_cni_plugins_url: String,
    pub cni_plugins_url: String,
}
