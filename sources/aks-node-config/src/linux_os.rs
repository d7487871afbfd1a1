//! Host operating system tuning: sysctls, containerd ulimits, swap and transparent hugepages.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomLinuxOsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sysctl_config: Option<SysctlConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ulimit_config: Option<UlimitConfig>,
    pub enable_swap_config: bool,
    pub swap_file_size: i32,
    pub transparent_hugepage_support: String,
    pub transparent_defrag: String,
}

/// Kernel parameters.  Every field is explicitly present or absent; absence keeps the node default
/// while a present zero is written out as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SysctlConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net_core_somaxconn: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net_core_netdev_max_backlog: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net_core_rmem_default: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net_core_rmem_max: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net_core_wmem_default: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net_core_wmem_max: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net_core_optmem_max: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net_ipv4_tcp_max_syn_backlog: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net_ipv4_tcp_max_tw_buckets: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net_ipv4_tcp_fin_timeout: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net_ipv4_tcp_keepalive_time: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net_ipv4_tcp_keepalive_probes: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net_ipv4_tcpkeepalive_intvl: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net_ipv4_tcp_tw_reuse: Option<bool>,
    /// Two space-separated port numbers, "<start> <end>".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net_ipv4_ip_local_port_range: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net_ipv4_neigh_default_gc_thresh1: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net_ipv4_neigh_default_gc_thresh2: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net_ipv4_neigh_default_gc_thresh3: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net_netfilter_nf_conntrack_max: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net_netfilter_nf_conntrack_buckets: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fs_inotify_max_user_watches: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fs_file_max: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fs_aio_max_nr: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fs_nr_open: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kernel_threads_max: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vm_max_map_count: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vm_swappiness: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vm_vfs_cache_pressure: Option<i32>,
}

/// Resource limits applied to the containerd service unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UlimitConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_locked_memory: Option<String>,
}
