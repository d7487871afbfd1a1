//! Fixed paths and values shared by the provisioning script and the controller.
//!
//! These are intentionally not configurable; the provisioning script expects them.

// Files owned by the controller and the provisioning script.
pub const LOG_FILE: &str = "/var/log/azure/aks-node-controller.log";
pub const PROVISION_JSON_FILE: &str = "/var/log/azure/aks/provision.json";
pub const PROVISION_COMPLETE_FILE: &str = "/opt/azure/containers/provision.complete";
pub const PROVISION_CONFIG_FILE: &str = aks_node_config::CONFIG_PATH;
pub const EVENTS_DIR: &str = "/var/log/azure/Microsoft.Azure.Extensions.CustomScript/events";
pub const PROVISION_OUTPUT: &str = "/var/log/azure/cluster-provision.log";

// Scripts placed on the image, handed to the provisioning script by path.
pub const CSE_HELPERS_FILEPATH: &str = "/opt/azure/containers/provision_source.sh";
pub const CSE_DISTRO_HELPERS_FILEPATH: &str = "/opt/azure/containers/provision_source_distro.sh";
pub const CSE_INSTALL_FILEPATH: &str = "/opt/azure/containers/provision_installs.sh";
pub const CSE_DISTRO_INSTALL_FILEPATH: &str = "/opt/azure/containers/provision_installs_distro.sh";
pub const CSE_CONFIG_FILEPATH: &str = "/opt/azure/containers/provision_configs.sh";
pub const CUSTOM_SEARCH_DOMAIN_FILEPATH: &str = "/opt/azure/containers/setup-custom-search-domains.sh";
pub const DHCPV6_SERVICE_FILEPATH: &str = "/etc/systemd/system/dhcpv6.service";
pub const DHCPV6_CONFIG_FILEPATH: &str = "/opt/azure/containers/enable-dhcpv6.sh";
pub const INIT_AKS_CUSTOM_CLOUD_FILEPATH: &str = "/opt/azure/containers/init-aks-custom-cloud.sh";
pub const PROVISION_START_FILEPATH: &str = "/opt/azure/containers/provision_start.sh";

// Defaults applied when the configuration leaves a value unset.
pub const DEFAULT_LINUX_USER: &str = "azureuser";
pub const DEFAULT_CLOUD_NAME: &str = "AzurePublicCloud";
pub const AKS_CUSTOM_CLOUD_NAME: &str = "akscustom";
pub const AZURE_STACK_CLOUD: &str = "AzureStackCloud";
pub const MAX_LB_RULE_COUNT_DEFAULT: i32 = 250;

// Local DNS.
pub const LOCAL_DNS_NODE_LISTENER_IP: &str = "169.254.10.10";
pub const LOCAL_DNS_CLUSTER_LISTENER_IP: &str = "169.254.10.11";
pub const AZURE_DNS_IP: &str = "168.63.129.16";
pub const DEFAULT_CORE_DNS_SERVICE_IP: &str = "10.0.0.10";
pub const DEFAULT_LOCAL_DNS_CPU_LIMIT: &str = "200.0%";
pub const DEFAULT_LOCAL_DNS_MEMORY_LIMIT: &str = "128M";

// Sysctl defaults.
pub const DEFAULT_NET_IPV4_TCP_RETRIES2: i64 = 8;
pub const DEFAULT_NET_CORE_MESSAGE_BURST: i64 = 80;
pub const DEFAULT_NET_CORE_MESSAGE_COST: i64 = 40;
pub const DEFAULT_NET_CORE_SOMAXCONN: i64 = 16384;
pub const DEFAULT_NET_IPV4_TCP_MAX_SYN_BACKLOG: i64 = 16384;
pub const DEFAULT_NET_IPV4_NEIGH_DEFAULT_GC_THRESH1: i64 = 4096;
pub const DEFAULT_NET_IPV4_NEIGH_DEFAULT_GC_THRESH2: i64 = 8192;
pub const DEFAULT_NET_IPV4_NEIGH_DEFAULT_GC_THRESH3: i64 = 16384;
/// Ports above this are reserved for the node when the local port range reaches into them.
pub const IP_LOCAL_RESERVED_PORTS: i32 = 65330;

// Provisioning outcome.
/// `ExitCode` recorded when the controller itself fails before or around the script.
pub const CONTROLLER_FAILURE_EXIT_CODE: i32 = 240;
