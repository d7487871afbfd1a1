//! Pure derivations from the node configuration to the strings the provisioning script consumes.
//!
//! Nothing here does I/O.  The command builder is the only place these are composed.

use crate::constants::*;
use aks_node_config::cluster::{LoadBalancerConfig, LoadBalancerSku, NetworkConfig, NetworkPlugin, NetworkPolicy, VmType};
use aks_node_config::configuration::{
    BootstrappingAuthMethod, BootstrappingConfig, CustomCloudConfig, CustomSearchDomainConfig,
    HttpProxyConfig,
};
use aks_node_config::kubelet::{KubeletConfig, KubeletDisk};
use aks_node_config::linux_os::{CustomLinuxOsConfig, SysctlConfig, UlimitConfig};
use aks_node_config::Configuration;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use log::debug;
use semver::Version;
use std::collections::BTreeMap;
use std::fmt::Display;

// Enum spellings.  Unspecified and "none" variants both mean "nothing to configure".

pub fn vm_type_str(vm_type: VmType) -> &'static str {
    match vm_type {
        VmType::Standard => "standard",
        VmType::Vmss => "vmss",
        VmType::Unspecified => "",
    }
}

pub fn network_plugin_str(plugin: NetworkPlugin) -> &'static str {
    match plugin {
        NetworkPlugin::Azure => "azure",
        NetworkPlugin::Kubenet => "kubenet",
        NetworkPlugin::None | NetworkPlugin::Unspecified => "",
    }
}

pub fn network_policy_str(policy: NetworkPolicy) -> &'static str {
    match policy {
        NetworkPolicy::Azure => "azure",
        NetworkPolicy::Calico => "calico",
        NetworkPolicy::None | NetworkPolicy::Unspecified => "",
    }
}

pub fn load_balancer_sku_str(sku: LoadBalancerSku) -> &'static str {
    match sku {
        LoadBalancerSku::Basic => "basic",
        LoadBalancerSku::Standard => "standard",
        LoadBalancerSku::Unspecified => "",
    }
}

pub fn kubelet_disk_type_str(disk: KubeletDisk) -> &'static str {
    match disk {
        KubeletDisk::OsDisk => "OS",
        KubeletDisk::TempDisk => "Temporary",
        KubeletDisk::Unspecified => "",
    }
}

pub fn bootstrapping_auth_method_str(method: BootstrappingAuthMethod) -> &'static str {
    match method {
        BootstrappingAuthMethod::TlsBootstrapping => "UseTLSBootstrapToken",
        BootstrappingAuthMethod::SecureTlsBootstrapping => "UseSecureTLSBootstrapping",
        BootstrappingAuthMethod::Unspecified => "",
    }
}

// Target cloud.

/// Picks the sovereign cloud, if any, from the cluster location.
pub fn cloud_for_location(location: &str) -> &'static str {
    let loc: String = location
        .split_whitespace()
        .collect::<String>()
        .to_lowercase();
    if loc.starts_with("china") {
        "AzureChinaCloud"
    } else if loc == "germanynortheast" || loc == "germanycentral" {
        "AzureGermanCloud"
    } else if loc.starts_with("usgov") || loc.starts_with("usdod") {
        "AzureUSGovernmentCloud"
    } else {
        DEFAULT_CLOUD_NAME
    }
}

pub fn is_aks_custom_cloud(custom_cloud: &CustomCloudConfig) -> bool {
    custom_cloud
        .custom_cloud_env_name
        .eq_ignore_ascii_case(AKS_CUSTOM_CLOUD_NAME)
}

pub fn target_environment(config: &Configuration) -> &'static str {
    if is_aks_custom_cloud(config.custom_cloud()) {
        AKS_CUSTOM_CLOUD_NAME
    } else {
        cloud_for_location(&config.cluster().location)
    }
}

pub fn target_cloud(config: &Configuration) -> &'static str {
    if is_aks_custom_cloud(config.custom_cloud()) {
        AZURE_STACK_CLOUD
    } else {
        target_environment(config)
    }
}

pub fn azure_environment_filepath(config: &Configuration) -> String {
    if is_aks_custom_cloud(config.custom_cloud()) {
        format!("/etc/kubernetes/{}.json", target_environment(config))
    } else {
        String::new()
    }
}

// Key/value formatting.

/// Joins `k=v` pairs in ascending key order, with no trailing delimiter.
pub fn sorted_key_value_pairs<K, V>(map: &BTreeMap<K, V>, delimiter: &str) -> String
where
    K: Display,
    V: Display,
{
    map.iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(delimiter)
}

/// Returns the end of a "<start> <end>" port range, or -1 if the range is malformed.
pub fn port_range_end(port_range: &str) -> i32 {
    let parts: Vec<&str> = port_range.split(' ').collect();
    if parts.len() != 2 {
        return -1;
    }
    let (start, end) = match (parts[0].parse::<i32>(), parts[1].parse::<i32>()) {
        (Ok(start), Ok(end)) => (start, end),
        _ => {
            debug!("Unable to parse port range '{}'", port_range);
            return -1;
        }
    };
    if start <= 0 || end <= 0 || start >= end {
        debug!("Invalid port range '{}'", port_range);
        return -1;
    }
    end
}

/// The effective kernel parameters: the node defaults overlaid with whatever the configuration
/// sets.  A parameter set to zero is written as zero, never dropped.
pub fn sysctl_values(sysctl: Option<&SysctlConfig>) -> BTreeMap<&'static str, String> {
    let empty = SysctlConfig::default();
    let s = sysctl.unwrap_or(&empty);
    let mut m = BTreeMap::new();

    m.insert("net.ipv4.tcp_retries2", DEFAULT_NET_IPV4_TCP_RETRIES2.to_string());
    m.insert("net.core.message_burst", DEFAULT_NET_CORE_MESSAGE_BURST.to_string());
    m.insert("net.core.message_cost", DEFAULT_NET_CORE_MESSAGE_COST.to_string());

    let with_default = |value: Option<i32>, default: i64| {
        value.map(i64::from).unwrap_or(default).to_string()
    };
    m.insert(
        "net.core.somaxconn",
        with_default(s.net_core_somaxconn, DEFAULT_NET_CORE_SOMAXCONN),
    );
    m.insert(
        "net.ipv4.tcp_max_syn_backlog",
        with_default(s.net_ipv4_tcp_max_syn_backlog, DEFAULT_NET_IPV4_TCP_MAX_SYN_BACKLOG),
    );
    m.insert(
        "net.ipv4.neigh.default.gc_thresh1",
        with_default(s.net_ipv4_neigh_default_gc_thresh1, DEFAULT_NET_IPV4_NEIGH_DEFAULT_GC_THRESH1),
    );
    m.insert(
        "net.ipv4.neigh.default.gc_thresh2",
        with_default(s.net_ipv4_neigh_default_gc_thresh2, DEFAULT_NET_IPV4_NEIGH_DEFAULT_GC_THRESH2),
    );
    m.insert(
        "net.ipv4.neigh.default.gc_thresh3",
        with_default(s.net_ipv4_neigh_default_gc_thresh3, DEFAULT_NET_IPV4_NEIGH_DEFAULT_GC_THRESH3),
    );

    let optional: [(&'static str, Option<i32>); 20] = [
        ("net.core.netdev_max_backlog", s.net_core_netdev_max_backlog),
        ("net.core.rmem_default", s.net_core_rmem_default),
        ("net.core.rmem_max", s.net_core_rmem_max),
        ("net.core.wmem_default", s.net_core_wmem_default),
        ("net.core.wmem_max", s.net_core_wmem_max),
        ("net.core.optmem_max", s.net_core_optmem_max),
        ("net.ipv4.tcp_max_tw_buckets", s.net_ipv4_tcp_max_tw_buckets),
        ("net.ipv4.tcp_fin_timeout", s.net_ipv4_tcp_fin_timeout),
        ("net.ipv4.tcp_keepalive_time", s.net_ipv4_tcp_keepalive_time),
        ("net.ipv4.tcp_keepalive_probes", s.net_ipv4_tcp_keepalive_probes),
        ("net.ipv4.tcp_keepalive_intvl", s.net_ipv4_tcpkeepalive_intvl),
        ("net.netfilter.nf_conntrack_max", s.net_netfilter_nf_conntrack_max),
        ("net.netfilter.nf_conntrack_buckets", s.net_netfilter_nf_conntrack_buckets),
        ("fs.inotify.max_user_watches", s.fs_inotify_max_user_watches),
        ("fs.file-max", s.fs_file_max),
        ("fs.aio-max-nr", s.fs_aio_max_nr),
        ("fs.nr_open", s.fs_nr_open),
        ("kernel.threads-max", s.kernel_threads_max),
        ("vm.max_map_count", s.vm_max_map_count),
        ("vm.swappiness", s.vm_swappiness),
    ];
    for (key, value) in optional {
        if let Some(value) = value {
            m.insert(key, value.to_string());
        }
    }
    if let Some(pressure) = s.vm_vfs_cache_pressure {
        m.insert("vm.vfs_cache_pressure", pressure.to_string());
    }

    if let Some(reuse) = s.net_ipv4_tcp_tw_reuse {
        m.insert("net.ipv4.tcp_tw_reuse", if reuse { "1" } else { "0" }.to_string());
    }

    if let Some(range) = s.net_ipv4_ip_local_port_range.as_deref().filter(|r| !r.is_empty()) {
        m.insert("net.ipv4.ip_local_port_range", range.to_string());
        if port_range_end(range) > IP_LOCAL_RESERVED_PORTS {
            m.insert(
                "net.ipv4.ip_local_reserved_ports",
                IP_LOCAL_RESERVED_PORTS.to_string(),
            );
        }
    }

    m
}

/// Base64 of the newline-separated, sorted sysctl settings.
pub fn sysctl_content(sysctl: Option<&SysctlConfig>) -> String {
    STANDARD.encode(sorted_key_value_pairs(&sysctl_values(sysctl), "\n"))
}

/// A systemd `[Service]` drop-in with the containerd limits, or nothing when no limits were given.
pub fn ulimit_content(ulimit: Option<&UlimitConfig>) -> String {
    let ulimit = match ulimit {
        Some(ulimit) => ulimit,
        None => return String::new(),
    };
    let mut m = BTreeMap::new();
    if let Some(no_file) = &ulimit.no_file {
        m.insert("LimitNOFILE", no_file.as_str());
    }
    if let Some(max_locked_memory) = &ulimit.max_locked_memory {
        m.insert("LimitMEMLOCK", max_locked_memory.as_str());
    }
    format!("[Service]\n{}", sorted_key_value_pairs(&m, " "))
}

pub fn should_config_containerd_ulimits(os: &CustomLinuxOsConfig) -> bool {
    os.ulimit_config.is_some()
}

// Proxy.

/// Shell exports for the configured proxies.  Each later export is prepended, so the order in
/// the output is NO_PROXY, HTTPS_PROXY, http_proxy.
pub fn proxy_variables(proxy: &HttpProxyConfig) -> String {
    let mut vars = String::new();
    if !proxy.http_proxy.is_empty() {
        vars = format!("export http_proxy=\"{}\";", proxy.http_proxy);
    }
    if !proxy.https_proxy.is_empty() {
        vars = format!("export HTTPS_PROXY=\"{}\"; {}", proxy.https_proxy, vars);
    }
    if !proxy.no_proxy_entries.is_empty() {
        vars = format!(
            "export NO_PROXY=\"{}\"; {}",
            proxy.no_proxy_entries.join(","),
            vars
        );
    }
    vars
}

pub fn should_configure_http_proxy(proxy: &HttpProxyConfig) -> bool {
    !proxy.http_proxy.is_empty() || !proxy.https_proxy.is_empty()
}

pub fn should_configure_http_proxy_ca(proxy: &HttpProxyConfig) -> bool {
    !proxy.proxy_trusted_ca.is_empty()
}

// Predicates.

pub fn ensure_no_dupe_promiscuous_bridge(network: &NetworkConfig) -> bool {
    network.network_plugin == NetworkPlugin::Kubenet && network.network_policy != NetworkPolicy::Calico
}

pub fn has_custom_search_domain(search: &CustomSearchDomainConfig) -> bool {
    !search.domain_name.is_empty()
        && !search.realm_user.is_empty()
        && !search.realm_password.is_empty()
}

pub fn enable_swap_config(os: &CustomLinuxOsConfig) -> bool {
    os.enable_swap_config && os.swap_file_size > 0
}

pub fn should_config_transparent_huge_page(os: &CustomLinuxOsConfig) -> bool {
    !os.transparent_defrag.is_empty() || !os.transparent_hugepage_support.is_empty()
}

pub fn has_kubelet_disk_type(kubelet: &KubeletConfig) -> bool {
    kubelet.kubelet_disk_type == KubeletDisk::TempDisk
}

pub fn has_data_dir(kubelet: &KubeletConfig) -> bool {
    !kubelet.container_data_dir.is_empty()
}

pub fn enable_nvidia(config: &Configuration) -> bool {
    config.gpu().enable_nvidia.unwrap_or(false)
}

/// Whether the size has SGX driver support.
pub fn is_sgx_enabled_sku(vm_size: &str) -> bool {
    matches!(vm_size, "Standard_DC2s" | "Standard_DC4s")
}

pub fn is_mig_node(gpu_instance_profile: &str) -> bool {
    !gpu_instance_profile.is_empty()
}

pub fn enable_tls_bootstrapping(bootstrapping: &BootstrappingConfig) -> bool {
    match bootstrapping.bootstrapping_auth_method {
        BootstrappingAuthMethod::TlsBootstrapping => true,
        BootstrappingAuthMethod::Unspecified => bootstrapping
            .tls_bootstrapping_token
            .as_ref()
            .map_or(false, |token| !token.is_empty()),
        BootstrappingAuthMethod::SecureTlsBootstrapping => false,
    }
}

pub fn enable_secure_tls_bootstrapping(bootstrapping: &BootstrappingConfig) -> bool {
    bootstrapping.bootstrapping_auth_method == BootstrappingAuthMethod::SecureTlsBootstrapping
}

pub fn custom_secure_tls_bootstrap_aad_server_app_id(bootstrapping: &BootstrappingConfig) -> String {
    bootstrapping
        .custom_secure_tls_bootstrap_aad_server_app_id
        .clone()
        .unwrap_or_default()
}

// Defaults for unset values.

pub fn exclude_master_from_standard_lb(lb: &LoadBalancerConfig) -> bool {
    lb.exclude_master_from_standard_load_balancer.unwrap_or(true)
}

pub fn max_lb_rule_count(lb: &LoadBalancerConfig) -> i32 {
    lb.max_load_balancer_rule_count
        .unwrap_or(MAX_LB_RULE_COUNT_DEFAULT)
}

pub fn linux_admin_username(username: &str) -> &str {
    if username.is_empty() {
        DEFAULT_LINUX_USER
    } else {
        username
    }
}

pub fn is_vhd(is_vhd: Option<bool>) -> bool {
    is_vhd.unwrap_or(true)
}

/// SSH stays enabled unless the configuration explicitly turns it off.
pub fn disable_ssh(enable_ssh: Option<bool>) -> bool {
    enable_ssh.map_or(false, |enabled| !enabled)
}

pub fn service_principal_file_content(config: &Configuration) -> String {
    let secret = &config.auth().service_principal_secret;
    if secret.is_empty() {
        String::new()
    } else {
        STANDARD.encode(secret.unsafe_value())
    }
}

pub fn kubelet_flags(kubelet: &KubeletConfig) -> String {
    sorted_key_value_pairs(&kubelet.kubelet_flags, " ")
}

// Local DNS.

pub fn should_enable_local_dns(config: &Configuration) -> bool {
    config
        .local_dns_profile
        .as_ref()
        .map_or(false, |profile| profile.enable_local_dns)
}

/// CPU limit for the local DNS unit, as a percentage of one core.
pub fn local_dns_cpu_limit(config: &Configuration) -> String {
    match config.local_dns().cpu_limit_in_milli_cores {
        Some(milli) if should_enable_local_dns(config) && milli != 0 => {
            format!("{:.1}%", f64::from(milli) / 10.0)
        }
        _ => DEFAULT_LOCAL_DNS_CPU_LIMIT.to_string(),
    }
}

pub fn local_dns_memory_limit(config: &Configuration) -> String {
    match config.local_dns().memory_limit_in_mb {
        Some(mb) if should_enable_local_dns(config) && mb != 0 => format!("{}M", mb),
        _ => DEFAULT_LOCAL_DNS_MEMORY_LIMIT.to_string(),
    }
}

pub fn core_dns_service_ip(config: &Configuration) -> &str {
    let ip = &config.cluster().network().core_dns_service_ip;
    if ip.is_empty() {
        DEFAULT_CORE_DNS_SERVICE_IP
    } else {
        ip
    }
}

// Misc.

/// Semantic version comparison.  Versions that don't parse compare as 0.0.0.
pub fn is_kubernetes_version_ge(actual: &str, minimum: &str) -> bool {
    let parse = |v: &str| Version::parse(v).unwrap_or_else(|_| Version::new(0, 0, 0));
    parse(actual) >= parse(minimum)
}

/// Strips line breaks so PEM material fits in a single environment value.
pub fn remove_newlines(s: &str) -> String {
    s.replace(['\n', '\r'], "")
}

#[cfg(test)]
mod test {
    use super::*;
    use aks_node_config::cluster::{ClusterConfig, ClusterNetworkConfig};
    use aks_node_config::local_dns::LocalDnsProfile;
    use maplit::btreemap;

    fn decode_b64(s: &str) -> String {
        String::from_utf8(STANDARD.decode(s).unwrap()).unwrap()
    }

    fn config_in(location: &str) -> Configuration {
        Configuration {
            cluster_config: Some(ClusterConfig {
                location: location.to_string(),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn absent_enums_are_empty() {
        assert_eq!(network_plugin_str(NetworkPlugin::Unspecified), "");
        assert_eq!(network_plugin_str(NetworkPlugin::None), "");
        assert_eq!(network_plugin_str(NetworkPlugin::Kubenet), "kubenet");
        assert_eq!(network_policy_str(NetworkPolicy::None), "");
        assert_eq!(network_policy_str(NetworkPolicy::Calico), "calico");
        assert_eq!(load_balancer_sku_str(LoadBalancerSku::Unspecified), "");
        assert_eq!(load_balancer_sku_str(LoadBalancerSku::Standard), "standard");
        assert_eq!(vm_type_str(VmType::Unspecified), "");
        assert_eq!(vm_type_str(VmType::Vmss), "vmss");
        assert_eq!(kubelet_disk_type_str(KubeletDisk::TempDisk), "Temporary");
    }

    #[test]
    fn target_cloud_table() {
        for (location, cloud) in [
            ("chinanorth2", "AzureChinaCloud"),
            ("germanynortheast", "AzureGermanCloud"),
            ("germanycentral", "AzureGermanCloud"),
            ("usgovvirginia", "AzureUSGovernmentCloud"),
            ("usdodeast", "AzureUSGovernmentCloud"),
            ("eastus", "AzurePublicCloud"),
            (" China East ", "AzureChinaCloud"),
        ] {
            let config = config_in(location);
            assert_eq!(target_cloud(&config), cloud, "location {}", location);
            assert_eq!(target_environment(&config), cloud, "location {}", location);
            assert_eq!(azure_environment_filepath(&config), "");
        }
    }

    #[test]
    fn custom_cloud_overrides_location() {
        let mut config = config_in("chinanorth2");
        config.custom_cloud_config = Some(CustomCloudConfig {
            custom_cloud_env_name: "AKSCustom".to_string(),
            ..Default::default()
        });
        assert_eq!(target_cloud(&config), "AzureStackCloud");
        assert_eq!(target_environment(&config), "akscustom");
        assert_eq!(
            azure_environment_filepath(&config),
            "/etc/kubernetes/akscustom.json"
        );
    }

    #[test]
    fn port_ranges() {
        assert_eq!(port_range_end("32768 65535"), 65535);
        assert_eq!(port_range_end("1024 2048"), 2048);
        assert_eq!(port_range_end(""), -1);
        assert_eq!(port_range_end("1024"), -1);
        assert_eq!(port_range_end("1024  2048"), -1);
        assert_eq!(port_range_end("2048 1024"), -1);
        assert_eq!(port_range_end("0 1024"), -1);
        assert_eq!(port_range_end("a b"), -1);
        assert_eq!(port_range_end("1 2 3"), -1);
    }

    #[test]
    fn key_value_pairs_are_sorted() {
        let m = btreemap! {
            "b".to_string() => "2".to_string(),
            "a".to_string() => "1".to_string(),
            "c".to_string() => "3".to_string(),
        };
        assert_eq!(sorted_key_value_pairs(&m, ","), "a=1,b=2,c=3");
        let empty: BTreeMap<String, String> = BTreeMap::new();
        assert_eq!(sorted_key_value_pairs(&empty, ","), "");
    }

    #[test]
    fn default_sysctl() {
        let expected = "net.core.message_burst=80
net.core.message_cost=40
net.core.somaxconn=16384
net.ipv4.neigh.default.gc_thresh1=4096
net.ipv4.neigh.default.gc_thresh2=8192
net.ipv4.neigh.default.gc_thresh3=16384
net.ipv4.tcp_max_syn_backlog=16384
net.ipv4.tcp_retries2=8";
        assert_eq!(decode_b64(&sysctl_content(None)), expected);
        assert_eq!(
            decode_b64(&sysctl_content(Some(&SysctlConfig::default()))),
            expected
        );
    }

    #[test]
    fn sysctl_zero_is_not_absent() {
        let zero = SysctlConfig {
            net_core_somaxconn: Some(0),
            vm_swappiness: Some(0),
            net_ipv4_tcp_tw_reuse: Some(false),
            ..Default::default()
        };
        let values = sysctl_values(Some(&zero));
        assert_eq!(values["net.core.somaxconn"], "0");
        assert_eq!(values["vm.swappiness"], "0");
        assert_eq!(values["net.ipv4.tcp_tw_reuse"], "0");
        assert!(!sysctl_values(None).contains_key("vm.swappiness"));
        assert_ne!(sysctl_content(Some(&zero)), sysctl_content(None));
    }

    #[test]
    fn sysctl_reserves_high_ports() {
        let wide = SysctlConfig {
            net_ipv4_ip_local_port_range: Some("32768 65535".to_string()),
            ..Default::default()
        };
        let values = sysctl_values(Some(&wide));
        assert_eq!(values["net.ipv4.ip_local_port_range"], "32768 65535");
        assert_eq!(values["net.ipv4.ip_local_reserved_ports"], "65330");

        let narrow = SysctlConfig {
            net_ipv4_ip_local_port_range: Some("32768 60999".to_string()),
            ..Default::default()
        };
        assert!(!sysctl_values(Some(&narrow)).contains_key("net.ipv4.ip_local_reserved_ports"));

        let empty = SysctlConfig {
            net_ipv4_ip_local_port_range: Some(String::new()),
            ..Default::default()
        };
        assert!(!sysctl_values(Some(&empty)).contains_key("net.ipv4.ip_local_port_range"));
    }

    #[test]
    fn ulimits() {
        assert_eq!(ulimit_content(None), "");
        assert_eq!(ulimit_content(Some(&UlimitConfig::default())), "[Service]\n");
        let limits = UlimitConfig {
            no_file: Some("1048576".to_string()),
            max_locked_memory: Some("75000".to_string()),
        };
        assert_eq!(
            ulimit_content(Some(&limits)),
            "[Service]\nLimitMEMLOCK=75000 LimitNOFILE=1048576"
        );
    }

    #[test]
    fn proxy_exports() {
        assert_eq!(proxy_variables(&HttpProxyConfig::default()), "");
        let proxy = HttpProxyConfig {
            http_proxy: "http://proxy:3128".to_string(),
            https_proxy: "https://proxy:3129".to_string(),
            no_proxy_entries: vec!["localhost".to_string(), "127.0.0.1".to_string()],
            ..Default::default()
        };
        assert_eq!(
            proxy_variables(&proxy),
            "export NO_PROXY=\"localhost,127.0.0.1\"; export HTTPS_PROXY=\"https://proxy:3129\"; export http_proxy=\"http://proxy:3128\";"
        );
        assert!(should_configure_http_proxy(&proxy));
        assert!(!should_configure_http_proxy_ca(&proxy));
    }

    #[test]
    fn predicates() {
        let kubenet = NetworkConfig {
            network_plugin: NetworkPlugin::Kubenet,
            ..Default::default()
        };
        assert!(ensure_no_dupe_promiscuous_bridge(&kubenet));
        let calico = NetworkConfig {
            network_plugin: NetworkPlugin::Kubenet,
            network_policy: NetworkPolicy::Calico,
            ..Default::default()
        };
        assert!(!ensure_no_dupe_promiscuous_bridge(&calico));

        let mut search = CustomSearchDomainConfig {
            domain_name: "corp.example.com".to_string(),
            realm_user: "user".to_string(),
            ..Default::default()
        };
        assert!(!has_custom_search_domain(&search));
        search.realm_password = "pw".into();
        assert!(has_custom_search_domain(&search));

        assert!(is_sgx_enabled_sku("Standard_DC2s"));
        assert!(!is_sgx_enabled_sku("Standard_DC2s_v2"));
        assert!(is_mig_node("MIG1g"));
        assert!(!is_mig_node(""));
    }

    #[test]
    fn unset_defaults() {
        assert!(is_vhd(None));
        assert!(!is_vhd(Some(false)));
        assert!(!disable_ssh(None));
        assert!(disable_ssh(Some(false)));
        assert!(!disable_ssh(Some(true)));
        assert!(exclude_master_from_standard_lb(&LoadBalancerConfig::default()));
        assert_eq!(max_lb_rule_count(&LoadBalancerConfig::default()), 250);
        let zero = LoadBalancerConfig {
            max_load_balancer_rule_count: Some(0),
            ..Default::default()
        };
        assert_eq!(max_lb_rule_count(&zero), 0);
        assert_eq!(linux_admin_username(""), "azureuser");
        assert_eq!(linux_admin_username("admin"), "admin");
    }

    #[test]
    fn tls_bootstrapping() {
        let mut bootstrapping = BootstrappingConfig::default();
        assert!(!enable_tls_bootstrapping(&bootstrapping));
        bootstrapping.tls_bootstrapping_token = Some("abc.def".into());
        assert!(enable_tls_bootstrapping(&bootstrapping));
        bootstrapping.bootstrapping_auth_method = BootstrappingAuthMethod::SecureTlsBootstrapping;
        assert!(!enable_tls_bootstrapping(&bootstrapping));
        assert!(enable_secure_tls_bootstrapping(&bootstrapping));
    }

    #[test]
    fn local_dns_limits() {
        let mut config = Configuration::default();
        assert_eq!(local_dns_cpu_limit(&config), "200.0%");
        assert_eq!(local_dns_memory_limit(&config), "128M");

        config.local_dns_profile = Some(LocalDnsProfile {
            enable_local_dns: true,
            cpu_limit_in_milli_cores: Some(2008),
            memory_limit_in_mb: Some(256),
            ..Default::default()
        });
        assert_eq!(local_dns_cpu_limit(&config), "200.8%");
        assert_eq!(local_dns_memory_limit(&config), "256M");

        if let Some(profile) = config.local_dns_profile.as_mut() {
            profile.enable_local_dns = false;
        }
        assert_eq!(local_dns_cpu_limit(&config), "200.0%");
    }

    #[test]
    fn core_dns_ip() {
        let mut config = Configuration::default();
        assert_eq!(core_dns_service_ip(&config), "10.0.0.10");
        config.cluster_config = Some(ClusterConfig {
            cluster_network_config: Some(ClusterNetworkConfig {
                core_dns_service_ip: "10.1.0.10".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        });
        assert_eq!(core_dns_service_ip(&config), "10.1.0.10");
    }

    #[test]
    fn version_comparison() {
        assert!(is_kubernetes_version_ge("1.22.0", "1.22.0"));
        assert!(is_kubernetes_version_ge("1.29.2", "1.22.0"));
        assert!(!is_kubernetes_version_ge("1.21.9", "1.22.0"));
        assert!(!is_kubernetes_version_ge("garbage", "1.22.0"));
    }

    #[test]
    fn newlines_removed() {
        assert_eq!(remove_newlines("a\r\nb\nc"), "abc");
    }
}
