//! Turns a configuration into the command that runs the provisioning script: a flat environment
//! and a one-line trigger script handed to `bash -c`.

use crate::constants::*;
use crate::gpu;
use crate::helpers::*;
use crate::render::{self, Renderer, KUBENET_TEMPLATE};
use aks_node_config::Configuration;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use log::warn;
use std::collections::BTreeMap;
use std::fmt;

/// Environment keys whose values are credentials.
const SENSITIVE_ENV_KEYS: [&str; 4] = [
    "CUSTOM_SEARCH_REALM_PASSWORD",
    "KUBELET_CLIENT_CONTENT",
    "SERVICE_PRINCIPAL_FILE_CONTENT",
    "TLS_BOOTSTRAP_TOKEN",
];

type Result<T> = std::result::Result<T, render::Error>;

/// A fully specified child process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    pub program: String,
    pub args: Vec<String>,
    /// `KEY=value` entries in ascending order.
    pub env: Vec<String>,
}

impl ProcessSpec {
    /// The environment as key/value pairs.
    pub fn env_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.env
            .iter()
            .filter_map(|entry| entry.split_once('='))
    }

    /// The environment with credential values masked, for logging.
    pub fn redacted_env(&self) -> Vec<String> {
        self.env
            .iter()
            .map(|entry| match entry.split_once('=') {
                Some((key, _)) if SENSITIVE_ENV_KEYS.contains(&key) => {
                    format!("{}=[REDACTED]", key)
                }
                _ => entry.clone(),
            })
            .collect()
    }
}

impl fmt::Display for ProcessSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Builds the command for `config`, layering its environment over the controller's own.
pub fn build_cse_cmd(renderer: &Renderer, config: &Configuration) -> Result<ProcessSpec> {
    build_cse_cmd_with_env(renderer, config, inherited_env())
}

/// The controller's own environment.  Entries that aren't UTF-8 can't be carried as `K=V`
/// strings and are dropped.
pub fn inherited_env() -> Vec<(String, String)> {
    std::env::vars_os()
        .filter_map(|(key, value)| match (key.into_string(), value.into_string()) {
            (Ok(key), Ok(value)) => Some((key, value)),
            (key, _) => {
                warn!("Skipping non-UTF-8 environment variable {:?}", key);
                None
            }
        })
        .collect()
}

/// Builds the command for `config` on top of `base_env`.  Entries from the configuration win.
pub fn build_cse_cmd_with_env<I>(
    renderer: &Renderer,
    config: &Configuration,
    base_env: I,
) -> Result<ProcessSpec>
where
    I: IntoIterator<Item = (String, String)>,
{
    let script = renderer.trigger_script(config)?.replace('\n', " ");

    let mut merged: BTreeMap<String, String> = base_env.into_iter().collect();
    merged.extend(cse_env(renderer, config)?);
    let mut env: Vec<String> = merged
        .into_iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect();
    env.sort();

    Ok(ProcessSpec {
        program: "/bin/bash".to_string(),
        args: vec!["-c".to_string(), script],
        env,
    })
}

/// Every variable the provisioning script reads.
pub fn cse_env(renderer: &Renderer, config: &Configuration) -> Result<BTreeMap<String, String>> {
    let auth = config.auth();
    let cluster = config.cluster();
    let cluster_net = cluster.network();
    let lb = cluster.load_balancer();
    let network = config.network();
    let bootstrapping = config.bootstrapping();
    let kubelet = config.kubelet();
    let kube_binary = config.kube_binary();
    let containerd = config.containerd();
    let runc = config.runc();
    let gpu_config = config.gpu();
    let teleport = config.teleport();
    let linux_os = config.linux_os();
    let proxy = config.http_proxy();
    let custom_cloud = config.custom_cloud();
    let search = config.custom_search_domain();
    let imds = config.imds_restriction();
    let vm_size = config.vm_size.as_str();

    let containerd_config = renderer.containerd_config(config, false)?;
    let containerd_config_no_gpu = renderer.containerd_config(config, true)?;
    let corefile = renderer.local_dns_corefile(config)?;
    let kubelet_config_file = render::kubelet_config_file(config)?;

    let mut env: BTreeMap<String, String> = BTreeMap::new();
    let mut set = |key: &str, value: String| {
        env.insert(key.to_string(), value);
    };

    // Fixed values.
    set("PROVISION_OUTPUT", PROVISION_OUTPUT.to_string());
    set("MOBY_VERSION", String::new());
    set("CLOUDPROVIDER_BACKOFF", "true".to_string());
    set("CLOUDPROVIDER_BACKOFF_MODE", "v2".to_string());
    set("CLOUDPROVIDER_BACKOFF_RETRIES", "6".to_string());
    set("CLOUDPROVIDER_BACKOFF_EXPONENT", "0".to_string());
    set("CLOUDPROVIDER_BACKOFF_DURATION", "5".to_string());
    set("CLOUDPROVIDER_BACKOFF_JITTER", "0".to_string());
    set("CLOUDPROVIDER_RATELIMIT", "true".to_string());
    set("CLOUDPROVIDER_RATELIMIT_QPS", "10".to_string());
    set("CLOUDPROVIDER_RATELIMIT_QPS_WRITE", "10".to_string());
    set("CLOUDPROVIDER_RATELIMIT_BUCKET", "100".to_string());
    set("CLOUDPROVIDER_RATELIMIT_BUCKET_WRITE", "100".to_string());
    set("CLI_TOOL", "ctr".to_string());
    set("NETWORK_MODE", "transparent".to_string());
    set("CSE_HELPERS_FILEPATH", CSE_HELPERS_FILEPATH.to_string());
    set("CSE_DISTRO_HELPERS_FILEPATH", CSE_DISTRO_HELPERS_FILEPATH.to_string());
    set("CSE_INSTALL_FILEPATH", CSE_INSTALL_FILEPATH.to_string());
    set("CSE_DISTRO_INSTALL_FILEPATH", CSE_DISTRO_INSTALL_FILEPATH.to_string());
    set("CSE_CONFIG_FILEPATH", CSE_CONFIG_FILEPATH.to_string());
    set("CUSTOM_SEARCH_DOMAIN_FILEPATH", CUSTOM_SEARCH_DOMAIN_FILEPATH.to_string());
    set("DHCPV6_SERVICE_FILEPATH", DHCPV6_SERVICE_FILEPATH.to_string());
    set("DHCPV6_CONFIG_FILEPATH", DHCPV6_CONFIG_FILEPATH.to_string());

    // Identity and placement.
    set("ADMINUSER", linux_admin_username(&config.linux_admin_username).to_string());
    set("TENANT_ID", auth.tenant_id.clone());
    set("SUBSCRIPTION_ID", auth.subscription_id.clone());
    set("SERVICE_PRINCIPAL_CLIENT_ID", auth.service_principal_id.clone());
    set("SERVICE_PRINCIPAL_FILE_CONTENT", service_principal_file_content(config));
    set("USER_ASSIGNED_IDENTITY_ID", auth.assigned_identity_id.clone());
    set(
        "USE_MANAGED_IDENTITY_EXTENSION",
        auth.use_managed_identity_extension.to_string(),
    );
    set("RESOURCE_GROUP", cluster.resource_group.clone());
    set("LOCATION", cluster.location.clone());
    set("VM_TYPE", vm_type_str(cluster.vm_type).to_string());
    set("PRIMARY_AVAILABILITY_SET", cluster.primary_availability_set.clone());
    set("PRIMARY_SCALE_SET", cluster.primary_scale_set.clone());
    set("USE_INSTANCE_METADATA", cluster.use_instance_metadata.to_string());
    set("TARGET_CLOUD", target_cloud(config).to_string());
    set("TARGET_ENVIRONMENT", target_environment(config).to_string());
    set("IS_CUSTOM_CLOUD", is_aks_custom_cloud(custom_cloud).to_string());
    set("CUSTOM_ENV_JSON", custom_cloud.custom_env_json_content.clone());
    set(
        "AKS_CUSTOM_CLOUD_CONTAINER_REGISTRY_DNS_SUFFIX",
        custom_cloud.container_registry_dns_suffix.clone(),
    );
    set("AZURE_ENVIRONMENT_FILEPATH", azure_environment_filepath(config));

    // API server.
    set("API_SERVER_NAME", config.api_server().api_server_name.clone());
    set(
        "APISERVER_PUBLIC_KEY",
        config.api_server().api_server_public_key.clone(),
    );
    set("KUBE_CA_CRT", config.kubernetes_ca_cert.clone());

    // Networking.
    set("SUBNET", cluster_net.subnet.clone());
    set("NETWORK_SECURITY_GROUP", cluster_net.security_group_name.clone());
    set("VIRTUAL_NETWORK", cluster_net.vnet_name.clone());
    set(
        "VIRTUAL_NETWORK_RESOURCE_GROUP",
        cluster_net.vnet_resource_group.clone(),
    );
    set("ROUTE_TABLE", cluster_net.route_table.clone());
    set("NETWORK_PLUGIN", network_plugin_str(network.network_plugin).to_string());
    set("NETWORK_POLICY", network_policy_str(network.network_policy).to_string());
    set("VNET_CNI_PLUGINS_URL", network.vnet_cni_plugins_url.clone());
    set(
        "ENSURE_NO_DUPE_PROMISCUOUS_BRIDGE",
        ensure_no_dupe_promiscuous_bridge(network).to_string(),
    );
    set("KUBENET_TEMPLATE", STANDARD.encode(KUBENET_TEMPLATE));
    set("IPV6_DUAL_STACK_ENABLED", config.ipv6_dual_stack_enabled.to_string());
    set("OUTBOUND_COMMAND", config.outbound_command.clone());
    set(
        "LOAD_BALANCER_DISABLE_OUTBOUND_SNAT",
        lb.disable_outbound_snat.to_string(),
    );
    set("LOAD_BALANCER_SKU", load_balancer_sku_str(lb.load_balancer_sku).to_string());
    set(
        "EXCLUDE_MASTER_FROM_STANDARD_LB",
        exclude_master_from_standard_lb(lb).to_string(),
    );
    set("MAXIMUM_LOADBALANCER_RULE_COUNT", max_lb_rule_count(lb).to_string());

    // Binaries and runtimes.
    set("KUBERNETES_VERSION", config.kubernetes_version.clone());
    set("KUBE_BINARY_URL", kube_binary.kube_binary_url.clone());
    set("CUSTOM_KUBE_BINARY_URL", kube_binary.custom_kube_binary_url.clone());
    set("PRIVATE_KUBE_BINARY_URL", kube_binary.private_kube_binary_url.clone());
    set(
        "CREDENTIAL_PROVIDER_DOWNLOAD_URL",
        kube_binary.linux_credential_provider_url.clone(),
    );
    set("KUBEPROXY_URL", config.kube_proxy_url.clone());
    set(
        "CONTAINERD_DOWNLOAD_URL_BASE",
        containerd.containerd_download_url_base.clone(),
    );
    set("CONTAINERD_VERSION", containerd.containerd_version.clone());
    set("CONTAINERD_PACKAGE_URL", containerd.containerd_package_url.clone());
    set("CONTAINERD_CONFIG_CONTENT", STANDARD.encode(containerd_config));
    set(
        "CONTAINERD_CONFIG_NO_GPU_CONTENT",
        STANDARD.encode(containerd_config_no_gpu),
    );
    set("RUNC_VERSION", runc.runc_version.clone());
    set("RUNC_PACKAGE_URL", runc.runc_package_url.clone());
    set("TELEPORT_ENABLED", teleport.status.to_string());
    set(
        "TELEPORTD_PLUGIN_DOWNLOAD_URL",
        teleport.teleportd_plugin_download_url.clone(),
    );
    set("ARTIFACT_STREAMING_ENABLED", config.enable_artifact_streaming.to_string());
    set("IS_KATA", config.is_kata.to_string());
    set("NEEDS_CGROUPV2", config.needs_cgroupv2.to_string());
    set(
        "AZURE_PRIVATE_REGISTRY_SERVER",
        config.azure_private_registry_server.clone(),
    );
    set(
        "BOOTSTRAP_PROFILE_CONTAINER_REGISTRY_SERVER",
        config.bootstrap_profile_container_registry_server.clone(),
    );

    // GPU.
    set("GPU_NODE", enable_nvidia(config).to_string());
    set("SGX_NODE", is_sgx_enabled_sku(vm_size).to_string());
    set("MIG_NODE", is_mig_node(&gpu_config.gpu_instance_profile).to_string());
    set("CONFIG_GPU_DRIVER_IF_NEEDED", gpu_config.config_gpu_driver.to_string());
    set(
        "ENABLE_GPU_DEVICE_PLUGIN_IF_NEEDED",
        gpu_config.gpu_device_plugin.to_string(),
    );
    set(
        "MANAGED_GPU_EXPERIENCE_AFEC_ENABLED",
        gpu_config.managed_gpu_experience_afec_enabled.to_string(),
    );
    set("GPU_INSTANCE_PROFILE", gpu_config.gpu_instance_profile.clone());
    set("GPU_DRIVER_VERSION", gpu::gpu_driver_version(vm_size).to_string());
    set("GPU_IMAGE_SHA", gpu::gpu_image_sha(vm_size).to_string());
    set("GPU_DRIVER_TYPE", gpu::gpu_driver_type(vm_size).to_string());
    set(
        "GPU_NEEDS_FABRIC_MANAGER",
        gpu::gpu_needs_fabric_manager(vm_size).to_string(),
    );

    // Kubelet and bootstrapping.
    set("KUBELET_FLAGS", kubelet_flags(kubelet));
    set(
        "KUBELET_NODE_LABELS",
        sorted_key_value_pairs(&kubelet.kubelet_node_labels, ","),
    );
    set("KUBELET_CLIENT_CONTENT", kubelet.kubelet_client_key.unsafe_value().to_string());
    set("KUBELET_CLIENT_CERT_CONTENT", kubelet.kubelet_client_cert_content.clone());
    set("KUBELET_CONFIG_FILE_ENABLED", kubelet.enable_kubelet_config_file.to_string());
    set("KUBELET_CONFIG_FILE_CONTENT", STANDARD.encode(kubelet_config_file));
    set("HAS_KUBELET_DISK_TYPE", has_kubelet_disk_type(kubelet).to_string());
    set(
        "KUBELET_DISK_TYPE",
        kubelet_disk_type_str(kubelet.kubelet_disk_type).to_string(),
    );
    set(
        "ENABLE_KUBELET_SERVING_CERTIFICATE_ROTATION",
        kubelet
            .config_file()
            .server_tls_bootstrap
            .unwrap_or(false)
            .to_string(),
    );
    set(
        "BOOTSTRAPPING_AUTH_METHOD",
        bootstrapping_auth_method_str(bootstrapping.bootstrapping_auth_method).to_string(),
    );
    set(
        "TLS_BOOTSTRAP_TOKEN",
        bootstrapping
            .tls_bootstrapping_token
            .as_ref()
            .map(|token| token.unsafe_value().to_string())
            .unwrap_or_default(),
    );
    set(
        "ENABLE_TLS_BOOTSTRAPPING",
        enable_tls_bootstrapping(bootstrapping).to_string(),
    );
    set(
        "ENABLE_SECURE_TLS_BOOTSTRAPPING",
        enable_secure_tls_bootstrapping(bootstrapping).to_string(),
    );
    set(
        "CUSTOM_SECURE_TLS_BOOTSTRAP_AAD_SERVER_APP_ID",
        custom_secure_tls_bootstrap_aad_server_app_id(bootstrapping),
    );

    // Host OS.
    set("IS_VHD", is_vhd(config.is_vhd).to_string());
    set("DISABLE_SSH", disable_ssh(config.enable_ssh).to_string());
    set("DISABLE_PUBKEY_AUTH", config.disable_pubkey_auth.to_string());
    set("ENABLE_HOSTS_CONFIG_AGENT", config.enable_hosts_config_agent.to_string());
    set(
        "ENABLE_UNATTENDED_UPGRADES",
        config.enable_unattended_upgrade.to_string(),
    );
    set("MESSAGE_OF_THE_DAY", config.message_of_the_day.clone());
    set("PRE_PROVISION_ONLY", config.pre_provision_only.to_string());
    set(
        "SYSCTL_CONTENT",
        sysctl_content(linux_os.sysctl_config.as_ref()),
    );
    set(
        "SHOULD_CONFIG_CONTAINERD_ULIMITS",
        should_config_containerd_ulimits(linux_os).to_string(),
    );
    set("CONTAINERD_ULIMITS", ulimit_content(linux_os.ulimit_config.as_ref()));
    set("SHOULD_CONFIG_SWAP_FILE", enable_swap_config(linux_os).to_string());
    set("SWAP_FILE_SIZE_MB", linux_os.swap_file_size.to_string());
    set(
        "SHOULD_CONFIG_TRANSPARENT_HUGE_PAGE",
        should_config_transparent_huge_page(linux_os).to_string(),
    );
    set("THP_ENABLED", linux_os.transparent_hugepage_support.clone());
    set("THP_DEFRAG", linux_os.transparent_defrag.clone());

    // Proxy and trust.
    set("SHOULD_CONFIGURE_HTTP_PROXY", should_configure_http_proxy(proxy).to_string());
    set(
        "SHOULD_CONFIGURE_HTTP_PROXY_CA",
        should_configure_http_proxy_ca(proxy).to_string(),
    );
    set("HTTP_PROXY_TRUSTED_CA", remove_newlines(&proxy.proxy_trusted_ca));
    set("HTTP_PROXY_URLS", proxy.http_proxy.clone());
    set("HTTPS_PROXY_URLS", proxy.https_proxy.clone());
    set("NO_PROXY_URLS", proxy.no_proxy_entries.join(","));
    set("PROXY_VARS", proxy_variables(proxy));
    set(
        "PRIVATE_EGRESS_PROXY_ADDRESS",
        config.private_egress_proxy_address.clone(),
    );
    set(
        "SHOULD_CONFIGURE_CUSTOM_CA_TRUST",
        (!config.custom_ca_certs.is_empty()).to_string(),
    );
    set("CUSTOM_CA_TRUST_COUNT", config.custom_ca_certs.len().to_string());
    for (i, cert) in config.custom_ca_certs.iter().enumerate() {
        set(&format!("CUSTOM_CA_CERT_{}", i), remove_newlines(cert));
    }

    // Search domain.
    set("HAS_CUSTOM_SEARCH_DOMAIN", has_custom_search_domain(search).to_string());
    set("CUSTOM_SEARCH_DOMAIN_NAME", search.domain_name.clone());
    set("CUSTOM_SEARCH_REALM_USER", search.realm_user.clone());
    set(
        "CUSTOM_SEARCH_REALM_PASSWORD",
        search.realm_password.unsafe_value().to_string(),
    );

    // IMDS.
    set("ENABLE_IMDS_RESTRICTION", imds.enable_imds_restriction.to_string());
    set(
        "INSERT_IMDS_RESTRICTION_RULE_TO_MANGLE_TABLE",
        imds.insert_imds_restriction_rule_to_mangle_table.to_string(),
    );

    // Local DNS.
    set("SHOULD_ENABLE_LOCALDNS", should_enable_local_dns(config).to_string());
    set("LOCALDNS_CPU_LIMIT", local_dns_cpu_limit(config));
    set("LOCALDNS_MEMORY_LIMIT", local_dns_memory_limit(config));
    set(
        "LOCALDNS_GENERATED_COREFILE",
        corefile.map(|c| STANDARD.encode(c)).unwrap_or_default(),
    );

    Ok(env)
}

#[cfg(test)]
mod test {
    use super::*;
    use aks_node_config::cluster::{ClusterConfig, NetworkConfig, NetworkPlugin};
    use aks_node_config::configuration::{AuthConfig, BootstrappingConfig};

    fn renderer() -> Renderer {
        Renderer::new().unwrap()
    }

    #[test]
    fn script_is_one_line() {
        let spec = build_cse_cmd_with_env(&renderer(), &Configuration::default(), Vec::new())
            .unwrap();
        assert_eq!(spec.program, "/bin/bash");
        assert_eq!(spec.args[0], "-c");
        assert!(!spec.args[1].contains('\n'));
        assert!(spec.args[1].starts_with("echo $(date),$(hostname) > ${PROVISION_OUTPUT}; "));
    }

    #[test]
    fn configuration_overrides_base_env() {
        let base = vec![
            ("PATH".to_string(), "/usr/bin".to_string()),
            ("LOCATION".to_string(), "stale".to_string()),
        ];
        let config = Configuration {
            cluster_config: Some(ClusterConfig {
                location: "eastus".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        };
        let spec = build_cse_cmd_with_env(&renderer(), &config, base).unwrap();
        assert!(spec.env.contains(&"PATH=/usr/bin".to_string()));
        assert!(spec.env.contains(&"LOCATION=eastus".to_string()));
        assert!(!spec.env.contains(&"LOCATION=stale".to_string()));
    }

    #[test]
    fn ca_certs_are_numbered() {
        let config = Configuration {
            custom_ca_certs: vec!["line1\nline2".to_string(), "other".to_string()],
            ..Default::default()
        };
        let env = cse_env(&renderer(), &config).unwrap();
        assert_eq!(env["CUSTOM_CA_TRUST_COUNT"], "2");
        assert_eq!(env["SHOULD_CONFIGURE_CUSTOM_CA_TRUST"], "true");
        assert_eq!(env["CUSTOM_CA_CERT_0"], "line1line2");
        assert_eq!(env["CUSTOM_CA_CERT_1"], "other");
        assert!(!env.contains_key("CUSTOM_CA_CERT_2"));
    }

    #[test]
    fn secrets_are_redacted_for_logging() {
        let config = Configuration {
            auth_config: Some(AuthConfig {
                service_principal_secret: "hunter2".into(),
                ..Default::default()
            }),
            bootstrapping_config: Some(BootstrappingConfig {
                tls_bootstrapping_token: Some("abc.def".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let spec = build_cse_cmd_with_env(&renderer(), &config, Vec::new()).unwrap();
        assert!(spec.env.contains(&"TLS_BOOTSTRAP_TOKEN=abc.def".to_string()));

        let redacted = spec.redacted_env().join("\n");
        assert!(redacted.contains("TLS_BOOTSTRAP_TOKEN=[REDACTED]"));
        assert!(redacted.contains("SERVICE_PRINCIPAL_FILE_CONTENT=[REDACTED]"));
        assert!(!redacted.contains("abc.def"));
        assert!(!redacted.contains(&STANDARD.encode("hunter2")));
    }

    #[test]
    fn kubenet_bridge_flag() {
        let config = Configuration {
            network_config: Some(NetworkConfig {
                network_plugin: NetworkPlugin::Kubenet,
                ..Default::default()
            }),
            ..Default::default()
        };
        let env = cse_env(&renderer(), &config).unwrap();
        assert_eq!(env["NETWORK_PLUGIN"], "kubenet");
        assert_eq!(env["ENSURE_NO_DUPE_PROMISCUOUS_BRIDGE"], "true");
        let containerd = STANDARD.decode(&env["CONTAINERD_CONFIG_CONTENT"]).unwrap();
        assert!(String::from_utf8(containerd)
            .unwrap()
            .contains("kubenet_template.conf"));
    }

    #[test]
    fn non_utf8_environment_is_skipped() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        std::env::set_var("AKS_TEST_NOT_UTF8", OsStr::from_bytes(b"\xFF\xFE"));
        std::env::set_var("AKS_TEST_UTF8", "fine");
        let env = inherited_env();
        std::env::remove_var("AKS_TEST_NOT_UTF8");
        std::env::remove_var("AKS_TEST_UTF8");

        assert!(env.iter().all(|(k, _)| k != "AKS_TEST_NOT_UTF8"));
        assert!(env.contains(&("AKS_TEST_UTF8".to_string(), "fine".to_string())));
        assert!(build_cse_cmd_with_env(&renderer(), &Configuration::default(), env).is_ok());
    }

    #[test]
    fn display_is_argv() {
        let spec = ProcessSpec {
            program: "/bin/bash".to_string(),
            args: vec!["-c".to_string(), "true".to_string()],
            env: vec![],
        };
        assert_eq!(spec.to_string(), "/bin/bash -c true");
    }
}
