//! The top-level node configuration record and its smaller sub-records.

use crate::cluster::{ClusterConfig, NetworkConfig};
use crate::kubelet::KubeletConfig;
use crate::linux_os::CustomLinuxOsConfig;
use crate::local_dns::LocalDnsProfile;
use crate::SensitiveString;
use serde::{Deserialize, Serialize};

wire_enum! {
    /// How the kubelet obtains its client certificate.
    pub enum BootstrappingAuthMethod {
        Unspecified = (0, "BOOTSTRAPPING_AUTH_METHOD_UNSPECIFIED"),
        TlsBootstrapping = (1, "BOOTSTRAPPING_AUTH_METHOD_TLS_BOOTSTRAPPING"),
        SecureTlsBootstrapping = (2, "BOOTSTRAPPING_AUTH_METHOD_SECURE_TLS_BOOTSTRAPPING"),
    }
}

/// Everything a node needs to join its cluster.
///
/// Sub-records are optional.  Use the accessor of the same name (`auth()`, `cluster()`, ...) to
/// read through an absent sub-record as if it were empty, and the field itself when presence
/// matters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_config: Option<AuthConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_config: Option<ClusterConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_server_config: Option<ApiServerConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_config: Option<NetworkConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bootstrapping_config: Option<BootstrappingConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kubelet_config: Option<KubeletConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kube_binary_config: Option<KubeBinaryConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub containerd_config: Option<ContainerdConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runc_config: Option<RuncConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gpu_config: Option<GpuConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teleport_config: Option<TeleportConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_linux_os_config: Option<CustomLinuxOsConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_proxy_config: Option<HttpProxyConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_cloud_config: Option<CustomCloudConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_search_domain_config: Option<CustomSearchDomainConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_dns_profile: Option<LocalDnsProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imds_restriction_config: Option<ImdsRestrictionConfig>,

    pub linux_admin_username: String,
    pub kubernetes_version: String,
    pub kube_proxy_url: String,
    pub vm_size: String,
    pub kubernetes_ca_cert: String,
    pub outbound_command: String,
    pub azure_private_registry_server: String,
    pub message_of_the_day: String,
    pub private_egress_proxy_address: String,
    pub bootstrap_profile_container_registry_server: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub custom_ca_certs: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_vhd: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_ssh: Option<bool>,
    pub enable_hosts_config_agent: bool,
    pub ipv6_dual_stack_enabled: bool,
    pub enable_unattended_upgrade: bool,
    pub needs_cgroupv2: bool,
    pub is_kata: bool,
    pub enable_artifact_streaming: bool,
    pub pre_provision_only: bool,
    pub disable_pubkey_auth: bool,
}

record_accessors! {
    Configuration {
        auth => auth_config: AuthConfig,
        cluster => cluster_config: ClusterConfig,
        api_server => api_server_config: ApiServerConfig,
        network => network_config: NetworkConfig,
        bootstrapping => bootstrapping_config: BootstrappingConfig,
        kubelet => kubelet_config: KubeletConfig,
        kube_binary => kube_binary_config: KubeBinaryConfig,
        containerd => containerd_config: ContainerdConfig,
        runc => runc_config: RuncConfig,
        gpu => gpu_config: GpuConfig,
        teleport => teleport_config: TeleportConfig,
        linux_os => custom_linux_os_config: CustomLinuxOsConfig,
        http_proxy => http_proxy_config: HttpProxyConfig,
        custom_cloud => custom_cloud_config: CustomCloudConfig,
        custom_search_domain => custom_search_domain_config: CustomSearchDomainConfig,
        local_dns => local_dns_profile: LocalDnsProfile,
        imds_restriction => imds_restriction_config: ImdsRestrictionConfig,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub subscription_id: String,
    pub tenant_id: String,
    pub service_principal_id: String,
    pub service_principal_secret: SensitiveString,
    pub assigned_identity_id: String,
    pub use_managed_identity_extension: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiServerConfig {
    pub api_server_public_key: String,
    pub api_server_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrappingConfig {
    pub bootstrapping_auth_method: BootstrappingAuthMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls_bootstrapping_token: Option<SensitiveString>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_secure_tls_bootstrap_aad_server_app_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KubeBinaryConfig {
    pub kube_binary_url: String,
    pub custom_kube_binary_url: String,
    pub private_kube_binary_url: String,
    pub linux_credential_provider_url: String,
    pub pod_infra_container_image_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerdConfig {
    pub containerd_download_url_base: String,
    pub containerd_version: String,
    pub containerd_package_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuncConfig {
    pub runc_version: String,
    pub runc_package_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GpuConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_nvidia: Option<bool>,
    pub config_gpu_driver: bool,
    pub gpu_device_plugin: bool,
    pub gpu_instance_profile: String,
    pub managed_gpu_experience_afec_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_amd_gpu: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeleportConfig {
    pub status: bool,
    pub teleportd_plugin_download_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpProxyConfig {
    pub http_proxy: String,
    pub https_proxy: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub no_proxy_entries: Vec<String>,
    pub proxy_trusted_ca: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomCloudConfig {
    pub custom_cloud_env_name: String,
    pub custom_env_json_content: String,
    pub container_registry_dns_suffix: String,
    pub repo_depot_endpoint: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomSearchDomainConfig {
    pub domain_name: String,
    pub realm_user: String,
    pub realm_password: SensitiveString,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImdsRestrictionConfig {
    pub enable_imds_restriction: bool,
    pub insert_imds_restriction_rule_to_mangle_table: bool,
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn accessors_read_through_absent_records() {
        let config = Configuration::default();
        assert_eq!(config.auth().subscription_id, "");
        assert_eq!(config.cluster().network().route_table, "");
        assert_eq!(config.gpu().enable_nvidia, None);
        assert!(config.kubelet().kubelet_flags.is_empty());
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let config: Configuration = serde_json::from_value(json!({
            "version": "v0",
            "some_future_field": {"nested": true},
            "auth_config": {"subscription_id": "sub", "future_auth": 1},
        }))
        .unwrap();
        assert_eq!(config.version, "v0");
        assert_eq!(config.auth().subscription_id, "sub");
    }

    #[test]
    fn secrets_do_not_leak_through_debug() {
        let config = Configuration {
            auth_config: Some(AuthConfig {
                service_principal_secret: "very-secret".into(),
                ..Default::default()
            }),
            ..Default::default()
        };
        let debug = format!("{:?}", config);
        assert!(!debug.contains("very-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn explicit_false_survives_encoding() {
        let config = Configuration {
            is_vhd: Some(false),
            ..Default::default()
        };
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["is_vhd"], json!(false));
        assert!(value.get("enable_ssh").is_none());
    }
}
