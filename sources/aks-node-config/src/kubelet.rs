//! Kubelet settings: command-line flags, labels, taints and the structured config file.

use crate::SensitiveString;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

wire_enum! {
    /// Which disk backs the kubelet root directory.
    pub enum KubeletDisk {
        Unspecified = (0, "KUBELET_DISK_UNSPECIFIED"),
        OsDisk = (1, "KUBELET_DISK_OS_DISK"),
        TempDisk = (2, "KUBELET_DISK_TEMP_DISK"),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Taint {
    pub key: String,
    pub effect: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KubeletConfig {
    /// Flags passed on the kubelet command line, keyed by flag name including the leading dashes.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub kubelet_flags: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub kubelet_node_labels: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub taints: Vec<Taint>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub startup_taints: Vec<Taint>,
    pub kubelet_disk_type: KubeletDisk,
    pub enable_kubelet_config_file: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kubelet_config_file_config: Option<KubeletConfigFileConfig>,
    pub kubelet_client_key: SensitiveString,
    pub kubelet_client_cert_content: String,
    pub container_data_dir: String,
}

record_accessors! {
    KubeletConfig {
        config_file => kubelet_config_file_config: KubeletConfigFileConfig,
    }
}

/// The structured kubelet configuration file.
///
/// Field names on the wire follow the kubelet's own `KubeletConfiguration` spelling, since the
/// record is handed to the kubelet as-is.  The snake_case spelling is accepted when decoding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KubeletConfigFileConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(rename = "apiVersion", alias = "api_version", skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    #[serde(rename = "staticPodPath", alias = "static_pod_path", skip_serializing_if = "Option::is_none")]
    pub static_pod_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(rename = "readOnlyPort", alias = "read_only_port", skip_serializing_if = "Option::is_none")]
    pub read_only_port: Option<i32>,
    #[serde(rename = "tlsCipherSuites", alias = "tls_cipher_suites", skip_serializing_if = "Vec::is_empty")]
    pub tls_cipher_suites: Vec<String>,
    #[serde(rename = "tlsCertFile", alias = "tls_cert_file", skip_serializing_if = "Option::is_none")]
    pub tls_cert_file: Option<String>,
    #[serde(rename = "tlsPrivateKeyFile", alias = "tls_private_key_file", skip_serializing_if = "Option::is_none")]
    pub tls_private_key_file: Option<String>,
    #[serde(rename = "rotateCertificates", alias = "rotate_certificates", skip_serializing_if = "Option::is_none")]
    pub rotate_certificates: Option<bool>,
    #[serde(rename = "serverTLSBootstrap", alias = "server_tls_bootstrap", skip_serializing_if = "Option::is_none")]
    pub server_tls_bootstrap: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authentication: Option<KubeletAuthentication>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization: Option<KubeletAuthorization>,
    #[serde(rename = "eventRecordQPS", alias = "event_record_qps", skip_serializing_if = "Option::is_none")]
    pub event_record_qps: Option<i32>,
    #[serde(rename = "clusterDomain", alias = "cluster_domain", skip_serializing_if = "Option::is_none")]
    pub cluster_domain: Option<String>,
    #[serde(rename = "clusterDNS", alias = "cluster_dns", skip_serializing_if = "Vec::is_empty")]
    pub cluster_dns: Vec<String>,
    #[serde(
        rename = "streamingConnectionIdleTimeout",
        alias = "streaming_connection_idle_timeout",
        skip_serializing_if = "Option::is_none"
    )]
    pub streaming_connection_idle_timeout: Option<String>,
    #[serde(
        rename = "nodeStatusUpdateFrequency",
        alias = "node_status_update_frequency",
        skip_serializing_if = "Option::is_none"
    )]
    pub node_status_update_frequency: Option<String>,
    #[serde(
        rename = "imageGCHighThresholdPercent",
        alias = "image_gc_high_threshold_percent",
        skip_serializing_if = "Option::is_none"
    )]
    pub image_gc_high_threshold_percent: Option<i32>,
    #[serde(
        rename = "imageGCLowThresholdPercent",
        alias = "image_gc_low_threshold_percent",
        skip_serializing_if = "Option::is_none"
    )]
    pub image_gc_low_threshold_percent: Option<i32>,
    #[serde(rename = "cgroupsPerQOS", alias = "cgroups_per_qos", skip_serializing_if = "Option::is_none")]
    pub cgroups_per_qos: Option<bool>,
    #[serde(rename = "maxPods", alias = "max_pods", skip_serializing_if = "Option::is_none")]
    pub max_pods: Option<i32>,
    #[serde(rename = "podPidsLimit", alias = "pod_pids_limit", skip_serializing_if = "Option::is_none")]
    pub pod_pids_limit: Option<i32>,
    #[serde(rename = "resolvConf", alias = "resolv_conf", skip_serializing_if = "Option::is_none")]
    pub resolv_conf: Option<String>,
    #[serde(rename = "evictionHard", alias = "eviction_hard", skip_serializing_if = "BTreeMap::is_empty")]
    pub eviction_hard: BTreeMap<String, String>,
    #[serde(
        rename = "protectKernelDefaults",
        alias = "protect_kernel_defaults",
        skip_serializing_if = "Option::is_none"
    )]
    pub protect_kernel_defaults: Option<bool>,
    #[serde(rename = "featureGates", alias = "feature_gates", skip_serializing_if = "BTreeMap::is_empty")]
    pub feature_gates: BTreeMap<String, bool>,
    #[serde(rename = "failSwapOn", alias = "fail_swap_on", skip_serializing_if = "Option::is_none")]
    pub fail_swap_on: Option<bool>,
    #[serde(rename = "kubeReserved", alias = "kube_reserved", skip_serializing_if = "BTreeMap::is_empty")]
    pub kube_reserved: BTreeMap<String, String>,
    #[serde(rename = "systemReserved", alias = "system_reserved", skip_serializing_if = "BTreeMap::is_empty")]
    pub system_reserved: BTreeMap<String, String>,
    #[serde(
        rename = "enforceNodeAllocatable",
        alias = "enforce_node_allocatable",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub enforce_node_allocatable: Vec<String>,
    #[serde(
        rename = "allowedUnsafeSysctls",
        alias = "allowed_unsafe_sysctls",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub allowed_unsafe_sysctls: Vec<String>,
    #[serde(rename = "cpuManagerPolicy", alias = "cpu_manager_policy", skip_serializing_if = "Option::is_none")]
    pub cpu_manager_policy: Option<String>,
    #[serde(
        rename = "topologyManagerPolicy",
        alias = "topology_manager_policy",
        skip_serializing_if = "Option::is_none"
    )]
    pub topology_manager_policy: Option<String>,
    #[serde(rename = "containerLogMaxSize", alias = "container_log_max_size", skip_serializing_if = "Option::is_none")]
    pub container_log_max_size: Option<String>,
    #[serde(
        rename = "containerLogMaxFiles",
        alias = "container_log_max_files",
        skip_serializing_if = "Option::is_none"
    )]
    pub container_log_max_files: Option<i32>,
    #[serde(rename = "seccompDefault", alias = "seccomp_default", skip_serializing_if = "Option::is_none")]
    pub seccomp_default: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KubeletAuthentication {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x509: Option<KubeletX509Authentication>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook: Option<KubeletWebhookAuthentication>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anonymous: Option<KubeletAnonymousAuthentication>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KubeletX509Authentication {
    #[serde(rename = "clientCAFile", alias = "client_ca_file", skip_serializing_if = "Option::is_none")]
    pub client_ca_file: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KubeletWebhookAuthentication {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KubeletAnonymousAuthentication {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KubeletAuthorization {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn config_file_uses_kubelet_spelling() {
        let file = KubeletConfigFileConfig {
            server_tls_bootstrap: Some(true),
            cluster_dns: vec!["10.0.0.10".to_string()],
            max_pods: Some(110),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&file).unwrap(),
            json!({"serverTLSBootstrap": true, "clusterDNS": ["10.0.0.10"], "maxPods": 110})
        );
    }

    #[test]
    fn config_file_accepts_snake_case() {
        let file: KubeletConfigFileConfig = serde_json::from_value(json!({
            "server_tls_bootstrap": false,
            "image_gc_high_threshold_percent": 0,
        }))
        .unwrap();
        assert_eq!(file.server_tls_bootstrap, Some(false));
        assert_eq!(file.image_gc_high_threshold_percent, Some(0));
        assert_eq!(file.max_pods, None);
    }

    #[test]
    fn disk_type_names() {
        let disk: KubeletDisk = serde_json::from_value(json!("KUBELET_DISK_TEMP_DISK")).unwrap();
        assert_eq!(disk, KubeletDisk::TempDisk);
        assert_eq!(KubeletDisk::default(), KubeletDisk::Unspecified);
    }
}
