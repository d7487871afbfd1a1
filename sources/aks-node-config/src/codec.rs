use crate::error;
use crate::Result;
use crate::{Configuration, SUPPORTED_VERSION};
use snafu::{ensure, ResultExt};

/// Decodes a configuration document, rejecting versions other than the supported one.
pub fn from_slice(input: &[u8]) -> Result<Configuration> {
    let config: Configuration = serde_json::from_slice(input).context(error::ParseSnafu)?;
    check_version(config)
}

/// Decodes a configuration document, rejecting versions other than the supported one.
pub fn from_str(input: &str) -> Result<Configuration> {
    from_slice(input.as_bytes())
}

fn check_version(config: Configuration) -> Result<Configuration> {
    ensure!(
        config.version == SUPPORTED_VERSION,
        error::UnsupportedVersionSnafu {
            version: config.version.clone()
        }
    );
    Ok(config)
}

/// Encodes with two-space indentation.  Absent optionals are left out and enums are written by
/// name.
pub fn to_json_pretty(config: &Configuration) -> Result<String> {
    serde_json::to_string_pretty(config).context(error::SerializeSnafu)
}

/// Encodes on a single line, for embedding in other documents.
pub fn to_json(config: &Configuration) -> Result<String> {
    serde_json::to_string(config).context(error::SerializeSnafu)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cluster::NetworkPlugin;
    use crate::linux_os::SysctlConfig;
    use crate::Error;

    const FULL: &str = r#"{
        "version": "v0",
        "auth_config": {"subscription_id": "sub", "service_principal_secret": "s3cr3t"},
        "cluster_config": {
            "location": "eastus",
            "resource_group": "rg",
            "vm_type": "VM_TYPE_VMSS",
            "cluster_network_config": {"vnet_name": "vnet", "route_table": "rt"},
            "load_balancer_config": {"max_load_balancer_rule_count": 0}
        },
        "network_config": {"network_plugin": 3},
        "kubelet_config": {
            "kubelet_flags": {"--max-pods": "30", "--cloud-provider": "external"},
            "kubelet_config_file_config": {"serverTLSBootstrap": true}
        },
        "custom_linux_os_config": {"sysctl_config": {"net_core_somaxconn": 0}},
        "is_vhd": false,
        "custom_ca_certs": ["a", "b"]
    }"#;

    #[test]
    fn decode() {
        let config = from_str(FULL).unwrap();
        assert_eq!(config.network().network_plugin, NetworkPlugin::Kubenet);
        assert_eq!(config.cluster().load_balancer().max_load_balancer_rule_count, Some(0));
        assert_eq!(
            config.linux_os().sysctl_config,
            Some(SysctlConfig {
                net_core_somaxconn: Some(0),
                ..Default::default()
            })
        );
        assert_eq!(config.is_vhd, Some(false));
        assert_eq!(config.enable_ssh, None);
    }

    #[test]
    fn round_trip() {
        let config = from_str(FULL).unwrap();
        let encoded = to_json_pretty(&config).unwrap();
        assert!(encoded.contains("\n  \"version\": \"v0\""));
        assert!(encoded.contains("\"NETWORK_PLUGIN_KUBENET\""));
        let decoded = from_str(&encoded).unwrap();
        assert_eq!(decoded, config);
    }

    #[test]
    fn malformed_input() {
        let err = from_str("{not json").unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
        assert!(err.to_string().starts_with("parse error"));
    }

    #[test]
    fn wrong_version() {
        let err = from_str(r#"{"version": "v1"}"#).unwrap_err();
        assert_eq!(err.to_string(), "unsupported version: v1");
        let err = from_str("{}").unwrap_err();
        assert!(matches!(err, Error::UnsupportedVersion { .. }));
    }
}
