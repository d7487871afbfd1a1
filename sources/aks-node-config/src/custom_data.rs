//! Delivery of the configuration to the node.
//!
//! The configuration travels inside a `#cloud-config` document that writes it to
//! [`CONFIG_PATH`]; the VM extension then runs [`CSE_COMMAND`], which blocks until provisioning
//! finishes.

use crate::Result;
use crate::{codec, Configuration};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

/// Where cloud-init places the configuration on the node.
pub const CONFIG_PATH: &str = "/opt/azure/containers/aks-node-controller-config.json";

/// The command the VM extension runs on the node.
pub const CSE_COMMAND: &str = "/opt/azure/containers/aks-node-controller provision-wait";

/// Builds the base64-encoded cloud-init user data carrying `config`.
pub fn custom_data(config: &Configuration) -> Result<String> {
    let json = codec::to_json(config)?;
    let cloud_config = format!(
        "#cloud-config\n\
         write_files:\n\
         - path: {}\n  \
         permissions: \"0755\"\n  \
         owner: root\n  \
         content: !!binary |\n   \
         {}",
        CONFIG_PATH,
        STANDARD.encode(json)
    );
    Ok(STANDARD.encode(cloud_config))
}

/// The command line for the VM extension.  It does not depend on the configuration.
pub fn cse_command(_config: &Configuration) -> &'static str {
    CSE_COMMAND
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn payload_layout() {
        let config = Configuration {
            version: "v0".to_string(),
            ..Default::default()
        };
        let payload = custom_data(&config).unwrap();
        let yaml = String::from_utf8(STANDARD.decode(payload).unwrap()).unwrap();
        let expected_json = STANDARD.encode(codec::to_json(&config).unwrap());
        assert_eq!(
            yaml,
            format!(
                "#cloud-config\nwrite_files:\n- path: /opt/azure/containers/aks-node-controller-config.json\n  permissions: \"0755\"\n  owner: root\n  content: !!binary |\n   {}",
                expected_json
            )
        );
    }

    #[test]
    fn embedded_config_decodes() {
        let config = Configuration {
            version: "v0".to_string(),
            vm_size: "Standard_D2s_v3".to_string(),
            ..Default::default()
        };
        let yaml = String::from_utf8(STANDARD.decode(custom_data(&config).unwrap()).unwrap()).unwrap();
        let encoded = yaml.lines().last().unwrap().trim();
        let json = STANDARD.decode(encoded).unwrap();
        assert_eq!(codec::from_slice(&json).unwrap(), config);
    }

    #[test]
    fn cse_is_fixed() {
        assert_eq!(
            cse_command(&Configuration::default()),
            "/opt/azure/containers/aks-node-controller provision-wait"
        );
    }
}
