/*!
`aks-node-config` describes the document that tells a freshly booted node how to join its AKS
cluster.

The document is versioned JSON with snake_case field names.  Every sub-record is optional, and
scalars that need to tell "unset" apart from "set to zero" are `Option`s, so a decoded
[`Configuration`] keeps exactly what the producer wrote.  Unknown fields are ignored on decode,
which lets an older node read a document written by a newer producer.

```
let json = r#"{"version": "v0", "cluster_config": {"location": "eastus"}}"#;
let config = aks_node_config::from_str(json).unwrap();
assert_eq!(config.cluster().location, "eastus");
assert!(aks_node_config::validate(&config).is_err());
```

The crate also builds the cloud-init payload that carries the document to the node
([`custom_data`]) and the command the VM extension runs to wait on the result ([`cse_command`]).
*/

#![deny(rust_2018_idioms)]

#[macro_use]
mod macros;

pub mod cluster;
mod codec;
pub mod configuration;
mod custom_data;
pub mod kubelet;
pub mod linux_os;
pub mod local_dns;
mod sensitive;
mod validate;

pub use codec::{from_slice, from_str, to_json, to_json_pretty};
pub use configuration::Configuration;
pub use custom_data::{cse_command, custom_data, CONFIG_PATH, CSE_COMMAND};
pub use sensitive::SensitiveString;
pub use validate::validate;

/// The only document version this crate understands.
pub const SUPPORTED_VERSION: &str = "v0";

mod error {
    use snafu::Snafu;

    #[derive(Debug, Snafu)]
    #[snafu(visibility(pub(crate)))]
    pub enum Error {
        #[snafu(display("parse error: {}", source))]
        Parse { source: serde_json::Error },

        #[snafu(display("unsupported version: {}", version))]
        UnsupportedVersion { version: String },

        #[snafu(display("Failed to serialize configuration: {}", source))]
        Serialize { source: serde_json::Error },

        #[snafu(display("required field {} is missing", field))]
        MissingField { field: &'static str },
    }
}

pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;
