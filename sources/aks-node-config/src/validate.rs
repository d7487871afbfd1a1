use crate::error;
use crate::Result;
use crate::Configuration;
use snafu::ensure;

/// Checks that the identifiers every node needs are present, reporting the first missing one by
/// its dotted path.
pub fn validate(config: &Configuration) -> Result<()> {
    let required: [(&'static str, &str); 7] = [
        ("version", &config.version),
        ("auth.subscription_id", &config.auth().subscription_id),
        ("cluster.resource_group", &config.cluster().resource_group),
        ("cluster.location", &config.cluster().location),
        ("cluster.network.vnet_name", &config.cluster().network().vnet_name),
        ("cluster.network.route_table", &config.cluster().network().route_table),
        ("api_server.api_server_name", &config.api_server().api_server_name),
    ];

    for (field, value) in required {
        ensure!(!value.is_empty(), error::MissingFieldSnafu { field });
    }
    Ok(())
}
