/*!
Renders the text artifacts handed to the provisioning script: the containerd configuration (with
and without GPU runtimes), the kubenet CNI template, the kubelet configuration file, the local DNS
corefile and the one-line trigger script.

Templates are embedded at build time and registered once per [`Renderer`].  Each template is
rendered from a small view computed from the configuration, so every name a template refers to is
always present and the registry can run in strict mode.
*/

mod helpers;

use crate::constants::AZURE_DNS_IP;
use crate::helpers as derive;
use aks_node_config::local_dns::{
    LocalDnsForwardDestination, LocalDnsForwardPolicy, LocalDnsOverrides, LocalDnsProtocol,
    LocalDnsQueryLogging, LocalDnsServeStale,
};
use aks_node_config::Configuration;
use handlebars::Handlebars;
use log::trace;
use serde::Serialize;
use snafu::ResultExt;
use std::collections::BTreeMap;

const CONTAINERD_TEMPLATE: &str = "containerd";
const CONTAINERD_NO_GPU_TEMPLATE: &str = "containerd_no_gpu";
const LOCAL_DNS_COREFILE_TEMPLATE: &str = "localdns_corefile";
const TRIGGER_TEMPLATE: &str = "cse_cmd";

const TEMPLATES: [(&str, &str); 4] = [
    (
        CONTAINERD_TEMPLATE,
        include_str!("../../templates/containerd.toml.hbs"),
    ),
    (
        CONTAINERD_NO_GPU_TEMPLATE,
        include_str!("../../templates/containerd_no_gpu.toml.hbs"),
    ),
    (
        LOCAL_DNS_COREFILE_TEMPLATE,
        include_str!("../../templates/localdns.corefile.hbs"),
    ),
    (TRIGGER_TEMPLATE, include_str!("../../templates/cse_cmd.sh.hbs")),
];

/// The kubenet CNI configuration template.  It is a containerd template, not ours, so it is
/// passed through untouched.
pub const KUBENET_TEMPLATE: &str = include_str!("../../templates/kubenet-cni.json.tmpl");

pub mod error {
    use snafu::Snafu;

    #[derive(Debug, Snafu)]
    #[snafu(visibility(pub(super)))]
    pub enum Error {
        #[snafu(display("Failed to register template '{}': {}", name, source))]
        RegisterTemplate {
            name: &'static str,
            #[snafu(source(from(handlebars::TemplateError, Box::new)))]
            source: Box<handlebars::TemplateError>,
        },

        #[snafu(display("Failed to render template '{}': {}", name, source))]
        RenderTemplate {
            name: &'static str,
            #[snafu(source(from(handlebars::RenderError, Box::new)))]
            source: Box<handlebars::RenderError>,
        },

        #[snafu(display("Failed to serialize kubelet config file: {}", source))]
        KubeletConfigFile { source: serde_json::Error },
    }
}
pub use error::Error;
type Result<T> = std::result::Result<T, error::Error>;

/// Holds the registered templates.
pub struct Renderer {
    registry: Handlebars<'static>,
}

impl Renderer {
    pub fn new() -> Result<Self> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        registry.register_escape_fn(handlebars::no_escape);
        helpers::register(&mut registry);

        for (name, text) in TEMPLATES {
            registry
                .register_template_string(name, text)
                .context(error::RegisterTemplateSnafu { name })?;
        }
        Ok(Self { registry })
    }

    fn render<T: Serialize>(&self, name: &'static str, view: &T) -> Result<String> {
        trace!("Rendering template '{}'", name);
        self.registry
            .render(name, view)
            .context(error::RenderTemplateSnafu { name })
    }

    /// The containerd configuration.  With `no_gpu` set, the GPU runtime is left out even on GPU
    /// nodes, for the script to fall back to when the driver install fails.
    pub fn containerd_config(&self, config: &Configuration, no_gpu: bool) -> Result<String> {
        let view = ContainerdView::new(config);
        if no_gpu {
            self.render(CONTAINERD_NO_GPU_TEMPLATE, &view)
        } else {
            self.render(CONTAINERD_TEMPLATE, &view)
        }
    }

    /// The local DNS corefile, or `None` when local DNS is not enabled.
    pub fn local_dns_corefile(&self, config: &Configuration) -> Result<Option<String>> {
        if !derive::should_enable_local_dns(config) {
            return Ok(None);
        }
        self.render(LOCAL_DNS_COREFILE_TEMPLATE, &CorefileView::new(config))
            .map(Some)
    }

    /// The multi-line trigger script.  The command builder joins it into one line.
    pub fn trigger_script(&self, config: &Configuration) -> Result<String> {
        let custom_cloud = config.custom_cloud();
        let view = TriggerView {
            custom_cloud: derive::is_aks_custom_cloud(custom_cloud),
            repo_depot_endpoint: &custom_cloud.repo_depot_endpoint,
        };
        self.render(TRIGGER_TEMPLATE, &view)
    }
}

/// The kubelet configuration file as indented JSON.  Empty when there is no kubelet record at all.
pub fn kubelet_config_file(config: &Configuration) -> Result<String> {
    match &config.kubelet_config {
        None => Ok(String::new()),
        Some(kubelet) => serde_json::to_string_pretty(kubelet.config_file())
            .context(error::KubeletConfigFileSnafu),
    }
}

#[derive(Debug, Serialize)]
struct TriggerView<'a> {
    custom_cloud: bool,
    repo_depot_endpoint: &'a str,
}

#[derive(Debug, Serialize)]
struct ContainerdView<'a> {
    data_dir: &'a str,
    sandbox_image: &'a str,
    kubernetes_version: &'a str,
    enable_nvidia: bool,
    needs_cgroupv2: bool,
    kubenet_cni: bool,
    kata: bool,
    teleport: bool,
    artifact_streaming: bool,
    snapshotter: &'static str,
    proxy_plugins: bool,
}

impl<'a> ContainerdView<'a> {
    fn new(config: &'a Configuration) -> Self {
        let teleport = config.teleport().status;
        let artifact_streaming = config.enable_artifact_streaming;
        let snapshotter = if teleport {
            "teleportd"
        } else if artifact_streaming {
            "overlaybd"
        } else {
            ""
        };
        Self {
            data_dir: &config.kubelet().container_data_dir,
            sandbox_image: &config.kube_binary().pod_infra_container_image_url,
            kubernetes_version: &config.kubernetes_version,
            enable_nvidia: derive::enable_nvidia(config),
            needs_cgroupv2: config.needs_cgroupv2,
            kubenet_cni: derive::ensure_no_dupe_promiscuous_bridge(config.network()),
            kata: config.is_kata,
            teleport,
            artifact_streaming,
            snapshotter,
            proxy_plugins: teleport || artifact_streaming || config.is_kata,
        }
    }
}

#[derive(Debug, Serialize)]
struct CorefileView {
    sections: Vec<CorefileSection>,
}

#[derive(Debug, Serialize)]
struct CorefileSection {
    comment: &'static str,
    blocks: Vec<DomainBlock>,
}

/// One CoreDNS server block.
#[derive(Debug, Serialize)]
struct DomainBlock {
    domain: String,
    log_directive: &'static str,
    listener: &'static str,
    forward_ip: String,
    force_tcp: bool,
    policy: &'static str,
    max_concurrent: i32,
    cache_duration: i32,
    serve_stale: String,
    nsid: &'static str,
    root_templates: bool,
}

/// Which listener a section of the corefile serves.
#[derive(Debug, Clone, Copy, PartialEq)]
enum DnsTraffic {
    /// Pods with `dnsPolicy: Default`, and the kubelet itself.
    Vnet,
    /// Pods with `dnsPolicy: ClusterFirst`.
    Kube,
}

impl CorefileView {
    fn new(config: &Configuration) -> Self {
        let profile = config.local_dns();
        let core_dns_ip = derive::core_dns_service_ip(config);
        Self {
            sections: vec![
                CorefileSection {
                    comment: "VnetDNS overrides apply to DNS traffic from pods with dnsPolicy:default or kubelet (referred to as VnetDNS traffic).",
                    blocks: domain_blocks(&profile.vnet_dns_overrides, DnsTraffic::Vnet, core_dns_ip),
                },
                CorefileSection {
                    comment: "KubeDNS overrides apply to DNS traffic from pods with dnsPolicy:ClusterFirst (referred to as KubeDNS traffic).",
                    blocks: domain_blocks(&profile.kube_dns_overrides, DnsTraffic::Kube, core_dns_ip),
                },
            ],
        }
    }
}

fn domain_blocks(
    overrides: &BTreeMap<String, LocalDnsOverrides>,
    traffic: DnsTraffic,
    core_dns_ip: &str,
) -> Vec<DomainBlock> {
    overrides
        .iter()
        .map(|(domain, o)| domain_block(domain, o, traffic, core_dns_ip))
        .collect()
}

fn domain_block(
    domain: &str,
    o: &LocalDnsOverrides,
    traffic: DnsTraffic,
    core_dns_ip: &str,
) -> DomainBlock {
    let is_root = domain == ".";
    let to_core_dns = domain.ends_with("cluster.local")
        || o.forward_destination == LocalDnsForwardDestination::ClusterCoreDns;
    // The VnetDNS root zone always goes to the platform resolver; sending it to CoreDNS would loop.
    let forward_ip = if (traffic == DnsTraffic::Vnet && is_root) || !to_core_dns {
        AZURE_DNS_IP
    } else {
        core_dns_ip
    };

    let serve_stale = match o.serve_stale {
        LocalDnsServeStale::Verify => format!("{}s verify", o.serve_stale_duration_in_seconds),
        LocalDnsServeStale::Immediate => {
            format!("{}s immediate", o.serve_stale_duration_in_seconds)
        }
        LocalDnsServeStale::Disable | LocalDnsServeStale::Unspecified => String::new(),
    };

    DomainBlock {
        domain: domain.to_string(),
        log_directive: match o.query_logging {
            LocalDnsQueryLogging::Error => "errors",
            LocalDnsQueryLogging::Log => "log",
            LocalDnsQueryLogging::Unspecified => "",
        },
        listener: match traffic {
            DnsTraffic::Vnet => "node",
            DnsTraffic::Kube => "cluster",
        },
        forward_ip: forward_ip.to_string(),
        force_tcp: o.protocol == LocalDnsProtocol::ForceTcp,
        policy: match o.forward_policy {
            LocalDnsForwardPolicy::RoundRobin => "round_robin",
            LocalDnsForwardPolicy::Random => "random",
            LocalDnsForwardPolicy::Sequential | LocalDnsForwardPolicy::Unspecified => "sequential",
        },
        max_concurrent: o.max_concurrent,
        cache_duration: o.cache_duration_in_seconds,
        serve_stale,
        nsid: match traffic {
            DnsTraffic::Vnet => "localdns",
            DnsTraffic::Kube => "localdns-pod",
        },
        root_templates: is_root,
    }
}
