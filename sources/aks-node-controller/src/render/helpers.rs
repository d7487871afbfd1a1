// Handlebars helpers available to the artifact templates.  They only expose fixed node values and
// pure derivations; anything configuration-specific is computed into the template view first.

use crate::constants::{
    INIT_AKS_CUSTOM_CLOUD_FILEPATH, LOCAL_DNS_CLUSTER_LISTENER_IP, LOCAL_DNS_NODE_LISTENER_IP,
};
use crate::helpers::is_kubernetes_version_ge;
use handlebars::{handlebars_helper, Context, Handlebars, Helper, Output, RenderContext, RenderError};
use log::trace;
use snafu::{OptionExt, ResultExt};

mod error {
    use handlebars::RenderError;
    use serde_json::Value;
    use snafu::Snafu;

    #[derive(Debug, Snafu)]
    #[snafu(visibility(pub(super)))]
    pub(super) enum TemplateHelperError {
        #[snafu(display(
            "Incorrect number of params provided to helper '{}' in template '{}' - {} expected, {} received",
            helper,
            template,
            expected,
            received,
        ))]
        IncorrectNumberOfParams {
            expected: usize,
            received: usize,
            helper: String,
            template: String,
        },

        #[snafu(display("Missing param {} for helper '{}'", index, helper_name))]
        MissingParam { index: usize, helper_name: String },

        #[snafu(display(
            "Invalid template value, expected {}, got '{}' in template {}",
            expected,
            value,
            template
        ))]
        InvalidTemplateValue {
            expected: &'static str,
            value: Value,
            template: String,
        },

        #[snafu(display(
            "Unknown listener '{}' in template '{}', expected 'node' or 'cluster'",
            listener,
            template
        ))]
        UnknownListener { listener: String, template: String },

        #[snafu(display("Unable to write template '{}': '{}'", template, source))]
        TemplateWrite {
            template: String,
            source: std::io::Error,
        },
    }

    // Handlebars helpers are required to return a RenderError.
    impl From<TemplateHelperError> for RenderError {
        fn from(e: TemplateHelperError) -> RenderError {
            RenderError::from_error("TemplateHelperError", e)
        }
    }
}

use error::TemplateHelperError;
use serde_json::value::Value as JsonValue;

/// Registers every helper on `registry`.
pub(crate) fn register(registry: &mut Handlebars<'_>) {
    registry.register_helper("listener_ip", Box::new(listener_ip));
    registry.register_helper("init_custom_cloud_path", Box::new(init_custom_cloud_path));
    registry.register_helper("version_ge", Box::new(version_ge));
}

handlebars_helper!(version_ge: |actual: str, minimum: str| is_kubernetes_version_ge(actual, minimum));

/// `listener_ip` writes one of the two link-local addresses the local DNS forwarder binds to.
///
/// Example:
///    {{listener_ip "node"}}     -> 169.254.10.10
///    {{listener_ip "cluster"}}  -> 169.254.10.11
pub fn listener_ip(
    helper: &Helper<'_, '_>,
    _: &Handlebars<'_>,
    _: &Context,
    renderctx: &mut RenderContext<'_, '_>,
    out: &mut dyn Output,
) -> Result<(), RenderError> {
    trace!("Starting listener_ip helper");
    let template_name = template_name(renderctx);
    check_param_count(helper, template_name, 1)?;

    let listener_value = get_param(helper, 0)?;
    let listener = listener_value
        .as_str()
        .context(error::InvalidTemplateValueSnafu {
            expected: "string",
            value: listener_value.to_owned(),
            template: template_name,
        })?;

    let ip = match listener {
        "node" => LOCAL_DNS_NODE_LISTENER_IP,
        "cluster" => LOCAL_DNS_CLUSTER_LISTENER_IP,
        _ => {
            return Err(error::UnknownListenerSnafu {
                listener,
                template: template_name,
            }
            .build()
            .into())
        }
    };
    out.write(ip)
        .context(error::TemplateWriteSnafu {
            template: template_name,
        })?;
    Ok(())
}

/// `init_custom_cloud_path` writes the path of the script that prepares a custom cloud.
pub fn init_custom_cloud_path(
    helper: &Helper<'_, '_>,
    _: &Handlebars<'_>,
    _: &Context,
    renderctx: &mut RenderContext<'_, '_>,
    out: &mut dyn Output,
) -> Result<(), RenderError> {
    let template_name = template_name(renderctx);
    check_param_count(helper, template_name, 0)?;
    out.write(INIT_AKS_CUSTOM_CLOUD_FILEPATH)
        .context(error::TemplateWriteSnafu {
            template: template_name,
        })?;
    Ok(())
}

// helpers to the helpers

/// Gets the value at `idx`, or an error if the helper was called without it.
fn get_param<'a>(helper: &'a Helper<'_, '_>, idx: usize) -> Result<&'a JsonValue, RenderError> {
    Ok(helper
        .param(idx)
        .map(|v| v.value())
        .context(error::MissingParamSnafu {
            index: idx,
            helper_name: helper.name(),
        })?)
}

/// Get the template name if there is one, otherwise return "dynamic template"
fn template_name<'a>(renderctx: &'a RenderContext<'_, '_>) -> &'a str {
    match renderctx.get_root_template_name() {
        Some(s) => s.as_str(),
        None => "dynamic template",
    }
}

fn check_param_count<S: AsRef<str>>(
    helper: &Helper<'_, '_>,
    template_name: S,
    expected: usize,
) -> Result<(), RenderError> {
    if helper.params().len() != expected {
        return Err(RenderError::from(
            TemplateHelperError::IncorrectNumberOfParams {
                expected,
                received: helper.params().len(),
                helper: helper.name().to_string(),
                template: template_name.as_ref().into(),
            },
        ));
    }
    Ok(())
}

#[cfg(test)]
mod test_helpers {
    use super::*;
    use serde::Serialize;
    use serde_json::json;

    // A thin wrapper around the handlebars render_template method that includes
    // setup and registration of helpers
    fn setup_and_render_template<T>(tmpl: &str, data: &T) -> Result<String, RenderError>
    where
        T: Serialize,
    {
        let mut registry = Handlebars::new();
        register(&mut registry);
        registry.render_template(tmpl, data)
    }

    #[test]
    fn listener_ips() {
        assert_eq!(
            setup_and_render_template("{{listener_ip \"node\"}}", &json!({})).unwrap(),
            "169.254.10.10"
        );
        assert_eq!(
            setup_and_render_template("{{listener_ip \"cluster\"}}", &json!({})).unwrap(),
            "169.254.10.11"
        );
    }

    #[test]
    fn unknown_listener() {
        assert!(setup_and_render_template("{{listener_ip \"pod\"}}", &json!({})).is_err());
        assert!(setup_and_render_template("{{listener_ip}}", &json!({})).is_err());
        assert!(setup_and_render_template("{{listener_ip 5}}", &json!({})).is_err());
    }

    #[test]
    fn fixed_values() {
        assert_eq!(
            setup_and_render_template("{{init_custom_cloud_path}}", &json!({})).unwrap(),
            "/opt/azure/containers/init-aks-custom-cloud.sh"
        );
        assert!(setup_and_render_template("{{init_custom_cloud_path \"x\"}}", &json!({})).is_err());
    }

    #[test]
    fn version_comparison() {
        let tmpl = "{{#if (version_ge v \"1.22.0\")}}new{{else}}old{{/if}}";
        assert_eq!(
            setup_and_render_template(tmpl, &json!({"v": "1.29.0"})).unwrap(),
            "new"
        );
        assert_eq!(
            setup_and_render_template(tmpl, &json!({"v": "1.21.2"})).unwrap(),
            "old"
        );
        assert_eq!(setup_and_render_template(tmpl, &json!({"v": ""})).unwrap(), "old");
    }
}
