use crate::command;
use crate::constants::CONTROLLER_FAILURE_EXIT_CODE;
use crate::error::{self, Error, Result};
use crate::render::Renderer;
use crate::runner::{CommandRunner, DryRunRunner};
use crate::status::{self, ProvisionResult, StatusPaths};
use crate::Cancel;
use argh::FromArgs;
use log::info;
use snafu::{ensure, OptionExt, ResultExt};
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand, name = "provision")]
/// Provision the node from a configuration file
pub struct ProvisionArgs {
    /// path to the provision config file
    #[argh(option)]
    pub provision_config: Option<PathBuf>,

    /// print the command that would be run without executing it
    #[argh(switch)]
    pub dry_run: bool,
}

/// Runs provisioning.  On any failure an outcome record and completion marker are left behind so
/// that a waiter sees the failure instead of blocking forever.
pub(crate) async fn run(
    runner: &dyn CommandRunner,
    paths: &StatusPaths,
    args: ProvisionArgs,
    cancel: Cancel,
) -> Result<()> {
    let started = Instant::now();
    let result = provision(runner, &args, cancel).await;
    if let Err(e) = &result {
        record_failure(paths, e, started.elapsed());
    }
    result
}

/// Leaves an outcome record for `err` unless the provisioning script already wrote one.
pub(crate) fn record_failure(paths: &StatusPaths, err: &Error, elapsed: Duration) {
    status::write_fallback(paths, &fallback_result(err, elapsed));
}

async fn provision(runner: &dyn CommandRunner, args: &ProvisionArgs, cancel: Cancel) -> Result<()> {
    let path = args
        .provision_config
        .as_ref()
        .filter(|p| !p.as_os_str().is_empty())
        .context(error::UsageSnafu {
            message: "--provision-config is required",
        })?;

    let data = fs::read(path).context(error::ConfigReadSnafu { path })?;
    let config = aks_node_config::from_slice(&data).context(error::ConfigSnafu)?;
    aks_node_config::validate(&config).context(error::ConfigSnafu)?;

    let renderer = Renderer::new().context(error::RenderSnafu)?;
    let spec = command::build_cse_cmd(&renderer, &config).context(error::RenderSnafu)?;

    let output = if args.dry_run {
        DryRunRunner.run(&spec, cancel).await
    } else {
        runner.run(&spec, cancel).await
    }
    .context(error::RunSnafu)?;

    // A child killed by a signal has no exit code.
    let code = output.code.unwrap_or(-1);
    info!(
        "CSE finished: exitCode={} stdout={:?} stderr={:?}",
        code, output.stdout, output.stderr
    );
    ensure!(
        code == 0,
        error::ChildFailedSnafu {
            code,
            stdout: output.stdout,
            stderr: output.stderr,
        }
    );
    Ok(())
}

fn fallback_result(err: &Error, elapsed: Duration) -> ProvisionResult {
    let (exit_code, output) = match err {
        Error::ChildFailed {
            code,
            stdout,
            stderr,
        } => (*code, format!("{}\n{}", stdout, stderr)),
        _ => (CONTROLLER_FAILURE_EXIT_CODE, String::new()),
    };
    ProvisionResult {
        exit_code: exit_code.to_string(),
        output,
        error: err.to_string(),
        exec_duration: Some(elapsed.as_secs().to_string()),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn fallback_for_child_failure() {
        let err = Error::ChildFailed {
            code: 7,
            stdout: "out".to_string(),
            stderr: "err".to_string(),
        };
        let result = fallback_result(&err, Duration::from_secs(3));
        assert_eq!(result.exit_code, "7");
        assert_eq!(result.output, "out\nerr");
        assert_eq!(result.error, "exit status 7");
        assert_eq!(result.exec_duration.as_deref(), Some("3"));
    }

    #[test]
    fn fallback_for_controller_failure() {
        let err = Error::Usage {
            message: "--provision-config is required".to_string(),
        };
        let result = fallback_result(&err, Duration::from_millis(10));
        assert_eq!(result.exit_code, "240");
        assert_eq!(result.output, "");
        assert_eq!(result.error, "--provision-config is required");
        assert_eq!(result.exec_duration.as_deref(), Some("0"));
    }
}
