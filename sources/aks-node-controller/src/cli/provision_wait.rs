use crate::error::{self, Result};
use crate::status::StatusPaths;
use crate::wait;
use crate::Cancel;
use argh::FromArgs;
use log::info;
use snafu::ResultExt;

#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand, name = "provision-wait")]
/// Wait for provisioning to complete and print its outcome
pub struct ProvisionWaitArgs {}

/// Blocks until provisioning completes, returning the outcome record.
pub(crate) async fn run(paths: &StatusPaths, cancel: Cancel) -> Result<String> {
    let result = wait::wait_for_provision(paths, cancel)
        .await
        .context(error::WaitSnafu);
    let output = match &result {
        Ok(raw) => raw.as_str(),
        Err(e) => e.raw_output().unwrap_or_default(),
    };
    info!("provision-wait finished: provisionOutput={}", output);
    result
}
