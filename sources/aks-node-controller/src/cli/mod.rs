//! Command line parsing.  Each subcommand lives in its own module next to the code that runs it.

pub(crate) mod provision;
pub(crate) mod provision_wait;

use crate::error::{self, Result};
use argh::FromArgs;
use snafu::ensure;
use std::path::Path;

pub use provision::ProvisionArgs;
pub use provision_wait::ProvisionWaitArgs;

const PROGRAM_NAME: &str = "aks-node-controller";

/// Bootstraps an AKS node from its provisioning configuration.
#[derive(FromArgs, PartialEq, Debug)]
pub struct Args {
    #[argh(subcommand)]
    pub subcommand: Subcommand,
}

#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand)]
pub enum Subcommand {
    Provision(ProvisionArgs),
    ProvisionWait(ProvisionWaitArgs),
}

/// What the command line asked for.
#[derive(Debug, PartialEq)]
pub enum Invocation {
    Run(Subcommand),
    /// `--help` was given; holds the text to print.
    Help(String),
}

/// Parses a full argv, program name included.
pub fn parse(argv: &[String]) -> Result<Invocation> {
    let command = argv.get(1).map(String::as_str).unwrap_or_default();
    ensure!(
        !command.is_empty(),
        error::UsageSnafu {
            message: "missing command argument"
        }
    );
    ensure!(
        is_known_command(command),
        error::UsageSnafu {
            message: format!("unknown command: {}", command)
        }
    );

    let program = argv
        .first()
        .and_then(|p| Path::new(p).file_name())
        .and_then(|p| p.to_str())
        .unwrap_or(PROGRAM_NAME);
    let args = split_equals(&argv[1..]);
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    match Args::from_args(&[program], &args) {
        Ok(parsed) => Ok(Invocation::Run(parsed.subcommand)),
        Err(early_exit) => match early_exit.status {
            Ok(()) => Ok(Invocation::Help(early_exit.output)),
            Err(()) => error::UsageSnafu {
                message: early_exit.output.trim().to_string(),
            }
            .fail(),
        },
    }
}

fn is_known_command(command: &str) -> bool {
    matches!(command, "provision" | "provision-wait" | "help" | "--help")
}

/// Rewrites `--key=value` as `--key value`.
fn split_equals(args: &[String]) -> Vec<String> {
    args.iter()
        .flat_map(|arg| match arg.split_once('=') {
            Some((key, value)) if key.starts_with("--") => {
                vec![key.to_string(), value.to_string()]
            }
            _ => vec![arg.clone()],
        })
        .collect()
}
