//! Dispatches a command line to its subcommand and turns the result into an exit code.

use crate::cli::{self, Invocation, Subcommand};
use crate::error::Result;
use crate::events::{EventLevel, EventLogger};
use crate::runner::{CommandRunner, ExecRunner};
use crate::status::StatusPaths;
use crate::Cancel;
use chrono::Local;
use log::{error, info};

/// Event task names reported to the guest agent.
const PROVISION_TASK: &str = "AKS.AKSNodeController.Provision";
const PROVISION_WAIT_TASK: &str = "AKS.AKSNodeController.ProvisionWait";
const DEFAULT_TASK: &str = "AKS.AKSNodeController";

/// The guest agent task name for a subcommand name.
pub fn task_name(command: &str) -> &'static str {
    match command {
        "provision" => PROVISION_TASK,
        "provision-wait" => PROVISION_WAIT_TASK,
        _ => DEFAULT_TASK,
    }
}

pub struct App {
    runner: Box<dyn CommandRunner>,
    paths: StatusPaths,
}

impl Default for App {
    fn default() -> Self {
        Self::new(Box::new(ExecRunner), StatusPaths::default())
    }
}

impl App {
    pub fn new(runner: Box<dyn CommandRunner>, paths: StatusPaths) -> Self {
        Self { runner, paths }
    }

    pub fn paths(&self) -> &StatusPaths {
        &self.paths
    }

    /// Runs `argv` to completion: prints any output, logs the outcome, records a guest agent
    /// event, and returns the process exit code.
    pub async fn run(&self, argv: &[String], cancel: Cancel) -> i32 {
        let start = Local::now();
        info!("aks-node-controller started: args={:?}", argv);
        let command = argv.get(1).map(String::as_str).unwrap_or_default();
        let events = EventLogger::new(&self.paths.events_dir);

        let result = self.execute(argv, cancel).await;
        let end = Local::now();
        match result {
            Ok(output) => {
                if let Some(output) = output {
                    println!("{}", output);
                }
                info!("aks-node-controller finished successfully.");
                events.log_event(
                    task_name(command),
                    "",
                    EventLevel::Informational,
                    start,
                    end,
                );
                0
            }
            Err(e) => {
                if let Some(raw) = e.raw_output() {
                    println!("{}", raw);
                }
                error!("aks-node-controller failed: {}", e);
                events.log_event(
                    task_name(command),
                    &e.to_string(),
                    EventLevel::Error,
                    start,
                    end,
                );
                e.exit_code()
            }
        }
    }

    /// Parses and runs `argv`, returning what should be printed on stdout.
    pub async fn execute(&self, argv: &[String], cancel: Cancel) -> Result<Option<String>> {
        let invocation = match cli::parse(argv) {
            Ok(invocation) => invocation,
            Err(e) => {
                // A waiter may already be blocked on the outcome of this provisioning run.
                if argv.get(1).map(String::as_str) == Some("provision") {
                    cli::provision::record_failure(&self.paths, &e, std::time::Duration::ZERO);
                }
                return Err(e);
            }
        };

        match invocation {
            Invocation::Help(text) => Ok(Some(text)),
            Invocation::Run(Subcommand::Provision(args)) => {
                cli::provision::run(self.runner.as_ref(), &self.paths, args, cancel).await?;
                Ok(None)
            }
            Invocation::Run(Subcommand::ProvisionWait(_)) => {
                let raw = cli::provision_wait::run(&self.paths, cancel).await?;
                Ok(Some(raw))
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn task_names() {
        assert_eq!(task_name("provision"), "AKS.AKSNodeController.Provision");
        assert_eq!(
            task_name("provision-wait"),
            "AKS.AKSNodeController.ProvisionWait"
        );
        assert_eq!(task_name("bogus"), "AKS.AKSNodeController");
        assert_eq!(task_name(""), "AKS.AKSNodeController");
    }
}
