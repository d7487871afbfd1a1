/*!
`aks-node-controller` runs once on a new AKS node.  It reads the node's provisioning
configuration, turns it into the environment and trigger script for the node provisioning
script, runs that script, and leaves an outcome record behind for anyone waiting on it.

Two subcommands share the binary:

* `provision --provision-config=<path> [--dry-run]` builds and runs the provisioning command.
  The child's exit code becomes ours.  If anything fails before the script can report for itself,
  a fallback outcome record and the completion marker are written so waiters unblock.
* `provision-wait` blocks on the completion marker using inotify, then prints the outcome record
  and fails if it reports a non-zero `ExitCode`.

Each invocation also drops an event file for the Azure VM guest agent.
*/

#![deny(rust_2018_idioms)]

pub mod app;
pub mod cli;
pub mod command;
pub mod constants;
mod error;
pub mod events;
pub mod gpu;
pub mod helpers;
pub mod logging;
pub mod render;
pub mod runner;
pub mod status;
pub mod wait;

use std::future::Future;
use std::pin::Pin;

pub use app::App;
pub use error::{Error, Result};

/// Resolves when the current invocation should stop: a signal in the binary, a timer in tests.
pub type Cancel = Pin<Box<dyn Future<Output = ()> + Send>>;
