//! The provisioning outcome record and the completion marker.
//!
//! The provisioning script writes `provision.json` and then touches `provision.complete`.  The
//! waiter reads the record once the marker appears.  When the controller fails before the script
//! gets a chance to write anything, it writes a fallback record itself so waiters don't hang.

use crate::constants::{PROVISION_COMPLETE_FILE, PROVISION_JSON_FILE};
use log::{error, info};
use serde::{Deserialize, Serialize};
use snafu::{OptionExt, ResultExt};
use std::fs;
use std::io::{ErrorKind, Write};
use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt};
use std::path::{Path, PathBuf};

/// Where the outcome record and the completion marker live.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusPaths {
    pub provision_json: PathBuf,
    pub provision_complete: PathBuf,
    pub events_dir: PathBuf,
}

impl Default for StatusPaths {
    fn default() -> Self {
        Self {
            provision_json: PathBuf::from(PROVISION_JSON_FILE),
            provision_complete: PathBuf::from(PROVISION_COMPLETE_FILE),
            events_dir: PathBuf::from(crate::constants::EVENTS_DIR),
        }
    }
}

/// The outcome record.  Values are strings because the script writes them with `jq --arg`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProvisionResult {
    pub exit_code: String,
    pub output: String,
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exec_duration: Option<String>,
}

mod error {
    use snafu::Snafu;

    #[derive(Debug, Snafu)]
    #[snafu(visibility(pub(super)))]
    pub enum Error {
        #[snafu(display(
            "failed to read provision.json: {}. One reason could be that AKSNodeConfig is not properly set",
            source
        ))]
        ReadStatus { source: std::io::Error },

        #[snafu(display("invalid provision.json: {}", source))]
        InvalidStatus {
            raw: String,
            source: serde_json::Error,
        },

        #[snafu(display("missing ExitCode in provision.json"))]
        MissingExitCode { raw: String },

        #[snafu(display("invalid ExitCode in provision.json: {}", exit_code))]
        InvalidExitCode { raw: String, exit_code: String },

        #[snafu(display(
            "provision failed: exitCode={} error={} output={:?}",
            exit_code,
            error,
            output
        ))]
        ProvisionFailed {
            raw: String,
            exit_code: i32,
            error: String,
            output: String,
        },
    }
}
pub use error::Error;
type Result<T> = std::result::Result<T, error::Error>;

impl Error {
    /// The record as it was read, if it could be read at all.
    pub fn raw_output(&self) -> Option<&str> {
        match self {
            Error::ReadStatus { .. } => None,
            Error::InvalidStatus { raw, .. }
            | Error::MissingExitCode { raw }
            | Error::InvalidExitCode { raw, .. }
            | Error::ProvisionFailed { raw, .. } => Some(raw),
        }
    }
}

/// Checks the `ExitCode` of a raw record.
pub fn evaluate(raw: &str) -> Result<()> {
    let value: serde_json::Value =
        serde_json::from_str(raw).context(error::InvalidStatusSnafu { raw })?;
    let exit_code = value
        .get("ExitCode")
        .filter(|v| !v.is_null() && v.as_str() != Some(""))
        .context(error::MissingExitCodeSnafu { raw })?;

    let code = match exit_code {
        serde_json::Value::String(s) => s.trim().parse::<i32>().ok(),
        serde_json::Value::Number(n) => n.as_i64().and_then(|n| i32::try_from(n).ok()),
        _ => None,
    }
    .context(error::InvalidExitCodeSnafu {
        raw,
        exit_code: exit_code.to_string(),
    })?;

    if code != 0 {
        let field = |name: &str| {
            value
                .get(name)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string()
        };
        return error::ProvisionFailedSnafu {
            raw,
            exit_code: code,
            error: field("Error"),
            output: field("Output"),
        }
        .fail();
    }
    Ok(())
}

/// Reads the record at `path` and evaluates it, returning the raw text on success.
pub fn read_and_evaluate(path: &Path) -> Result<String> {
    let raw = fs::read_to_string(path).context(error::ReadStatusSnafu)?;
    evaluate(&raw)?;
    Ok(raw)
}

/// Writes `result` as the outcome record unless the script already wrote one, then creates the
/// completion marker unless it exists.  Failures are logged and otherwise ignored; there is
/// nobody left to report them to.
pub fn write_fallback(paths: &StatusPaths, result: &ProvisionResult) {
    if !paths.provision_json.exists() {
        match serde_json::to_vec(result) {
            Ok(data) => {
                create_parent(&paths.provision_json);
                if let Err(e) = write_new_file(&paths.provision_json, &data) {
                    error!(
                        "Failed to write provision.json '{}': {}",
                        paths.provision_json.display(),
                        e
                    );
                }
            }
            Err(e) => error!("Failed to serialize provision result: {}", e),
        }
    }

    match fs::metadata(&paths.provision_complete) {
        Ok(_) => return,
        Err(e) if e.kind() != ErrorKind::NotFound => {
            error!(
                "Failed to stat provision.complete '{}': {}",
                paths.provision_complete.display(),
                e
            );
            return;
        }
        Err(_) => {}
    }
    create_parent(&paths.provision_complete);
    match write_new_file(&paths.provision_complete, &[]) {
        Ok(()) => info!(
            "Wrote completion marker '{}'",
            paths.provision_complete.display()
        ),
        Err(e) => error!(
            "Failed to write provision.complete '{}': {}",
            paths.provision_complete.display(),
            e
        ),
    }
}

fn create_parent(path: &Path) {
    if let Some(dir) = path.parent() {
        if let Err(e) = fs::DirBuilder::new().recursive(true).mode(0o755).create(dir) {
            error!(
                "Failed to create directory for '{}': {}",
                path.display(),
                e
            );
        }
    }
}

fn write_new_file(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut f = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    f.write_all(data)
}
