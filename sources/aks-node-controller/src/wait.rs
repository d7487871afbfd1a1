//! Blocks until the provisioning script signals completion.

use crate::status::{self, StatusPaths};
use crate::Cancel;
use futures_util::StreamExt;
use inotify::{EventStream, Inotify, WatchMask};
use log::{debug, info};
use snafu::{OptionExt, ResultExt};
use std::ffi::OsStr;
use std::fs;
use std::os::unix::fs::DirBuilderExt;
use std::path::Path;

pub mod error {
    use snafu::Snafu;
    use std::path::PathBuf;

    #[derive(Debug, Snafu)]
    #[snafu(visibility(pub(super)))]
    pub enum Error {
        #[snafu(display("failed to create directory {}: {}", path.display(), source))]
        CreateDir {
            path: PathBuf,
            source: std::io::Error,
        },

        #[snafu(display("invalid completion marker path '{}'", path.display()))]
        MarkerPath { path: PathBuf },

        #[snafu(display("failed to watch directory: {}", source))]
        Watch { source: std::io::Error },

        #[snafu(display("error watching file: {}", source))]
        WatchEvent { source: std::io::Error },

        #[snafu(display("inotify event stream ended unexpectedly"))]
        StreamEnded,

        #[snafu(display("context deadline exceeded waiting for provision complete"))]
        DeadlineExceeded,

        #[snafu(display("{}", source))]
        Status { source: crate::status::Error },
    }
}
pub use error::Error;
pub type Result<T> = std::result::Result<T, error::Error>;

impl Error {
    /// The outcome record that came with the error, if one was read.
    pub fn raw_output(&self) -> Option<&str> {
        match self {
            Error::Status { source } => source.raw_output(),
            _ => None,
        }
    }
}

/// Waits for the completion marker and returns the outcome record once it reports success.
///
/// The watch is placed before the marker is checked, so a marker created in between is not
/// missed.
pub async fn wait_for_provision(paths: &StatusPaths, cancel: Cancel) -> Result<String> {
    let marker = &paths.provision_complete;
    let dir = marker.parent().context(error::MarkerPathSnafu { path: marker })?;
    let name = marker
        .file_name()
        .context(error::MarkerPathSnafu { path: marker })?;

    fs::DirBuilder::new()
        .recursive(true)
        .mode(0o755)
        .create(dir)
        .context(error::CreateDirSnafu { path: dir })?;

    let inotify = Inotify::init().context(error::WatchSnafu)?;
    inotify
        .watches()
        .add(dir, WatchMask::CREATE | WatchMask::MOVED_TO)
        .context(error::WatchSnafu)?;

    if marker.exists() {
        info!("'{}' already exists, reading outcome", marker.display());
        return read_outcome(&paths.provision_json);
    }

    let buffer = [0u8; 4096];
    let mut events = inotify.into_event_stream(buffer).context(error::WatchSnafu)?;
    info!("Waiting for '{}'", marker.display());

    tokio::select! {
        result = watch_for(&mut events, name) => {
            result?;
            info!("'{}' created, reading outcome", marker.display());
            read_outcome(&paths.provision_json)
        }
        _ = cancel => error::DeadlineExceededSnafu.fail(),
    }
}

/// Consumes events until one names `name`.  Only the file name is compared; events for other
/// entries in the directory are skipped.
async fn watch_for<T>(events: &mut EventStream<T>, name: &OsStr) -> Result<()>
where
    T: AsMut<[u8]> + AsRef<[u8]> + Unpin,
{
    while let Some(event) = events.next().await {
        let event = event.context(error::WatchEventSnafu)?;
        debug!("inotify event {:?} for {:?}", event.mask, event.name);
        if event.name.as_deref() == Some(name) {
            return Ok(());
        }
    }
    error::StreamEndedSnafu.fail()
}

fn read_outcome(path: &Path) -> Result<String> {
    status::read_and_evaluate(path).context(error::StatusSnafu)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    const SUCCESS: &str = r#"{"ExitCode":"0","Output":"hello world","Error":""}"#;

    fn paths_in(dir: &Path) -> StatusPaths {
        StatusPaths {
            provision_json: dir.join("provision.json"),
            provision_complete: dir.join("containers").join("provision.complete"),
            events_dir: dir.join("events"),
        }
    }

    fn after(ms: u64) -> Cancel {
        Box::pin(tokio::time::sleep(Duration::from_millis(ms)))
    }

    #[tokio::test]
    async fn marker_already_present() {
        let dir = TempDir::new().unwrap();
        let paths = paths_in(dir.path());
        fs::create_dir_all(paths.provision_complete.parent().unwrap()).unwrap();
        fs::write(&paths.provision_json, SUCCESS).unwrap();
        fs::write(&paths.provision_complete, "").unwrap();

        let raw = wait_for_provision(&paths, after(5000)).await.unwrap();
        assert_eq!(raw, SUCCESS);
    }

    #[tokio::test]
    async fn ignores_other_files() {
        let dir = TempDir::new().unwrap();
        let paths = paths_in(dir.path());
        let watched = paths.provision_complete.parent().unwrap().to_path_buf();

        let writer = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            fs::write(watched.join("provision.complete.tmp"), "").unwrap();
        });
        let err = wait_for_provision(&paths, after(500)).await.unwrap_err();
        writer.await.unwrap();
        assert_eq!(
            err.to_string(),
            "context deadline exceeded waiting for provision complete"
        );
    }

    #[tokio::test]
    async fn creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let paths = paths_in(dir.path());
        let _ = wait_for_provision(&paths, after(50)).await;
        assert!(paths.provision_complete.parent().unwrap().is_dir());
    }

    #[tokio::test]
    async fn marker_without_record() {
        let dir = TempDir::new().unwrap();
        let paths = paths_in(dir.path());
        fs::create_dir_all(paths.provision_complete.parent().unwrap()).unwrap();
        fs::write(&paths.provision_complete, "").unwrap();

        let err = wait_for_provision(&paths, after(5000)).await.unwrap_err();
        assert!(err.to_string().starts_with("failed to read provision.json"));
        assert_eq!(err.raw_output(), None);
    }
}
