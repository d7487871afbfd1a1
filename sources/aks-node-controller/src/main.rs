/*!
Entry point for `aks-node-controller`.  Sets up logging to the terminal and as JSON lines to the
controller's log file, wires SIGTERM and SIGINT to cancellation, and exits with the code the app
decides on.
*/

use aks_node_controller::constants::LOG_FILE;
use aks_node_controller::logging::JsonLogger;
use aks_node_controller::{App, Cancel};
use log::{info, warn};
use simplelog::{
    ColorChoice, CombinedLogger, Config as LogConfig, LevelFilter, TermLogger, TerminalMode,
};
use snafu::ResultExt;
use std::env;
use std::fs::{self, File};
use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt};
use std::path::Path;
use std::process;
use tokio::signal::unix::{signal, SignalKind};

/// Overrides the log level: trace|debug|info|warn|error|off
const LOG_LEVEL_ENV: &str = "AKS_NODE_CONTROLLER_LOG_LEVEL";

type Result<T> = std::result::Result<T, error::Error>;

fn log_level() -> LevelFilter {
    env::var(LOG_LEVEL_ENV)
        .ok()
        .and_then(|level| level.parse().ok())
        .unwrap_or(LevelFilter::Info)
}

fn open_log_file(path: &Path) -> Result<File> {
    if let Some(dir) = path.parent() {
        fs::DirBuilder::new()
            .recursive(true)
            .mode(0o755)
            .create(dir)
            .context(error::LogDirSnafu { path: dir })?;
    }
    fs::OpenOptions::new()
        .append(true)
        .create(true)
        .mode(0o644)
        .open(path)
        .context(error::LogFileSnafu { path })
}

fn setup_logger() -> Result<()> {
    let level = log_level();
    let log_file = open_log_file(Path::new(LOG_FILE))?;
    CombinedLogger::init(vec![
        TermLogger::new(
            level,
            LogConfig::default(),
            TerminalMode::Stderr,
            ColorChoice::Never,
        ),
        JsonLogger::new(level, log_file),
    ])
    .context(error::LoggerSnafu)
}

/// Resolves on the first SIGTERM or SIGINT.
fn shutdown_signal() -> Cancel {
    Box::pin(async {
        let mut term = match signal(SignalKind::terminate()) {
            Ok(term) => term,
            Err(e) => {
                warn!("Unable to listen for SIGTERM: {}", e);
                return futures_util::future::pending().await;
            }
        };
        tokio::select! {
            _ = term.recv() => info!("Received SIGTERM"),
            _ = tokio::signal::ctrl_c() => info!("Received SIGINT"),
        }
    })
}

#[tokio::main]
async fn main() {
    if let Err(e) = setup_logger() {
        eprintln!("{}", e);
        process::exit(1);
    }

    let argv: Vec<String> = env::args().collect();
    let code = App::default().run(&argv, shutdown_signal()).await;
    process::exit(code);
}

mod error {
    use snafu::Snafu;
    use std::path::PathBuf;

    #[derive(Debug, Snafu)]
    #[snafu(visibility(pub(super)))]
    pub(super) enum Error {
        #[snafu(display("failed to create log directory {}: {}", path.display(), source))]
        LogDir {
            path: PathBuf,
            source: std::io::Error,
        },

        #[snafu(display("failed to open log file {}: {}", path.display(), source))]
        LogFile {
            path: PathBuf,
            source: std::io::Error,
        },

        #[snafu(display("Logger setup error: {}", source))]
        Logger { source: log::SetLoggerError },
    }
}
