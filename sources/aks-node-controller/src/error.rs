//! Provides the list of errors for `aks-node-controller`.

use snafu::Snafu;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("{}", message))]
    Usage { message: String },

    #[snafu(display("open provision file {}: {}", path.display(), source))]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("{}", source))]
    Config { source: aks_node_config::Error },

    #[snafu(display("build CSE command: {}", source))]
    Render { source: crate::render::Error },

    #[snafu(display("{}", source))]
    Run { source: crate::runner::Error },

    #[snafu(display("exit status {}", code))]
    ChildFailed {
        code: i32,
        stdout: String,
        stderr: String,
    },

    #[snafu(display("{}", source))]
    Wait { source: crate::wait::Error },
}

impl Error {
    /// The process exit code for this error: the child's own status when it failed, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::ChildFailed { code, .. } => *code,
            _ => 1,
        }
    }

    /// The outcome record read by the waiter, if any.
    pub fn raw_output(&self) -> Option<&str> {
        match self {
            Error::Wait { source } => source.raw_output(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn exit_codes() {
        let child = Error::ChildFailed {
            code: 7,
            stdout: String::new(),
            stderr: String::new(),
        };
        assert_eq!(child.exit_code(), 7);
        assert_eq!(child.to_string(), "exit status 7");

        let usage = Error::Usage {
            message: "missing command argument".to_string(),
        };
        assert_eq!(usage.exit_code(), 1);
        assert_eq!(usage.to_string(), "missing command argument");
    }
}
