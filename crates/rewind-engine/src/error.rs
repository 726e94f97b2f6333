//! Session error types.

use std::error::Error;
use std::fmt;
use std::io;
use std::path::PathBuf;

use rewind_trace::TraceError;

use crate::config::ConfigError;

/// Errors returned by [`Session::init`](crate::Session::init).
///
/// Every variant leaves the session uninitialised.
#[derive(Debug)]
pub enum SessionError {
    /// The configuration failed validation.
    Config(ConfigError),
    /// `init` was called on a session that has not been quit.
    AlreadyInitialized,
    /// The trace could not be created for recording.
    OpenTrace {
        /// Trace path from the configuration.
        path: PathBuf,
        /// Underlying failure.
        source: TraceError,
    },
    /// The trace could not be loaded for replay.
    LoadTrace {
        /// Trace path from the configuration.
        path: PathBuf,
        /// Underlying failure.
        source: TraceError,
    },
    /// The working-directory override could not be applied.
    WorkDir {
        /// Requested working directory.
        path: PathBuf,
        /// Underlying failure.
        source: io::Error,
    },
    /// The background injector thread could not be spawned.
    ThreadSpawnFailed {
        /// OS error description.
        reason: String,
    },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "invalid configuration: {e}"),
            Self::AlreadyInitialized => {
                write!(f, "session already initialized; call quit() first")
            }
            Self::OpenTrace { path, source } => {
                write!(f, "failed to open {} for recording: {source}", path.display())
            }
            Self::LoadTrace { path, source } => {
                write!(f, "failed to load {} for replay: {source}", path.display())
            }
            Self::WorkDir { path, source } => {
                write!(
                    f,
                    "failed to change working directory to {}: {source}",
                    path.display()
                )
            }
            Self::ThreadSpawnFailed { reason } => {
                write!(f, "injector thread spawn failed: {reason}")
            }
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::OpenTrace { source, .. } | Self::LoadTrace { source, .. } => Some(source),
            Self::WorkDir { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ConfigError> for SessionError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}
