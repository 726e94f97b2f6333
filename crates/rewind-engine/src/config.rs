//! Session configuration, validation, and command-line parsing.
//!
//! [`SessionConfig`] is consumed by [`Session::init`](crate::Session::init).
//! [`validate()`](SessionConfig::validate) checks the mode-specific
//! requirements before any file or thread is touched.

use std::error::Error;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use rewind_core::{CallSite, Clock, Platform};

use crate::assertion::FailedAssertion;

/// Default pause between background injector polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1);

// ── Mode ───────────────────────────────────────────────────────────

/// What a session does with input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Every operation is a no-op.
    #[default]
    Disabled,
    /// Capture input and write a trace.
    Record,
    /// Load a trace and re-inject its input.
    Replay,
}

impl Mode {
    /// Lowercase name, as accepted by `--test-mode=`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Record => "record",
            Self::Replay => "replay",
        }
    }

    /// Find `--test-mode=<mode>` in a command line.
    ///
    /// Returns `Ok(None)` if the flag is absent. The last occurrence wins.
    ///
    /// # Examples
    ///
    /// ```
    /// use rewind_engine::Mode;
    ///
    /// let args = ["game.exe", "--test-mode=replay", "--test=menu.trace"];
    /// assert_eq!(Mode::from_args(args).unwrap(), Some(Mode::Replay));
    /// assert_eq!(Mode::from_args(["game.exe"]).unwrap(), None);
    /// ```
    pub fn from_args<I, S>(args: I) -> Result<Option<Mode>, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        find_flag(args, "--test-mode=")
            .map(|value| value.parse())
            .transpose()
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "disabled" => Ok(Self::Disabled),
            "record" => Ok(Self::Record),
            "replay" => Ok(Self::Replay),
            _ => Err(ConfigError::InvalidMode(s.to_string())),
        }
    }
}

/// Find `--test=<path>` in a command line.
///
/// Returns `None` if the flag is absent or empty.
pub fn trace_path_from_args<I, S>(args: I) -> Option<PathBuf>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    find_flag(args, "--test=")
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

fn find_flag<I, S>(args: I, prefix: &str) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    args.into_iter()
        .filter_map(|arg| arg.as_ref().strip_prefix(prefix).map(str::to_string))
        .last()
}

// ── Callbacks ──────────────────────────────────────────────────────

/// Invoked when the run is marked failed. Replaces the default
/// log-report-and-abort action.
pub type FailCallback = Arc<dyn Fn() + Send + Sync>;

/// Invoked on every `sync_signal` call with the session mode, the signal id,
/// and the caller's location.
pub type SignalCallback = Arc<dyn Fn(Mode, i32, CallSite) + Send + Sync>;

/// Invoked for every failed assertion.
pub type AssertionCallback = Arc<dyn Fn(&FailedAssertion) + Send + Sync>;

// ── ReplayDriver ───────────────────────────────────────────────────

/// What drives replay injection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplayDriver {
    /// Inject from inside [`Session::update`](crate::Session::update).
    Tick,
    /// Inject from a background thread polling at a fixed interval.
    Background {
        /// Pause between polls.
        poll_interval: Duration,
    },
}

impl Default for ReplayDriver {
    fn default() -> Self {
        Self::Background {
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

// ── DirectoryMapping ───────────────────────────────────────────────

/// A path redirect handed to the file-redirection layer.
///
/// The session only carries these; it never rewrites paths itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirectoryMapping {
    /// Path as the application sees it.
    pub path: PathBuf,
    /// Where accesses should land instead.
    pub redirected: PathBuf,
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected during [`SessionConfig::validate()`] or argument parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Record or replay was requested without a trace path.
    MissingTracePath,
    /// Record or replay was requested without a platform.
    MissingPlatform,
    /// The background poll interval is zero.
    InvalidPollInterval,
    /// A mode string is not `record`, `replay`, or `disabled`.
    InvalidMode(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingTracePath => write!(f, "record and replay modes require a trace path"),
            Self::MissingPlatform => write!(f, "record and replay modes require a platform"),
            Self::InvalidPollInterval => write!(f, "poll_interval must be non-zero"),
            Self::InvalidMode(s) => {
                write!(f, "unknown mode '{s}' (expected record, replay, or disabled)")
            }
        }
    }
}

impl Error for ConfigError {}

// ── SessionConfig ──────────────────────────────────────────────────

/// Everything a session needs, supplied once at `init`.
#[derive(Clone, Default)]
pub struct SessionConfig {
    /// Session mode.
    pub mode: Mode,
    /// Trace file to write (record) or read (replay).
    pub trace_path: Option<PathBuf>,
    /// Input capture and injection. Required for record and replay.
    pub platform: Option<Arc<dyn Platform>>,
    /// Time source. `None` uses [`MonotonicClock`](rewind_core::MonotonicClock).
    pub clock: Option<Arc<dyn Clock>>,
    /// Replaces the default fail action.
    pub on_fail: Option<FailCallback>,
    /// Observes every sync signal.
    pub on_signal: Option<SignalCallback>,
    /// Observes every failed assertion.
    pub on_assertion: Option<AssertionCallback>,
    /// Working directory to switch to before opening the trace.
    pub work_dir: Option<PathBuf>,
    /// Redirects for the file-redirection layer.
    pub directory_mappings: Vec<DirectoryMapping>,
    /// Failed assertions tolerated before the run fails. Values `<= 1`
    /// fail on the first.
    pub fail_threshold: u32,
    /// What drives replay injection.
    pub replay_driver: ReplayDriver,
}

impl SessionConfig {
    /// A record-mode configuration.
    pub fn record(trace_path: impl Into<PathBuf>, platform: Arc<dyn Platform>) -> Self {
        Self {
            mode: Mode::Record,
            trace_path: Some(trace_path.into()),
            platform: Some(platform),
            ..Self::default()
        }
    }

    /// A replay-mode configuration.
    pub fn replay(trace_path: impl Into<PathBuf>, platform: Arc<dyn Platform>) -> Self {
        Self {
            mode: Mode::Replay,
            trace_path: Some(trace_path.into()),
            platform: Some(platform),
            ..Self::default()
        }
    }

    /// Effective failure threshold (at least 1).
    pub fn effective_fail_threshold(&self) -> u32 {
        self.fail_threshold.max(1)
    }

    /// Validate the mode-specific requirements.
    ///
    /// Disabled sessions need nothing. Record and replay need a non-empty
    /// trace path and a platform; a background driver needs a non-zero
    /// poll interval.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mode == Mode::Disabled {
            return Ok(());
        }
        match &self.trace_path {
            Some(path) if !path.as_os_str().is_empty() => {}
            _ => return Err(ConfigError::MissingTracePath),
        }
        if self.platform.is_none() {
            return Err(ConfigError::MissingPlatform);
        }
        if let ReplayDriver::Background { poll_interval } = self.replay_driver {
            if self.mode == Mode::Replay && poll_interval.is_zero() {
                return Err(ConfigError::InvalidPollInterval);
            }
        }
        Ok(())
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn set<T: ?Sized>(v: &Option<Arc<T>>) -> &'static str {
            if v.is_some() {
                "set"
            } else {
                "null"
            }
        }
        f.debug_struct("SessionConfig")
            .field("mode", &self.mode)
            .field("trace_path", &self.trace_path)
            .field("platform", &set(&self.platform))
            .field("clock", &set(&self.clock))
            .field("on_fail", &set(&self.on_fail))
            .field("on_signal", &set(&self.on_signal))
            .field("on_assertion", &set(&self.on_assertion))
            .field("work_dir", &self.work_dir)
            .field("directory_mappings", &self.directory_mappings)
            .field("fail_threshold", &self.fail_threshold)
            .field("replay_driver", &self.replay_driver)
            .finish()
    }
}
