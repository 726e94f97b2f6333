//! Session lifecycle and per-tick driver.
//!
//! A [`Session`] is a handle over one mutex-guarded state. Every public
//! operation takes `&self`, so the handle can be shared between the game
//! thread and helpers through an `Arc<Session>`.
//!
//! # Lock discipline
//!
//! State is only touched under the lock. Work that calls out of the
//! session (input injection, user callbacks, the default fail action) is
//! computed under the lock, then performed after the guard is dropped, so
//! callbacks may re-enter the session freely.

use std::env;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rewind_core::{hash_str, CallSite, Clock, MonotonicClock, Platform};
use rewind_trace::{load_file, TraceMetrics};

use crate::assertion::AssertionLog;
use crate::config::{FailCallback, Mode, ReplayDriver, SessionConfig};
use crate::error::SessionError;
use crate::injector_thread::InjectorThread;
use crate::key_counter::KeyCounter;
use crate::recorder::Recorder;
use crate::replay::{Injection, Replayer, SignalOutcome};
use crate::report::SessionReport;

// ── Internal state ────────────────────────────────────────────────

pub(crate) enum Channel {
    Disabled,
    Record(Recorder),
    Replay(Replayer),
}

/// State of an initialised session.
pub(crate) struct Active {
    pub(crate) config: SessionConfig,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) tick: u64,
    pub(crate) failed: bool,
    pub(crate) assertions: AssertionLog,
    pub(crate) pin_counter: KeyCounter,
    pub(crate) track_counter: KeyCounter,
    pub(crate) channel: Channel,
}

impl Active {
    pub(crate) fn mode(&self) -> Mode {
        self.config.mode
    }

    fn platform(&self) -> Option<Arc<dyn Platform>> {
        self.config.platform.clone()
    }

    pub(crate) fn report(&self) -> SessionReport {
        SessionReport {
            mode: self.mode(),
            trace_path: self.config.trace_path.clone(),
            ticks: self.tick,
            assertions_evaluated: self.assertions.total(),
            unique_sites: self.assertions.unique_sites(),
            failures: self.assertions.failed().to_vec(),
            fire_count: self.assertions.fire_count(),
            failed: self.failed,
        }
    }

    /// Mark the run failed and capture what to do about it once the lock
    /// is released.
    pub(crate) fn mark_failed(&mut self) -> FailAction {
        self.failed = true;
        log::error!("run marked as failed on tick {}", self.tick);
        match &self.config.on_fail {
            Some(callback) => FailAction::Callback(Arc::clone(callback)),
            None => FailAction::Abort(Box::new(self.report())),
        }
    }

    fn poll_replay(&mut self) -> Option<(Arc<dyn Platform>, Injection)> {
        let now = self.clock.now();
        let Channel::Replay(replayer) = &mut self.channel else {
            return None;
        };
        let injection = replayer.poll(now)?;
        Some((self.platform()?, injection))
    }
}

/// Deferred reaction to a failed run.
pub(crate) enum FailAction {
    Callback(FailCallback),
    Abort(Box<SessionReport>),
}

impl FailAction {
    pub(crate) fn run(self) {
        match self {
            Self::Callback(callback) => callback(),
            Self::Abort(report) => {
                log::error!("run FAILED, aborting");
                log::error!("\n{report}");
                std::process::abort();
            }
        }
    }
}

pub(crate) struct Shared {
    state: Mutex<Option<Active>>,
    injector: Mutex<Option<InjectorThread>>,
}

impl Shared {
    pub(crate) fn lock(&self) -> MutexGuard<'_, Option<Active>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn injector(&self) -> MutexGuard<'_, Option<InjectorThread>> {
        self.injector.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// One background injector step.
    pub(crate) fn pump(&self) {
        let due = self.lock().as_mut().and_then(Active::poll_replay);
        if let Some((platform, injection)) = due {
            platform.inject_input(&injection.new, &injection.prev);
        }
    }
}

// ── Session ───────────────────────────────────────────────────────

/// A record/replay session.
///
/// Starts uninitialised; every operation is a no-op until
/// [`init`](Self::init) succeeds and again after [`quit`](Self::quit).
/// Dropping an initialised session quits it.
///
/// # Examples
///
/// ```
/// use rewind_engine::{Mode, Session, SessionConfig};
///
/// let session = Session::new();
/// session.init(SessionConfig::default()).unwrap();
/// assert_eq!(session.mode(), Some(Mode::Disabled));
///
/// session.update();
/// session.assert(false, "ignored while disabled");
/// assert!(session.get_failed_assertions().is_empty());
///
/// session.quit();
/// assert!(!session.is_initialized());
/// ```
pub struct Session {
    shared: Arc<Shared>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Create an uninitialised session.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(None),
                injector: Mutex::new(None),
            }),
        }
    }

    /// Run `f` on the active state unless the session is uninitialised or
    /// disabled. The lock is held only for the duration of `f`.
    pub(crate) fn with_active<R>(&self, f: impl FnOnce(&mut Active) -> R) -> Option<R> {
        let mut guard = self.shared.lock();
        let active = guard.as_mut().filter(|a| a.mode() != Mode::Disabled)?;
        Some(f(active))
    }

    // ── Lifecycle ─────────────────────────────────────────────────

    /// Validate `config` and start the session.
    ///
    /// Record mode creates the trace (and missing parent directories) and
    /// writes its header. Replay mode loads and decodes the whole trace and
    /// starts the replay clock. On error the session stays uninitialised.
    pub fn init(&self, config: SessionConfig) -> Result<(), SessionError> {
        let mut guard = self.shared.lock();
        if guard.is_some() {
            log::warn!("session already initialized; call quit() first");
            return Err(SessionError::AlreadyInitialized);
        }
        config.validate()?;
        log_setup(&config);

        let clock = config
            .clock
            .clone()
            .unwrap_or_else(|| Arc::new(MonotonicClock::new()));

        let channel = match config.mode {
            Mode::Disabled => Channel::Disabled,
            mode => {
                let previous_dir = enter_work_dir(config.work_dir.as_deref())?;
                let path = config.trace_path.as_deref().unwrap_or(Path::new(""));
                open_channel(mode, path, clock.as_ref()).inspect_err(|_| {
                    if let Some(previous) = previous_dir.as_deref() {
                        restore_work_dir(previous);
                    }
                })?
            }
        };

        let spawn_injector = match (config.mode, config.replay_driver) {
            (Mode::Replay, ReplayDriver::Background { poll_interval }) => Some(poll_interval),
            _ => None,
        };

        *guard = Some(Active {
            assertions: AssertionLog::new(config.effective_fail_threshold()),
            config,
            clock,
            tick: 0,
            failed: false,
            pin_counter: KeyCounter::new(),
            track_counter: KeyCounter::new(),
            channel,
        });
        drop(guard);

        if let Some(poll_interval) = spawn_injector {
            match InjectorThread::spawn(Arc::clone(&self.shared), poll_interval) {
                Ok(thread) => *self.shared.injector() = Some(thread),
                Err(e) => {
                    self.shared.lock().take();
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    /// Finish the session.
    ///
    /// Stops the background injector, terminates the trace (record) or
    /// releases the decoded arrays (replay), logs the report, and returns
    /// the session to its uninitialised state.
    pub fn quit(&self) -> Option<SessionReport> {
        let injector = self.shared.injector().take();
        if let Some(injector) = injector {
            if !injector.stop() {
                log::warn!("injector thread panicked before shutdown");
            }
        }

        let active = self.shared.lock().take()?;
        let report = active.report();
        match active.channel {
            Channel::Record(mut recorder) => {
                log::info!("closing recording {}", recorder.path().display());
                if let Some(metrics) = recorder.close() {
                    log::info!("  {metrics}");
                }
            }
            Channel::Replay(_) => log::info!("freeing and stopping replay"),
            Channel::Disabled => {}
        }
        log::info!("\n{report}");
        Some(report)
    }

    /// Advance one tick.
    ///
    /// Resets the Pin/Track call ordinals, then records captured input or,
    /// with [`ReplayDriver::Tick`], injects due input.
    pub fn update(&self) {
        let due = self.with_active(|a| {
            a.pin_counter.reset();
            a.track_counter.reset();
            let due = if let Channel::Record(recorder) = &mut a.channel {
                if let Some(platform) = a.config.platform.as_ref() {
                    let snapshot = platform.capture_input();
                    recorder.write_input(a.clock.now(), &snapshot);
                }
                None
            } else if a.config.replay_driver == ReplayDriver::Tick {
                a.poll_replay()
            } else {
                None
            };
            a.tick += 1;
            due
        });
        if let Some((platform, injection)) = due.flatten() {
            platform.inject_input(&injection.new, &injection.prev);
        }
    }

    /// Start over without changing mode or configuration.
    ///
    /// Record mode terminates and truncates the trace; replay mode reloads
    /// it. Tick count, failed assertions, fire count, failed flag, signal
    /// gate, and the clock are all reset.
    pub fn reset(&self) {
        self.with_active(|a| {
            log::info!("resetting session (tick was {})", a.tick);
            let now = a.clock.now();
            match &mut a.channel {
                Channel::Record(recorder) => recorder.restart(now),
                Channel::Replay(replayer) => {
                    let path = a.config.trace_path.as_deref().unwrap_or(Path::new(""));
                    match open_replay(path, a.clock.as_ref()) {
                        Ok(fresh) => {
                            *replayer = fresh;
                            log::info!("replay data reloaded");
                        }
                        Err(e) => {
                            log::error!("{e}; restarting the trace already in memory");
                            replayer.rearm(now);
                        }
                    }
                }
                Channel::Disabled => {}
            }
            a.tick = 0;
            a.failed = false;
            a.assertions.reset_failures();
            a.pin_counter.reset();
            a.track_counter.reset();
        });
    }

    /// Mark the run failed and invoke the fail callback.
    ///
    /// Without a callback the report is logged and the process aborts.
    pub fn fail(&self) {
        if let Some(action) = self.with_active(Active::mark_failed) {
            action.run();
        }
    }

    // ── Signals ───────────────────────────────────────────────────

    /// Mark a synchronisation point.
    ///
    /// Record mode writes a SIGNAL record. Replay mode matches it against
    /// the next recorded signal and re-aligns the replay clock; a mismatch
    /// is logged and ignored. The signal callback runs afterwards in both
    /// modes.
    #[track_caller]
    pub fn sync_signal(&self, id: i32) {
        self.sync_signal_at(id, CallSite::caller());
    }

    /// [`sync_signal`](Self::sync_signal) with the FNV-1a hash of `name`.
    #[track_caller]
    pub fn sync_signal_str(&self, name: &str) {
        self.sync_signal_at(hash_str(name), CallSite::caller());
    }

    /// [`sync_signal`](Self::sync_signal) with the hash of the caller's
    /// location as the id.
    #[track_caller]
    pub fn sync_signal_auto(&self) {
        let site = CallSite::caller();
        self.sync_signal_at(site.hash() as i32, site);
    }

    fn sync_signal_at(&self, id: i32, site: CallSite) {
        let callback = self.with_active(|a| {
            let now = a.clock.now();
            match &mut a.channel {
                Channel::Record(recorder) => recorder.write_signal(now, id),
                Channel::Replay(replayer) => match replayer.sync_signal(id, now) {
                    SignalOutcome::Matched { late, shift } => log::debug!(
                        "signal {id} matched ({}), clock shifted by {shift:.3}s",
                        if late { "late" } else { "early" }
                    ),
                    SignalOutcome::Mismatch { expected } => log::warn!(
                        "signal {id} at {site} does not match expected signal {expected}; ignored"
                    ),
                    SignalOutcome::Exhausted => log::warn!(
                        "signal {id} at {site} received after all recorded signals; ignored"
                    ),
                },
                Channel::Disabled => {}
            }
            a.config.on_signal.clone().map(|cb| (cb, a.mode()))
        });
        if let Some((callback, mode)) = callback.flatten() {
            callback(mode, id, site);
        }
    }

    // ── Accessors ─────────────────────────────────────────────────

    /// Whether `init` has succeeded and `quit` has not been called.
    pub fn is_initialized(&self) -> bool {
        self.shared.lock().is_some()
    }

    /// Mode of an initialised session.
    pub fn mode(&self) -> Option<Mode> {
        self.shared.lock().as_ref().map(Active::mode)
    }

    /// Ticks since `init` or the last `reset`.
    pub fn tick(&self) -> u64 {
        self.shared.lock().as_ref().map_or(0, |a| a.tick)
    }

    /// Whether the run has been marked failed.
    pub fn is_failed(&self) -> bool {
        self.shared.lock().as_ref().is_some_and(|a| a.failed)
    }

    /// Current summary of the run.
    pub fn report(&self) -> Option<SessionReport> {
        self.shared.lock().as_ref().map(Active::report)
    }

    /// Whether replay injection is gated on a signal.
    pub fn is_waiting_for_signal(&self) -> bool {
        self.with_active(|a| match &a.channel {
            Channel::Replay(replayer) => replayer.is_waiting(),
            _ => false,
        })
        .unwrap_or(false)
    }

    /// Position on the recording's timeline, in replay mode.
    pub fn replay_time(&self) -> Option<f64> {
        self.with_active(|a| match &a.channel {
            Channel::Replay(replayer) => Some(replayer.replay_time(a.clock.now())),
            _ => None,
        })
        .flatten()
    }

    /// Whether every recorded input and signal has been replayed.
    pub fn is_replay_finished(&self) -> bool {
        self.with_active(|a| match &a.channel {
            Channel::Replay(replayer) => replayer.is_finished(),
            _ => false,
        })
        .unwrap_or(false)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.quit();
    }
}

fn open_channel(mode: Mode, path: &Path, clock: &dyn Clock) -> Result<Channel, SessionError> {
    if mode == Mode::Record {
        let recorder =
            Recorder::create(path, clock.now()).map_err(|source| SessionError::OpenTrace {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Channel::Record(recorder))
    } else {
        open_replay(path, clock).map(Channel::Replay)
    }
}

/// Switch to `dir` if one is configured, returning the directory to go
/// back to.
fn enter_work_dir(dir: Option<&Path>) -> Result<Option<PathBuf>, SessionError> {
    let Some(dir) = dir.filter(|d| !d.as_os_str().is_empty()) else {
        return Ok(None);
    };
    let previous = env::current_dir().ok();
    env::set_current_dir(dir).map_err(|source| SessionError::WorkDir {
        path: dir.to_path_buf(),
        source,
    })?;
    log::info!("working directory set to {}", dir.display());
    Ok(previous)
}

fn restore_work_dir(previous: &Path) {
    match env::set_current_dir(previous) {
        Ok(()) => log::info!("working directory restored to {}", previous.display()),
        Err(e) => log::error!(
            "failed to restore working directory {}: {e}",
            previous.display()
        ),
    }
}

fn open_replay(path: &Path, clock: &dyn Clock) -> Result<Replayer, SessionError> {
    let trace = load_file(path).map_err(|source| SessionError::LoadTrace {
        path: path.to_path_buf(),
        source,
    })?;
    let file_size = std::fs::metadata(path).ok().map(|m| m.len());
    let metrics = TraceMetrics::from_decoded(&trace, file_size);
    log::info!("loaded {} for replay: {metrics}", path.display());
    Ok(Replayer::new(trace, clock.now()))
}

fn log_setup(config: &SessionConfig) {
    let set = |b: bool| if b { "set" } else { "null" };
    log::info!("starting rewind session:");
    log::info!("  mode:                {}", config.mode);
    log::info!(
        "  trace path:          {}",
        config
            .trace_path
            .as_deref()
            .map_or("(none)".into(), |p| p.display().to_string())
    );
    log::info!(
        "  work dir:            {}",
        config
            .work_dir
            .as_deref()
            .map_or("(none)".into(), |p| p.display().to_string())
    );
    log::info!("  directory mappings:  {}", config.directory_mappings.len());
    log::info!("  fail threshold:      {}", config.effective_fail_threshold());
    log::info!("  replay driver:       {:?}", config.replay_driver);
    log::info!("  signal callback:     {}", set(config.on_signal.is_some()));
    log::info!("  fail callback:       {}", set(config.on_fail.is_some()));
    log::info!("  assertion callback:  {}", set(config.on_assertion.is_some()));
}
