//! Background replay injector.
//!
//! The injector thread wakes every `poll_interval`, computes what is due
//! under the session lock, releases it, and then injects. Shutdown is a
//! message on a crossbeam channel, so `stop` never waits out a full poll
//! interval.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{RecvTimeoutError, Sender};

use crate::error::SessionError;
use crate::session::Shared;

/// Handle to a running injector thread.
pub(crate) struct InjectorThread {
    shutdown_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl InjectorThread {
    /// Spawn the thread. It runs until [`stop`](Self::stop) or drop.
    pub fn spawn(shared: Arc<Shared>, poll_interval: Duration) -> Result<Self, SessionError> {
        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded::<()>(1);
        let handle = thread::Builder::new()
            .name("rewind-injector".into())
            .spawn(move || loop {
                match shutdown_rx.recv_timeout(poll_interval) {
                    Err(RecvTimeoutError::Timeout) => shared.pump(),
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })
            .map_err(|e| SessionError::ThreadSpawnFailed {
                reason: format!("rewind-injector: {e}"),
            })?;
        log::debug!("injector thread started ({poll_interval:?} poll interval)");
        Ok(Self {
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    /// Signal shutdown and join. Returns `false` if the thread panicked.
    pub fn stop(mut self) -> bool {
        self.shutdown()
    }

    fn shutdown(&mut self) -> bool {
        if let Some(tx) = self.shutdown_tx.take() {
            // A full channel or a gone receiver both mean the thread is
            // already on its way out.
            let _ = tx.try_send(());
        }
        match self.handle.take() {
            Some(handle) => handle.join().is_ok(),
            None => true,
        }
    }
}

impl Drop for InjectorThread {
    fn drop(&mut self) {
        self.shutdown();
    }
}
