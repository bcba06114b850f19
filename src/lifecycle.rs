//! Worker lifecycle.
//!
//! One dedicated thread owns the event source: it installs the hook
//! subscriptions, pumps events until told to stop, then uninstalls them.
//! The controller is either stopped or running, with a sticky failure flag
//! that only `shutdown` clears.

use crate::dispatcher::Dispatcher;
use crate::source::{EventSource, HookError};
use std::fmt;
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle, ThreadId};

/// Why the worker is not running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    /// An earlier start failed and `shutdown` has not been called since.
    Failed,
    /// The worker thread could not be created.
    Spawn(String),
    /// The worker started but could not install its subscriptions.
    Subscribe(HookError),
    /// The worker ended before reporting readiness.
    WorkerExited,
}

impl fmt::Display for LifecycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleError::Failed => write!(f, "Input worker failed earlier; shutdown required"),
            LifecycleError::Spawn(e) => write!(f, "Failed to spawn input worker: {}", e),
            LifecycleError::Subscribe(e) => write!(f, "Input worker could not subscribe: {}", e),
            LifecycleError::WorkerExited => write!(f, "Input worker exited during startup"),
        }
    }
}

impl std::error::Error for LifecycleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LifecycleError::Subscribe(e) => Some(e),
            _ => None,
        }
    }
}

#[derive(Default)]
struct State {
    worker: Option<JoinHandle<()>>,
    /// Set while `shutdown` joins the worker with this thread id.
    stopping: Option<ThreadId>,
    failed: bool,
}

/// Starts and stops the dedicated input worker.
pub struct Lifecycle<S: EventSource> {
    source: Arc<S>,
    thread_name: String,
    state: Mutex<State>,
    stopped: Condvar,
}

impl<S: EventSource> Lifecycle<S> {
    pub fn new(source: Arc<S>, thread_name: impl Into<String>) -> Self {
        Self {
            source,
            thread_name: thread_name.into(),
            state: Mutex::new(State::default()),
            stopped: Condvar::new(),
        }
    }

    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Waits for an in-progress `shutdown` to finish joining the worker.
    fn wait_stopped<'a>(&self, state: MutexGuard<'a, State>) -> MutexGuard<'a, State> {
        self.stopped
            .wait_while(state, |state| state.stopping.is_some())
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts the worker unless it is already running.
    ///
    /// Returns once the worker's subscriptions are installed. Fails without
    /// retrying while the sticky failure flag is set.
    ///
    /// While a shutdown is in progress, a call made on the worker itself
    /// reports ready without waiting; any other caller waits for the stop to
    /// finish and then starts a fresh worker.
    pub fn start(&self, dispatcher: &Arc<Dispatcher>) -> Result<(), LifecycleError> {
        let mut state = self.lock();
        if state.stopping == Some(thread::current().id()) {
            return Ok(());
        }
        state = self.wait_stopped(state);
        if state.failed {
            return Err(LifecycleError::Failed);
        }
        if state.worker.is_some() {
            return Ok(());
        }

        tracing::info!(thread = %self.thread_name, "Starting input worker");

        let (ready_tx, ready_rx) = mpsc::channel();
        let source = Arc::clone(&self.source);
        let dispatcher = Arc::clone(dispatcher);
        let spawned = thread::Builder::new()
            .name(self.thread_name.clone())
            .spawn(move || run_worker(source, dispatcher, ready_tx));

        let worker = match spawned {
            Ok(worker) => worker,
            Err(e) => {
                tracing::error!(error = %e, "Failed to spawn input worker");
                state.failed = true;
                return Err(LifecycleError::Spawn(e.to_string()));
            }
        };

        let outcome = match ready_rx.recv() {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(LifecycleError::Subscribe(e)),
            Err(_) => Err(LifecycleError::WorkerExited),
        };

        match outcome {
            Ok(()) => {
                state.worker = Some(worker);
                Ok(())
            }
            Err(e) => {
                let _ = worker.join();
                state.failed = true;
                tracing::error!(error = %e, "Input worker failed to start");
                Err(e)
            }
        }
    }

    /// Stops the worker and waits for it to exit, then clears the failure
    /// flag.
    ///
    /// Blocks until the subscriptions are released. The state lock is not
    /// held during the join, so callbacks on the worker may still register.
    /// Must not be called from a handler running on the worker.
    pub fn shutdown(&self) {
        let worker = {
            let mut state = self.wait_stopped(self.lock());
            let worker = state.worker.take();
            state.stopping = worker.as_ref().map(|worker| worker.thread().id());
            worker
        };

        if let Some(worker) = worker {
            tracing::info!("Stopping input worker");
            self.source.request_stop();
            if worker.join().is_err() {
                tracing::error!("Input worker panicked");
            }
        }

        let mut state = self.lock();
        state.stopping = None;
        state.failed = false;
        drop(state);
        self.stopped.notify_all();
        tracing::info!("Input shutdown complete");
    }

    pub fn is_running(&self) -> bool {
        self.lock().worker.is_some()
    }

    pub fn is_failed(&self) -> bool {
        self.lock().failed
    }
}

impl<S: EventSource> Drop for Lifecycle<S> {
    fn drop(&mut self) {
        if self.is_running() {
            self.shutdown();
        }
    }
}

impl<S: EventSource> fmt::Debug for Lifecycle<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("Lifecycle")
            .field("thread_name", &self.thread_name)
            .field("running", &state.worker.is_some())
            .field("stopping", &state.stopping.is_some())
            .field("failed", &state.failed)
            .finish()
    }
}

/// Worker body: subscribe, report readiness, pump, unsubscribe.
fn run_worker<S: EventSource>(
    source: Arc<S>,
    dispatcher: Arc<Dispatcher>,
    ready: Sender<Result<(), HookError>>,
) {
    let subscription = match source.subscribe(dispatcher) {
        Ok(subscription) => subscription,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };
    let _ = ready.send(Ok(()));

    tracing::debug!("Input worker pumping events");
    source.pump_until_stopped();

    source.unsubscribe(subscription);
    tracing::debug!("Input worker exiting");
}
