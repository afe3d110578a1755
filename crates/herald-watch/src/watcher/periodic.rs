//! Cancellable periodic watcher.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::context::{WatcherConfig, WatcherContext, WatcherState};
use super::fault::{FaultHandler, LogFaultHandler, isolate, panic_message};
use crate::error::WatchError;

/// The unit of work a watcher runs on every tick.
pub type WatcherAction = dyn Fn(&WatcherContext) -> anyhow::Result<()> + Send + Sync;

/// State shared between the owner and the run threads.
struct Shared {
    name: Arc<str>,
    interval: Duration,
    action: Box<WatcherAction>,
    fault_handler: Arc<dyn FaultHandler>,
    /// Held for the whole of every invocation, so ticks never overlap.
    tick_lock: Mutex<()>,
    ticks: AtomicU64,
}

impl Shared {
    /// Body of a run thread.
    fn run_thread(&self, shutdown_rx: watch::Receiver<bool>) {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| -> Result<(), WatchError> {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()
                .map_err(|e| WatchError::infrastructure(&*self.name, e.to_string()))?;
            runtime.block_on(self.run_loop(shutdown_rx));
            Ok(())
        }));

        let fault = match outcome {
            Ok(Ok(())) => {
                info!(watcher = %self.name, status = "cancelled", "Watcher loop finished");
                return;
            },
            Ok(Err(fault)) => fault,
            Err(payload) => {
                WatchError::infrastructure(&*self.name, panic_message(payload.as_ref()))
            },
        };

        error!(watcher = %self.name, status = "faulted", error = %fault, "Watcher loop finished");
        self.fault_handler.on_fault(&fault);
    }

    /// Waits one interval, runs one tick, repeats until cancelled.
    async fn run_loop(&self, mut shutdown_rx: watch::Receiver<bool>) {
        info!(watcher = %self.name, interval = ?self.interval, "Watcher started");

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {
                    if !self.scheduled_tick(&shutdown_rx) {
                        warn!(watcher = %self.name, "Watcher cancelled");
                        break;
                    }
                }
                result = shutdown_rx.changed() => {
                    if result.is_err() || *shutdown_rx.borrow() {
                        warn!(watcher = %self.name, "Watcher cancelled");
                        break;
                    }
                }
            }
        }
    }

    /// Runs a tick unless cancellation landed while waiting for the lock.
    fn scheduled_tick(&self, shutdown_rx: &watch::Receiver<bool>) -> bool {
        let _guard = self.tick_lock.lock();
        if *shutdown_rx.borrow() {
            return false;
        }
        self.invoke_locked(Some(shutdown_rx.clone()));
        true
    }

    fn manual_tick(&self, cancel: Option<watch::Receiver<bool>>) -> bool {
        let _guard = self.tick_lock.lock();
        self.invoke_locked(cancel)
    }

    fn invoke_locked(&self, cancel: Option<watch::Receiver<bool>>) -> bool {
        let tick = self.ticks.fetch_add(1, Ordering::SeqCst) + 1;
        let ctx = WatcherContext::new(Arc::clone(&self.name), tick, cancel);
        debug!(watcher = %self.name, tick, "Running tick");

        isolate(&self.name, self.fault_handler.as_ref(), || {
            (self.action)(&ctx).map_err(|e| WatchError::action(&*self.name, e))
        })
    }
}

#[derive(Default)]
struct RunSlot {
    active: Option<JoinHandle<()>>,
    stopping: Vec<JoinHandle<()>>,
    shutdown_tx: Option<watch::Sender<bool>>,
}

impl RunSlot {
    fn is_running(&self) -> bool {
        self.active.as_ref().is_some_and(|h| !h.is_finished())
    }

    fn reap_stopped(&mut self) {
        self.stopping.retain(|h| !h.is_finished());
    }

    fn is_cancelling(&mut self) -> bool {
        self.reap_stopped();
        !self.stopping.is_empty()
    }
}

/// Runs an action every `interval` on a dedicated thread until stopped.
///
/// Each run owns one OS thread driving a current-thread tokio runtime, so a
/// slow action never stalls other watchers. Invocations are serialized by a
/// per-watcher lock: a tick from a stopping run and a tick from a fresh run,
/// or a scheduled tick and [`execute_procedure`](Self::execute_procedure),
/// never execute at the same time. The action must not call
/// `execute_procedure` on its own watcher.
///
/// Dropping the watcher disposes it.
pub struct PeriodicWatcher {
    shared: Arc<Shared>,
    run: Mutex<RunSlot>,
    disposed: AtomicBool,
}

impl PeriodicWatcher {
    /// Creates an idle watcher.
    pub fn new<F>(config: WatcherConfig, action: F, fault_handler: Arc<dyn FaultHandler>) -> Self
    where
        F: Fn(&WatcherContext) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self {
            shared: Arc::new(Shared {
                name: Arc::from(config.name),
                interval: config.interval,
                action: Box::new(action),
                fault_handler,
                tick_lock: Mutex::new(()),
                ticks: AtomicU64::new(0),
            }),
            run: Mutex::new(RunSlot::default()),
            disposed: AtomicBool::new(false),
        }
    }

    /// Creates a watcher whose faults are only logged.
    pub fn with_log_faults<F>(config: WatcherConfig, action: F) -> Self
    where
        F: Fn(&WatcherContext) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self::new(config, action, Arc::new(LogFaultHandler))
    }

    /// Starts a run unless one is already active.
    ///
    /// Returns `true` if a new run was launched. A failure to launch is
    /// reported to the fault handler.
    pub fn start(&self) -> bool {
        let mut run = self.run.lock();

        if self.is_disposed() {
            warn!(watcher = %self.shared.name, "Start ignored, watcher is disposed");
            return false;
        }
        if run.is_running() {
            debug!(watcher = %self.shared.name, "Start ignored, already running");
            return false;
        }
        run.reap_stopped();

        if let Some(previous) = run.shutdown_tx.take() {
            let _ = previous.send(true);
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name(format!("watcher-{}", self.shared.name))
            .spawn(move || shared.run_thread(shutdown_rx));

        match spawned {
            Ok(handle) => {
                run.active = Some(handle);
                run.shutdown_tx = Some(shutdown_tx);
                info!(watcher = %self.shared.name, "Watcher run launched");
                true
            },
            Err(e) => {
                let fault = WatchError::infrastructure(&*self.shared.name, e.to_string());
                self.shared.fault_handler.on_fault(&fault);
                false
            },
        }
    }

    /// Requests cancellation of the active run without waiting for it.
    ///
    /// A tick already in progress runs to completion.
    pub fn stop(&self) {
        let mut run = self.run.lock();
        run.reap_stopped();

        if let Some(tx) = run.shutdown_tx.as_ref() {
            let _ = tx.send(true);
        }

        match run.active.take() {
            Some(handle) => {
                info!(watcher = %self.shared.name, "Watcher stop requested");
                run.stopping.push(handle);
            },
            None => debug!(watcher = %self.shared.name, "Stop ignored, watcher is idle"),
        }
    }

    /// Stops the watcher and releases its cancellation signal. Idempotent.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.stop();
        self.run.lock().shutdown_tx = None;
        debug!(watcher = %self.shared.name, "Watcher disposed");
    }

    /// Runs the action once on the caller's thread, outside the schedule.
    ///
    /// Waits for any in-flight tick first. Returns `true` if the action
    /// succeeded; a failure goes to the fault handler like a scheduled tick.
    pub fn execute_procedure(&self) -> bool {
        let cancel = self
            .run
            .lock()
            .shutdown_tx
            .as_ref()
            .map(watch::Sender::subscribe);

        info!(watcher = %self.shared.name, "Executing procedure on demand");
        self.shared.manual_tick(cancel)
    }

    /// Blocks until no run is active or stopping, or `timeout` elapses.
    ///
    /// Returns `true` if the watcher reached [`WatcherState::Idle`].
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.state() == WatcherState::Idle {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(Duration::from_millis(5));
        }
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> WatcherState {
        let mut run = self.run.lock();
        if run.is_running() {
            WatcherState::Running
        } else if run.is_cancelling() {
            WatcherState::Cancelling
        } else {
            WatcherState::Idle
        }
    }

    pub fn is_running(&self) -> bool {
        self.run.lock().is_running()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn interval(&self) -> Duration {
        self.shared.interval
    }

    /// Returns the number of invocations so far, scheduled or manual.
    pub fn ticks(&self) -> u64 {
        self.shared.ticks.load(Ordering::SeqCst)
    }
}

impl Drop for PeriodicWatcher {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for PeriodicWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeriodicWatcher")
            .field("name", &self.shared.name)
            .field("interval", &self.shared.interval)
            .field("state", &self.state())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
