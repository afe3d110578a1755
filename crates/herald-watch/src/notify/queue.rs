//! Buffered notification delivery on a periodic drain.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::format::MessageFormatter;
use super::message::{MessageSender, NotificationContext};
use crate::error::WatchError;
use crate::watcher::{FaultHandler, PeriodicWatcher, WatcherConfig, WatcherState, isolate};

/// Configuration for a notification queue.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Name of the drain watcher.
    pub name: String,
    /// Delay between drains.
    pub drain_interval: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            name: "notification-queue".to_string(),
            drain_interval: Duration::from_secs(60),
        }
    }
}

/// Outcome of one drain cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Every chunk was sent.
    pub delivered: usize,
    /// The channel did not resolve.
    pub dropped: usize,
    /// Formatting or sending faulted.
    pub failed: usize,
}

impl DrainReport {
    pub fn attempted(&self) -> usize {
        self.delivered + self.dropped + self.failed
    }
}

struct QueueCore {
    name: String,
    items: Mutex<VecDeque<NotificationContext>>,
    /// Held for a whole drain so only one consumer pops at a time.
    consumer: Mutex<()>,
    sender: Arc<dyn MessageSender>,
    formatter: Arc<dyn MessageFormatter>,
    fault_handler: Arc<dyn FaultHandler>,
}

impl QueueCore {
    fn pop(&self) -> Option<NotificationContext> {
        self.items.lock().pop_front()
    }

    fn drain(&self) -> DrainReport {
        let _consumer = self.consumer.lock();
        let pending = self.items.lock().len();
        info!(queue = %self.name, items = pending, "Processing notifications");

        let mut report = DrainReport::default();
        while let Some(notification) = self.pop() {
            self.deliver(&notification, &mut report);
        }

        if report.attempted() > 0 {
            debug!(
                queue = %self.name,
                delivered = report.delivered,
                dropped = report.dropped,
                failed = report.failed,
                "Drain finished"
            );
        }
        report
    }

    /// Sends one notification; a fault here never reaches the next item.
    fn deliver(&self, notification: &NotificationContext, report: &mut DrainReport) {
        let channel_id = notification.channel_id;
        let mut unresolved = false;

        let ok = isolate(&self.name, self.fault_handler.as_ref(), || {
            if !self.sender.resolve(channel_id) {
                unresolved = true;
                return Ok(());
            }
            for chunk in self.formatter.split_message(&notification.message) {
                self.sender
                    .deliver(channel_id, &chunk)
                    .map_err(|e| WatchError::delivery(channel_id, e))?;
            }
            Ok(())
        });

        if unresolved {
            warn!(queue = %self.name, channel_id, "Channel not found, notification dropped");
            report.dropped += 1;
        } else if ok {
            report.delivered += 1;
        } else {
            report.failed += 1;
        }
    }
}

/// FIFO buffer of notifications, drained by its own periodic watcher.
///
/// Producers enqueue from any thread without waiting on delivery; each
/// drain takes items one at a time and releases the buffer between them.
/// Drains never overlap: a manual [`drain`](Self::drain) issued while the
/// periodic one is delivering waits for it, so delivery stays in FIFO order.
pub struct NotificationQueue {
    core: Arc<QueueCore>,
    watcher: PeriodicWatcher,
}

impl NotificationQueue {
    /// Creates a queue. Call [`start`](Self::start) to begin draining.
    pub fn new(
        config: QueueConfig,
        sender: Arc<dyn MessageSender>,
        formatter: Arc<dyn MessageFormatter>,
        fault_handler: Arc<dyn FaultHandler>,
    ) -> Self {
        let core = Arc::new(QueueCore {
            name: config.name.clone(),
            items: Mutex::new(VecDeque::new()),
            consumer: Mutex::new(()),
            sender,
            formatter,
            fault_handler: Arc::clone(&fault_handler),
        });

        let drained = Arc::clone(&core);
        let watcher = PeriodicWatcher::new(
            WatcherConfig::new(config.name, config.drain_interval),
            move |_| {
                drained.drain();
                Ok(())
            },
            fault_handler,
        );

        Self { core, watcher }
    }

    /// Appends a notification and returns the new queue depth.
    pub fn enqueue(&self, notification: NotificationContext) -> usize {
        let channel_id = notification.channel_id;
        let depth = {
            let mut items = self.core.items.lock();
            items.push_back(notification);
            items.len()
        };
        info!(queue = %self.core.name, channel_id, depth, "Notification enqueued");
        depth
    }

    /// Delivers everything currently queued on the caller's thread.
    ///
    /// Blocks while another drain is in progress.
    pub fn drain(&self) -> DrainReport {
        self.core.drain()
    }

    pub fn len(&self) -> usize {
        self.core.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.core.items.lock().is_empty()
    }

    /// Starts the periodic drain.
    pub fn start(&self) -> bool {
        self.watcher.start()
    }

    /// Stops the periodic drain. Queued items are kept.
    pub fn stop(&self) {
        self.watcher.stop();
    }

    /// Stops draining for good. Items still queued are not delivered.
    pub fn dispose(&self) {
        let pending = self.len();
        if pending > 0 && !self.watcher.is_disposed() {
            warn!(queue = %self.core.name, pending, "Disposing queue with undelivered notifications");
        }
        self.watcher.dispose();
    }

    pub fn is_running(&self) -> bool {
        self.watcher.is_running()
    }

    pub fn state(&self) -> WatcherState {
        self.watcher.state()
    }

    /// Blocks until the drain watcher is idle or `timeout` elapses.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        self.watcher.wait_idle(timeout)
    }
}

impl std::fmt::Debug for NotificationQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationQueue")
            .field("name", &self.core.name)
            .field("len", &self.len())
            .field("watcher", &self.watcher)
            .finish()
    }
}
