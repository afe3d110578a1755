//! Periodic feed polling and subscriber notification.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use herald_core::{MemorySource, Repository};
use herald_watch::{
    ChannelId, FaultHandler, NotificationContext, NotificationQueue, PeriodicWatcher,
    WatcherConfig, WatcherState,
};
use tracing::{debug, info};

use super::entities::{FeedEntry, Subscription};
use super::provider::ContentProvider;
use crate::commands::CommandSpec;

/// Repository type used by the host.
pub type HostRepository = Repository<MemorySource>;

/// Result of one poll.
#[derive(Debug, Clone, Copy, Default)]
struct PollReport {
    /// Entries seen for the first time.
    new_entries: usize,
    /// Notifications enqueued, one per subscribed channel.
    notified: usize,
}

struct FeedCore {
    name: String,
    repository: Arc<HostRepository>,
    provider: Arc<dyn ContentProvider>,
    queue: Arc<NotificationQueue>,
}

impl FeedCore {
    fn poll(&self) -> anyhow::Result<PollReport> {
        let entries = self.provider.latest()?;
        if entries.is_empty() {
            debug!(feed = %self.name, "Feed has no entries");
            return Ok(PollReport::default());
        }

        let ids: Vec<&str> = entries.iter().map(|e| e.id.as_str()).collect();
        let mut seen: HashSet<String> = self
            .repository
            .try_get_item::<FeedEntry>(&ids)?
            .into_iter()
            .map(|e| e.id)
            .collect();

        let fresh: Vec<FeedEntry> = entries
            .into_iter()
            .filter(|e| seen.insert(e.id.clone()))
            .collect();
        if fresh.is_empty() {
            debug!(feed = %self.name, "No new entries");
            return Ok(PollReport::default());
        }

        for entry in &fresh {
            self.repository.set_item(entry.clone())?;
        }

        let subscribers = self.subscribers()?;
        let message = self.render(&fresh);
        for subscription in &subscribers {
            self.queue
                .enqueue(NotificationContext::new(subscription.channel_id, message.clone()));
        }

        info!(
            feed = %self.name,
            new_entries = fresh.len(),
            notified = subscribers.len(),
            "Feed polled"
        );
        Ok(PollReport {
            new_entries: fresh.len(),
            notified: subscribers.len(),
        })
    }

    fn subscribers(&self) -> anyhow::Result<Vec<Subscription>> {
        Ok(self
            .repository
            .try_get_items::<Subscription>(|s| s.source == self.name)?)
    }

    fn render(&self, entries: &[FeedEntry]) -> String {
        let mut message = format!("New in {}:", self.name);
        for entry in entries {
            message.push('\n');
            message.push_str(&entry.title);
            message.push('\n');
            message.push_str(&entry.link);
        }
        message
    }

    fn toggle(&self, channel_id: ChannelId) -> anyhow::Result<bool> {
        let key = Subscription::key(channel_id, &self.name);
        let existing = self
            .repository
            .try_get_item::<Subscription>(&[key])?
            .into_iter()
            .next();

        match existing {
            Some(subscription) => {
                self.repository.delete_item(&subscription)?;
                info!(feed = %self.name, channel_id, "Channel unsubscribed");
                Ok(false)
            },
            None => {
                if !self
                    .repository
                    .set_item(Subscription::new(channel_id, self.name.as_str()))?
                {
                    anyhow::bail!("store declined subscription for channel {channel_id}");
                }
                info!(feed = %self.name, channel_id, "Channel subscribed");
                Ok(true)
            },
        }
    }
}

/// Polls a [`ContentProvider`] on a schedule and notifies subscribers of
/// entries not seen before.
pub struct FeedWatcher {
    core: Arc<FeedCore>,
    watcher: PeriodicWatcher,
}

impl FeedWatcher {
    /// Creates an idle feed watcher and registers its entity types.
    pub fn new(
        config: WatcherConfig,
        feed_name: impl Into<String>,
        repository: Arc<HostRepository>,
        provider: Arc<dyn ContentProvider>,
        queue: Arc<NotificationQueue>,
        fault_handler: Arc<dyn FaultHandler>,
    ) -> Self {
        repository.add_source_invocator::<Subscription>();
        repository.add_source_invocator::<FeedEntry>();

        let core = Arc::new(FeedCore {
            name: feed_name.into(),
            repository,
            provider,
            queue,
        });

        let polled = Arc::clone(&core);
        let watcher = PeriodicWatcher::new(
            config,
            move |ctx| {
                let report = polled.poll()?;
                debug!(
                    feed = %polled.name,
                    tick = ctx.tick(),
                    new_entries = report.new_entries,
                    notified = report.notified,
                    "Poll finished"
                );
                Ok(())
            },
            fault_handler,
        );

        Self { core, watcher }
    }

    pub fn name(&self) -> &str {
        &self.core.name
    }

    /// Polls once on the caller's thread. Returns `true` on success.
    ///
    /// Shares the scheduled tick's lock, so an entry is never announced
    /// twice by overlapping polls. Failures go to the fault handler.
    pub fn check_now(&self) -> bool {
        self.watcher.execute_procedure()
    }

    /// Subscribes `channel_id` if it is not subscribed, otherwise
    /// unsubscribes it. Returns the new subscription state.
    pub fn toggle_subscription(&self, channel_id: ChannelId) -> anyhow::Result<bool> {
        self.core.toggle(channel_id)
    }

    pub fn subscribers(&self) -> anyhow::Result<Vec<Subscription>> {
        self.core.subscribers()
    }

    pub fn start(&self) -> bool {
        self.watcher.start()
    }

    pub fn stop(&self) {
        self.watcher.stop();
    }

    pub fn dispose(&self) {
        self.watcher.dispose();
    }

    pub fn state(&self) -> WatcherState {
        self.watcher.state()
    }

    pub fn wait_idle(&self, timeout: Duration) -> bool {
        self.watcher.wait_idle(timeout)
    }

    /// Commands exposed by this feature: `notify` and `check`.
    pub fn commands(self: &Arc<Self>) -> Vec<CommandSpec> {
        let toggled = Arc::clone(self);
        let checked = Arc::clone(self);

        vec![
            CommandSpec::new(
                "notify",
                "Toggles feed notifications for this channel",
                move |ctx| {
                    let subscribed = toggled.toggle_subscription(ctx.channel_id)?;
                    let verb = if subscribed { "subscribed to" } else { "unsubscribed from" };
                    Ok(Some(format!("Channel {} {} {}.", ctx.channel_id, verb, toggled.name())))
                },
            )
            .alias("subscribe"),
            CommandSpec::new("check", "Polls the feed now", move |_| {
                let reply = if checked.check_now() {
                    format!("Checked {}.", checked.name())
                } else {
                    format!("Checking {} failed, see logs.", checked.name())
                };
                Ok(Some(reply))
            })
            .alias("test"),
        ]
    }
}

impl std::fmt::Debug for FeedWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedWatcher")
            .field("name", &self.core.name)
            .field("watcher", &self.watcher)
            .finish()
    }
}
