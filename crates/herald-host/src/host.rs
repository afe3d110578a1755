//! Composition root.

use std::sync::Arc;
use std::time::Duration;

use herald_core::{MemorySource, Repository, TypedCacheStore};
use herald_watch::{
    ChannelId, ChunkingFormatter, FaultHandler, MessageSender, NotificationQueue,
};
use tracing::{info, warn};

use crate::commands::{CommandError, CommandRegistry, CommandSpec};
use crate::error::HostResult;
use crate::feed::{ContentProvider, EmptyProvider, FeedWatcher, HostRepository, JsonFileProvider};
use crate::sender::LogSender;
use crate::settings::Settings;
use crate::stats::{Statistics, StatisticsSnapshot, StatsFaultHandler};

/// How long shutdown waits for background threads to exit.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Owns every long-lived component of a Herald process.
pub struct Host {
    settings: Settings,
    statistics: Arc<Statistics>,
    repository: Arc<HostRepository>,
    queue: Arc<NotificationQueue>,
    feed: Arc<FeedWatcher>,
    commands: CommandRegistry,
}

impl Host {
    /// Builds a host from settings, reading feed entries from
    /// `feed.source` and delivering notifications to the log.
    pub fn from_settings(settings: Settings) -> HostResult<Self> {
        let provider: Arc<dyn ContentProvider> = match &settings.feed.source {
            Some(path) => Arc::new(JsonFileProvider::new(path)),
            None => Arc::new(EmptyProvider),
        };
        Self::build(settings, provider, Arc::new(LogSender))
    }

    /// Wires every component. Nothing is started.
    pub fn build(
        settings: Settings,
        provider: Arc<dyn ContentProvider>,
        sender: Arc<dyn MessageSender>,
    ) -> HostResult<Self> {
        settings.validate()?;

        let statistics = Arc::new(Statistics::new());
        let fault_handler: Arc<dyn FaultHandler> =
            Arc::new(StatsFaultHandler::new(Arc::clone(&statistics)));

        let repository = Arc::new(Repository::new(
            Arc::new(TypedCacheStore::new()),
            Arc::new(MemorySource::new("host")),
        ));
        repository.add_source_invocator::<StatisticsSnapshot>();

        let queue = Arc::new(NotificationQueue::new(
            settings.queue_config(),
            sender,
            Arc::new(ChunkingFormatter::new(settings.formatter.max_message_length)),
            Arc::clone(&fault_handler),
        ));

        let feed = Arc::new(FeedWatcher::new(
            settings.feed_watcher_config(),
            settings.feed.name.clone(),
            Arc::clone(&repository),
            provider,
            Arc::clone(&queue),
            fault_handler,
        ));

        let commands = CommandRegistry::builder()
            .prefix(settings.commands.prefix.clone())
            .statistics(Arc::clone(&statistics))
            .commands(feed.commands())
            .command(stats_command(Arc::clone(&statistics)))
            .build()?;

        Ok(Self {
            settings,
            statistics,
            repository,
            queue,
            feed,
            commands,
        })
    }

    /// Starts the notification drain and the feed poll.
    pub fn start(&self) {
        self.queue.start();
        self.feed.start();
        info!(
            feed = %self.feed.name(),
            poll_interval = ?self.settings.feed.poll_interval,
            drain_interval = ?self.settings.queue.drain_interval,
            "Host started"
        );
    }

    /// Handles one line of user input from `channel_id`.
    pub fn handle_line(
        &self,
        channel_id: ChannelId,
        line: &str,
    ) -> Result<Option<String>, CommandError> {
        self.commands.handle_line(channel_id, line)
    }

    /// Stops background work, flushes pending notifications and persists a
    /// statistics snapshot.
    ///
    /// Blocks until the background threads exit or the grace period ends.
    pub fn shutdown(&self) -> HostResult<StatisticsSnapshot> {
        self.feed.dispose();
        self.queue.stop();

        if !self.feed.wait_idle(SHUTDOWN_GRACE) || !self.queue.wait_idle(SHUTDOWN_GRACE) {
            warn!("Background work still running after grace period");
        }

        let report = self.queue.drain();
        if report.attempted() > 0 {
            info!(delivered = report.delivered, failed = report.failed, "Flushed notifications");
        }
        self.queue.dispose();

        let snapshot = self.statistics.snapshot();
        self.repository.set_item(snapshot.clone())?;
        info!(
            snapshot = %serde_json::to_string(&snapshot).unwrap_or_default(),
            "Host stopped"
        );
        Ok(snapshot)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn statistics(&self) -> &Arc<Statistics> {
        &self.statistics
    }

    pub fn repository(&self) -> &Arc<HostRepository> {
        &self.repository
    }

    pub fn queue(&self) -> &Arc<NotificationQueue> {
        &self.queue
    }

    pub fn feed(&self) -> &Arc<FeedWatcher> {
        &self.feed
    }

    pub fn commands(&self) -> &CommandRegistry {
        &self.commands
    }
}

impl std::fmt::Debug for Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Host")
            .field("feed", &self.feed)
            .field("queue", &self.queue)
            .field("commands", &self.commands)
            .finish_non_exhaustive()
    }
}

fn stats_command(statistics: Arc<Statistics>) -> CommandSpec {
    CommandSpec::new(
        "stats",
        "Shows runtime statistics; `stats reset` clears them",
        move |ctx| {
            if ctx.args.first().is_some_and(|arg| arg == "reset") {
                statistics.reset();
                return Ok(Some("Statistics reset.".to_string()));
            }
            Ok(Some(statistics.snapshot().display_string()))
        },
    )
    .alias("statistics")
}
