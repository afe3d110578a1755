//! Shared fixtures for herald-host integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use herald_host::{ContentProvider, FeedEntry, Host, Settings};
use herald_watch::{ChannelId, MessageSender};
use parking_lot::Mutex;

/// Provider whose entries the test controls.
#[derive(Default)]
pub struct StaticProvider {
    entries: Mutex<Vec<FeedEntry>>,
    failing: AtomicBool,
}

impl StaticProvider {
    pub fn publish(&self, id: &str) {
        self.entries.lock().push(FeedEntry::new(
            id,
            format!("Title {id}"),
            format!("https://example.com/{id}"),
        ));
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl ContentProvider for StaticProvider {
    fn latest(&self) -> anyhow::Result<Vec<FeedEntry>> {
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("feed unreachable");
        }
        Ok(self.entries.lock().clone())
    }
}

/// Sender that collects every delivered chunk.
#[derive(Default)]
pub struct CollectingSender {
    sent: Mutex<Vec<(ChannelId, String)>>,
}

impl CollectingSender {
    pub fn sent(&self) -> Vec<(ChannelId, String)> {
        self.sent.lock().clone()
    }
}

impl MessageSender for CollectingSender {
    fn resolve(&self, _channel_id: ChannelId) -> bool {
        true
    }

    fn deliver(&self, channel_id: ChannelId, text: &str) -> anyhow::Result<()> {
        self.sent.lock().push((channel_id, text.to_string()));
        Ok(())
    }
}

pub struct Fixture {
    pub host: Host,
    pub provider: Arc<StaticProvider>,
    pub sender: Arc<CollectingSender>,
}

/// Host with slow schedules, driven manually by the test.
pub fn fixture() -> Fixture {
    fixture_with(Duration::from_secs(3600), Duration::from_secs(3600))
}

pub fn fixture_with(poll_interval: Duration, drain_interval: Duration) -> Fixture {
    let mut settings = Settings::default();
    settings.feed.poll_interval = poll_interval;
    settings.queue.drain_interval = drain_interval;

    let provider = Arc::new(StaticProvider::default());
    let sender = Arc::new(CollectingSender::default());
    let host = Host::build(settings, provider.clone(), sender.clone()).unwrap();

    Fixture {
        host,
        provider,
        sender,
    }
}

pub fn wait_until(timeout: Duration, condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    condition()
}
