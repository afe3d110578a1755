//! Delivery tests for NotificationQueue.

mod common;

use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use common::{FaultLog, RecordingSender, wait_until};
use herald_watch::{
    ChunkingFormatter, DrainReport, MessageSender, NotificationContext, NotificationQueue,
    QueueConfig,
};

fn queue_with(
    sender: Arc<dyn MessageSender>,
    faults: Arc<FaultLog>,
    drain_interval: Duration,
) -> NotificationQueue {
    NotificationQueue::new(
        QueueConfig {
            name: "test-queue".to_string(),
            drain_interval,
        },
        sender,
        Arc::new(ChunkingFormatter::new(2000)),
        faults,
    )
}

#[test]
fn test_concurrent_producers_all_delivered_in_order() {
    let sender = Arc::new(RecordingSender::new());
    let queue = Arc::new(queue_with(
        sender.clone(),
        FaultLog::shared(),
        Duration::from_secs(60),
    ));

    let producers: Vec<_> = (0..8u64)
        .map(|producer| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for seq in 0..25 {
                    queue.enqueue(NotificationContext::new(producer, format!("msg-{seq}")));
                }
            })
        })
        .collect();
    for producer in producers {
        producer.join().unwrap();
    }

    assert_eq!(queue.len(), 200);
    let report = queue.drain();
    assert_eq!(report.delivered, 200);

    let sent = sender.sent();
    for producer in 0..8u64 {
        let ordered: Vec<_> = sent
            .iter()
            .filter(|(channel, _)| *channel == producer)
            .map(|(_, text)| text.clone())
            .collect();
        let expected: Vec<_> = (0..25).map(|seq| format!("msg-{seq}")).collect();
        assert_eq!(ordered, expected);
    }
}

#[test]
fn test_failing_item_does_not_block_later_items() {
    let sender = Arc::new(RecordingSender::new());
    let faults = FaultLog::shared();
    let queue = queue_with(sender.clone(), faults.clone(), Duration::from_millis(10));

    queue.enqueue(NotificationContext::new(1, "one"));
    queue.enqueue(NotificationContext::new(2, "fail two"));
    queue.enqueue(NotificationContext::new(3, "panic three"));
    queue.enqueue(NotificationContext::new(4, "four"));
    queue.enqueue(NotificationContext::new(5, "five"));

    queue.start();
    assert!(wait_until(Duration::from_secs(2), || sender.sent_count() == 3));
    queue.stop();
    assert!(queue.wait_idle(Duration::from_secs(2)));

    assert_eq!(
        sender.sent(),
        vec![
            (1, "one".to_string()),
            (4, "four".to_string()),
            (5, "five".to_string())
        ]
    );
    assert_eq!(faults.count(), 2);
    assert!(queue.is_empty());
}

#[test]
fn test_missing_channel_is_dropped_without_fault() {
    let sender = Arc::new(RecordingSender::new().without_channel(9));
    let faults = FaultLog::shared();
    let queue = queue_with(sender.clone(), faults.clone(), Duration::from_secs(60));

    queue.enqueue(NotificationContext::new(9, "nobody home"));
    queue.enqueue(NotificationContext::new(1, "hello"));

    assert_eq!(
        queue.drain(),
        DrainReport {
            delivered: 1,
            dropped: 1,
            failed: 0
        }
    );
    assert_eq!(faults.count(), 0);
}

/// Blocks inside `deliver` until the test releases it.
struct GatedSender {
    entered: mpsc::SyncSender<()>,
    release: parking_lot::Mutex<mpsc::Receiver<()>>,
    inner: RecordingSender,
}

impl MessageSender for GatedSender {
    fn resolve(&self, channel_id: u64) -> bool {
        self.inner.resolve(channel_id)
    }

    fn deliver(&self, channel_id: u64, text: &str) -> anyhow::Result<()> {
        if text == "gate" {
            self.entered.send(())?;
            self.release.lock().recv_timeout(Duration::from_secs(2))?;
        }
        self.inner.deliver(channel_id, text)
    }
}

#[test]
fn test_enqueue_does_not_wait_for_delivery() {
    let (entered_tx, entered_rx) = mpsc::sync_channel(1);
    let (release_tx, release_rx) = mpsc::channel();
    let sender = Arc::new(GatedSender {
        entered: entered_tx,
        release: parking_lot::Mutex::new(release_rx),
        inner: RecordingSender::new(),
    });
    let queue = Arc::new(queue_with(
        sender.clone(),
        FaultLog::shared(),
        Duration::from_secs(60),
    ));

    queue.enqueue(NotificationContext::new(1, "gate"));
    let drainer = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || queue.drain())
    };

    entered_rx.recv_timeout(Duration::from_secs(2)).unwrap();
    queue.enqueue(NotificationContext::new(2, "late"));
    release_tx.send(()).unwrap();

    let report = drainer.join().unwrap();
    assert_eq!(report.delivered, 2);
    assert_eq!(
        sender.inner.sent(),
        vec![(1, "gate".to_string()), (2, "late".to_string())]
    );
}

#[test]
fn test_manual_drain_waits_for_scheduled_drain() {
    let (entered_tx, entered_rx) = mpsc::sync_channel(1);
    let (release_tx, release_rx) = mpsc::channel();
    let sender = Arc::new(GatedSender {
        entered: entered_tx,
        release: parking_lot::Mutex::new(release_rx),
        inner: RecordingSender::new(),
    });
    let queue = Arc::new(queue_with(
        sender.clone(),
        FaultLog::shared(),
        Duration::from_millis(5),
    ));

    queue.enqueue(NotificationContext::new(1, "gate"));
    assert!(queue.start());
    entered_rx.recv_timeout(Duration::from_secs(2)).unwrap();

    queue.enqueue(NotificationContext::new(2, "second"));
    let manual = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || queue.drain())
    };
    thread::sleep(Duration::from_millis(30));
    assert!(sender.inner.sent().is_empty());
    release_tx.send(()).unwrap();

    let report = manual.join().unwrap();
    assert!(wait_until(Duration::from_secs(2), || sender.inner.sent_count() == 2));
    queue.stop();
    assert!(queue.wait_idle(Duration::from_secs(2)));

    assert!(report.delivered <= 1);
    assert_eq!(
        sender.inner.sent(),
        vec![(1, "gate".to_string()), (2, "second".to_string())]
    );
    assert!(queue.is_empty());
}

#[test]
fn test_dispose_stops_draining() {
    let sender = Arc::new(RecordingSender::new());
    let queue = queue_with(sender.clone(), FaultLog::shared(), Duration::from_millis(5));

    queue.start();
    queue.dispose();
    assert!(queue.wait_idle(Duration::from_secs(2)));
    assert!(!queue.start());

    queue.enqueue(NotificationContext::new(1, "never sent"));
    thread::sleep(Duration::from_millis(30));
    assert_eq!(sender.sent_count(), 0);
    assert_eq!(queue.len(), 1);
}
