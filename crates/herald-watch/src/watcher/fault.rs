//! Fault isolation for watcher ticks and queue deliveries.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tracing::error;

use crate::error::WatchError;

/// Receives faults caught at an isolation boundary.
///
/// Implementations must not panic: a handler runs on the watcher thread
/// and is itself outside any boundary.
pub trait FaultHandler: Send + Sync {
    /// Called once per caught fault.
    fn on_fault(&self, fault: &WatchError);
}

impl<F> FaultHandler for F
where
    F: Fn(&WatchError) + Send + Sync,
{
    fn on_fault(&self, fault: &WatchError) {
        self(fault)
    }
}

/// Fault handler that only logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogFaultHandler;

impl FaultHandler for LogFaultHandler {
    fn on_fault(&self, fault: &WatchError) {
        error!(error = %fault, terminal = fault.is_terminal(), "Caught fault");
    }
}

/// Runs `f`, converting both an error and a panic into a reported fault.
///
/// Returns `true` if `f` completed successfully.
pub fn isolate<F>(scope: &str, handler: &dyn FaultHandler, f: F) -> bool
where
    F: FnOnce() -> Result<(), WatchError>,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(())) => true,
        Ok(Err(fault)) => {
            handler.on_fault(&fault);
            false
        },
        Err(payload) => {
            let fault = WatchError::panicked(scope, panic_message(payload.as_ref()));
            handler.on_fault(&fault);
            false
        },
    }
}

/// Extracts a readable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn recorder() -> (std::sync::Arc<Mutex<Vec<String>>>, impl FaultHandler) {
        let seen = std::sync::Arc::new(Mutex::new(Vec::new()));
        let sink = std::sync::Arc::clone(&seen);
        (seen, move |fault: &WatchError| sink.lock().push(fault.to_string()))
    }

    #[test]
    fn test_success_reports_nothing() {
        let (seen, handler) = recorder();
        assert!(isolate("tick", &handler, || Ok(())));
        assert!(seen.lock().is_empty());
    }

    #[test]
    fn test_error_is_reported() {
        let (seen, handler) = recorder();
        let ok = isolate("tick", &handler, || {
            Err(WatchError::action("feed", anyhow::anyhow!("offline")))
        });

        assert!(!ok);
        assert_eq!(*seen.lock(), vec!["watcher 'feed' action failed: offline"]);
    }

    #[test]
    fn test_panic_is_reported() {
        let (seen, handler) = recorder();
        let ok = isolate("tick", &handler, || panic!("boom"));

        assert!(!ok);
        assert_eq!(*seen.lock(), vec!["'tick' panicked: boom"]);
    }

    #[test]
    fn test_formatted_panic_message() {
        let (seen, handler) = recorder();
        isolate("tick", &handler, || panic!("item {} missing", 3));
        assert_eq!(*seen.lock(), vec!["'tick' panicked: item 3 missing"]);
    }
}
