//! Herald binary.

use std::sync::Arc;
use std::time::Duration;

use herald_host::{Host, Settings, logging};
use tokio::io::{AsyncBufReadExt, BufReader};

fn main() -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(run());
    // A pending stdin read cannot be cancelled; don't wait on it.
    runtime.shutdown_timeout(Duration::from_millis(500));
    result
}

async fn run() -> anyhow::Result<()> {
    let settings = Settings::load()?;
    logging::init(&settings.log_level)?;
    herald_core::register_cache_metrics();

    tracing::info!("Starting Herald v{}", env!("CARGO_PKG_VERSION"));

    let host = Arc::new(Host::from_settings(settings)?);
    host.start();
    tracing::info!("Available commands:\n{}", host.commands().help());

    let console = tokio::spawn(console_loop(Arc::clone(&host)));
    shutdown_signal().await;
    console.abort();

    let stopping = Arc::clone(&host);
    let snapshot = tokio::task::spawn_blocking(move || stopping.shutdown()).await??;
    tracing::info!("Final statistics:\n{}", snapshot.display_string());

    Ok(())
}

/// Treats each stdin line as a command from the console channel.
async fn console_loop(host: Arc<Host>) {
    let channel_id = host.settings().commands.console_channel;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Ok(Some(line)) = lines.next_line().await {
        let handler = Arc::clone(&host);
        let outcome =
            tokio::task::spawn_blocking(move || handler.handle_line(channel_id, &line)).await;

        match outcome {
            Ok(Ok(Some(reply))) => println!("{reply}"),
            Ok(Ok(None)) => {},
            Ok(Err(e)) => tracing::warn!("{}", e),
            Err(e) => tracing::error!("Command task failed: {}", e),
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
