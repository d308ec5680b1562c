//! Turn SIGINT / SIGTERM into cancellation of the running batch.

use tokio_util::sync::CancellationToken;

/// Spawn a task that cancels `cancel` on the first shutdown signal.
///
/// Must be called from within a tokio runtime.
pub fn install(cancel: CancellationToken) {
    tokio::spawn(async move {
        tokio::select! {
            signal = wait_for_signal() => match signal {
                Ok(name) => {
                    tracing::info!("Received {}, terminating conversions", name);
                    cancel.cancel();
                }
                Err(e) => tracing::warn!("Failed to install signal handler: {}", e),
            },
            _ = cancel.cancelled() => {}
        }
    });
}

async fn wait_for_signal() -> std::io::Result<&'static str> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut terminate = signal(SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result.map(|_| "SIGINT"),
            _ = terminate.recv() => Ok("SIGTERM"),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.map(|_| "Ctrl+C")
    }
}
