use tokio::signal;
use tokio::sync::mpsc;

/// Forward every Ctrl+C / SIGTERM to `tx` until the receiver is dropped.
///
/// Inside a proctored session these are exit attempts, not shutdown requests.
pub(crate) fn forward_close_requests(tx: mpsc::UnboundedSender<()>) {
    tokio::spawn(async move {
        #[cfg(unix)]
        let mut terminate = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(stream) => Some(stream),
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM handler");
                None
            }
        };

        loop {
            #[cfg(unix)]
            let terminate_signal = async {
                match terminate.as_mut() {
                    Some(stream) => {
                        stream.recv().await;
                    }
                    None => std::future::pending::<()>().await,
                }
            };

            #[cfg(not(unix))]
            let terminate_signal = std::future::pending::<()>();

            tokio::select! {
                result = signal::ctrl_c() => {
                    if let Err(err) = result {
                        tracing::error!(error = %err, "Failed to install Ctrl+C handler");
                        return;
                    }
                }
                _ = terminate_signal => {}
            }

            tracing::info!("close request received");
            if tx.send(()).is_err() {
                return;
            }
        }
    });
}
