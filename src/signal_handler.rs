use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::signal;
use tokio::sync::Notify;
use tracing::{info, warn};

/// Process-wide shutdown flag, set by Ctrl-C, SIGTERM or [`SignalHandler::request_shutdown`].
#[derive(Clone, Default)]
pub struct SignalHandler {
    shutdown_requested: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl SignalHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown_requested.load(Ordering::Acquire)
    }

    pub fn request_shutdown(&self) {
        if !self.shutdown_requested.swap(true, Ordering::AcqRel) {
            info!("Graceful shutdown requested");
        }
        self.notify.notify_waiters();
    }

    /// Resolve once a shutdown signal arrives. Suitable for
    /// `axum::serve(..).with_graceful_shutdown`.
    pub async fn wait_for_shutdown(self) {
        let ctrl_c = async {
            if let Err(e) = signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                }
                Err(e) => {
                    warn!("Failed to create SIGTERM handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        let requested = async {
            let notified = self.notify.notified();
            if !self.is_shutdown_requested() {
                notified.await;
            }
        };

        tokio::select! {
            _ = ctrl_c => warn!("Received Ctrl-C"),
            _ = terminate => warn!("Received SIGTERM signal"),
            _ = requested => {},
        }
        self.request_shutdown();
    }
}
