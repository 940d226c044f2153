use tokio::{signal, sync::watch};
use tracing::info;

/// Fires the process-wide shutdown. Dropping it without calling
/// [`ShutdownTrigger::trigger`] also releases every waiter.
#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

/// Cloneable view of the shutdown state, handed to every long-lived task.
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

pub fn channel() -> (ShutdownTrigger, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx }, Shutdown { rx })
}

impl ShutdownTrigger {
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }
}

impl Shutdown {
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once shutdown has been triggered (or the trigger is gone).
    pub async fn wait(&mut self) {
        // `Err` means the trigger was dropped; treat that as shutdown too.
        let _ = self.rx.wait_for(|stop| *stop).await;
    }

    /// Owned variant of [`Shutdown::wait`] for APIs that want a `'static`
    /// future, e.g. `axum::serve(..).with_graceful_shutdown(..)`.
    pub async fn wait_owned(mut self) {
        self.wait().await;
    }
}

/// Resolves on Ctrl+C or, on Unix, SIGTERM.
pub async fn os_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
