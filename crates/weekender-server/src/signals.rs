//! Unix signal handling.
//!
//! - SIGTERM/SIGINT: graceful shutdown
//! - SIGHUP: refresh every venue now

use std::io;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info};

/// Turns process signals into shutdown and refresh notifications.
pub struct SignalHandler {
    shutdown_tx: Arc<watch::Sender<bool>>,
    shutdown_rx: watch::Receiver<bool>,
    /// Counts SIGHUPs so that none are lost between two `recv` calls.
    reload_tx: Arc<watch::Sender<u64>>,
    reload_rx: watch::Receiver<u64>,
}

impl Default for SignalHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalHandler {
    pub fn new() -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (reload_tx, reload_rx) = watch::channel(0);

        Self {
            shutdown_tx: Arc::new(shutdown_tx),
            shutdown_rx,
            reload_tx: Arc::new(reload_tx),
            reload_rx,
        }
    }

    /// Installs the signal handlers and spawns the listener task.
    ///
    /// Must be called from within a tokio runtime.
    #[cfg(unix)]
    pub fn spawn_listener(&self) -> io::Result<()> {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sighup = signal(SignalKind::hangup())?;

        let shutdown_tx = self.shutdown_tx.clone();
        let reload_tx = self.reload_tx.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = sigterm.recv() => {
                        info!("received SIGTERM, shutting down");
                        let _ = shutdown_tx.send(true);
                        break;
                    }
                    _ = sigint.recv() => {
                        info!("received SIGINT, shutting down");
                        let _ = shutdown_tx.send(true);
                        break;
                    }
                    _ = sighup.recv() => {
                        info!("received SIGHUP, refreshing venues");
                        reload_tx.send_modify(|n| *n += 1);
                    }
                }
            }
            debug!("signal listener stopped");
        });

        Ok(())
    }

    /// Only Ctrl+C is handled off Unix.
    #[cfg(not(unix))]
    pub fn spawn_listener(&self) -> io::Result<()> {
        let shutdown_tx = self.shutdown_tx.clone();

        tokio::spawn(async move {
            if let Ok(()) = tokio::signal::ctrl_c().await {
                info!("received Ctrl+C, shutting down");
                let _ = shutdown_tx.send(true);
            }
        });
        Ok(())
    }

    /// Returns a future source that completes once shutdown is signaled.
    pub fn shutdown(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.shutdown_rx.clone(),
        }
    }

    /// Returns a receiver of refresh requests.
    pub fn reload(&self) -> ReloadSignal {
        let mut rx = self.reload_rx.clone();
        rx.mark_unchanged();
        ReloadSignal { rx }
    }

    pub fn is_shutdown(&self) -> bool {
        *self.shutdown_rx.borrow()
    }

    pub fn trigger_shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    pub fn trigger_reload(&self) {
        self.reload_tx.send_modify(|n| *n += 1);
    }
}

/// Completes when shutdown is signaled.
#[derive(Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Waits for shutdown. Also returns if the handler is dropped.
    pub async fn wait(mut self) {
        let _ = self.rx.wait_for(|down| *down).await;
    }

    pub fn is_shutdown(&self) -> bool {
        *self.rx.borrow()
    }
}

/// Yields once per refresh request.
pub struct ReloadSignal {
    rx: watch::Receiver<u64>,
}

impl ReloadSignal {
    /// Waits for the next refresh request.
    ///
    /// Requests arriving while the caller is busy are coalesced into one.
    /// Returns `false` once the handler is gone.
    pub async fn recv(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}
