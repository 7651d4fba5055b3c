use tokio::sync::watch;

/// Observable lifecycle of the listener.
///
/// Graceful shutdown walks RUNNING → DRAINING → STOPPED; a forced shutdown
/// jumps straight from RUNNING to STOPPED.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Running,
    Draining,
    Stopped,
}

/// How the server should come down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownKind {
    /// Stop accepting, let in-flight responses complete, then exit.
    Graceful,
    /// Close the listener and all connections immediately.
    Forced,
}

/// Sending half of the shutdown channel, held by the signal task (and by
/// tests driving the server directly).
#[derive(Clone)]
pub struct ShutdownHandle {
    tx: watch::Sender<Option<ShutdownKind>>,
}

impl ShutdownHandle {
    pub fn graceful(&self) {
        let _ = self.tx.send(Some(ShutdownKind::Graceful));
    }

    pub fn forced(&self) {
        let _ = self.tx.send(Some(ShutdownKind::Forced));
    }
}

/// Receiving half, awaited by the accept loop.
pub struct ShutdownSignal {
    rx: watch::Receiver<Option<ShutdownKind>>,
}

impl ShutdownSignal {
    /// Waits until a shutdown is requested. A dropped handle counts as a
    /// forced shutdown so the server never runs unsupervised.
    pub async fn recv(&mut self) -> ShutdownKind {
        loop {
            if let Some(kind) = *self.rx.borrow_and_update() {
                return kind;
            }
            if self.rx.changed().await.is_err() {
                return ShutdownKind::Forced;
            }
        }
    }
}

pub fn channel() -> (ShutdownHandle, ShutdownSignal) {
    let (tx, rx) = watch::channel(None);
    (ShutdownHandle { tx }, ShutdownSignal { rx })
}

/// Maps process termination signals onto the shutdown channel: interrupt
/// (Ctrl-C) drains gracefully, SIGTERM closes immediately.
pub async fn wait_for_signal(handle: ShutdownHandle) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut terminate = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {e}");
                return;
            }
        };

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupt received, shutting down gracefully");
                handle.graceful();
            }
            _ = terminate.recv() => {
                tracing::info!("terminate received, shutting down now");
                handle.forced();
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("interrupt received, shutting down gracefully");
        handle.graceful();
    }
}
