use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::config::Config;
use crate::http::connection::Connection;
use crate::serve::{MimeTable, StaticHandler};
use crate::server::shutdown::{LifecycleState, ShutdownKind, ShutdownSignal};

/// The bound server, ready to accept connections.
#[derive(Debug)]
pub struct Server {
    listener: TcpListener,
    handler: Arc<StaticHandler>,
    read_timeout: Duration,
    state: watch::Sender<LifecycleState>,
}

impl Server {
    /// Binds the configured address. Bind failure is the only startup-fatal
    /// condition; the caller logs it and exits non-zero.
    pub async fn bind(cfg: &Config) -> anyhow::Result<Self> {
        let addr = cfg.listen_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("failed to bind {addr} (is the port already in use?)"))?;

        let mime = Arc::new(MimeTable::new());
        let handler = Arc::new(StaticHandler::new(cfg, mime));
        let (state, _) = watch::channel(LifecycleState::Running);

        info!(
            "serving {} at http://{}",
            cfg.root.display(),
            listener.local_addr()?
        );

        Ok(Self {
            listener,
            handler,
            read_timeout: Duration::from_secs(cfg.request_timeout_secs),
            state,
        })
    }

    /// The address actually bound, useful when the configured port is 0.
    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        self.listener.local_addr().context("listener address")
    }

    /// A watch on the lifecycle state, for supervision and tests.
    pub fn state(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    /// Accepts connections until shutdown is requested.
    ///
    /// Graceful shutdown closes the listener first, then waits for every
    /// in-flight connection task to finish. Forced shutdown aborts them.
    pub async fn run(self, mut shutdown: ShutdownSignal) -> anyhow::Result<()> {
        let Server {
            listener,
            handler,
            read_timeout,
            state,
        } = self;

        let mut tasks: JoinSet<()> = JoinSet::new();

        let kind = loop {
            tokio::select! {
                accepted = listener.accept() => {
                    match accepted {
                        Ok((socket, peer)) => {
                            let handler = handler.clone();
                            tasks.spawn(async move {
                                let mut conn = Connection::new(socket, handler, read_timeout);
                                if let Err(e) = conn.run().await {
                                    warn!("connection error from {}: {}", peer, e);
                                }
                            });
                        }
                        Err(e) => {
                            warn!("accept failed: {e}");
                        }
                    }
                }

                kind = shutdown.recv() => {
                    break kind;
                }
            }
        };

        // No new connections past this point.
        drop(listener);

        match kind {
            ShutdownKind::Graceful => {
                info!("draining {} in-flight connection(s)", tasks.len());
                state.send_replace(LifecycleState::Draining);
                while tasks.join_next().await.is_some() {}
            }
            ShutdownKind::Forced => {
                tasks.abort_all();
            }
        }

        state.send_replace(LifecycleState::Stopped);
        info!("server stopped");
        Ok(())
    }
}
