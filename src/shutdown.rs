// src/shutdown.rs
//! Running -> Stopping on SIGINT/SIGTERM. Stopping is terminal.

use std::future::Future;

use crate::stream::StreamHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownState {
    Running,
    Stopping,
}

#[derive(Debug)]
pub struct ShutdownCoordinator {
    handle: Option<StreamHandle>,
    state: ShutdownState,
}

impl ShutdownCoordinator {
    pub fn new(handle: StreamHandle) -> Self {
        Self {
            handle: Some(handle),
            state: ShutdownState::Running,
        }
    }

    pub fn state(&self) -> ShutdownState {
        self.state
    }

    /// Wait for `signal`, then stop the stream. In-flight handler work is
    /// left to finish; only new events are cut off.
    pub async fn run<F>(&mut self, signal: F) -> ShutdownState
    where
        F: Future<Output = ()>,
    {
        signal.await;
        tracing::info!("termination signal received, stopping stream");
        self.stop().await;
        self.state
    }

    /// Transition to `Stopping`. The handle is stopped on the first call only.
    pub async fn stop(&mut self) {
        self.state = ShutdownState::Stopping;
        if let Some(handle) = self.handle.take() {
            handle.stop().await;
        }
    }
}

/// Resolves on the first SIGINT (Ctrl+C) or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { tracing::info!("received SIGINT"); }
        () = terminate => { tracing::info!("received SIGTERM"); }
    }
}
