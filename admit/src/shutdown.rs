//! Operator interrupts (SIGINT/SIGTERM) turned into gate cancellation.

use std::future::Future;

use anyhow::Context;
use tracing::info;

use crate::gate::Gate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    Interrupt,
    Terminate,
}

/// Cancel `gate` once `trigger` completes, passing its output through.
pub async fn cancel_on<F: Future>(gate: Gate, trigger: F) -> F::Output {
    let output = trigger.await;
    gate.cancel();
    output
}

/// Cancel `gate` on Ctrl+C or (unix) SIGTERM.
///
/// Returns `None` without installing anything further if the gate is canceled
/// by someone else first. Errors only if a signal handler cannot be installed.
pub async fn cancel_on_signal(gate: Gate) -> anyhow::Result<Option<ShutdownReason>> {
    tokio::select! {
        _ = gate.done() => Ok(None),
        reason = shutdown_signal() => {
            let reason = reason?;
            gate.cancel();
            Ok(Some(reason))
        }
    }
}

async fn shutdown_signal() -> anyhow::Result<ShutdownReason> {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .context("failed to install Ctrl+C handler")
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .context("failed to install SIGTERM handler")?
            .recv()
            .await;
        anyhow::Ok(())
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<anyhow::Result<()>>();

    tokio::select! {
        res = ctrl_c => {
            res?;
            info!("Received SIGINT, canceling gate...");
            Ok(ShutdownReason::Interrupt)
        }
        res = terminate => {
            res?;
            info!("Received SIGTERM, canceling gate...");
            Ok(ShutdownReason::Terminate)
        }
    }
}
