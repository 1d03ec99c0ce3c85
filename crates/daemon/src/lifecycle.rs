// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup and shutdown of the fortress.

use std::sync::Arc;
use std::time::Duration;

use keep_fortress::{
    BoxError, Fortress, FortressError, Guard, Guest, TracedGuard, TracedGuest, Worker,
};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::{ConfigError, FortressConfig};

/// Name the daemon's fortress is logged under
const FORTRESS_NAME: &str = "keepd";

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to unlock fortress: {0}")]
    Unlock(#[source] FortressError),

    #[error("fortress stopped abnormally: {0}")]
    Stopped(#[source] BoxError),

    #[error("logging setup failed: {0}")]
    Logging(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A running fortress owned by the daemon
pub struct Supervisor {
    config: FortressConfig,
    fortress: Fortress,
    guard: TracedGuard<Fortress>,
}

/// Start the fortress and apply the configured initial state
pub async fn startup(config: &FortressConfig) -> Result<Supervisor, LifecycleError> {
    let fortress = Fortress::new();
    let guard = TracedGuard::new(FORTRESS_NAME, fortress.clone());

    if config.start_unlocked {
        let ctx = deadline(config.unlock_timeout);
        let unlocked = guard.unlock(&ctx).await;
        ctx.cancel();
        if let Err(e) = unlocked {
            fortress.kill();
            return Err(LifecycleError::Unlock(e));
        }
    }

    info!(unlocked = config.start_unlocked, "fortress started");
    Ok(Supervisor {
        config: config.clone(),
        fortress,
        guard,
    })
}

impl Supervisor {
    /// Guard capability for the component that needs exclusive access
    pub fn guard(&self) -> Arc<dyn Guard> {
        Arc::new(self.guard.clone())
    }

    /// Guest capability for components needing shared access
    pub fn guest(&self, name: &str) -> Arc<dyn Guest> {
        Arc::new(TracedGuest::new(
            format!("{}/{}", FORTRESS_NAME, name),
            self.fortress.clone(),
        ))
    }

    /// Shut the fortress down gracefully
    ///
    /// Locks down first so no new visits start, waiting up to the drain
    /// timeout for running ones. Visits still running when the timeout
    /// expires are left to finish; the fortress is stopped and this
    /// returns only once they have.
    pub async fn shutdown(self) -> Result<(), LifecycleError> {
        info!("Shutting down fortress...");

        // 1. Stop admitting visits and give running ones a chance to drain
        let ctx = deadline(self.config.drain_timeout);
        let drained = self.guard.lockdown(&ctx).await;
        ctx.cancel();
        match drained {
            Ok(()) => info!("all visits drained"),
            Err(FortressError::Aborted) => warn!(
                active = self.fortress.active_visits(),
                "drain timeout elapsed, stopping with visits in flight"
            ),
            Err(e) => warn!(error = %e, "lockdown failed"),
        }

        // 2. Stop the control loop
        self.fortress.kill();

        // 3. Wait for the loop to exit and every admitted visit to return
        self.fortress
            .wait()
            .await
            .map_err(LifecycleError::Stopped)?;

        info!("Fortress shutdown complete");
        Ok(())
    }
}

/// Token cancelled once `after` has elapsed
///
/// Cancel it early to stop the timer once the guarded call returns.
fn deadline(after: Duration) -> CancellationToken {
    let ctx = CancellationToken::new();
    let timer = ctx.clone();
    tokio::spawn(async move {
        tokio::select! {
            () = tokio::time::sleep(after) => timer.cancel(),
            () = timer.cancelled() => {}
        }
    });
    ctx
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
