// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced Guard and Guest wrappers for consistent observability

use crate::error::FortressError;
use crate::interface::{Guard, Guest, Visit};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Wrapper that adds tracing to any Guard
#[derive(Clone)]
pub struct TracedGuard<G> {
    name: String,
    inner: G,
}

impl<G> TracedGuard<G> {
    pub fn new(name: impl Into<String>, inner: G) -> Self {
        Self {
            name: name.into(),
            inner,
        }
    }
}

#[async_trait]
impl<G: Guard> Guard for TracedGuard<G> {
    async fn unlock(&self, ctx: &CancellationToken) -> Result<(), FortressError> {
        let span = tracing::info_span!("fortress.unlock", fortress = %self.name);
        async {
            tracing::debug!("requesting unlock");
            let result = self.inner.unlock(ctx).await;
            match &result {
                Ok(()) => tracing::info!("unlocked"),
                Err(e) => tracing::warn!(error = %e, "unlock failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn lockdown(&self, ctx: &CancellationToken) -> Result<(), FortressError> {
        let span = tracing::info_span!("fortress.lockdown", fortress = %self.name);
        async {
            tracing::debug!("requesting lockdown");
            let start = std::time::Instant::now();
            let result = self.inner.lockdown(ctx).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(()) => tracing::info!(elapsed_ms, "locked down"),
                // Admission is already closed; only this caller's wait ended.
                Err(FortressError::Aborted) => {
                    tracing::warn!(elapsed_ms, "gave up waiting for visits to drain")
                }
                Err(e) => tracing::warn!(elapsed_ms, error = %e, "lockdown failed"),
            }
            result
        }
        .instrument(span)
        .await
    }
}

/// Wrapper that adds tracing to any Guest
#[derive(Clone)]
pub struct TracedGuest<G> {
    name: String,
    inner: G,
}

impl<G> TracedGuest<G> {
    pub fn new(name: impl Into<String>, inner: G) -> Self {
        Self {
            name: name.into(),
            inner,
        }
    }
}

#[async_trait]
impl<G: Guest> Guest for TracedGuest<G> {
    async fn visit(&self, ctx: &CancellationToken, visit: Visit) -> Result<(), FortressError> {
        let span = tracing::debug_span!("fortress.visit", fortress = %self.name);
        async {
            let start = std::time::Instant::now();
            let result = self.inner.visit(ctx, visit).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(()) => tracing::debug!(elapsed_ms, "visit complete"),
                Err(FortressError::Visit(e)) => {
                    tracing::debug!(elapsed_ms, error = %e, "visit returned error")
                }
                Err(e) => tracing::debug!(elapsed_ms, error = %e, "visit not run"),
            }
            result
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
