// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Guard and Guest capabilities

use crate::error::{BoxError, FortressError};
use async_trait::async_trait;
use std::future::Future;
use std::pin::Pin;
use tokio_util::sync::CancellationToken;

/// A unit of work run under Guest access
///
/// The future is not polled until the fortress admits it, so dropping an
/// unadmitted visit runs none of its body.
pub type Visit = Pin<Box<dyn Future<Output = Result<(), BoxError>> + Send + 'static>>;

/// Box a future up as a [`Visit`]
pub fn visit<F>(work: F) -> Visit
where
    F: Future<Output = Result<(), BoxError>> + Send + 'static,
{
    Box::pin(work)
}

/// Controls whether a fortress admits visits
///
/// Requests are idempotent: unlocking an unlocked fortress, or locking
/// down a locked one, succeeds without changing anything.
#[async_trait]
pub trait Guard: Send + Sync {
    /// Start admitting visits
    async fn unlock(&self, ctx: &CancellationToken) -> Result<(), FortressError>;

    /// Stop admitting visits and wait until none are running
    ///
    /// Admission stops as soon as the request is processed. If `ctx` is
    /// cancelled first this returns `Aborted`, but the lockdown itself
    /// still stands and the fortress keeps draining in the background.
    async fn lockdown(&self, ctx: &CancellationToken) -> Result<(), FortressError>;
}

/// Runs visits while a fortress is unlocked
#[async_trait]
pub trait Guest: Send + Sync {
    /// Run `visit` once the fortress admits it
    ///
    /// Blocks while the fortress is locked. Returns `Aborted` if `ctx` is
    /// cancelled before admission, `Shutdown` if the fortress stops first,
    /// and otherwise whatever the visit returned. Cancellation after the
    /// visit has started is not observed; long visits should watch `ctx`
    /// themselves. A visit that panics resumes the panic in the caller.
    async fn visit(&self, ctx: &CancellationToken, visit: Visit) -> Result<(), FortressError>;
}
