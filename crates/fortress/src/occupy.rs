// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Running a long-lived worker inside a single visit

use crate::error::{BoxError, FortressError};
use crate::interface::{visit, Guest};
use crate::worker::Worker;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

/// Errors from [`occupy`]
#[derive(Debug, Error)]
pub enum OccupyError {
    /// The visit could not begin
    #[error("cannot occupy fortress: {0}")]
    Fortress(#[from] FortressError),
    /// The visit began but the worker failed to start
    #[error("cannot start worker: {0}")]
    Start(#[source] BoxError),
}

/// Start a worker inside a visit and keep the visit open until it stops
///
/// While the returned worker runs, the fortress counts it as an active
/// visit, so a lockdown cannot complete until the worker has stopped.
/// `abort` only lets the caller stop waiting for admission; once the
/// worker is returned, getting it killed is the caller's job.
pub async fn occupy<W, F>(
    guest: Arc<dyn Guest>,
    start: F,
    abort: &CancellationToken,
) -> Result<Arc<W>, OccupyError>
where
    W: Worker + 'static,
    F: FnOnce() -> Result<W, BoxError> + Send + 'static,
{
    let (started_tx, mut started) = oneshot::channel();
    let task = visit(async move {
        match start() {
            Ok(worker) => {
                let worker = Arc::new(worker);
                let _ = started_tx.send(Ok(Arc::clone(&worker)));
                // The worker's own error belongs to whoever holds it now.
                let _ = worker.wait().await;
            }
            Err(err) => {
                let _ = started_tx.send(Err(err));
            }
        }
        Ok(())
    });

    let abort = abort.clone();
    let mut visiting = tokio::spawn(async move { guest.visit(&abort, task).await });

    let outcome = tokio::select! {
        biased;
        handed = &mut started => match handed {
            Ok(Ok(worker)) => return Ok(worker),
            Ok(Err(err)) => return Err(OccupyError::Start(err)),
            // The task was dropped without running; the visit says why.
            Err(_) => visiting.await,
        },
        outcome = &mut visiting => match started.try_recv() {
            Ok(Ok(worker)) => return Ok(worker),
            Ok(Err(err)) => return Err(OccupyError::Start(err)),
            Err(_) => outcome,
        },
    };

    match outcome {
        Ok(Err(err)) => Err(OccupyError::Fortress(err)),
        Ok(Ok(())) | Err(_) => Err(OccupyError::Fortress(FortressError::Shutdown)),
    }
}

#[cfg(test)]
#[path = "occupy_tests.rs"]
mod tests;
