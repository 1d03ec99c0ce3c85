// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request tickets passed from the facades to the control loop
//!
//! Every ticket carries a single-use reply slot. Guard tickets are
//! completed on their own task and guest visits run on theirs, so the
//! control loop never waits on a visit or on quiescence.

use crate::active::{ActiveVisits, VisitPermit};
use crate::error::FortressError;
use crate::fortress::AdmissionState;
use crate::interface::Visit;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

pub(crate) type ResultSlot = oneshot::Sender<Result<(), FortressError>>;

/// Guard request to change admission
pub(crate) struct GuardTicket {
    pub(crate) desired: AdmissionState,
    pub(crate) ctx: CancellationToken,
    pub(crate) result: ResultSlot,
}

impl GuardTicket {
    /// Send exactly one result: `Ok` once the desired state is reached,
    /// `Aborted` if the caller's context is done first.
    ///
    /// Unlock is reached as soon as the loop applies it. Lockdown is
    /// reached when no admitted visit is still running.
    pub(crate) async fn complete(self, active: ActiveVisits) {
        let result = match self.desired {
            AdmissionState::Unlocked if self.ctx.is_cancelled() => Err(FortressError::Aborted),
            AdmissionState::Unlocked => Ok(()),
            AdmissionState::Locked => {
                tokio::select! {
                    biased;
                    () = self.ctx.cancelled() => Err(FortressError::Aborted),
                    () = active.wait_idle() => Ok(()),
                }
            }
        };
        // The caller may have stopped listening; nothing else needs the result.
        let _ = self.result.send(result);
    }
}

/// Guest request for admission
///
/// Carries no work. The visit stays with the caller until the loop hands
/// back a permit, so a caller that gives up drops its visit on the spot.
pub(crate) struct GuestTicket {
    pub(crate) admitted: oneshot::Sender<VisitPermit>,
}

impl GuestTicket {
    /// Hand the caller its permit
    ///
    /// Returns `false` when the caller has already given up waiting; the
    /// permit is dropped here and the count goes straight back down.
    pub(crate) fn admit(self, permit: VisitPermit) -> bool {
        self.admitted.send(permit).is_ok()
    }
}

/// A visit the loop has counted, ready to run
pub(crate) struct AdmittedVisit {
    visit: Visit,
    ctx: CancellationToken,
    permit: VisitPermit,
}

impl AdmittedVisit {
    pub(crate) fn new(visit: Visit, ctx: CancellationToken, permit: VisitPermit) -> Self {
        Self { visit, ctx, permit }
    }

    /// Run the visit, then release the permit
    ///
    /// The context is checked once before the visit starts. A context
    /// cancelled after that point does not interrupt the visit. The permit
    /// is released on unwind too.
    pub(crate) async fn complete(self) -> Result<(), FortressError> {
        let _permit = self.permit;
        if self.ctx.is_cancelled() {
            return Err(FortressError::Aborted);
        }
        self.visit.await.map_err(FortressError::Visit)
    }
}

#[cfg(test)]
#[path = "ticket_tests.rs"]
mod tests;
