// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The fortress gate and its control loop
//!
//! All admission state lives inside a single control loop task. Guard and
//! Guest calls hand tickets to the loop over channels. The loop applies
//! a state change on the spot and leaves the lockdown wait to a spawned
//! task. Admitted guests get a permit back and run their visit on a task
//! of their own, so the loop is never held up by a running visit.

use crate::active::ActiveVisits;
use crate::error::{BoxError, FortressError};
use crate::interface::{Guard, Guest, Visit};
use crate::ticket::{AdmittedVisit, GuardTicket, GuestTicket};
use crate::worker::Worker;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;

/// Tickets a facade may park before it has to wait for the loop
const TICKET_CAPACITY: usize = 1;

/// Whether the fortress admits new visits
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdmissionState {
    Locked,
    Unlocked,
}

impl std::fmt::Display for AdmissionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdmissionState::Locked => write!(f, "locked"),
            AdmissionState::Unlocked => write!(f, "unlocked"),
        }
    }
}

/// How the control loop ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LoopExit {
    Clean,
    Panicked,
}

/// Gate coordinating one Guard with any number of Guests
///
/// Created locked. Cloning yields another handle to the same gate. The
/// gate runs until [`Worker::kill`] is called or every handle is dropped.
#[derive(Clone)]
pub struct Fortress {
    guard_tickets: mpsc::Sender<GuardTicket>,
    guest_tickets: mpsc::Sender<GuestTicket>,
    shutdown: CancellationToken,
    exit: watch::Receiver<Option<LoopExit>>,
    active: ActiveVisits,
}

impl Fortress {
    /// Start a new, locked fortress on the current tokio runtime
    ///
    /// The caller is responsible for eventually killing it and for
    /// observing the result of [`Worker::wait`].
    pub fn new() -> Self {
        let (guard_tx, guard_rx) = mpsc::channel(TICKET_CAPACITY);
        let (guest_tx, guest_rx) = mpsc::channel(TICKET_CAPACITY);
        let (exit_tx, exit_rx) = watch::channel(None);
        let shutdown = CancellationToken::new();
        let active = ActiveVisits::new();

        let control = ControlLoop {
            guard_tickets: guard_rx,
            guest_tickets: guest_rx,
            shutdown: shutdown.clone(),
            active: active.clone(),
            state: AdmissionState::Locked,
        };
        tokio::spawn(control.run(ExitSignal(exit_tx)));

        Self {
            guard_tickets: guard_tx,
            guest_tickets: guest_tx,
            shutdown,
            exit: exit_rx,
            active,
        }
    }

    /// Guard capability for this fortress
    pub fn guard(&self) -> Arc<dyn Guard> {
        Arc::new(self.clone())
    }

    /// Guest capability for this fortress
    pub fn guest(&self) -> Arc<dyn Guest> {
        Arc::new(self.clone())
    }

    /// Number of visits currently running
    pub fn active_visits(&self) -> usize {
        self.active.count()
    }

    /// Hand a guard ticket to the loop and wait for its result
    async fn allow_guests(
        &self,
        ctx: &CancellationToken,
        desired: AdmissionState,
    ) -> Result<(), FortressError> {
        let (result, delivered) = oneshot::channel();
        let ticket = GuardTicket {
            desired,
            ctx: ctx.clone(),
            result,
        };

        let sent = tokio::select! {
            biased;
            () = self.shutdown.cancelled() => false,
            sent = self.guard_tickets.send(ticket) => sent.is_ok(),
        };
        if !sent {
            return Err(FortressError::Shutdown);
        }

        tokio::select! {
            biased;
            delivered = delivered => match delivered {
                Ok(result) => result,
                Err(_) => Err(FortressError::Shutdown),
            },
            () = ctx.cancelled() => Err(FortressError::Aborted),
        }
    }
}

impl Default for Fortress {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Guard for Fortress {
    async fn unlock(&self, ctx: &CancellationToken) -> Result<(), FortressError> {
        self.allow_guests(ctx, AdmissionState::Unlocked).await
    }

    async fn lockdown(&self, ctx: &CancellationToken) -> Result<(), FortressError> {
        self.allow_guests(ctx, AdmissionState::Locked).await
    }
}

#[async_trait]
impl Guest for Fortress {
    async fn visit(&self, ctx: &CancellationToken, visit: Visit) -> Result<(), FortressError> {
        let (admitted, admission) = oneshot::channel();
        let ticket = GuestTicket { admitted };

        tokio::select! {
            biased;
            () = self.shutdown.cancelled() => return Err(FortressError::Shutdown),
            () = ctx.cancelled() => return Err(FortressError::Aborted),
            sent = self.guest_tickets.send(ticket) => {
                if sent.is_err() {
                    return Err(FortressError::Shutdown);
                }
            }
        }

        // A locked fortress never reads the ticket, so only cancellation
        // or shutdown can end this wait. Giving up drops `visit` unrun.
        let permit = tokio::select! {
            biased;
            admission = admission => match admission {
                Ok(permit) => permit,
                Err(_) => return Err(FortressError::Shutdown),
            },
            () = ctx.cancelled() => return Err(FortressError::Aborted),
            () = self.shutdown.cancelled() => return Err(FortressError::Shutdown),
        };

        // Detached so the visit keeps its permit even if this call is dropped.
        let running = tokio::spawn(AdmittedVisit::new(visit, ctx.clone(), permit).complete());
        match running.await {
            Ok(result) => result,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(_) => Err(FortressError::Shutdown),
        }
    }
}

#[async_trait]
impl Worker for Fortress {
    fn kill(&self) {
        self.shutdown.cancel();
    }

    /// Resolves once the loop has exited and every admitted visit has
    /// returned.
    async fn wait(&self) -> Result<(), BoxError> {
        let mut exit = self.exit.clone();
        // ExitSignal publishes before its sender drops, so a closed channel
        // still carries the final value.
        let panicked = matches!(
            exit.wait_for(Option::is_some).await.as_deref(),
            Ok(Some(LoopExit::Panicked))
        );
        self.active.wait_idle().await;

        if panicked {
            return Err("fortress control loop panicked".into());
        }
        Ok(())
    }
}

/// Publishes the loop's exit, including on unwind
struct ExitSignal(watch::Sender<Option<LoopExit>>);

impl Drop for ExitSignal {
    fn drop(&mut self) {
        let exit = if std::thread::panicking() {
            LoopExit::Panicked
        } else {
            LoopExit::Clean
        };
        self.0.send_replace(Some(exit));
    }
}

/// Sole owner of admission state
struct ControlLoop {
    guard_tickets: mpsc::Receiver<GuardTicket>,
    guest_tickets: mpsc::Receiver<GuestTicket>,
    shutdown: CancellationToken,
    active: ActiveVisits,
    state: AdmissionState,
}

impl ControlLoop {
    /// Admit visits while unlocked; on lockdown, stop reading guest
    /// tickets and let the guard's completion wait out the visits already
    /// running. Exits on shutdown without draining either channel.
    async fn run(mut self, exit: ExitSignal) {
        let _exit = exit;
        tracing::debug!(state = %self.state, "fortress started");

        loop {
            tokio::select! {
                biased;
                () = self.shutdown.cancelled() => {
                    tracing::debug!(active = self.active.count(), "fortress stopping");
                    return;
                }
                ticket = self.guard_tickets.recv() => match ticket {
                    Some(ticket) => self.handle_guard(ticket),
                    None => {
                        tracing::debug!("all fortress handles dropped");
                        return;
                    }
                },
                ticket = self.guest_tickets.recv(), if self.state == AdmissionState::Unlocked => {
                    match ticket {
                        Some(ticket) => self.handle_guest(ticket),
                        None => return,
                    }
                }
            }
        }
    }

    fn handle_guard(&mut self, ticket: GuardTicket) {
        // Guard requests are idempotent, so they are applied as they
        // arrive: a later request takes effect even while an earlier
        // lockdown is still waiting for quiescence.
        if self.state != ticket.desired {
            tracing::debug!(from = %self.state, to = %ticket.desired, "admission changed");
        }
        self.state = ticket.desired;
        tokio::spawn(ticket.complete(self.active.clone()));
    }

    fn handle_guest(&mut self, ticket: GuestTicket) {
        if ticket.admit(self.active.enter()) {
            tracing::trace!(active = self.active.count(), "visit admitted");
        } else {
            tracing::trace!("guest gave up before admission");
        }
    }
}

#[cfg(test)]
#[path = "fortress_tests.rs"]
mod tests;
