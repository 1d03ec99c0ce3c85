// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Fortress: an in-process gate arbitrating exclusive and shared access
//!
//! A single Guard locks and unlocks the fortress; any number of Guests
//! run short visits while it is unlocked. Lockdown completes only once
//! every admitted visit has returned.
//!
//! This crate provides:
//! - **Fortress** - the gate itself, driven by a single-owner control loop
//! - **Guard / Guest** - capability-scoped facades over the gate
//! - **Worker** - the lifecycle contract a supervisor drives
//! - **occupy** - hold a visit open for the lifetime of a worker
//! - **Traced wrappers** - tracing spans around any Guard or Guest

mod active;
mod error;
mod fortress;
mod interface;
mod occupy;
mod ticket;
pub mod traced;
mod worker;

pub use active::{ActiveVisits, VisitPermit};
pub use error::{BoxError, FortressError};
pub use fortress::{AdmissionState, Fortress};
pub use interface::{visit, Guard, Guest, Visit};
pub use occupy::{occupy, OccupyError};
pub use traced::{TracedGuard, TracedGuest};
pub use worker::Worker;
