// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Keep daemon: supervises a fortress for the rest of the control plane

pub mod config;
pub mod lifecycle;

pub use config::{Config, ConfigError, FortressConfig, LogConfig};
pub use lifecycle::{startup, LifecycleError, Supervisor};
