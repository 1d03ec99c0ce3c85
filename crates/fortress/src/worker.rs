// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle contract between a long-running task and its supervisor

use crate::error::BoxError;
use async_trait::async_trait;

/// A long-running task that a supervisor can stop and observe
#[async_trait]
pub trait Worker: Send + Sync {
    /// Ask the worker to stop. Never blocks; safe to call repeatedly.
    fn kill(&self);

    /// Wait for the worker to stop and report how it ended
    ///
    /// May be awaited from any number of tasks, before or after `kill`.
    async fn wait(&self) -> Result<(), BoxError>;
}
