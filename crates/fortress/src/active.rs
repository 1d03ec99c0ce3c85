// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Active visit tracking
//!
//! Counts visits in flight and lets any task wait for the count to reach
//! zero. The counter lives behind an `Arc`, so waiters keep making
//! progress after the control loop that admitted the visits has exited.

use std::sync::Arc;
use tokio::sync::watch;

/// Count of visits currently running
#[derive(Clone, Debug)]
pub struct ActiveVisits {
    count: Arc<watch::Sender<usize>>,
}

impl ActiveVisits {
    pub fn new() -> Self {
        let (count, _) = watch::channel(0);
        Self {
            count: Arc::new(count),
        }
    }

    /// Record a new visit; it stays counted until the permit drops
    pub fn enter(&self) -> VisitPermit {
        self.count.send_modify(|n| *n += 1);
        VisitPermit {
            count: Arc::clone(&self.count),
        }
    }

    /// Snapshot of the current count (for logging and tests)
    pub fn count(&self) -> usize {
        *self.count.borrow()
    }

    /// Resolve once no visits are running
    pub async fn wait_idle(&self) {
        let mut rx = self.count.subscribe();
        // The sender is owned by self, so the channel cannot close here.
        let _ = rx.wait_for(|n| *n == 0).await;
    }
}

impl Default for ActiveVisits {
    fn default() -> Self {
        Self::new()
    }
}

/// Keeps one visit counted until dropped
///
/// Dropping happens on success, error, and unwind alike.
#[derive(Debug)]
pub struct VisitPermit {
    count: Arc<watch::Sender<usize>>,
}

impl Drop for VisitPermit {
    fn drop(&mut self) {
        self.count.send_modify(|n| *n = n.saturating_sub(1));
    }
}

#[cfg(test)]
#[path = "active_tests.rs"]
mod tests;
