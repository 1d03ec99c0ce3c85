// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for fortress access

use thiserror::Error;

/// Opaque error returned by visits and workers
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors returned from Guard and Guest calls
///
/// Guard calls only ever produce `Shutdown` or `Aborted`. Guest calls may
/// also return `Visit`, which carries the visit's own error untouched.
#[derive(Debug, Error)]
pub enum FortressError {
    /// The fortress is shutting down or already stopped
    #[error("fortress worker shutting down")]
    Shutdown,
    /// The caller's context was cancelled before the request completed
    #[error("fortress operation aborted")]
    Aborted,
    /// Error returned by the visit itself
    #[error(transparent)]
    Visit(BoxError),
}

impl FortressError {
    pub fn is_shutdown(&self) -> bool {
        matches!(self, FortressError::Shutdown)
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, FortressError::Aborted)
    }

    /// Recover the error a visit returned, if this is one
    pub fn into_visit_error(self) -> Option<BoxError> {
        match self {
            FortressError::Visit(err) => Some(err),
            _ => None,
        }
    }
}
