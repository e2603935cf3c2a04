//! Async forms of blocking operations.
//!
//! Every `*_async` entry point moves its owned inputs onto tokio's blocking
//! pool and awaits the same function the blocking form calls.

use crate::error::{Error, Result};

/// Run `job` on the blocking pool of the current tokio runtime.
///
/// # Errors
///
/// Whatever `job` returns, or [`Error::Worker`] if the task panicked or was
/// cancelled.
///
/// # Panics
///
/// Panics when called outside a tokio runtime.
pub(crate) async fn run<F, T>(job: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(|err| Error::Worker(err.to_string()))?
}
