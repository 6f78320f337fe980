/// Request-scoped deadlines around store and provider calls
use std::future::Future;
use std::time::Duration;

use crate::error::AppError;

/// Run a fallible call, failing with [`AppError::Timeout`] once `limit` elapses.
pub async fn with_timeout<F, T, E>(operation: &'static str, limit: Duration, future: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, E>>,
    AppError: From<E>,
{
    match tokio::time::timeout(limit, future).await {
        Ok(result) => result.map_err(AppError::from),
        Err(_) => {
            tracing::warn!(operation, timeout_ms = limit.as_millis() as u64, "call timed out");
            Err(AppError::Timeout {
                operation,
                after: limit,
            })
        }
    }
}
