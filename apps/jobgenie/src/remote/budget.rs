use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::{Operation, ServiceError};

/// Runs one remote call under an optional time budget and a cancellation token.
///
/// Whichever finishes first wins; the losing future is dropped, which aborts
/// any request still in flight. The timer is owned by this future, so it is
/// released on every exit path.
pub async fn within_budget<T, F>(
    operation: Operation,
    budget: Option<Duration>,
    cancel: &CancellationToken,
    call: F,
) -> Result<T, ServiceError>
where
    F: Future<Output = Result<T, ServiceError>>,
{
    let bounded = async {
        match budget {
            Some(budget) => match tokio::time::timeout(budget, call).await {
                Ok(result) => result,
                Err(_) => Err(ServiceError::Timeout { operation, budget }),
            },
            None => call.await,
        }
    };

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ServiceError::Cancelled { operation }),
        result = bounded => result,
    }
}
