//! Optional time bound on collaborator calls.

use std::future::Future;
use std::time::Duration;

/// Await `fut`, giving up after `limit`. `None` when the bound elapsed.
pub(crate) async fn within<F: Future>(limit: Option<Duration>, fut: F) -> Option<F::Output> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut).await.ok(),
        None => Some(fut.await),
    }
}
