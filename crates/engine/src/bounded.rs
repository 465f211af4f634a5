//! Per-call collaborator deadlines

use hydronav_core::{Error, Result};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

pub(crate) const STORE: &str = "flow network store";
pub(crate) const CATALOG: &str = "feature catalog";
pub(crate) const SNAP: &str = "hydrologic snap service";

/// Await `call`, failing with `CollaboratorUnavailable` once `limit` elapses.
///
/// The timed-out future is dropped, which cancels any in-flight request it owns.
pub(crate) async fn bounded<T, F>(collaborator: &'static str, limit: Duration, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => {
            warn!("{} did not answer within {:?}", collaborator, limit);
            Err(Error::unavailable(
                collaborator,
                format!("timed out after {:?}", limit),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_passes_result_through() {
        let v = bounded(STORE, Duration::from_secs(1), async { Ok(7) }).await.unwrap();
        assert_eq!(v, 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        };
        match bounded(SNAP, Duration::from_secs(2), slow).await {
            Err(Error::CollaboratorUnavailable { collaborator, .. }) => {
                assert_eq!(collaborator, SNAP)
            }
            other => panic!("Expected CollaboratorUnavailable, got {:?}", other),
        }
    }
}
