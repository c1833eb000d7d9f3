//! Background suspension re-check.
//!
//! Temporary suspensions carry an absolute expiry; nothing in the ledger
//! flips them back by itself. A [`SuspensionPoller`] periodically runs a
//! re-check task (typically [`release_expired_suspensions`] over the actor
//! records a client is watching). The poll is best effort: failures are
//! logged, never surfaced to users. The poller stops on [`stop`] or drop.
//!
//! [`stop`]: SuspensionPoller::stop

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use agora_ledger::{LedgerAdapter, LedgerResult};
use agora_types::RecordId;

/// Cancellable periodic background task.
pub struct SuspensionPoller {
    handle: JoinHandle<()>,
}

impl SuspensionPoller {
    /// Run `task` every `period` until stopped. The first run happens
    /// immediately. Task failures are logged at `warn` and polling
    /// continues.
    pub fn spawn<F, Fut, E>(period: Duration, mut task: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), E>> + Send,
        E: Display,
    {
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if let Err(error) = task().await {
                    warn!(%error, "background suspension re-check failed");
                }
            }
        });
        Self { handle }
    }

    /// Cancel the poller. Dropping it has the same effect.
    pub fn stop(self) {
        self.handle.abort();
    }
}

impl Drop for SuspensionPoller {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Release every expired temporary suspension among `targets`, writing an
/// approved status revision over the suspended head. Returns how many
/// records were released.
pub async fn release_expired_suspensions<P>(
    adapter: &dyn LedgerAdapter<P>,
    targets: &[RecordId],
    now: DateTime<Utc>,
) -> LedgerResult<usize>
where
    P: Clone + Send + Sync + 'static,
{
    let mut released = 0;
    for &target in targets {
        let Some(current) = adapter.get_status(target).await? else {
            continue;
        };
        if let Some(next) = current.status.unsuspend_if_expired(now) {
            adapter
                .set_status(target, Some(current.revision), next)
                .await?;
            debug!(target = %target.short_hex(), "released expired suspension");
            released += 1;
        }
    }
    Ok(released)
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_ledger::InMemoryLedger;
    use agora_types::{ActorId, ModerationStatus};
    use serde::{Deserialize, Serialize};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Clone, Debug, Serialize, Deserialize)]
    struct Profile {
        name: String,
    }

    #[tokio::test]
    async fn poller_runs_and_stops() {
        let runs = Arc::new(AtomicUsize::new(0));
        let poller = {
            let runs = runs.clone();
            SuspensionPoller::spawn(Duration::from_millis(10), move || {
                let runs = runs.clone();
                async move {
                    runs.fetch_add(1, Ordering::SeqCst);
                    Ok::<(), std::io::Error>(())
                }
            })
        };

        tokio::time::sleep(Duration::from_millis(35)).await;
        poller.stop();
        let after_stop = runs.load(Ordering::SeqCst);
        assert!(after_stop >= 2);

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(runs.load(Ordering::SeqCst), after_stop);
    }

    #[tokio::test]
    async fn failures_do_not_stop_polling() {
        let runs = Arc::new(AtomicUsize::new(0));
        let _poller = {
            let runs = runs.clone();
            SuspensionPoller::spawn(Duration::from_millis(10), move || {
                let runs = runs.clone();
                async move {
                    runs.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>(std::io::Error::new(std::io::ErrorKind::Other, "flaky"))
                }
            })
        };
        tokio::time::sleep(Duration::from_millis(35)).await;
        assert!(runs.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn expired_suspensions_are_released() {
        let ledger: InMemoryLedger<Profile> = InMemoryLedger::new();
        let author = ActorId::derive(b"author");
        let now = Utc::now();

        let expired = ledger
            .create(author, Profile { name: "a".into() })
            .await
            .unwrap();
        let active = ledger
            .create(author, Profile { name: "b".into() })
            .await
            .unwrap();

        let first = ledger
            .set_status(expired.original, None, ModerationStatus::Approved)
            .await
            .unwrap();
        ledger
            .set_status(
                expired.original,
                Some(first.revision),
                ModerationStatus::suspended_temporarily("abuse", -1, now),
            )
            .await
            .unwrap();
        let first = ledger
            .set_status(active.original, None, ModerationStatus::Approved)
            .await
            .unwrap();
        ledger
            .set_status(
                active.original,
                Some(first.revision),
                ModerationStatus::suspended_temporarily("abuse", 7, now),
            )
            .await
            .unwrap();

        let released = release_expired_suspensions(
            &ledger,
            &[expired.original, active.original],
            now,
        )
        .await
        .unwrap();

        assert_eq!(released, 1);
        let status = ledger.get_status(expired.original).await.unwrap().unwrap();
        assert_eq!(status.status, ModerationStatus::Approved);
        let status = ledger.get_status(active.original).await.unwrap().unwrap();
        assert!(matches!(
            status.status,
            ModerationStatus::SuspendedTemporarily { .. }
        ));
    }
}
