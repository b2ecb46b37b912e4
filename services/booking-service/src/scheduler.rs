use crate::config::AppState;
use crate::repositories::{session_repo, slot_repo};
use std::future::Future;
use std::time::Duration;

const MAX_ATTEMPTS: u32 = 3;

/// Background scheduler untuk maintenance slot & session
pub struct BookingScheduler {
    state: AppState,
}

impl BookingScheduler {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Start background maintenance tasks
    pub fn start(self) {
        if !self.state.config.scheduler_enabled {
            tracing::info!("Booking scheduler disabled via DISABLE_SCHEDULER environment variable");
            return;
        }

        let period = Duration::from_secs(self.state.config.scheduler_interval_secs);
        tracing::info!("Starting booking maintenance scheduler (every {}s)", period.as_secs());

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);

            loop {
                interval.tick().await;

                tracing::info!("Running booking maintenance tasks...");

                // Slot available yang sudah lewat tidak bisa di-book lagi
                let db = self.state.db.clone();
                tokio::spawn(async move {
                    if let Some(deleted) =
                        with_retry("purge expired slots", || slot_repo::purge_expired_available_slots(&db)).await
                    {
                        if deleted > 0 {
                            tracing::info!("Purged {} expired available slots", deleted);
                        }
                    }
                });

                // Session yang end_time-nya lewat jadi completed
                let db = self.state.db.clone();
                tokio::spawn(async move {
                    if let Some(completed) =
                        with_retry("complete ended sessions", || session_repo::complete_ended_sessions(&db)).await
                    {
                        if completed > 0 {
                            tracing::info!("Marked {} sessions as completed", completed);
                        }
                    }
                });
            }
        });
    }
}

// Jalankan job sampai MAX_ATTEMPTS kali, None kalau semua gagal
async fn with_retry<T, E, F, Fut>(job: &str, mut run: F) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    for attempt in 1..=MAX_ATTEMPTS {
        match run().await {
            Ok(value) => return Some(value),
            Err(e) if attempt == MAX_ATTEMPTS => {
                tracing::error!("Failed to {} after {} attempts: {}", job, MAX_ATTEMPTS, e);
            }
            Err(e) => {
                tracing::warn!("Attempt {} to {} failed: {}", attempt, job, e);
                tokio::time::sleep(Duration::from_millis(1000)).await;
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_retry_succeeds_after_failures() {
        let calls = AtomicU32::new(0);
        let result = with_retry("flaky job", || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n < 3 {
                    Err("transient")
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result, Some(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_gives_up() {
        let calls = AtomicU32::new(0);
        let result: Option<u64> = with_retry("broken job", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<u64, _>("down") }
        })
        .await;

        assert_eq!(result, None);
        assert_eq!(calls.load(Ordering::SeqCst), MAX_ATTEMPTS);
    }
}
