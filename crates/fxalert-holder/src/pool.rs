//! Fetch worker pool.

use chrono::NaiveDate;
use fxalert_fetch::{FetchError, QuoteFetcher};
use fxalert_types::{Bar, Symbol};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};

use crate::Shutdown;

/// Which pass a fetch job belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum JobKind {
    /// Today's bar, feeding the snapshot and the hourly bucket.
    Current,
    /// A closed previous trading day, seeding its daily bucket.
    PreviousDay,
}

/// One fetch to perform.
#[derive(Debug, Clone)]
pub(crate) struct FetchJob {
    pub(crate) symbol: Symbol,
    pub(crate) day: NaiveDate,
    pub(crate) kind: JobKind,
}

/// Outcome of one job.
#[derive(Debug)]
pub(crate) struct FetchResult {
    pub(crate) job: FetchJob,
    pub(crate) result: Result<Bar, FetchError>,
}

/// Shared job queue the workers pull from.
pub(crate) type JobQueue = Arc<Mutex<mpsc::Receiver<FetchJob>>>;

/// Fills a closed queue with every job.
pub(crate) fn job_queue(jobs: Vec<FetchJob>) -> JobQueue {
    let (tx, rx) = mpsc::channel(jobs.len().max(1));
    for job in jobs {
        // Capacity equals the job count, so this never fails.
        let _ = tx.try_send(job);
    }
    Arc::new(Mutex::new(rx))
}

/// Pulls jobs until the queue is drained or shutdown fires.
///
/// Sleeps a random delay of up to `max_jitter` between jobs so the
/// provider does not see bursts.
pub(crate) async fn worker(
    fetcher: Arc<dyn QuoteFetcher>,
    jobs: JobQueue,
    results: mpsc::Sender<FetchResult>,
    shutdown: Shutdown,
    max_jitter: Duration,
) {
    loop {
        let job = jobs.lock().await.recv().await;
        let Some(job) = job else {
            return;
        };

        let result = tokio::select! {
            () = shutdown.cancelled() => return,
            result = fetcher.fetch(&job.symbol, job.day) => result,
        };
        if results.send(FetchResult { job, result }).await.is_err() {
            return;
        }

        let delay = jitter(max_jitter);
        tokio::select! {
            () = shutdown.cancelled() => return,
            () = tokio::time::sleep(delay) => {}
        }
    }
}

fn jitter(max: Duration) -> Duration {
    if max.is_zero() {
        return Duration::ZERO;
    }
    rand::thread_rng().gen_range(Duration::ZERO..=max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jitter_bounds() {
        let max = Duration::from_secs(2);
        for _ in 0..100 {
            assert!(jitter(max) <= max);
        }
        assert_eq!(jitter(Duration::ZERO), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_job_queue_closes_after_drain() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let jobs = vec![
            FetchJob {
                symbol: Symbol::new("EURUSD").unwrap(),
                day,
                kind: JobKind::Current,
            },
            FetchJob {
                symbol: Symbol::new("GBPUSD").unwrap(),
                day,
                kind: JobKind::PreviousDay,
            },
        ];
        let queue = job_queue(jobs);
        let mut rx = queue.lock().await;
        assert!(rx.recv().await.is_some());
        assert!(rx.recv().await.is_some());
        assert!(rx.recv().await.is_none());
    }
}
