//! Crawl session: the state shared by every task of one crawl
//!
//! A session carries the cooperative cancellation flag, the semaphore bounding
//! concurrent fetches, and a count of site crawls that have not settled yet.
//! Each call to start indexing creates a fresh session, so tasks left over
//! from a stopped crawl can never observe the flag of a newer one.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

#[derive(Debug)]
pub struct CrawlSession {
    running: AtomicBool,
    active_sites: AtomicUsize,
    permits: Arc<Semaphore>,
    started_at: DateTime<Utc>,
}

impl CrawlSession {
    /// Creates a running session allowing `max_concurrent_fetches` fetches at once
    pub fn new(max_concurrent_fetches: usize) -> Self {
        Self {
            running: AtomicBool::new(true),
            active_sites: AtomicUsize::new(0),
            permits: Arc::new(Semaphore::new(max_concurrent_fetches.max(1))),
            started_at: Utc::now(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Clears the running flag
    ///
    /// Returns true if the session was running before the call.
    pub fn stop(&self) -> bool {
        self.running.swap(false, Ordering::SeqCst)
    }

    /// Waits for a fetch slot
    ///
    /// Returns None once the semaphore has been closed.
    pub async fn acquire(&self) -> Option<OwnedSemaphorePermit> {
        self.permits.clone().acquire_owned().await.ok()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Number of site crawls that have not reached a final status
    pub fn active_sites(&self) -> usize {
        self.active_sites.load(Ordering::SeqCst)
    }

    /// Returns true while the session runs or any of its sites is still settling
    pub fn is_busy(&self) -> bool {
        self.is_running() || self.active_sites() > 0
    }

    pub(crate) fn site_started(&self) {
        self.active_sites.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn site_finished(&self) {
        // Saturate so an unbalanced call can never wrap around
        let _ = self
            .active_sites
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
    }
}
