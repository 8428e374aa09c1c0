// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Fetch Concurrency Limiter
 * FIFO slot gate shared by every outbound probe of a scan
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{Semaphore, SemaphorePermit};

/// Caps the number of in-flight fetches. Waiters are admitted in arrival
/// order; releasing a slot immediately admits the next waiter. The gauges
/// exist so callers and tests can observe that the ceiling holds.
pub struct FetchLimiter {
    semaphore: Semaphore,
    limit: usize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

/// RAII slot handle. The slot is returned on drop, on every exit path.
pub struct FetchPermit<'a> {
    limiter: &'a FetchLimiter,
    _permit: SemaphorePermit<'a>,
}

impl Drop for FetchPermit<'_> {
    fn drop(&mut self) {
        self.limiter.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl FetchLimiter {
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            semaphore: Semaphore::new(limit),
            limit,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    /// Wait for a free slot. Queued callers are served first-in-first-out.
    pub async fn acquire(&self) -> FetchPermit<'_> {
        let permit = self
            .semaphore
            .acquire()
            .await
            .expect("limiter semaphore is never closed");
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(current, Ordering::SeqCst);
        FetchPermit {
            limiter: self,
            _permit: permit,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Currently held slots
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneously held slots observed so far
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_ceiling_is_never_exceeded() {
        let limiter = Arc::new(FetchLimiter::new(3));
        let mut handles = Vec::new();
        for _ in 0..10 {
            let limiter = Arc::clone(&limiter);
            handles.push(tokio::spawn(async move {
                let _permit = limiter.acquire().await;
                tokio::time::sleep(Duration::from_millis(30)).await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(limiter.peak(), 3);
        assert_eq!(limiter.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_slot_released_on_drop() {
        let limiter = FetchLimiter::new(1);
        {
            let _permit = limiter.acquire().await;
            assert_eq!(limiter.in_flight(), 1);
        }
        assert_eq!(limiter.in_flight(), 0);
        // Must not deadlock: the slot came back
        let _again = limiter.acquire().await;
        assert_eq!(limiter.in_flight(), 1);
    }

    #[tokio::test]
    async fn test_waiters_admitted_in_arrival_order() {
        let limiter = Arc::new(FetchLimiter::new(1));
        let order = Arc::new(tokio::sync::Mutex::new(Vec::new()));

        let first = limiter.acquire().await;

        let mut handles = Vec::new();
        for label in ["second", "third", "fourth"] {
            let limiter = Arc::clone(&limiter);
            let order = Arc::clone(&order);
            handles.push(tokio::spawn(async move {
                let _permit = limiter.acquire().await;
                order.lock().await.push(label);
            }));
            // Give each waiter time to enqueue before the next arrives
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        drop(first);
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(*order.lock().await, vec!["second", "third", "fourth"]);
    }
}
