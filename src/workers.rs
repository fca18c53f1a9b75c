//! Bounded pool of in-flight request tasks

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Caps concurrent request tasks and lets shutdown wait for them.
#[derive(Clone)]
pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
    size: u32,
}

impl WorkerPool {
    /// Pool admitting `size` tasks at once (at least one)
    pub fn new(size: usize) -> Self {
        let size = u32::try_from(size.max(1)).unwrap_or(u32::MAX);
        Self {
            semaphore: Arc::new(Semaphore::new(size as usize)),
            size,
        }
    }

    pub fn size(&self) -> usize {
        self.size as usize
    }

    /// Tasks currently holding a slot
    pub fn in_flight(&self) -> usize {
        self.size as usize - self.semaphore.available_permits()
    }

    /// Wait for a free slot. The slot is released when the permit drops.
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit> {
        self.semaphore
            .clone()
            .acquire_owned()
            .await
            .context("Worker pool closed")
    }

    /// Wait until every admitted task has released its slot, then close the
    /// pool so nothing new is admitted.
    pub async fn drain(&self) -> Result<()> {
        let _all = self
            .semaphore
            .acquire_many(self.size)
            .await
            .context("Worker pool closed during shutdown")?;
        self.semaphore.close();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_bounds_concurrency() {
        let pool = WorkerPool::new(2);
        let first = pool.acquire().await.unwrap();
        let _second = pool.acquire().await.unwrap();
        assert_eq!(pool.in_flight(), 2);

        let blocked = tokio::time::timeout(Duration::from_millis(20), pool.acquire()).await;
        assert!(blocked.is_err());

        drop(first);
        assert!(pool.acquire().await.is_ok());
    }

    #[tokio::test]
    async fn test_zero_size_admits_one() {
        let pool = WorkerPool::new(0);
        assert_eq!(pool.size(), 1);
        assert!(pool.acquire().await.is_ok());
    }

    #[tokio::test]
    async fn test_drain_waits_for_in_flight_tasks() {
        let pool = WorkerPool::new(4);
        let finished = Arc::new(AtomicUsize::new(0));

        for i in 0..3u64 {
            let permit = pool.acquire().await.unwrap();
            let finished = finished.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(30 + 10 * i)).await;
                finished.fetch_add(1, Ordering::SeqCst);
                drop(permit);
            });
        }

        pool.drain().await.unwrap();
        assert_eq!(finished.load(Ordering::SeqCst), 3);
        assert_eq!(pool.in_flight(), 0);
        assert!(pool.acquire().await.is_err());
    }

    #[tokio::test]
    async fn test_drain_when_idle() {
        let pool = WorkerPool::new(3);
        tokio::time::timeout(Duration::from_millis(100), pool.drain())
            .await
            .expect("idle pool should drain immediately")
            .unwrap();
    }
}
