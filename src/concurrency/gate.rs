/// Resizable concurrency gate
///
/// A semaphore whose capacity can move while permits are out. Growing
/// takes effect immediately; shrinking swallows the excess permits as
/// in-flight work returns them, so running requests are never interrupted.
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};

pub struct AdaptiveGate {
    semaphore: Arc<Semaphore>,
    capacity: AtomicUsize,
}

impl AdaptiveGate {
    pub fn new(capacity: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity: AtomicUsize::new(capacity),
        }
    }

    /// Target capacity, which in-flight work may still exceed briefly
    /// after a shrink
    pub fn capacity(&self) -> usize {
        self.capacity.load(Ordering::SeqCst)
    }

    /// Permits currently free
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Waits for a slot. The permit releases its slot on drop.
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit, AcquireError> {
        self.semaphore.clone().acquire_owned().await
    }

    /// Takes a slot only if one is free right now
    pub fn try_acquire(&self) -> Option<OwnedSemaphorePermit> {
        self.semaphore.clone().try_acquire_owned().ok()
    }

    /// Moves the capacity to a new target.
    ///
    /// Shrinks complete asynchronously: a background task claims the
    /// excess permits as they free up and forgets them.
    pub fn resize(&self, new_capacity: usize) {
        let old = self.capacity.swap(new_capacity, Ordering::SeqCst);
        if new_capacity > old {
            self.semaphore.add_permits(new_capacity - old);
        } else if new_capacity < old {
            let semaphore = Arc::clone(&self.semaphore);
            let excess = (old - new_capacity) as u32;
            tokio::spawn(async move {
                if let Ok(permits) = semaphore.acquire_many_owned(excess).await {
                    permits.forget();
                }
            });
        }
    }
}
