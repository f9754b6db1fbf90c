//! One-time async construction of an expensive shared resource
//!
//! `LazyResource` hands out an `Arc<T>` to every caller. The first caller
//! starts construction on a spawned task; everyone who arrives while that
//! attempt is running waits on the same attempt and sees the same outcome.
//! A failed attempt clears the slot so the next `acquire()` starts over.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::watch;

type InitFuture<T> = Pin<Box<dyn Future<Output = anyhow::Result<T>> + Send>>;
type InitFn<T> = dyn Fn() -> InitFuture<T> + Send + Sync;
type Outcome<T> = Option<Result<Arc<T>, InitError>>;

/// Failure of a construction attempt, shared by every waiter of that attempt
#[derive(Debug, Clone, Error)]
#[error("{0:#}")]
pub struct InitError(Arc<anyhow::Error>);

impl InitError {
    fn new(err: anyhow::Error) -> Self {
        Self(Arc::new(err))
    }
}

enum Slot<T> {
    Empty,
    InFlight(watch::Receiver<Outcome<T>>),
    Ready(Arc<T>),
}

pub struct LazyResource<T> {
    slot: Arc<Mutex<Slot<T>>>,
    init: Arc<InitFn<T>>,
}

impl<T: Send + Sync + 'static> LazyResource<T> {
    pub fn new<F, Fut>(init: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        Self {
            slot: Arc::new(Mutex::new(Slot::Empty)),
            init: Arc::new(move || Box::pin(init()) as InitFuture<T>),
        }
    }

    /// Returns the resource if it has already been built
    #[cfg(test)]
    pub fn get(&self) -> Option<Arc<T>> {
        match &*self.slot.lock() {
            Slot::Ready(resource) => Some(resource.clone()),
            _ => None,
        }
    }

    /// Returns the shared resource, building it if nobody has yet
    pub async fn acquire(&self) -> Result<Arc<T>, InitError> {
        let mut rx = {
            let mut slot = self.slot.lock();
            match &*slot {
                Slot::Ready(resource) => return Ok(resource.clone()),
                Slot::InFlight(rx) => rx.clone(),
                Slot::Empty => self.start(&mut slot),
            }
        };

        let outcome = match rx.wait_for(Option::is_some).await {
            Ok(outcome) => outcome.clone(),
            Err(_) => None,
        };

        match outcome {
            Some(result) => result,
            None => {
                // The construction task went away without reporting back
                let mut slot = self.slot.lock();
                let stale = matches!(&*slot, Slot::InFlight(current) if current.same_channel(&rx));
                if stale {
                    *slot = Slot::Empty;
                }
                Err(InitError::new(anyhow::anyhow!(
                    "initialization task ended without a result"
                )))
            }
        }
    }

    fn start(&self, slot: &mut Slot<T>) -> watch::Receiver<Outcome<T>> {
        let (tx, rx) = watch::channel(None);
        *slot = Slot::InFlight(rx.clone());

        let future = (self.init)();
        let shared = self.slot.clone();

        // Runs to completion even if every caller stops waiting
        tokio::spawn(async move {
            let result = future.await.map(Arc::new).map_err(InitError::new);

            {
                let mut slot = shared.lock();
                *slot = match &result {
                    Ok(resource) => Slot::Ready(resource.clone()),
                    Err(err) => {
                        tracing::warn!("Shared resource initialization failed: {}", err);
                        Slot::Empty
                    }
                };
            }

            let _ = tx.send(Some(result));
        });

        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn counted(calls: Arc<AtomicUsize>, fail_first: usize) -> LazyResource<String> {
        LazyResource::new(move || {
            let calls = calls.clone();
            async move {
                let attempt = calls.fetch_add(1, Ordering::SeqCst) + 1;
                tokio::time::sleep(Duration::from_millis(20)).await;
                if attempt <= fail_first {
                    anyhow::bail!("attempt {} failed", attempt);
                }
                Ok(format!("built on attempt {}", attempt))
            }
        })
    }

    #[tokio::test]
    async fn test_concurrent_acquire_builds_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let lazy = counted(calls.clone(), 0);

        let (a, b, c) = tokio::join!(lazy.acquire(), lazy.acquire(), lazy.acquire());

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let a = a.unwrap();
        assert!(Arc::ptr_eq(&a, &b.unwrap()));
        assert!(Arc::ptr_eq(&a, &c.unwrap()));
        assert_eq!(a.as_str(), "built on attempt 1");
    }

    #[tokio::test]
    async fn test_many_concurrent_tasks_build_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let lazy = Arc::new(counted(calls.clone(), 0));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let lazy = lazy.clone();
                tokio::spawn(async move { lazy.acquire().await.map(|r| r.len()) })
            })
            .collect();

        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_ready_resource_is_not_rebuilt() {
        let calls = Arc::new(AtomicUsize::new(0));
        let lazy = counted(calls.clone(), 0);

        assert!(lazy.get().is_none());
        let first = lazy.acquire().await.unwrap();
        let second = lazy.acquire().await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(lazy.get().is_some());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_reaches_every_waiter() {
        let calls = Arc::new(AtomicUsize::new(0));
        let lazy = counted(calls.clone(), 1);

        let (a, b, c) = tokio::join!(lazy.acquire(), lazy.acquire(), lazy.acquire());

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        for result in [a, b, c] {
            let err = result.unwrap_err();
            assert!(err.to_string().contains("attempt 1 failed"));
        }
        assert!(lazy.get().is_none());
    }

    #[tokio::test]
    async fn test_retry_after_failure_runs_one_new_attempt() {
        let calls = Arc::new(AtomicUsize::new(0));
        let lazy = counted(calls.clone(), 1);

        assert!(lazy.acquire().await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let (a, b) = tokio::join!(lazy.acquire(), lazy.acquire());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(a.unwrap().as_str(), "built on attempt 2");
        assert_eq!(b.unwrap().as_str(), "built on attempt 2");
    }

    #[tokio::test]
    async fn test_abandoned_caller_does_not_cancel_attempt() {
        let calls = Arc::new(AtomicUsize::new(0));
        let lazy = counted(calls.clone(), 0);

        let abandoned =
            tokio::time::timeout(Duration::from_millis(1), lazy.acquire()).await;
        assert!(abandoned.is_err());

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(lazy.get().is_some());

        lazy.acquire().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
