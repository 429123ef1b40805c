//! Fixed-size pool of tokio tasks for fan-out/fan-in over a work list.
//!
//! Items go through a bounded `async-channel` (one clone of the receiver per
//! worker, no shared lock), results come back on an unbounded mpsc channel.
//! The caller drains results until [`WorkerPool::recv`] returns `None`, at
//! which point every worker has exited.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Duration;

/// Upper bound on a single item. A stuck download must not hold the batch
/// forever; the item is dropped and yields no result.
const ITEM_TIMEOUT: Duration = Duration::from_secs(120);

/// A pool of worker tasks that process items concurrently.
///
/// ```ignore
/// let mut pool = WorkerPool::start(16, images, |image| async move {
///     fetch(image).await
/// });
/// while let Some(outcome) = pool.recv().await {
///     handle(outcome);
/// }
/// ```
pub struct WorkerPool<R: Send + 'static> {
    result_rx: mpsc::UnboundedReceiver<R>,
    _handles: Vec<JoinHandle<()>>,
}

impl<R: Send + 'static> WorkerPool<R> {
    /// Spawn `n` workers (at least one) and feed them `items`.
    ///
    /// Submission runs in its own task so results can be received while
    /// items are still being queued.
    pub fn start<W, F, Fut>(n: usize, items: Vec<W>, process_fn: F) -> Self
    where
        W: Send + 'static,
        F: Fn(W) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
    {
        let n = n.max(1);
        let (work_tx, work_rx) = async_channel::bounded::<W>(n);
        let (result_tx, result_rx) = mpsc::unbounded_channel::<R>();
        let process_fn = Arc::new(process_fn);

        let handles: Vec<JoinHandle<()>> = (0..n)
            .map(|_| {
                let work_rx = work_rx.clone();
                let result_tx = result_tx.clone();
                let process_fn = process_fn.clone();
                tokio::spawn(async move {
                    while let Ok(item) = work_rx.recv().await {
                        match tokio::time::timeout(ITEM_TIMEOUT, process_fn(item)).await {
                            Ok(r) => {
                                if result_tx.send(r).is_err() {
                                    break;
                                }
                            }
                            Err(_) => {
                                log::warn!(
                                    "Worker pool: item timed out after {}s, dropping it",
                                    ITEM_TIMEOUT.as_secs()
                                );
                            }
                        }
                    }
                })
            })
            .collect();

        // Channel closes once the last worker drops its sender.
        drop(result_tx);

        tokio::spawn(async move {
            for item in items {
                if work_tx.send(item).await.is_err() {
                    break;
                }
            }
        });

        Self {
            result_rx,
            _handles: handles,
        }
    }

    /// Next finished result, or `None` once all workers are done.
    pub async fn recv(&mut self) -> Option<R> {
        self.result_rx.recv().await
    }

    /// Wait for every result. Order is completion order, not input order.
    pub async fn join(mut self) -> Vec<R> {
        let mut results = Vec::new();
        while let Some(r) = self.recv().await {
            results.push(r);
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[tokio::test]
    async fn processes_every_item() {
        let pool = WorkerPool::start(4, (0..50u32).collect(), |n| async move { n * 2 });
        let mut results = pool.join().await;
        results.sort_unstable();
        assert_eq!(results, (0..50u32).map(|n| n * 2).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn concurrency_is_bounded() {
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let (a, p) = (active.clone(), peak.clone());
        let pool = WorkerPool::start(3, (0..20u32).collect(), move |_| {
            let active = a.clone();
            let peak = p.clone();
            async move {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                active.fetch_sub(1, Ordering::SeqCst);
            }
        });
        assert_eq!(pool.join().await.len(), 20);
        assert!(peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn empty_input_finishes() {
        let pool = WorkerPool::start(2, Vec::<u8>::new(), |n| async move { n });
        assert!(pool.join().await.is_empty());
    }
}
