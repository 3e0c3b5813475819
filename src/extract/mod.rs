//! Parallel Extraction
//!
//! Bounded fan-out over a known batch of independent work items, usually one
//! external command per item. Every item is spawned as its own task; a
//! semaphore keeps at most `workers` of them running, and results are
//! gathered either in input order or folded as they complete.

pub mod error;
pub mod tasks;

use std::future::Future;
use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use log::warn;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub use error::{ExtractError, ExtractResult};

/// Worker pool for independent extraction tasks
#[derive(Debug, Clone)]
pub struct ParallelExtractor {
    /// Limits the number of tasks running at once
    semaphore: Arc<Semaphore>,
    workers: usize,
    /// Cancels every outstanding task of every batch
    cancellation_token: CancellationToken,
}

impl ParallelExtractor {
    /// Create a pool running at most `workers` tasks at once (minimum one)
    pub fn new(workers: usize) -> Self {
        let workers = workers.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(workers)),
            workers,
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Tie the pool to an externally owned token, e.g. one cancelled on Ctrl-C
    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = token;
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Abort outstanding tasks; their futures are dropped, killing any
    /// subprocess they own
    pub fn cancel(&self) {
        self.cancellation_token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation_token.is_cancelled()
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    fn spawn<I, T, F, Fut>(&self, task: Arc<F>, item: I) -> JoinHandle<ExtractResult<T>>
    where
        I: Send + 'static,
        T: Send + 'static,
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        let semaphore = Arc::clone(&self.semaphore);
        let cancel = self.cancellation_token.child_token();

        tokio::spawn(async move {
            let _permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ExtractError::Cancelled),
                permit = semaphore.acquire_owned() => permit.map_err(|_| ExtractError::Closed)?,
            };
            let work = (*task)(item);
            tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(ExtractError::Cancelled),
                value = work => Ok(value),
            }
        })
    }

    /// Run `task` over every item, returning results in input order
    pub async fn map_ordered<I, T, F, Fut>(
        &self,
        items: impl IntoIterator<Item = I>,
        task: F,
    ) -> Vec<ExtractResult<T>>
    where
        I: Send + 'static,
        T: Send + 'static,
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        let task = Arc::new(task);
        let handles: Vec<_> = items
            .into_iter()
            .map(|item| self.spawn(Arc::clone(&task), item))
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            results.push(match handle.await {
                Ok(result) => result,
                Err(join_err) => Err(ExtractError::from(join_err)),
            });
        }
        results
    }

    /// Run `task` over every item and fold the results in completion order
    ///
    /// Failed items are logged and left out of the reduction.
    pub async fn map_reduce<I, T, A, F, Fut, R>(
        &self,
        items: impl IntoIterator<Item = I>,
        task: F,
        init: A,
        mut fold: R,
    ) -> A
    where
        I: Send + 'static,
        T: Send + 'static,
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
        R: FnMut(A, T) -> A,
    {
        let task = Arc::new(task);
        let mut pending: FuturesUnordered<_> = items
            .into_iter()
            .map(|item| self.spawn(Arc::clone(&task), item))
            .collect();

        let mut acc = init;
        while let Some(joined) = pending.next().await {
            match joined.map_err(ExtractError::from).and_then(|result| result) {
                Ok(value) => acc = fold(acc, value),
                Err(e) => warn!("Skipping extraction result: {}", e),
            }
        }
        acc
    }
}

/// Unwrap ordered results, substituting the default for failed items
pub fn or_default<T: Default>(results: Vec<ExtractResult<T>>) -> Vec<T> {
    results
        .into_iter()
        .map(|result| match result {
            Ok(value) => value,
            Err(e) => {
                warn!("No data from extraction task: {}", e);
                T::default()
            }
        })
        .collect()
}
