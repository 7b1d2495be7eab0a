//! The latest value of an asynchronous fetch, with change notification.
//!
//! # Design
//! `RemoteData<T>` keeps two channels:
//! - a `watch` cell holding `Option<T>`, read synchronously through
//!   `value()`. `None` means no update has completed yet.
//! - a `broadcast` channel that carries every successfully fetched value to
//!   the subscribers present at the time it is published. There is no replay.
//!
//! `update()` spawns the fetch as its own task, so it runs to completion even
//! if nobody awaits the returned `UpdateHandle`. Overlapping updates are not
//! ordered: whichever completes last owns `value()`.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::ApiError;

const DEFAULT_CAPACITY: usize = 16;

type FetchFn<T> = Arc<dyn Fn() -> BoxFuture<'static, Result<T, ApiError>> + Send + Sync>;

/// A remotely sourced value, refreshed on demand. Clones share state.
pub struct RemoteData<T> {
    fetch: FetchFn<T>,
    value: Arc<watch::Sender<Option<T>>>,
    updates: broadcast::Sender<T>,
}

impl<T> RemoteData<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new<F, Fut>(fetch: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        Self::with_capacity(fetch, DEFAULT_CAPACITY)
    }

    /// `capacity` bounds how many unread values a slow subscriber may fall
    /// behind before it starts skipping.
    pub fn with_capacity<F, Fut>(fetch: F, capacity: usize) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let (updates, _) = broadcast::channel(capacity.max(1));
        let (value, _) = watch::channel(None);
        Self {
            fetch: Arc::new(move || fetch().boxed()),
            value: Arc::new(value),
            updates,
        }
    }

    /// The most recently published value, `None` before the first
    /// successful update.
    pub fn value(&self) -> Option<T> {
        self.value.borrow().clone()
    }

    /// Receive every value published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<T> {
        self.updates.subscribe()
    }

    /// Latest value plus change notification.
    pub fn watch(&self) -> watch::Receiver<Option<T>> {
        self.value.subscribe()
    }

    /// Start a fetch. The result is stored and published when it arrives;
    /// the returned handle resolves to this particular call's outcome.
    ///
    /// Must be called within a tokio runtime.
    pub fn update(&self) -> UpdateHandle<T> {
        let fetch = (self.fetch)();
        let value = self.value.clone();
        let updates = self.updates.clone();

        let task = tokio::spawn(async move {
            match fetch.await {
                Ok(data) => {
                    value.send_replace(Some(data.clone()));
                    // No subscribers is not an error.
                    let receivers = updates.send(data.clone()).unwrap_or(0);
                    debug!(receivers, "remote data updated");
                    Ok(data)
                }
                Err(e) => {
                    warn!(error = %e, "remote data update failed");
                    Err(e)
                }
            }
        });
        UpdateHandle { task }
    }
}

impl<T> Clone for RemoteData<T> {
    fn clone(&self) -> Self {
        Self {
            fetch: self.fetch.clone(),
            value: self.value.clone(),
            updates: self.updates.clone(),
        }
    }
}

/// Completion of one `RemoteData::update` call.
///
/// Dropping the handle does not cancel the update.
pub struct UpdateHandle<T> {
    task: JoinHandle<Result<T, ApiError>>,
}

impl<T> UpdateHandle<T> {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl<T> Future for UpdateHandle<T> {
    type Output = Result<T, ApiError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.task)
            .poll(cx)
            .map(|joined| joined.unwrap_or_else(|e| Err(ApiError::TaskFailed(e.to_string()))))
    }
}
