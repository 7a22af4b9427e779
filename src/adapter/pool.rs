//! Bounded worker pool for asynchronous command execution
//!
//! Command bodies are synchronous and may block, so every job runs through `spawn_blocking` on the
//! injected runtime. A semaphore caps how many jobs run at once; jobs beyond that wait in FIFO
//! order for a permit. The pool never owns the runtime, it only holds a [`Handle`] to it.

use std::{
    future::Future,
    pin::Pin,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering}
    },
    task::{Context, Poll}
};

use tokio::{
    runtime::Handle,
    sync::{Semaphore, oneshot},
    task::JoinHandle
};
use tracing::{Level, event};

use crate::domain::{constant::pool, error::CommandError};

pub const DEFAULT_WORKER_POOL_SIZE: usize = 5;

#[derive(Debug, Clone)]
pub struct WorkerPool {
    handle:    Handle,
    permits:   Arc<Semaphore>,
    size:      usize,
    accepting: Arc<AtomicBool>
}

impl WorkerPool {
    /// Pool running at most `size` jobs at once on `handle`'s runtime. A size of zero is raised to one.
    pub fn new(handle: Handle, size: usize) -> Self {
        let size = size.max(1);
        event!(Level::DEBUG, event = pool::POOL_STARTED, size = size);
        Self { handle, permits: Arc::new(Semaphore::new(size)), size, accepting: Arc::new(AtomicBool::new(true)) }
    }

    /// Pool bound to the runtime the caller is running in
    pub fn current(size: usize) -> Result<Self, CommandError> {
        let handle = Handle::try_current().map_err(|e| CommandError::Runtime(e.to_string()))?;
        Ok(Self::new(handle, size))
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    /// Stop accepting new jobs. Jobs already submitted still run to completion.
    pub fn shutdown(&self) {
        if self.accepting.swap(false, Ordering::SeqCst) {
            event!(Level::INFO, event = pool::POOL_SHUTDOWN, size = self.size);
        }
    }

    pub fn is_shutdown(&self) -> bool {
        !self.accepting.load(Ordering::SeqCst)
    }

    /// Submit a job, consumed through a composable handle
    pub fn submit<T, F>(&self, job: F) -> Result<CompletableExecution<T>, CommandError>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, CommandError> + Send + 'static
    {
        let join = self.spawn(job)?;
        Ok(CompletableExecution { handle: self.handle.clone(), join })
    }

    /// Submit a job, consumed by awaiting or by blocking the calling thread
    pub fn submit_pending<T, F>(&self, job: F) -> Result<PendingExecution<T>, CommandError>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, CommandError> + Send + 'static
    {
        let join = self.spawn(job)?;
        let (sender, receiver) = oneshot::channel();

        self.handle.spawn(async move {
            let _ = sender.send(flatten(join.await));
        });

        Ok(PendingExecution { receiver })
    }

    fn spawn<T, F>(&self, job: F) -> Result<JoinHandle<Result<T, CommandError>>, CommandError>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, CommandError> + Send + 'static
    {
        if self.is_shutdown() {
            event!(Level::WARN, event = pool::JOB_REJECTED, reason = "pool shut down");
            return Err(CommandError::PoolShutdown);
        }

        event!(Level::DEBUG, event = pool::JOB_SUBMITTED, available = self.permits.available_permits());
        let permits = self.permits.clone();

        Ok(self.handle.spawn(async move {
            let _permit = permits.acquire_owned().await.map_err(|e| CommandError::Runtime(e.to_string()))?;
            flatten(tokio::task::spawn_blocking(job).await)
        }))
    }
}

fn flatten<T>(joined: Result<Result<T, CommandError>, tokio::task::JoinError>) -> Result<T, CommandError> {
    joined.unwrap_or_else(|e| {
        event!(Level::ERROR, event = pool::JOB_ABORTED, error = %e);
        Err(CommandError::Runtime(e.to_string()))
    })
}

/// Handle to a submitted job that can be awaited or waited on from a plain thread
#[derive(Debug)]
pub struct PendingExecution<T> {
    receiver: oneshot::Receiver<Result<T, CommandError>>
}

impl<T> PendingExecution<T> {
    /// Block the current thread until the job finishes
    ///
    /// Must not be called from inside an async context.
    pub fn blocking_wait(self) -> Result<T, CommandError> {
        self.receiver.blocking_recv().unwrap_or_else(|_| Err(dropped()))
    }
}

impl<T> Future for PendingExecution<T> {
    type Output = Result<T, CommandError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver).poll(cx).map(|received| received.unwrap_or_else(|_| Err(dropped())))
    }
}

fn dropped() -> CommandError {
    CommandError::Runtime("worker dropped the execution before completing it".to_string())
}

/// Handle to a submitted job that supports chaining continuations
#[derive(Debug)]
pub struct CompletableExecution<T> {
    handle: Handle,
    join:   JoinHandle<Result<T, CommandError>>
}

impl<T: Send + 'static> CompletableExecution<T> {
    /// Run `next` on the successful value; failures skip it
    pub fn then<U, F>(self, next: F) -> CompletableExecution<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> Result<U, CommandError> + Send + 'static
    {
        let handle = self.handle.clone();
        let join = handle.spawn(async move { self.await.and_then(next) });
        CompletableExecution { handle, join }
    }

    pub fn map<U, F>(self, transform: F) -> CompletableExecution<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static
    {
        self.then(move |value| Ok(transform(value)))
    }

    /// Replace a failure with the outcome of `fallback`
    pub fn recover<F>(self, fallback: F) -> CompletableExecution<T>
    where
        F: FnOnce(CommandError) -> Result<T, CommandError> + Send + 'static
    {
        let handle = self.handle.clone();
        let join = handle.spawn(async move { self.await.or_else(fallback) });
        CompletableExecution { handle, join }
    }

    /// Observe the outcome, success or failure, and pass it through unchanged
    pub fn on_complete<F>(self, callback: F) -> CompletableExecution<T>
    where
        F: FnOnce(&Result<T, CommandError>) + Send + 'static
    {
        let handle = self.handle.clone();
        let join = handle.spawn(async move {
            let outcome = self.await;
            callback(&outcome);
            outcome
        });
        CompletableExecution { handle, join }
    }
}

impl<T> Future for CompletableExecution<T> {
    type Output = Result<T, CommandError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.join).poll(cx).map(flatten)
    }
}
