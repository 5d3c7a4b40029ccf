//! Consumer worker pool.
//!
//! [`ConsumerPool`] runs a fixed number of consumer workers, each reading
//! from the shared [`Stream`] and invoking the [`ConsumerFn`] once per item.
//!
//! Cancellation does not make a consumer exit. A producer may be halfway
//! through handing over an item when the token is cancelled, and that hand
//! over only completes once some reader takes the item. So a cancelled
//! consumer switches to draining: it keeps receiving and discarding items
//! without invoking the callback, and exits only once the stream is closed.
//!
//! A panicking callback gets the same treatment: the worker cancels its token
//! so producers wind down, drains until the stream closes, and only then
//! re-raises the panic for [`ConsumerPool::wait`] to resume.

use crate::{ConsumerFn, Error, Result, Role, Stream, producer::join_workers};
use futures::FutureExt;
use std::{panic::AssertUnwindSafe, sync::Arc};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// A pool of consumer workers draining a single [`Stream`].
pub struct ConsumerPool<T> {
    stream: Stream<T>,
    worker_count: usize,
    consumer: ConsumerFn<T>,
    workers: JoinSet<()>,
    started: bool,
}

impl<T> ConsumerPool<T>
where
    T: Send + 'static,
{
    /// Creates a pool of `worker_count` workers reading `stream`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `consumer` is `None` ([`Error::InvalidCallback`]).
    /// - `worker_count` is zero ([`Error::InvalidWorkerCount`]).
    pub fn new(
        stream: Stream<T>,
        worker_count: usize,
        consumer: Option<ConsumerFn<T>>,
    ) -> Result<Self> {
        let consumer = consumer.ok_or(Error::InvalidCallback)?;
        if worker_count == 0 {
            return Err(Error::InvalidWorkerCount {
                role: Role::Consumer,
            });
        }

        Ok(Self {
            stream,
            worker_count,
            consumer,
            workers: JoinSet::new(),
            started: false,
        })
    }

    /// Returns the number of workers this pool runs.
    pub const fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// The stream this pool reads.
    pub fn stream(&self) -> &Stream<T> {
        &self.stream
    }

    /// Returns `true` once the pool has been run.
    pub const fn is_spent(&self) -> bool {
        self.started
    }

    /// Spawns the pool's workers and returns immediately. Calling `run` on a
    /// spent pool does nothing.
    ///
    /// A worker whose callback panics cancels `token`, so pass the token the
    /// producers run under to have them stop as well.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    pub fn run(&mut self, token: &CancellationToken) {
        if self.started {
            #[cfg(feature = "tracing")]
            tracing::warn!("Consumer pool is spent, ignoring run");
            return;
        }
        self.started = true;

        #[cfg(feature = "tracing")]
        tracing::debug!("Starting {} consumer workers", self.worker_count);

        for worker_id in 0..self.worker_count {
            let worker = consume(
                worker_id,
                self.stream.clone(),
                Arc::clone(&self.consumer),
                token.clone(),
            );
            self.workers.spawn(worker);
        }
    }

    /// Waits for every worker to exit.
    ///
    /// Workers exit only once the stream is closed, so this returns after the
    /// producer side has been waited on. A worker panic is resumed here after
    /// the remaining workers have been joined.
    pub async fn wait(&mut self) {
        let panic = join_workers(&mut self.workers, Role::Consumer).await;

        #[cfg(feature = "tracing")]
        tracing::debug!("Consumer pool drained");

        if let Some(panic) = panic {
            std::panic::resume_unwind(panic);
        }
    }
}

async fn consume<T>(
    _worker_id: usize,
    stream: Stream<T>,
    consumer: ConsumerFn<T>,
    token: CancellationToken,
) where
    T: Send + 'static,
{
    #[cfg(feature = "tracing")]
    tracing::trace!("Consumer {_worker_id} started");

    let mut draining = false;
    let mut panic = None;

    loop {
        tokio::select! {
            biased;

            () = token.cancelled(), if !draining => {
                #[cfg(feature = "tracing")]
                tracing::trace!("Consumer {_worker_id} draining until the stream closes");
                draining = true;
            }
            item = stream.recv() => {
                let Some(item) = item else {
                    break;
                };
                if draining {
                    continue;
                }
                let invocation = async { consumer(token.clone(), item).await };
                if let Err(payload) = AssertUnwindSafe(invocation).catch_unwind().await {
                    #[cfg(feature = "tracing")]
                    tracing::error!(
                        "Consumer {_worker_id} callback panicked, draining until the stream closes"
                    );
                    token.cancel();
                    draining = true;
                    panic.get_or_insert(payload);
                }
            }
        }
    }

    #[cfg(feature = "tracing")]
    tracing::trace!("Consumer {_worker_id} stopped");

    if let Some(panic) = panic {
        std::panic::resume_unwind(panic);
    }
}
