//! Producer worker pool.
//!
//! This module defines [`ProducerPool`], which runs a fixed number of
//! producer workers as Tokio tasks. Every worker repeatedly invokes the shared
//! [`ProducerFn`], interprets the returned [`Action`], and forwards items onto
//! the pool's [`Stream`].
//!
//! Stopping is cooperative. [`Action::STOP`] ends the worker that observed it,
//! while [`Action::STOP_ALL`] sets a one-shot, pool-wide flag and cancels the
//! pool's child [`CancellationToken`] so that sibling workers wind down on
//! their next iteration. Cancelling the caller's token has the same effect.

use crate::{
    Action, Error, ProducerFn, Result, Role,
    stream::{self, Stream, StreamSender},
};
use portable_atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// A pool of producer workers writing into a single shared [`Stream`].
///
/// A pool is one-shot: once it has been run (or waited on) it is spent, and
/// a fresh pool is needed for a fresh run. The pool-wide stop flag is never
/// reset.
pub struct ProducerPool<T> {
    worker_count: usize,
    producer: ProducerFn<T>,
    sender: Option<StreamSender<T>>,
    stream: Stream<T>,
    stop_all: Arc<AtomicBool>,
    token: Option<CancellationToken>,
    workers: JoinSet<()>,
    started: bool,
}

impl<T> ProducerPool<T>
where
    T: Send + 'static,
{
    /// Creates a pool of `worker_count` workers sharing `producer`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `producer` is `None` ([`Error::InvalidCallback`]).
    /// - `worker_count` is zero ([`Error::InvalidWorkerCount`]).
    pub fn new(worker_count: usize, producer: Option<ProducerFn<T>>) -> Result<Self> {
        let producer = producer.ok_or(Error::InvalidCallback)?;
        if worker_count == 0 {
            return Err(Error::InvalidWorkerCount {
                role: Role::Producer,
            });
        }

        let (sender, stream) = stream::channel();
        Ok(Self {
            worker_count,
            producer,
            sender: Some(sender),
            stream,
            stop_all: Arc::new(AtomicBool::new(false)),
            token: None,
            workers: JoinSet::new(),
            started: false,
        })
    }

    /// Returns the number of workers this pool runs.
    pub const fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Returns a read-only view of the stream the workers write to.
    ///
    /// The view stays valid for the lifetime of the pool and reports the
    /// stream as closed once [`ProducerPool::wait`] has joined every worker.
    pub fn stream(&self) -> Stream<T> {
        self.stream.clone()
    }

    /// Returns `true` if `stream` is a view of this pool's stream.
    pub fn owns(&self, stream: &Stream<T>) -> bool {
        self.stream.same_stream(stream)
    }

    /// Returns `true` once the pool has been run or waited on.
    pub fn is_spent(&self) -> bool {
        self.started || self.sender.is_none()
    }

    /// Returns `true` if a worker has observed [`Action::STOP_ALL`].
    pub fn is_stopping_all(&self) -> bool {
        self.stop_all.load(Ordering::Acquire)
    }

    /// Spawns the pool's workers and returns immediately.
    ///
    /// Workers run under a child of `token`; cancelling `token` stops them,
    /// and so does any worker observing [`Action::STOP_ALL`], without touching
    /// `token` itself. Calling `run` on a spent pool does nothing.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    pub fn run(&mut self, token: &CancellationToken) {
        let Some(sender) = self.sender.clone().filter(|_| !self.started) else {
            #[cfg(feature = "tracing")]
            tracing::warn!("Producer pool is spent, ignoring run");
            return;
        };
        self.started = true;

        let token = token.child_token();

        #[cfg(feature = "tracing")]
        tracing::debug!("Starting {} producer workers", self.worker_count);

        for worker_id in 0..self.worker_count {
            let worker = produce(
                worker_id,
                Arc::clone(&self.producer),
                sender.clone(),
                Arc::clone(&self.stop_all),
                token.clone(),
            );
            self.workers.spawn(worker);
        }

        self.token = Some(token);
    }

    /// Waits for every worker to exit, then closes the stream and releases
    /// the pool's cancellation handle.
    ///
    /// Closing happens only after the join, so no worker can be writing when
    /// the stream closes. Waiting on a pool that was never run closes the
    /// stream straight away; waiting twice is a no-op.
    ///
    /// If a worker panicked, the panic is resumed here once the stream is
    /// closed, so readers are never left waiting on it.
    pub async fn wait(&mut self) {
        let panic = join_workers(&mut self.workers, Role::Producer).await;

        // Dropping the last sender closes the stream.
        drop(self.sender.take());

        if let Some(token) = self.token.take() {
            token.cancel();
        }

        #[cfg(feature = "tracing")]
        tracing::debug!("Producer pool drained, stream closed");

        if let Some(panic) = panic {
            std::panic::resume_unwind(panic);
        }
    }
}

/// Joins every worker in `workers`, returning the first panic payload, if
/// any.
///
/// Cancel safe: workers not yet joined stay in the set.
pub(crate) async fn join_workers(
    workers: &mut JoinSet<()>,
    _role: Role,
) -> Option<Box<dyn core::any::Any + Send + 'static>> {
    let mut first_panic = None;

    while let Some(result) = workers.join_next().await {
        match result {
            Ok(()) => {}
            Err(e) if e.is_panic() => {
                #[cfg(feature = "tracing")]
                tracing::error!("A {_role} worker panicked: {e}");
                if first_panic.is_none() {
                    first_panic = Some(e.into_panic());
                }
            }
            Err(_e) => {
                #[cfg(feature = "tracing")]
                tracing::warn!("A {_role} worker was cancelled: {_e}");
            }
        }
    }

    first_panic
}

/// Producer worker loop.
///
/// Each round the worker:
///
/// - exits if its token is cancelled or the pool-wide stop flag is set;
/// - invokes the producer callback;
/// - exits without acting on the result if the stop flag was set meanwhile;
/// - on [`Action::STOP_ALL`], sets the stop flag (only the first setter
///   cancels the pool token, once its own send has completed);
/// - on [`Action::SEND`] with an item, hands the item to a consumer, waiting
///   until one takes it;
/// - exits on [`Action::STOP`] or [`Action::STOP_ALL`].
async fn produce<T>(
    _worker_id: usize,
    producer: ProducerFn<T>,
    sender: StreamSender<T>,
    stop_all: Arc<AtomicBool>,
    token: CancellationToken,
) where
    T: Send + 'static,
{
    #[cfg(feature = "tracing")]
    tracing::trace!("Producer {_worker_id} started");

    loop {
        if token.is_cancelled() {
            #[cfg(feature = "tracing")]
            tracing::trace!("Producer {_worker_id} observed cancellation");
            break;
        }
        if stop_all.load(Ordering::Acquire) {
            break;
        }

        let (item, action): (Option<T>, Action) = producer(token.clone()).await;

        if stop_all.load(Ordering::Acquire) {
            #[cfg(feature = "tracing")]
            tracing::trace!("Producer {_worker_id} discarding {action}, pool is stopping");
            break;
        }

        let first_to_stop_all = action.is_stop_all()
            && stop_all
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_ok();

        let delivered = match item {
            Some(item) if action.is_send() => sender.deliver(item).await,
            _ => false,
        };

        if first_to_stop_all {
            #[cfg(feature = "tracing")]
            tracing::debug!("Producer {_worker_id} stopping all producers");
            token.cancel();
        }

        if action.terminates() {
            #[cfg(feature = "tracing")]
            tracing::trace!("Producer {_worker_id} received {action}");
            break;
        }

        if !delivered {
            // Nothing waited on a reader this round. Yield so a no-op loop
            // cannot starve the runtime.
            tokio::task::yield_now().await;
        }
    }

    #[cfg(feature = "tracing")]
    tracing::trace!("Producer {_worker_id} stopped");
}
