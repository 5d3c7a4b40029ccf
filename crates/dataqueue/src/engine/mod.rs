//! Wiring between a [`ProducerPool`] and a [`ConsumerPool`].
//!
//! [`run`] drives two already-built pools. The other entry points build the
//! pools from raw callbacks or from a [`Runner`] first.


use crate::{ConsumerFn, ConsumerPool, Error, ProducerFn, ProducerPool, Result, Runner};
use tokio_util::sync::CancellationToken;

/// Runs `producer` and `consumer` to completion.
///
/// Both pools are started under a child of `token`, then the producer pool is
/// waited on (which closes the stream), then the consumer pool. Returns once
/// every worker on both sides has exited.
///
/// A panicking consumer callback cancels the child token, so the producers
/// stop, the stream closes and the panic is resumed here. `token` itself is
/// never cancelled by the engine.
///
/// # Errors
///
/// Returns an error if:
/// - the producer pool is spent ([`Error::InvalidProducer`]);
/// - the consumer pool is spent, or does not read the producer pool's stream
///   ([`Error::InvalidConsumer`]).
pub async fn run<T>(
    token: &CancellationToken,
    producer: &mut ProducerPool<T>,
    consumer: &mut ConsumerPool<T>,
) -> Result<()>
where
    T: Send + 'static,
{
    if producer.is_spent() {
        return Err(Error::InvalidProducer);
    }
    if consumer.is_spent() || !producer.owns(consumer.stream()) {
        return Err(Error::InvalidConsumer);
    }

    #[cfg(feature = "tracing")]
    tracing::debug!(
        "Running {} producers into {} consumers",
        producer.worker_count(),
        consumer.worker_count()
    );

    let token = token.child_token();
    producer.run(&token);
    consumer.run(&token);

    producer.wait().await;
    consumer.wait().await;

    Ok(())
}

/// Builds both pools from raw callbacks and runs them.
///
/// # Errors
///
/// Any failure to build the producer pool is reported as
/// [`Error::InvalidProducer`], any failure to build the consumer pool as
/// [`Error::InvalidConsumer`].
pub async fn run_with<T>(
    token: &CancellationToken,
    producers: usize,
    producer: Option<ProducerFn<T>>,
    consumers: usize,
    consumer: Option<ConsumerFn<T>>,
) -> Result<()>
where
    T: Send + 'static,
{
    let mut producer = ProducerPool::new(producers, producer).map_err(|_e| {
        #[cfg(feature = "tracing")]
        tracing::debug!("Cannot build producer pool: {_e}");
        Error::InvalidProducer
    })?;
    let mut consumer = ConsumerPool::new(producer.stream(), consumers, consumer).map_err(|_e| {
        #[cfg(feature = "tracing")]
        tracing::debug!("Cannot build consumer pool: {_e}");
        Error::InvalidConsumer
    })?;

    run(token, &mut producer, &mut consumer).await
}

/// Runs the callbacks yielded by `runner` with the given worker counts.
///
/// # Errors
///
/// See [`run_with`].
pub async fn start<T, R>(
    token: &CancellationToken,
    runner: &R,
    producers: usize,
    consumers: usize,
) -> Result<()>
where
    T: Send + 'static,
    R: Runner<T> + ?Sized,
{
    let (producer, consumer) = runner.callbacks();
    run_with(token, producers, producer, consumers, consumer).await
}

/// Runs `runner` with `producers` producer workers and a single consumer.
///
/// # Errors
///
/// See [`run_with`].
pub async fn start_single_consumer<T, R>(
    token: &CancellationToken,
    runner: &R,
    producers: usize,
) -> Result<()>
where
    T: Send + 'static,
    R: Runner<T> + ?Sized,
{
    start(token, runner, producers, 1).await
}

/// Runs `runner` with a single producer and `consumers` consumer workers.
///
/// # Errors
///
/// See [`run_with`].
pub async fn start_single_producer<T, R>(
    token: &CancellationToken,
    runner: &R,
    consumers: usize,
) -> Result<()>
where
    T: Send + 'static,
    R: Runner<T> + ?Sized,
{
    start(token, runner, 1, consumers).await
}
