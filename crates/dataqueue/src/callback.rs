use crate::Action;
use futures::{FutureExt, future::BoxFuture};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// What a producer callback hands back each round: an optional item and the
/// [`Action`] deciding what happens to it.
///
/// A `None` item is never forwarded, even with [`Action::SEND`] set, which
/// lets a callback say "stop, nothing to emit" without a sentinel value.
pub type Produced<T> = (Option<T>, Action);

/// Shared producer callback, invoked repeatedly by every producer worker.
///
/// The token is the producer pool's token: it is cancelled when the caller
/// cancels the pipeline or when any worker observes [`Action::STOP_ALL`].
pub type ProducerFn<T> =
    Arc<dyn Fn(CancellationToken) -> BoxFuture<'static, Produced<T>> + Send + Sync>;

/// Shared consumer callback, invoked once per delivered item.
///
/// Callbacks should discriminate the item themselves and ignore anything they
/// do not recognize rather than panic.
pub type ConsumerFn<T> = Arc<dyn Fn(CancellationToken, T) -> BoxFuture<'static, ()> + Send + Sync>;

/// Wraps an async closure into a [`ProducerFn`].
///
/// ```
/// use dataqueue::{Action, producer_fn};
///
/// let producer = producer_fn(|_token| async { (Some(42_u64), Action::SEND_AND_STOP) });
/// # let _ = producer;
/// ```
pub fn producer_fn<T, F, Fut>(f: F) -> ProducerFn<T>
where
    T: 'static,
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Produced<T>> + Send + 'static,
{
    Arc::new(move |token| -> BoxFuture<'static, Produced<T>> { f(token).boxed() })
}

/// Wraps an async closure into a [`ConsumerFn`].
pub fn consumer_fn<T, F, Fut>(f: F) -> ConsumerFn<T>
where
    T: 'static,
    F: Fn(CancellationToken, T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(move |token, item| -> BoxFuture<'static, ()> { f(token, item).boxed() })
}

/// The extension point external code implements to plug into the engine.
///
/// A runner yields the producer/consumer callback pair. Returning `None` for
/// either side makes the engine reject the run with an error instead of
/// starting any worker.
pub trait Runner<T> {
    /// Returns the producer and consumer callbacks for one run.
    fn callbacks(&self) -> (Option<ProducerFn<T>>, Option<ConsumerFn<T>>);
}

impl<T, R: Runner<T> + ?Sized> Runner<T> for Arc<R> {
    fn callbacks(&self) -> (Option<ProducerFn<T>>, Option<ConsumerFn<T>>) {
        (**self).callbacks()
    }
}
