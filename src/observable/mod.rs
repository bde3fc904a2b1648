//! The `observable` module provides the building blocks for creating and composing
//! observables.

mod range;

use std::{fmt, sync::Arc};

use crate::{
    errors::{EmitResult, ObserverError},
    observer::{HandlerResult, Observer, ObserverLike},
    subscription::{
        safe::safe_subscriber,
        subscribe::{Subscriber, Subscription},
    },
};

pub use range::range;

type OnSubscribeFn<T> = dyn Fn(Subscriber<T>) -> EmitResult + Send + Sync;

/// The `Observable` struct represents a deferred recipe producing a sequence
/// of values.
///
/// An `Observable` stores a producer function. Every call to `subscribe`
/// runs the producer again for the new subscriber ("cold" semantics), and
/// cloning an `Observable` shares the same producer.
///
/// The producer receives a [`Subscriber`] and pushes values into it
/// synchronously. It may register teardown logic with
/// [`Subscriber::add`], and it returns an [`EmitResult`] so emissions can be
/// chained with `?`.
///
/// # Example
///
/// ```
/// use rxlite::{EmitResult, Observable, Observer, ObserverLike, Subscribeable, Subscriber};
///
/// let numbers = Observable::new(|subscriber: Subscriber<i32>| -> EmitResult {
///     for i in 1..=3 {
///         subscriber.on_next(i)?;
///     }
///     subscriber.on_completed()
/// });
///
/// numbers
///     .map(|v| v * 10)
///     .subscribe(
///         Observer::from_next(|v: i32| println!("Emitted {}", v))
///             .with_completed(|| println!("Completed")),
///     )
///     .unwrap();
/// ```
pub struct Observable<T> {
    producer: Arc<OnSubscribeFn<T>>,
}

impl<T: 'static> Observable<T> {
    /// Creates a new `Observable` with the provided producer function.
    pub fn new<F, R>(producer: F) -> Self
    where
        F: Fn(Subscriber<T>) -> R + Send + Sync + 'static,
        R: HandlerResult,
    {
        Observable {
            producer: Arc::new(move |subscriber| producer(subscriber).into_result()),
        }
    }

    /// Same as [`Observable::new`].
    pub fn create<F, R>(producer: F) -> Self
    where
        F: Fn(Subscriber<T>) -> R + Send + Sync + 'static,
        R: HandlerResult,
    {
        Self::new(producer)
    }

    /// Runs the producer for `subscriber` without any wrapping.
    pub(crate) fn on_subscribe(&self, subscriber: Subscriber<T>) -> EmitResult {
        (self.producer)(subscriber)
    }
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Observable {
            producer: Arc::clone(&self.producer),
        }
    }
}

impl<T> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable").finish_non_exhaustive()
    }
}

/// Types that produce a sequence of values and can be subscribed to.
///
/// Implemented by [`Observable`] and by `Subject`. Only
/// [`as_observable`](Subscribeable::as_observable) is required; subscribing
/// and operator composition are provided on top of it.
pub trait Subscribeable<T: 'static> {
    /// The observable backing this value.
    fn as_observable(&self) -> &Observable<T>;

    /// Subscribes `observer` and returns the handle cancelling this one
    /// subscription.
    ///
    /// The observer is wrapped in a safe subscriber before the producer runs,
    /// so it sees at most one terminal event and never sees an event after
    /// it was unsubscribed.
    ///
    /// # Errors
    ///
    /// Returns [`ObserverError::Unhandled`] when an error reached an observer
    /// that cannot handle it while the producer was running. Any other error
    /// returned by the producer is delivered to `observer` as `on_error`.
    fn subscribe(&self, observer: Observer<T>) -> Result<Subscription, ObserverError> {
        let safe = safe_subscriber(&Subscriber::new(observer));
        let subscription = safe.subscription();

        tracing::trace!("subscribing to observable");
        match self.as_observable().on_subscribe(safe.clone()) {
            Ok(()) => {}
            Err(ObserverError::Unhandled(e)) => return Err(ObserverError::Unhandled(e)),
            Err(err) => safe.on_error(err.into_payload())?,
        }
        Ok(subscription)
    }

    /// Subscribes with a value callback only.
    ///
    /// Errors reaching this subscriber are not handled: they are returned to
    /// whoever emitted them, see [`Observer::with_unhandled_errors`].
    ///
    /// # Errors
    ///
    /// Same as [`subscribe`](Subscribeable::subscribe).
    fn subscribe_next<N, R>(&self, next_fn: N) -> Result<Subscription, ObserverError>
    where
        N: Fn(T) -> R + Send + Sync + 'static,
        R: HandlerResult,
    {
        self.subscribe(Observer::from_next(next_fn).with_unhandled_errors())
    }

    /// Builds a new observable by rewriting the subscriber seen by this one's
    /// producer.
    ///
    /// When the returned observable is subscribed, `operator` receives the
    /// downstream `Subscriber<R>` and returns the `Subscriber<T>` handed to
    /// this observable's producer.
    fn lift<R, F>(&self, operator: F) -> Observable<R>
    where
        R: 'static,
        F: Fn(Subscriber<R>) -> Subscriber<T> + Send + Sync + 'static,
    {
        let source = self.as_observable().clone();
        Observable::new(move |subscriber: Subscriber<R>| {
            source.on_subscribe(operator(subscriber))
        })
    }

    /// Transforms every value with `f`. Completion and errors pass through
    /// unchanged.
    fn map<R, F>(&self, f: F) -> Observable<R>
    where
        R: 'static,
        F: Fn(T) -> R + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        self.lift(move |downstream: Subscriber<R>| {
            let f = Arc::clone(&f);
            let observer = downstream.observer().clone();
            let completed = observer.clone();
            let errored = observer.clone();

            downstream.with_observer(Observer::<T>::new(
                move |v: T| observer.on_next((*f)(v)),
                move || completed.on_completed(),
                move |e| errored.on_error(e),
            ))
        })
    }
}

impl<T: 'static> Subscribeable<T> for Observable<T> {
    fn as_observable(&self) -> &Observable<T> {
        self
    }
}
