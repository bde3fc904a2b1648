//! The three-channel sink contract and its closure-backed implementation.

use std::sync::Arc;

use crate::errors::{EmitResult, ObservableError, ObserverError};

/// Capability of receiving the three kinds of notification an observable
/// stream delivers.
///
/// Implemented by [`Observer`], by `Subscriber` and by `Subject`. Every
/// channel reports back whether the event was handled, see [`EmitResult`].
pub trait ObserverLike<T> {
    /// Delivers the next value.
    fn on_next(&self, v: T) -> EmitResult;

    /// Signals that no more values will follow.
    fn on_completed(&self) -> EmitResult;

    /// Signals that the stream terminated with an error.
    fn on_error(&self, e: ObservableError) -> EmitResult;
}

/// Return types accepted from user supplied callbacks.
///
/// Plain closures returning `()` always succeed. Closures returning
/// [`EmitResult`] can report failures.
pub trait HandlerResult {
    fn into_result(self) -> EmitResult;
}

impl HandlerResult for () {
    fn into_result(self) -> EmitResult {
        Ok(())
    }
}

impl HandlerResult for EmitResult {
    fn into_result(self) -> EmitResult {
        self
    }
}

type NextFn<T> = Arc<dyn Fn(T) -> EmitResult + Send + Sync>;
type CompletedFn = Arc<dyn Fn() -> EmitResult + Send + Sync>;
type ErrorFn = Arc<dyn Fn(ObservableError) -> EmitResult + Send + Sync>;

/// A set of up to three callbacks handling values, completion and errors.
///
/// Calling a channel whose callback was not supplied is a silent no-op.
/// Cloning an `Observer` is shallow: clones share the same callbacks.
///
/// ```
/// use rxlite::{Observer, ObserverLike};
///
/// let observer = Observer::from_next(|v: i32| println!("got {}", v))
///     .with_completed(|| println!("done"));
///
/// observer.on_next(1).unwrap();
/// observer.on_completed().unwrap();
/// ```
pub struct Observer<T> {
    next_fn: Option<NextFn<T>>,
    completed_fn: Option<CompletedFn>,
    error_fn: Option<ErrorFn>,
}

impl<T> Observer<T> {
    /// Creates an `Observer` handling all three channels.
    pub fn new<N, C, E, RN, RC, RE>(next_fn: N, completed_fn: C, error_fn: E) -> Self
    where
        N: Fn(T) -> RN + Send + Sync + 'static,
        C: Fn() -> RC + Send + Sync + 'static,
        E: Fn(ObservableError) -> RE + Send + Sync + 'static,
        RN: HandlerResult,
        RC: HandlerResult,
        RE: HandlerResult,
    {
        Self::from_next(next_fn)
            .with_completed(completed_fn)
            .with_error(error_fn)
    }

    /// Creates an `Observer` that handles values only.
    pub fn from_next<N, R>(next_fn: N) -> Self
    where
        N: Fn(T) -> R + Send + Sync + 'static,
        R: HandlerResult,
    {
        Observer {
            next_fn: Some(Arc::new(move |v| next_fn(v).into_result())),
            completed_fn: None,
            error_fn: None,
        }
    }

    /// Creates an `Observer` that ignores every notification.
    #[must_use]
    pub fn empty() -> Self {
        Observer {
            next_fn: None,
            completed_fn: None,
            error_fn: None,
        }
    }

    /// Sets the completion callback.
    #[must_use]
    pub fn with_completed<C, R>(mut self, completed_fn: C) -> Self
    where
        C: Fn() -> R + Send + Sync + 'static,
        R: HandlerResult,
    {
        self.completed_fn = Some(Arc::new(move || completed_fn().into_result()));
        self
    }

    /// Sets the error callback.
    #[must_use]
    pub fn with_error<E, R>(mut self, error_fn: E) -> Self
    where
        E: Fn(ObservableError) -> R + Send + Sync + 'static,
        R: HandlerResult,
    {
        self.error_fn = Some(Arc::new(move |e| error_fn(e).into_result()));
        self
    }

    /// Makes the error channel report [`ObserverError::OnErrorNotImplemented`].
    ///
    /// Once wrapped by a safe subscriber, any error reaching this observer is
    /// returned to whoever emitted it instead of being dropped.
    #[must_use]
    pub fn with_unhandled_errors(mut self) -> Self {
        self.error_fn = Some(Arc::new(|_| Err(ObserverError::OnErrorNotImplemented)));
        self
    }
}

impl<T> ObserverLike<T> for Observer<T> {
    fn on_next(&self, v: T) -> EmitResult {
        match &self.next_fn {
            Some(nfn) => nfn(v),
            None => Ok(()),
        }
    }

    fn on_completed(&self) -> EmitResult {
        match &self.completed_fn {
            Some(cfn) => cfn(),
            None => Ok(()),
        }
    }

    fn on_error(&self, e: ObservableError) -> EmitResult {
        match &self.error_fn {
            Some(efn) => efn(e),
            None => Ok(()),
        }
    }
}

impl<T> Clone for Observer<T> {
    fn clone(&self) -> Self {
        Observer {
            next_fn: self.next_fn.clone(),
            completed_fn: self.completed_fn.clone(),
            error_fn: self.error_fn.clone(),
        }
    }
}

impl<T> Default for Observer<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> std::fmt::Debug for Observer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observer")
            .field("next", &self.next_fn.is_some())
            .field("completed", &self.completed_fn.is_some())
            .field("error", &self.error_fn.is_some())
            .finish()
    }
}
