//! Wrapper enforcing the Observable Contract around an arbitrary observer.
//!
//! A safe subscriber guarantees that its destination observer receives at most
//! one terminal notification, that every termination unsubscribes the
//! subscription, and that failures inside the destination's callbacks
//! (returned errors or panics) are turned into a single error notification
//! instead of leaking into the producer.
//!
//! The only error a safe subscriber ever returns is
//! [`ObserverError::Unhandled`], raised when the destination cannot handle an
//! error. It carries the error that triggered it.

use std::{
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use crate::{
    errors::{EmitResult, ObservableError, ObserverError},
    observer::{Observer, ObserverLike},
    subscription::subscribe::{Subscriber, Subscription},
};

struct SafeObserverState<T> {
    observer: Observer<T>,
    subscription: Subscription,
    finished: AtomicBool,
}

impl<T> SafeObserverState<T> {
    /// Wins the single transition into the finished state.
    fn finish(&self) -> bool {
        self.finished
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn is_done(&self) -> bool {
        self.finished.load(Ordering::Acquire) || self.subscription.is_closed()
    }

    fn next(&self, v: T) -> EmitResult {
        if self.is_done() {
            tracing::trace!("dropping value delivered after termination");
            return Ok(());
        }

        match guard(|| self.observer.on_next(v)) {
            Ok(()) => Ok(()),
            Err(ObserverError::Unhandled(e)) => self.escape(e),
            Err(err) => self.error(err.into_payload()),
        }
    }

    fn completed(&self) -> EmitResult {
        if self.subscription.is_closed() || !self.finish() {
            tracing::trace!("dropping completion delivered after termination");
            return Ok(());
        }

        let result = match guard(|| self.observer.on_completed()) {
            Ok(()) => Ok(()),
            Err(ObserverError::Unhandled(e)) => Err(ObserverError::Unhandled(e)),
            Err(err) => {
                let e = err.into_payload();
                let outcome = guard(|| self.observer.on_error(Arc::clone(&e)));
                escalate(e, outcome)
            }
        };

        self.subscription.unsubscribe();
        result
    }

    fn error(&self, e: ObservableError) -> EmitResult {
        if self.subscription.is_closed() || !self.finish() {
            tracing::trace!("dropping error delivered after termination");
            return Ok(());
        }

        let outcome = guard(|| self.observer.on_error(Arc::clone(&e)));
        self.subscription.unsubscribe();
        escalate(e, outcome)
    }

    fn escape(&self, e: ObservableError) -> EmitResult {
        if self.finish() {
            self.subscription.unsubscribe();
        }
        Err(ObserverError::Unhandled(e))
    }
}

/// Runs a destination callback, turning a panic into a failure.
fn guard(f: impl FnOnce() -> EmitResult) -> EmitResult {
    panic::catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| {
        let err = ObserverError::from_panic(payload);
        tracing::warn!(error = %err, "observer callback panicked");
        Err(err)
    })
}

/// Maps the outcome of the destination's error handler for error `e`.
fn escalate(e: ObservableError, outcome: EmitResult) -> EmitResult {
    let escaped = match outcome {
        Ok(()) => return Ok(()),
        Err(ObserverError::OnErrorNotImplemented) => e,
        Err(ObserverError::Failed(x) | ObserverError::Unhandled(x)) => x,
    };
    tracing::warn!(error = %escaped, "unhandled error escaping safe subscriber");
    Err(ObserverError::Unhandled(escaped))
}

/// Wraps the observer of `actual` in an observer enforcing the Observable
/// Contract. Termination unsubscribes `actual`'s subscription.
pub fn safe_observer<T: 'static>(actual: &Subscriber<T>) -> Observer<T> {
    let state = Arc::new(SafeObserverState {
        observer: actual.observer().clone(),
        subscription: actual.subscription(),
        finished: AtomicBool::new(false),
    });

    let next_state = Arc::clone(&state);
    let completed_state = Arc::clone(&state);

    Observer::new(
        move |v| next_state.next(v),
        move || completed_state.completed(),
        move |e| state.error(e),
    )
}

/// Returns a new subscriber delivering through [`safe_observer`] and sharing
/// `actual`'s subscription list.
pub fn safe_subscriber<T: 'static>(actual: &Subscriber<T>) -> Subscriber<T> {
    actual.with_observer(safe_observer(actual))
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    };

    use super::*;
    use crate::subscription::subscribe::UnsubscribeLogic;

    #[derive(Debug, thiserror::Error)]
    #[error("bad value")]
    struct BadValue;

    #[derive(Default)]
    struct Log {
        nexts: Mutex<Vec<i32>>,
        completes: AtomicUsize,
        errors: Mutex<Vec<String>>,
    }

    fn recording(log: &Arc<Log>) -> Observer<i32> {
        let (n, c, e) = (Arc::clone(log), Arc::clone(log), Arc::clone(log));
        Observer::new(
            move |v| n.nexts.lock().unwrap().push(v),
            move || {
                c.completes.fetch_add(1, Ordering::SeqCst);
            },
            move |err: ObservableError| e.errors.lock().unwrap().push(err.to_string()),
        )
    }

    fn teardown_counter(subscriber: &Subscriber<i32>) -> Arc<AtomicUsize> {
        let count = Arc::new(AtomicUsize::new(0));
        let count_c = Arc::clone(&count);
        subscriber.add(Subscription::new(UnsubscribeLogic::Logic(Box::new(
            move || {
                count_c.fetch_add(1, Ordering::SeqCst);
            },
        ))));
        count
    }

    #[test]
    fn single_terminal_event_and_single_unsubscribe() {
        let log = Arc::new(Log::default());
        let actual = Subscriber::new(recording(&log));
        let teardowns = teardown_counter(&actual);
        let safe = safe_subscriber(&actual);

        safe.on_next(1).unwrap();
        safe.on_completed().unwrap();
        safe.on_completed().unwrap();
        safe.on_error(Arc::new(BadValue)).unwrap();
        safe.on_next(2).unwrap();

        assert_eq!(*log.nexts.lock().unwrap(), vec![1]);
        assert_eq!(log.completes.load(Ordering::SeqCst), 1);
        assert!(log.errors.lock().unwrap().is_empty());
        assert_eq!(teardowns.load(Ordering::SeqCst), 1);
        assert!(actual.is_unsubscribed());
    }

    #[test]
    fn failing_value_handler_becomes_error() {
        let log = Arc::new(Log::default());
        let log_e = Arc::clone(&log);
        let observer = Observer::new(
            |v: i32| {
                if v == 2 {
                    return Err(ObserverError::failed(BadValue));
                }
                Ok(())
            },
            || {},
            move |e: ObservableError| log_e.errors.lock().unwrap().push(e.to_string()),
        );
        let safe = safe_subscriber(&Subscriber::new(observer));

        safe.on_next(1).unwrap();
        safe.on_next(2).unwrap();
        safe.on_next(3).unwrap();

        assert_eq!(*log.errors.lock().unwrap(), vec!["bad value".to_owned()]);
        assert!(safe.is_unsubscribed());
    }

    #[test]
    fn panicking_value_handler_is_contained() {
        let log = Arc::new(Log::default());
        let log_e = Arc::clone(&log);
        let observer = Observer::from_next::<_, ()>(|_: i32| panic!("value handler exploded"))
            .with_error(move |e| log_e.errors.lock().unwrap().push(e.to_string()));
        let safe = safe_subscriber(&Subscriber::new(observer));

        assert!(safe.on_next(1).is_ok());

        let errors = log.errors.lock().unwrap();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("value handler exploded"));
    }

    #[test]
    fn failing_completion_handler_is_delivered_as_error() {
        let log = Arc::new(Log::default());
        let log_e = Arc::clone(&log);
        let observer = Observer::from_next(|_: i32| {})
            .with_completed(|| Err::<(), _>(ObserverError::failed(BadValue)))
            .with_error(move |e| log_e.errors.lock().unwrap().push(e.to_string()));
        let actual = Subscriber::new(observer);
        let teardowns = teardown_counter(&actual);
        let safe = safe_subscriber(&actual);

        assert!(safe.on_completed().is_ok());

        assert_eq!(*log.errors.lock().unwrap(), vec!["bad value".to_owned()]);
        assert_eq!(teardowns.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unimplemented_error_handler_rethrows_original_error() {
        let observer = Observer::from_next(|_: i32| {}).with_unhandled_errors();
        let actual = Subscriber::new(observer);
        let teardowns = teardown_counter(&actual);
        let safe = safe_subscriber(&actual);

        let original: ObservableError = Arc::new(BadValue);
        let result = safe.on_error(Arc::clone(&original));

        match result {
            Err(ObserverError::Unhandled(e)) => assert!(Arc::ptr_eq(&e, &original)),
            other => panic!("expected unhandled error, got {:?}", other),
        }
        assert_eq!(teardowns.load(Ordering::SeqCst), 1);
        assert!(safe.on_error(Arc::new(BadValue)).is_ok());
    }

    #[test]
    fn unimplemented_error_handler_rethrows_completion_failure() {
        let observer = Observer::from_next(|_: i32| {})
            .with_completed(|| Err::<(), _>(ObserverError::failed(BadValue)))
            .with_unhandled_errors();
        let actual = Subscriber::new(observer);
        let safe = safe_subscriber(&actual);

        match safe.on_completed() {
            Err(ObserverError::Unhandled(e)) => assert_eq!(e.to_string(), "bad value"),
            other => panic!("expected unhandled error, got {:?}", other),
        }
        assert!(actual.is_unsubscribed());
    }

    #[test]
    fn missing_error_handler_swallows_error() {
        let safe = safe_subscriber(&Subscriber::from_next(|_: i32| {}));

        assert!(safe.on_error(Arc::new(BadValue)).is_ok());
        assert!(safe.is_unsubscribed());
    }

    #[test]
    fn nothing_delivered_after_unsubscribe() {
        let log = Arc::new(Log::default());
        let actual = Subscriber::new(recording(&log));
        let safe = safe_subscriber(&actual);

        safe.on_next(1).unwrap();
        actual.subscription().unsubscribe();
        safe.on_next(2).unwrap();
        safe.on_completed().unwrap();

        assert_eq!(*log.nexts.lock().unwrap(), vec![1]);
        assert_eq!(log.completes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn safe_subscriber_shares_subscription() {
        let actual = Subscriber::from_next(|_: i32| {});
        let safe = safe_subscriber(&actual);

        assert_eq!(actual.subscription(), safe.subscription());
        assert_ne!(actual, safe);
    }
}
