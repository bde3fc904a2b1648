use std::fmt;

use crate::{
    errors::{EmitResult, ObservableError},
    observable::{Observable, Subscribeable},
    observer::{Observer, ObserverLike},
};

use super::SubjectSubscriptionManager;

/// A `Subject` is an `Observable` and an `Observer` at the same time: a
/// multicast hub.
///
/// Unlike a regular `Observable`, which is unicast (each subscriber gets its
/// own execution of the producer), a `Subject` is multicast. Values pushed
/// into it with `on_next` are delivered live, in registration order, to every
/// subscriber registered at that moment. A subscriber joining later receives
/// nothing retroactively.
///
/// `on_completed` and `on_error` are delivered to the registered subscribers,
/// which are then dropped. The terminal event is recorded: further events are
/// ignored, and a subscriber joining after termination immediately receives
/// that same completion or error.
///
/// Cloning is shallow; clones share the subscriber set.
///
/// # Examples
///
/// ```
/// use rxlite::{Observer, ObserverLike, Subject, Subscribeable};
///
/// fn create_observer(id: i32) -> Observer<i32> {
///     Observer::from_next(move |v: i32| println!("Subscriber #{} emitted: {}", id, v))
///         .with_completed(move || println!("Completed {}", id))
/// }
///
/// let subject = Subject::new();
///
/// subject.subscribe(create_observer(1)).unwrap();
///
/// subject.on_next(101).unwrap(); // Reaches subscriber 1.
///
/// // Operators apply to subjects like to any observable.
/// subject
///     .map(|v| format!("mapped {}", v))
///     .subscribe(Observer::from_next(|v: String| println!("Subscriber #2 emitted: {}", v)))
///     .unwrap();
///
/// subject.on_next(102).unwrap(); // Reaches subscribers 1 and 2.
/// subject.on_completed().unwrap();
///
/// // Post-completion subscribe completes immediately.
/// subject.subscribe(create_observer(3)).unwrap();
///
/// subject.on_next(103).unwrap(); // Ignored.
/// ```
///
/// A `Subject` can be subscribed to another observable as its observer:
///
/// ```
/// use rxlite::{range, Observer, Subject, Subscribeable};
///
/// let subject = Subject::new();
/// subject
///     .subscribe(Observer::from_next(|v: i32| println!("got {}", v)))
///     .unwrap();
///
/// range(1, 3).subscribe(subject.clone().into()).unwrap();
/// ```
pub struct Subject<T> {
    observable: Observable<T>,
    observer: Observer<T>,
    manager: SubjectSubscriptionManager<T>,
}

impl<T: Clone + 'static> Subject<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::with_manager(SubjectSubscriptionManager::new())
    }

    /// Same as [`Subject::new`].
    #[must_use]
    pub fn create() -> Self {
        Self::new()
    }

    /// Creates a `Subject` pre-sized for `capacity` subscribers.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_manager(SubjectSubscriptionManager::with_capacity(capacity))
    }

    fn with_manager(manager: SubjectSubscriptionManager<T>) -> Self {
        Subject {
            observable: Observable::new(manager.create_on_subscribe_fn()),
            observer: Observer::new(
                manager.create_on_next_fn(),
                manager.create_on_completed_fn(),
                manager.create_on_error_fn(),
            ),
            manager,
        }
    }

    /// Returns the number of registered subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.manager.len()
    }

    /// Returns `true` if no subscribers are registered, `false` otherwise.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.manager.is_empty()
    }

    /// Returns `true` once the subject completed or errored.
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.manager.is_terminated()
    }
}

impl<T: Clone + 'static> Default for Subject<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> Subscribeable<T> for Subject<T> {
    fn as_observable(&self) -> &Observable<T> {
        &self.observable
    }
}

impl<T> ObserverLike<T> for Subject<T> {
    fn on_next(&self, v: T) -> EmitResult {
        self.observer.on_next(v)
    }

    fn on_completed(&self) -> EmitResult {
        self.observer.on_completed()
    }

    fn on_error(&self, e: ObservableError) -> EmitResult {
        self.observer.on_error(e)
    }
}

impl<T> Clone for Subject<T> {
    fn clone(&self) -> Self {
        Subject {
            observable: self.observable.clone(),
            observer: self.observer.clone(),
            manager: self.manager.clone(),
        }
    }
}

impl<T> fmt::Debug for Subject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subject")
            .field("manager", &self.manager)
            .finish()
    }
}

impl<T> From<Subject<T>> for Observable<T> {
    fn from(value: Subject<T>) -> Self {
        value.observable
    }
}

impl<T> From<Subject<T>> for Observer<T> {
    fn from(value: Subject<T>) -> Self {
        value.observer
    }
}

#[cfg(test)]
mod test {
    use std::sync::{Arc, Mutex};

    use crate::{
        errors::ObservableError, observable::Subscribeable, observer::Observer,
        observer::ObserverLike, Subject,
    };

    type Register = Arc<Mutex<Vec<usize>>>;

    fn subject_value_registers() -> (impl Fn() -> Observer<usize>, Register, Register, Register) {
        let nexts: Register = Arc::new(Mutex::new(Vec::with_capacity(5)));
        let completes: Register = Arc::new(Mutex::new(Vec::with_capacity(5)));
        let errors: Register = Arc::new(Mutex::new(Vec::with_capacity(5)));

        let (nexts_c, completes_c, errors_c) = (
            Arc::clone(&nexts),
            Arc::clone(&completes),
            Arc::clone(&errors),
        );
        let make_observer = move || {
            let (n, c, e) = (
                Arc::clone(&nexts_c),
                Arc::clone(&completes_c),
                Arc::clone(&errors_c),
            );
            Observer::new(
                // Track next() calls.
                move |v| n.lock().unwrap().push(v),
                // Track complete() calls.
                move || c.lock().unwrap().push(1),
                // Track error() calls.
                move |_: ObservableError| e.lock().unwrap().push(1),
            )
        };
        (make_observer, nexts, completes, errors)
    }

    #[test]
    fn subject_emit_than_complete() {
        let (make_observer, nexts, completes, errors) = subject_value_registers();
        let subject = Subject::new();

        // Emit but no registered subscribers yet.
        subject.on_next(1).unwrap();

        assert_eq!(subject.len(), 0);
        assert_eq!(nexts.lock().unwrap().len(), 0);

        // Register subscriber.
        subject.subscribe(make_observer()).unwrap(); // 1st

        // Registered but nothing is emitted after.
        assert_eq!(subject.len(), 1);
        assert_eq!(nexts.lock().unwrap().len(), 0);

        // Emit three times to one registered subscriber.
        subject.on_next(2).unwrap();
        subject.on_next(3).unwrap();
        subject.on_next(4).unwrap();

        assert_eq!(*nexts.lock().unwrap(), vec![2, 3, 4]);

        // Register more subscribers.
        subject.subscribe(make_observer()).unwrap(); // 2nd
        subject.subscribe(make_observer()).unwrap(); // 3rd

        assert_eq!(subject.len(), 3);
        assert_eq!(nexts.lock().unwrap().len(), 3);

        // Emit two more times on 3 registered subscribers.
        subject.on_next(5).unwrap();
        subject.on_next(6).unwrap();

        assert_eq!(nexts.lock().unwrap().len(), 9);
        assert_eq!(completes.lock().unwrap().len(), 0);

        // Complete Subject.
        subject.on_completed().unwrap();

        assert_eq!(subject.len(), 0);
        assert_eq!(nexts.lock().unwrap().len(), 9);
        assert_eq!(completes.lock().unwrap().len(), 3);
        assert_eq!(errors.lock().unwrap().len(), 0);

        // Register another subscriber and emit some values after complete.
        subject.subscribe(make_observer()).unwrap(); // 4th
        subject.on_next(7).unwrap();
        subject.on_next(8).unwrap();

        assert_eq!(subject.len(), 0);
        assert_eq!(nexts.lock().unwrap().len(), 9);
        assert_eq!(completes.lock().unwrap().len(), 4);
        assert_eq!(errors.lock().unwrap().len(), 0);
    }

    #[test]
    fn subject_emit_than_error() {
        let (make_observer, nexts, completes, errors) = subject_value_registers();
        let subject = Subject::new();

        // Register some subscribers.
        subject.subscribe(make_observer()).unwrap(); // 1st
        subject.subscribe(make_observer()).unwrap(); // 2nd
        subject.subscribe(make_observer()).unwrap(); // 3rd

        // Emit some values.
        subject.on_next(1).unwrap();
        subject.on_next(2).unwrap();
        subject.on_next(3).unwrap();

        assert_eq!(subject.len(), 3);
        assert_eq!(nexts.lock().unwrap().len(), 9);

        #[derive(Debug, thiserror::Error)]
        #[error("my error")]
        struct MyErr;

        // Invoke error on a Subject.
        subject.on_error(Arc::new(MyErr)).unwrap();

        assert_eq!(subject.len(), 0);
        assert_eq!(nexts.lock().unwrap().len(), 9);
        assert_eq!(completes.lock().unwrap().len(), 0);
        assert_eq!(errors.lock().unwrap().len(), 3);

        // Register another subscriber and emit some values after error.
        subject.subscribe(make_observer()).unwrap(); // 4th
        subject.on_next(4).unwrap();
        subject.on_completed().unwrap();

        assert_eq!(subject.len(), 0);
        assert_eq!(nexts.lock().unwrap().len(), 9);
        assert_eq!(completes.lock().unwrap().len(), 0);
        assert_eq!(errors.lock().unwrap().len(), 4);
    }

    #[test]
    fn clones_share_subscribers() {
        let (make_observer, nexts, _, _) = subject_value_registers();
        let subject = Subject::new();
        let other = subject.clone();

        other.subscribe(make_observer()).unwrap();
        subject.on_next(1).unwrap();

        assert_eq!(subject.len(), 1);
        assert_eq!(*nexts.lock().unwrap(), vec![1]);
    }
}
