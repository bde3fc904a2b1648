use std::{
    fmt,
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use parking_lot::Mutex;

use crate::{
    errors::{EmitResult, ObservableError},
    observer::{HandlerResult, Observer, ObserverLike},
};

/// Enumerates the unsubscribe logic a [`Subscription`] can hold.
pub enum UnsubscribeLogic {
    /// No specific unsubscribe logic.
    Nil,

    /// If one subscription depends on another. Wrapped subscription's unsubscribe
    /// will be called upon unsubscribing.
    Wrapped(Box<Subscription>),

    /// Unsubscribe logic defined by a function.
    Logic(Box<dyn FnOnce() + Send>),
}

impl UnsubscribeLogic {
    fn unsubscribe(self) {
        match self {
            UnsubscribeLogic::Nil => (),
            UnsubscribeLogic::Logic(fnc) => fnc(),
            UnsubscribeLogic::Wrapped(subscription) => subscription.unsubscribe(),
        }
    }
}

enum Teardown {
    Single(UnsubscribeLogic),
    List(Vec<Subscription>),
}

struct Inner {
    closed: AtomicBool,
    teardown: Mutex<Teardown>,
}

impl Inner {
    fn new(teardown: Teardown) -> Arc<Self> {
        Arc::new(Inner {
            closed: AtomicBool::new(false),
            teardown: Mutex::new(teardown),
        })
    }
}

/// An idempotent, shareable cancellation token.
///
/// Cloning a `Subscription` shares the same cancellation action; clones
/// compare equal, independently constructed subscriptions never do.
///
/// Calling [`unsubscribe`] more than once is safe: the held logic runs at
/// most once. If the logic panics the panic propagates to the caller of
/// `unsubscribe`, and the subscription stays closed.
///
/// [`unsubscribe`]: Subscription::unsubscribe
#[derive(Clone)]
pub struct Subscription {
    inner: Arc<Inner>,
}

impl Subscription {
    /// Creates a new `Subscription` holding the given unsubscribe logic.
    #[must_use]
    pub fn new(unsubscribe_logic: UnsubscribeLogic) -> Self {
        Subscription {
            inner: Inner::new(Teardown::Single(unsubscribe_logic)),
        }
    }

    /// Creates a `Subscription` whose unsubscribe does nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(UnsubscribeLogic::Nil)
    }

    /// Runs the held cancellation logic unless it already ran.
    ///
    /// For a subscription obtained from a [`SubscriptionList`] this
    /// unsubscribes every child.
    pub fn unsubscribe(&self) {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        // Take the logic out under the lock, run it with the lock released so
        // it may touch other subscriptions freely.
        let teardown = {
            let mut guard = self.inner.teardown.lock();
            match &mut *guard {
                Teardown::Single(logic) => {
                    Teardown::Single(std::mem::replace(logic, UnsubscribeLogic::Nil))
                }
                Teardown::List(children) => Teardown::List(std::mem::take(children)),
            }
        };

        match teardown {
            Teardown::Single(logic) => logic.unsubscribe(),
            Teardown::List(children) => {
                tracing::debug!(children = children.len(), "unsubscribing subscription list");
                // Every child runs even if an earlier one panics; the first
                // panic is resumed afterwards.
                let mut first_panic = None;
                for child in children {
                    let outcome = panic::catch_unwind(AssertUnwindSafe(|| child.unsubscribe()));
                    if let Err(payload) = outcome {
                        tracing::warn!("child teardown panicked");
                        first_panic.get_or_insert(payload);
                    }
                }
                if let Some(payload) = first_panic {
                    panic::resume_unwind(payload);
                }
            }
        }
    }

    /// Returns `true` once [`unsubscribe`](Subscription::unsubscribe) was called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }
}

impl Default for Subscription {
    fn default() -> Self {
        Self::empty()
    }
}

impl PartialEq for Subscription {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Subscription {}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("is_closed", &self.is_closed())
            .finish()
    }
}

/// A composite [`Subscription`] holding an ordered collection of children.
///
/// Unsubscribing the list unsubscribes every child it currently holds
/// exactly once, in insertion order, and clears the collection. A panicking
/// child does not stop the others; the first panic is resumed once all of
/// them ran. Children
/// added after the list was unsubscribed are unsubscribed immediately.
#[derive(Clone, PartialEq, Eq)]
pub struct SubscriptionList(Subscription);

impl SubscriptionList {
    #[must_use]
    pub fn new() -> Self {
        SubscriptionList(Subscription {
            inner: Inner::new(Teardown::List(Vec::new())),
        })
    }

    /// Registers a child subscription.
    pub fn add(&self, s: Subscription) {
        if s == self.0 {
            return;
        }
        if !self.is_closed() {
            let mut guard = self.0.inner.teardown.lock();
            // Re-check under the lock: `unsubscribe` flips the flag before it
            // drains the children.
            if !self.is_closed() {
                if let Teardown::List(children) = &mut *guard {
                    children.push(s);
                    return;
                }
            }
        }
        tracing::debug!("subscription added to a closed list, unsubscribing it");
        s.unsubscribe();
    }

    /// Unsubscribes and discards `s` if this list holds it.
    pub fn remove(&self, s: &Subscription) {
        let removed = {
            let mut guard = self.0.inner.teardown.lock();
            match &mut *guard {
                Teardown::List(children) => children
                    .iter()
                    .position(|c| c == s)
                    .map(|i| children.remove(i)),
                Teardown::Single(_) => None,
            }
        };

        if let Some(child) = removed {
            child.unsubscribe();
        }
    }

    /// Unsubscribes every child and clears the list.
    pub fn unsubscribe(&self) {
        self.0.unsubscribe();
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.0.is_closed()
    }

    /// Number of children currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        match &*self.0.inner.teardown.lock() {
            Teardown::List(children) => children.len(),
            Teardown::Single(_) => 0,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns this list viewed as a plain [`Subscription`] with the same
    /// identity.
    #[must_use]
    pub fn as_subscription(&self) -> Subscription {
        self.0.clone()
    }
}

impl Default for SubscriptionList {
    fn default() -> Self {
        Self::new()
    }
}

impl From<SubscriptionList> for Subscription {
    fn from(list: SubscriptionList) -> Self {
        list.0
    }
}

impl fmt::Debug for SubscriptionList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionList")
            .field("is_closed", &self.is_closed())
            .field("len", &self.len())
            .finish()
    }
}

struct SubscriberState<T> {
    observer: Observer<T>,
    subscriptions: SubscriptionList,
}

/// An [`Observer`] bound to the [`SubscriptionList`] of one particular
/// subscription.
///
/// Producers receive a `Subscriber` and may [`add`](Subscriber::add) teardown
/// logic to it, such as stopping a timer or closing a connection, that must
/// run when this subscription is torn down.
///
/// Cloning is shallow and equality is identity of the shared state.
pub struct Subscriber<T> {
    state: Arc<SubscriberState<T>>,
}

impl<T> Subscriber<T> {
    /// Creates a `Subscriber` with a fresh subscription list.
    pub fn new(observer: Observer<T>) -> Self {
        Self::from_parts(observer, SubscriptionList::new())
    }

    /// Creates a `Subscriber` whose list starts out holding `subscription`.
    pub fn with_subscription(observer: Observer<T>, subscription: Subscription) -> Self {
        let subscriptions = SubscriptionList::new();
        subscriptions.add(subscription);
        Self::from_parts(observer, subscriptions)
    }

    /// Creates a `Subscriber` handling values only.
    pub fn from_next<N, R>(next_fn: N) -> Self
    where
        N: Fn(T) -> R + Send + Sync + 'static,
        R: HandlerResult,
    {
        Self::new(Observer::from_next(next_fn))
    }

    /// Returns a new `Subscriber` delivering to `observer` that shares this
    /// subscriber's subscription list.
    ///
    /// Operators use this to hand a rewritten subscriber upstream while
    /// keeping upstream teardown tied to the downstream subscription.
    pub fn with_observer<U>(&self, observer: Observer<U>) -> Subscriber<U> {
        Subscriber::from_parts(observer, self.state.subscriptions.clone())
    }

    fn from_parts(observer: Observer<T>, subscriptions: SubscriptionList) -> Self {
        Subscriber {
            state: Arc::new(SubscriberState {
                observer,
                subscriptions,
            }),
        }
    }

    #[must_use]
    pub fn observer(&self) -> &Observer<T> {
        &self.state.observer
    }

    /// The handle cancelling this subscription.
    #[must_use]
    pub fn subscription(&self) -> Subscription {
        self.state.subscriptions.as_subscription()
    }

    /// Registers unsubscribe logic for this subscription.
    pub fn add(&self, s: Subscription) {
        self.state.subscriptions.add(s);
    }

    /// Returns `true` once this subscription has been torn down. Producers can
    /// check it to stop emitting early.
    #[must_use]
    pub fn is_unsubscribed(&self) -> bool {
        self.state.subscriptions.is_closed()
    }
}

impl<T> ObserverLike<T> for Subscriber<T> {
    fn on_next(&self, v: T) -> EmitResult {
        self.state.observer.on_next(v)
    }

    fn on_completed(&self) -> EmitResult {
        self.state.observer.on_completed()
    }

    fn on_error(&self, e: ObservableError) -> EmitResult {
        self.state.observer.on_error(e)
    }
}

impl<T> From<Observer<T>> for Subscriber<T> {
    fn from(observer: Observer<T>) -> Self {
        Self::new(observer)
    }
}

impl<T> Clone for Subscriber<T> {
    fn clone(&self) -> Self {
        Subscriber {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T> PartialEq for Subscriber<T> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }
}

impl<T> Eq for Subscriber<T> {}

impl<T> fmt::Debug for Subscriber<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber")
            .field("observer", &self.state.observer)
            .field("subscriptions", &self.state.subscriptions)
            .finish()
    }
}
