use std::{
    fmt,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};

use parking_lot::Mutex;

use crate::{
    errors::{EmitResult, ObservableError},
    observer::ObserverLike,
    subscription::subscribe::{Subscriber, Subscription, UnsubscribeLogic},
};

/// Terminal event recorded by a subject.
#[derive(Clone)]
enum Terminal {
    Completed,
    Errored(ObservableError),
}

impl Terminal {
    fn replay<T>(&self, subscriber: &Subscriber<T>) -> EmitResult {
        match self {
            Terminal::Completed => subscriber.on_completed(),
            Terminal::Errored(e) => subscriber.on_error(Arc::clone(e)),
        }
    }
}

struct ManagerState<T> {
    subscribers: Vec<(u64, Subscriber<T>)>,
    next_key: u64,
    terminal: Option<Terminal>,
}

/// The shared set of subscribers currently registered on a subject.
///
/// The manager hands out the four functions a subject is built from: the
/// producer run when something subscribes, and the three forwarding functions
/// of the subject's own observer role. Clones share the same set.
pub struct SubjectSubscriptionManager<T> {
    state: Arc<Mutex<ManagerState<T>>>,
}

impl<T: 'static> SubjectSubscriptionManager<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(16)
    }

    /// Creates a manager whose subscriber set is pre-sized for `capacity`
    /// subscribers.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        SubjectSubscriptionManager {
            state: Arc::new(Mutex::new(ManagerState {
                subscribers: Vec::with_capacity(capacity),
                next_key: 0,
                terminal: None,
            })),
        }
    }

    /// Returns the number of registered subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().subscribers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` once a terminal event went through the manager.
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.state.lock().terminal.is_some()
    }

    /// Returns the producer used when something subscribes to the subject.
    ///
    /// The producer registers the subscriber and attaches to its subscription
    /// a cleanup action removing it from the set again. If the subject has
    /// already terminated the subscriber is not registered; it receives the
    /// recorded terminal event right away.
    pub fn create_on_subscribe_fn(
        &self,
    ) -> impl Fn(Subscriber<T>) -> EmitResult + Send + Sync + 'static {
        let state = Arc::clone(&self.state);

        move |subscriber: Subscriber<T>| {
            let key = {
                let mut guard = state.lock();
                if let Some(terminal) = guard.terminal.clone() {
                    drop(guard);
                    tracing::debug!("replaying terminal event to late subscriber");
                    return terminal.replay(&subscriber);
                }
                let key = guard.next_key;
                guard.next_key += 1;
                guard.subscribers.push((key, subscriber.clone()));
                key
            };
            tracing::trace!(key, "subscriber registered on subject");

            let weak = Arc::downgrade(&state);
            subscriber.add(Subscription::new(UnsubscribeLogic::Logic(Box::new(
                move || {
                    if let Some(state) = weak.upgrade() {
                        state.lock().subscribers.retain(|(k, _)| *k != key);
                        tracing::trace!(key, "subscriber removed from subject");
                    }
                },
            ))));
            Ok(())
        }
    }

    /// Returns the function fanning a value out to every subscriber
    /// registered at the time of the call.
    pub fn create_on_next_fn(&self) -> impl Fn(T) -> EmitResult + Send + Sync + 'static
    where
        T: Clone,
    {
        let state = Arc::clone(&self.state);

        move |v: T| {
            let snapshot: Vec<Subscriber<T>> = {
                let guard = state.lock();
                if guard.terminal.is_some() {
                    return Ok(());
                }
                guard.subscribers.iter().map(|(_, s)| s.clone()).collect()
            };
            fan_out(&snapshot, |s| s.on_next(v.clone()))
        }
    }

    /// Returns the function completing every registered subscriber and
    /// clearing the set.
    pub fn create_on_completed_fn(&self) -> impl Fn() -> EmitResult + Send + Sync + 'static {
        let state = Arc::clone(&self.state);

        move || match terminate(&state, Terminal::Completed) {
            Some(subscribers) => fan_out(&subscribers, |s| s.on_completed()),
            None => Ok(()),
        }
    }

    /// Returns the function delivering an error to every registered
    /// subscriber and clearing the set.
    pub fn create_on_error_fn(
        &self,
    ) -> impl Fn(ObservableError) -> EmitResult + Send + Sync + 'static {
        let state = Arc::clone(&self.state);

        move |e: ObservableError| match terminate(&state, Terminal::Errored(Arc::clone(&e))) {
            Some(subscribers) => fan_out(&subscribers, |s| s.on_error(Arc::clone(&e))),
            None => Ok(()),
        }
    }
}

/// Records `terminal` and takes the subscriber set, unless the subject
/// already terminated.
fn terminate<T>(
    state: &Mutex<ManagerState<T>>,
    terminal: Terminal,
) -> Option<Vec<Subscriber<T>>> {
    let mut guard = state.lock();
    if guard.terminal.is_some() {
        return None;
    }
    guard.terminal = Some(terminal);
    let subscribers = std::mem::take(&mut guard.subscribers);
    Some(subscribers.into_iter().map(|(_, s)| s).collect())
}

/// Notifies every subscriber, then reports the first failure.
///
/// A panic escaping one subscriber, such as a panicking teardown, does not
/// stop the others. The first one is resumed after all were notified.
fn fan_out<T>(
    subscribers: &[Subscriber<T>],
    mut emit: impl FnMut(&Subscriber<T>) -> EmitResult,
) -> EmitResult {
    let mut first_err = None;
    let mut first_panic = None;
    for subscriber in subscribers {
        match panic::catch_unwind(AssertUnwindSafe(|| emit(subscriber))) {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                first_err.get_or_insert(err);
            }
            Err(payload) => {
                tracing::warn!("subscriber panicked during fan-out");
                first_panic.get_or_insert(payload);
            }
        }
    }
    if let Some(payload) = first_panic {
        panic::resume_unwind(payload);
    }
    first_err.map_or(Ok(()), Err)
}

impl<T: 'static> Default for SubjectSubscriptionManager<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for SubjectSubscriptionManager<T> {
    fn clone(&self) -> Self {
        SubjectSubscriptionManager {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T> fmt::Debug for SubjectSubscriptionManager<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("SubjectSubscriptionManager")
            .field("subscribers", &state.subscribers.len())
            .field("terminated", &state.terminal.is_some())
            .finish()
    }
}
