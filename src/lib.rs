//! A small reactive core: observables, observers, subscriptions and subjects.
//!
//! An [`Observable`] is a deferred recipe producing values. Subscribing runs
//! its producer for the new [`Observer`], which is first wrapped in a safe
//! subscriber enforcing the Observable Contract: at most one terminal event,
//! nothing after unsubscribe, and callback failures turned into a single
//! error notification. A [`Subject`] is an observable and an observer at once,
//! multicasting whatever is pushed into it to its current subscribers.
//!
//! Every channel returns an [`EmitResult`], so producers chain emissions with
//! `?` and stop as soon as downstream reports an error nobody handled.
//!
//! ```
//! use rxlite::{range, Observer, Subscribeable};
//!
//! range(1, 5)
//!     .map(|v| v * 2)
//!     .subscribe(
//!         Observer::from_next(|v: i32| println!("Emitted {}", v))
//!             .with_completed(|| println!("Completed")),
//!     )
//!     .unwrap();
//! ```

pub mod errors;
pub mod observable;
pub mod observer;
pub mod subjects;
mod subscription;

pub use subscription::*;

pub use errors::*;
pub use observable::{range, Observable, Subscribeable};
pub use observer::{HandlerResult, Observer, ObserverLike};
pub use subjects::{Subject, SubjectSubscriptionManager};
pub use subscription::subscribe::{Subscriber, Subscription, SubscriptionList, UnsubscribeLogic};
