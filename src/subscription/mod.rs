//! Provides structures related to subscription management.
//!
//! `subscribe` holds [`Subscription`](subscribe::Subscription) for cancelling
//! subscriptions, its composite form
//! [`SubscriptionList`](subscribe::SubscriptionList), and
//! [`Subscriber`](subscribe::Subscriber), the observer a producer pushes into.
//!
//! `safe` holds the wrapper that enforces the Observable Contract on every
//! subscriber handed to a producer.
pub mod safe;
pub mod subscribe;
