//! The `subjects` module provides the multicast [`Subject`] and the
//! [`SubjectSubscriptionManager`] holding its subscriber set.
//!
//! A `Subject` acts both as an `Observer`, enabling `on_next()`, `on_error()`
//! and `on_completed()` calls, and as an `Observable` that can be subscribed
//! to. Since it is an observer it can also be passed to the `subscribe`
//! method of another `Observable`, multicasting that observable's values.

mod subject;
mod subscription_manager;

pub use subject::*;
pub use subscription_manager::*;
