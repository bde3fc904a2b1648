use crate::{
    errors::EmitResult, observable::Observable, observer::ObserverLike,
    subscription::subscribe::Subscriber,
};

/// Emits every integer from `start` up to and including `end`, then
/// completes. Emits nothing but the completion when `start > end`.
///
/// Emission stops early once the subscription is unsubscribed.
#[must_use]
pub fn range(start: i32, end: i32) -> Observable<i32> {
    Observable::new(move |subscriber: Subscriber<i32>| -> EmitResult {
        for i in start..=end {
            if subscriber.is_unsubscribed() {
                return Ok(());
            }
            subscriber.on_next(i)?;
        }
        subscriber.on_completed()
    })
}
