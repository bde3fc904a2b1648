//! Basic `Observable` example
//!
//! This example demonstrates creating an `Observable` from a producer
//! function, chaining `map` onto it and subscribing to the result. It also
//! shows the built in `range` observable.
//!
//! To run this example, execute `cargo run --example basic_observable`.

use rxlite::{
    range, EmitResult, Observable, Observer, ObserverError, ObserverLike, Subscribeable,
    Subscriber,
};

fn main() -> Result<(), ObserverError> {
    // Create a custom observer with `next` and `completed` callbacks.
    let observer = Observer::from_next(|v: String| println!("Emitted {}", v))
        .with_completed(|| println!("Completed"));

    // Create an observable that emits 0 to 10.
    let observable = Observable::new(|subscriber: Subscriber<i32>| -> EmitResult {
        for i in 0..=10 {
            // Stop early once the subscriber is gone.
            if subscriber.is_unsubscribed() {
                return Ok(());
            }
            subscriber.on_next(i)?;
        }
        subscriber.on_completed()
    });

    // Chain operators and subscribe.
    observable
        .map(|v| v * 10)
        .map(|v| format!("mapped {}", v))
        .subscribe(observer)?;

    // `range` does the same for an inclusive interval.
    range(1, 3).subscribe_next(|v| println!("range emitted {}", v))?;

    Ok(())
}
