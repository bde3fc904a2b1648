//! `Subject` example
//!
//! This example demonstrates the usage of the `Subject` in the `rxlite`
//! library.
//!
//! The `Subject` acts as both an observer and observable in reactive
//! programming, broadcasting values to multiple observers.
//!
//! To run this example, execute `cargo run --example subject`.

use std::fmt::Display;

use rxlite::{range, Observer, ObserverError, ObserverLike, Subject, Subscribeable};

fn create_observer<T: Display + 'static>(subscriber_id: i32) -> Observer<T> {
    Observer::new(
        move |v: T| println!("Subscriber #{} emitted: {}", subscriber_id, v),
        move || println!("Completed {}", subscriber_id),
        |e| eprintln!("Error {}", e),
    )
}

fn main() -> Result<(), ObserverError> {
    let subject = Subject::<i32>::new();

    // Registers subscriber 1.
    subject.subscribe(create_observer(1))?;

    subject.on_next(101)?; // Emits 101 to subscriber 1.
    subject.on_next(102)?; // Emits 102 to subscriber 1.

    // All Observable operators can be applied to the subject.
    // Registers mapped subscriber 2.
    subject
        .map(|v: i32| format!("mapped {}", v))
        .subscribe(create_observer(2))?;

    // Registers subscriber 3 and keeps its subscription.
    let third = subject.subscribe(create_observer(3))?;

    // Emits 103 to subscribers 1, 2 and 3.
    subject.on_next(103)?;

    // Subscriber 3 leaves; 104 reaches subscribers 1 and 2.
    third.unsubscribe();
    subject.on_next(104)?;

    // A second subject fed by `range` through its observer side.
    let relay = Subject::<i32>::new();
    relay.subscribe(create_observer(5))?;
    range(1, 3).subscribe(relay.clone().into())?;

    // Calls `on_completed` on subscribers 1 and 2.
    subject.on_completed()?;

    // Subscriber 4: post-completion subscribe, completes immediately.
    subject.subscribe(create_observer(4))?;

    // Called post-completion, does not emit.
    subject.on_next(105)?;

    Ok(())
}
