use std::sync::{Arc, Mutex};

use rxlite::{errors::ObservableError, Observer};

pub type Register = Arc<Mutex<Vec<i32>>>;

/// Returns a factory of observers recording into shared registers, plus the
/// registers for values, completions and errors.
pub fn register_emissions_observer() -> (impl Fn() -> Observer<i32>, Register, Register, Register) {
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
            move |v: i32| {
                // Track next() calls.
                n.lock().unwrap().push(v);
            },
            move || {
                // Track complete() calls.
                c.lock().unwrap().push(1);
            },
            move |_: ObservableError| {
                // Track error() calls.
                e.lock().unwrap().push(1);
            },
        )
    };
    (make_observer, nexts, completes, errors)
}

/// Same as [`register_emissions_observer`] but the observers have no error
/// handling, so errors reaching them escape to the emitter.
pub fn register_nexts_observer() -> (impl Fn() -> Observer<i32>, Register, Register) {
    let nexts: Register = Arc::new(Mutex::new(Vec::with_capacity(5)));
    let completes: Register = Arc::new(Mutex::new(Vec::with_capacity(5)));

    let (nexts_c, completes_c) = (Arc::clone(&nexts), Arc::clone(&completes));

    let make_observer = move || {
        let (n, c) = (Arc::clone(&nexts_c), Arc::clone(&completes_c));
        Observer::from_next(move |v: i32| n.lock().unwrap().push(v))
            .with_completed(move || c.lock().unwrap().push(1))
            .with_unhandled_errors()
    };
    (make_observer, nexts, completes)
}
