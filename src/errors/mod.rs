//! Error types shared by observers, subscribers and subjects.

mod observer_errors;

pub use observer_errors::*;
