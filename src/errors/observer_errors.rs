use std::any::Any;
use std::error::Error;
use std::sync::Arc;

/// Error payload carried by the `on_error` channel.
///
/// Wrapped in an `Arc` so a `Subject` can hand the same error to every
/// registered subscriber.
pub type ObservableError = Arc<dyn Error + Send + Sync>;

/// Outcome of delivering a single event to an observer.
pub type EmitResult = Result<(), ObserverError>;

/// Errors reported back by observer callbacks and by the emitting calls that
/// drive them.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ObserverError {
    /// A callback failed while handling a value or a completion, or a
    /// producer failed while emitting.
    #[error("observer callback failed: {0}")]
    Failed(#[source] ObservableError),

    /// Returned by an error channel that has no meaningful error handling.
    ///
    /// A safe subscriber never passes this through. It turns it into
    /// [`ObserverError::Unhandled`] carrying the error that triggered it.
    #[error("error handling is not implemented by this observer")]
    OnErrorNotImplemented,

    /// An error nobody handled, escaping to the caller of the emitting call.
    #[error("unhandled observable error: {0}")]
    Unhandled(#[source] ObservableError),
}

impl ObserverError {
    /// Wraps `err` as a callback failure.
    pub fn failed(err: impl Error + Send + Sync + 'static) -> Self {
        Self::Failed(Arc::new(err))
    }

    /// Returns `true` for the variant that escapes a safe subscriber.
    #[must_use]
    pub fn is_unhandled(&self) -> bool {
        matches!(self, Self::Unhandled(_))
    }

    /// Converts this error into a payload suitable for `on_error`.
    #[must_use]
    pub fn into_payload(self) -> ObservableError {
        match self {
            Self::Failed(e) | Self::Unhandled(e) => e,
            other => Arc::new(other),
        }
    }

    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_owned()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            String::from("non-string panic payload")
        };
        Self::failed(ObserverPanic { message })
    }
}

/// A panic raised inside an observer callback, captured as an error.
#[derive(Debug, Clone, thiserror::Error)]
#[error("observer callback panicked: {message}")]
pub struct ObserverPanic {
    message: String,
}

impl ObserverPanic {
    /// The panic message, if the payload was a string.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}
