use std::fmt::{Debug, Display};

use crate::ContainerError;

/// An error that hands a value back to the caller.
///
/// Operations that take ownership of their input return this when they fail,
/// so that a failed call never drops (and thereby releases) something the caller
/// still owns.
pub struct Rejected<T, E = ContainerError> {
    error: E,
    value: T,
}

impl<T, E> Rejected<T, E> {
    pub fn new(error: E, value: T) -> Self {
        Rejected { error, value }
    }

    /// The reason the value was rejected.
    pub fn error(&self) -> &E {
        &self.error
    }

    /// Take back the rejected value, discarding the reason.
    pub fn into_value(self) -> T {
        self.value
    }

    /// Convert the reason into another error type, keeping the value.
    pub fn map_err<F>(self, f: impl FnOnce(E) -> F) -> Rejected<T, F> {
        Rejected {
            error: f(self.error),
            value: self.value,
        }
    }
}

impl<T, E: Debug> Debug for Rejected<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rejected")
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl<T, E: Display> Display for Rejected<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.error, f)
    }
}

impl<T, E: std::error::Error> std::error::Error for Rejected<T, E> {}

impl<T> From<Rejected<T, ContainerError>> for ContainerError {
    fn from(r: Rejected<T, ContainerError>) -> Self {
        r.error
    }
}
