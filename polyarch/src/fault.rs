use crate::Error;
use log::warn;
use serde::de;
use std::cell::Cell;

/// Records the typed cause of a rejected load.
///
/// Serde visitors can only report failures through the backend's own error type, so
/// loaders record [`Error::UnknownType`] and [`Error::UnknownVariant`] here and the
/// caller gets them back with [`Faults::resolve`]. One instance per load call.
#[derive(Default)]
pub struct Faults {
    first: Cell<Option<Error>>,
}

impl Faults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember `error` (the first one wins) and turn it into a backend error.
    pub fn raise<E: de::Error>(&self, error: Error) -> E {
        warn!("load rejected: {error}");
        let backend = E::custom(&error);
        let first = self.first.take();
        self.first.set(first.or(Some(error)));
        backend
    }

    pub fn take(&self) -> Option<Error> {
        self.first.take()
    }

    /// Prefer the recorded cause over the backend error it was reported as.
    pub fn resolve(&self, backend: impl Into<Error>) -> Error {
        self.take().unwrap_or_else(|| backend.into())
    }
}
